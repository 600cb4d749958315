//! Scanner metrics helpers
//!
//! Thin wrappers over the `metrics` facade so metric names live in one
//! place, plus an online statistics accumulator for end-of-run summaries.

use metrics::{counter, gauge, histogram};

/// Count one poll cycle by its outcome label
pub fn record_cycle_outcome(outcome: &'static str) {
    counter!("sbscan_cycles_total", "outcome" => outcome).increment(1);
}

/// Count one accepted position
pub fn record_position_recorded(session_id: i64) {
    counter!("sbscan_positions_recorded_total").increment(1);
    gauge!("sbscan_session_id").set(session_id as f64);
}

/// Age of the depth reading attached to a position (seconds)
pub fn record_depth_age(seconds: f64) {
    histogram!("sbscan_depth_age_seconds").record(seconds);
}

/// Count one durability commit
pub fn record_session_commit() {
    counter!("sbscan_commits_total").increment(1);
}

/// Current pause state (1 = paused)
pub fn record_paused(paused: bool) {
    gauge!("sbscan_paused").set(if paused { 1.0 } else { 0.0 });
}

/// Statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        assert_eq!(RunningStats::default().summary().to_string(), "N/A");

        let mut stats = RunningStats::default();
        stats.push(0.5);
        stats.push(1.5);
        let text = stats.summary().to_string();
        assert!(text.contains("mean=1.000"));
        assert!(text.contains("(n=2)"));
    }

    #[test]
    fn test_helpers_without_recorder() {
        // No global recorder installed: calls are no-ops
        record_cycle_outcome("recorded");
        record_position_recorded(1);
        record_depth_age(0.2);
        record_session_commit();
        record_paused(true);
    }
}

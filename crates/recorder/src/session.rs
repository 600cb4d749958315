//! IngestionSession - motion-gated position recording

use chrono::Utc;
use contracts::{
    ContractError, PositionRecord, PositionStore, PublishedState, RequiredFields, SessionId,
    SessionSummary, Stamped, TelemetryView,
};
use observability::RunningStats;
use tracing::{debug, info, instrument, trace};

use crate::depth::resolve_depth;

/// Recording policy
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Speed (knots) under which recording pauses
    pub min_speed_knots: f64,

    /// Whether slow speeds pause recording at all
    pub pause_on_stop: bool,

    /// Accepted records between two commits (>= 1)
    pub commit_interval: u64,

    /// Log a milestone every this many records (`None` = never)
    pub log_interval: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_speed_knots: 0.5,
            pause_on_stop: true,
            commit_interval: 500,
            log_interval: Some(1000),
        }
    }
}

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Some required field has never been observed
    WarmingUp { missing: Vec<&'static str> },
    /// Speed text did not parse
    InvalidSpeed,
    /// Below the speed threshold
    Paused,
    /// Position fix not newer than the last recorded one
    Unchanged,
    /// A position was stored
    Recorded,
}

impl Outcome {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::WarmingUp { .. } => "warming_up",
            Outcome::InvalidSpeed => "invalid_speed",
            Outcome::Paused => "paused",
            Outcome::Unchanged => "unchanged",
            Outcome::Recorded => "recorded",
        }
    }
}

/// One scanner run: a session row plus the positions recorded under it.
///
/// Positions are stored only while moving and only when the position fix is
/// strictly newer than the previous recorded one.
pub struct IngestionSession<S: PositionStore> {
    store: S,
    config: SessionConfig,
    session_id: SessionId,
    started_at: chrono::DateTime<Utc>,
    paused: bool,
    have_required_fields: bool,
    position_counter: u64,
    last_recorded: f64,
    depth_age: RunningStats,
}

impl<S: PositionStore> IngestionSession<S> {
    /// Create the session row and make it durable
    #[instrument(name = "session_open", skip(store))]
    pub fn open(mut store: S, config: SessionConfig) -> Result<Self, ContractError> {
        if config.commit_interval == 0 {
            return Err(ContractError::config_validation(
                "commit_interval",
                "must be at least 1",
            ));
        }

        let started_at = Utc::now();
        let session_id = store.open_session(started_at)?;
        store.commit()?;
        info!(session_id, started_at = %started_at, "session started");

        Ok(Self {
            store,
            config,
            session_id,
            started_at,
            paused: false,
            have_required_fields: false,
            position_counter: 0,
            last_recorded: f64::NEG_INFINITY,
            depth_age: RunningStats::default(),
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn positions(&self) -> u64 {
        self.position_counter
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the recording policy against one published state.
    ///
    /// # Errors
    /// Only storage failures, which are fatal for the session.
    pub fn observe(&mut self, state: &PublishedState) -> Result<Outcome, ContractError> {
        let outcome = self.evaluate(state)?;
        observability::record_cycle_outcome(outcome.label());
        Ok(outcome)
    }

    fn evaluate(&mut self, state: &PublishedState) -> Result<Outcome, ContractError> {
        let view = TelemetryView::from_state(state);

        let Some(RequiredFields {
            latitude: lat,
            north_south: ns,
            longitude: lon,
            east_west: ew,
            speed,
        }) = view.required()
        else {
            let missing = view.missing_required();
            trace!(missing = ?missing, "waiting for required fields");
            return Ok(Outcome::WarmingUp { missing });
        };

        if !self.have_required_fields {
            self.have_required_fields = true;
            info!(session_id = self.session_id, "all required fields observed");
        }

        let Some(speed_knots) = speed.as_f64() else {
            debug!(speed = %speed.value, "unparsable speed, skipping cycle");
            return Ok(Outcome::InvalidSpeed);
        };

        self.update_pause(speed_knots);
        if self.paused {
            return Ok(Outcome::Paused);
        }

        let passing_time = lat.timestamp;
        if passing_time <= self.last_recorded {
            return Ok(Outcome::Unchanged);
        }

        let depth = resolve_depth(&view);
        let record = PositionRecord {
            passing_time,
            latitude: format!("{}{}", lat.value, ns.value),
            longitude: format!("{}{}", lon.value, ew.value),
            speed_knots,
            heading_degrees: view.track.as_ref().and_then(Stamped::as_f64),
            depth_meters: depth.map(|d| d.meters),
            depth_time_delta: depth.map(|d| passing_time - d.timestamp),
            session_id: self.session_id,
        };

        self.store.insert_position(&record)?;
        self.position_counter += 1;
        self.last_recorded = passing_time;
        observability::record_position_recorded(self.session_id);
        if let Some(delta) = record.depth_time_delta {
            self.depth_age.push(delta);
            observability::record_depth_age(delta);
        }
        trace!(
            passing_time,
            lat = %record.latitude,
            lon = %record.longitude,
            depth = ?record.depth_meters,
            "position recorded"
        );

        if self.position_counter % self.config.commit_interval == 0 {
            self.store.commit()?;
            observability::record_session_commit();
            debug!(positions = self.position_counter, "positions committed");
        }

        if let Some(interval) = self.config.log_interval {
            if interval > 0 && self.position_counter % interval == 0 {
                info!(
                    session_id = self.session_id,
                    positions = self.position_counter,
                    "{} points recorded",
                    self.position_counter
                );
            }
        }

        Ok(Outcome::Recorded)
    }

    fn update_pause(&mut self, speed_knots: f64) {
        let paused = self.config.pause_on_stop && speed_knots < self.config.min_speed_knots;
        if paused == self.paused {
            return;
        }
        self.paused = paused;
        observability::record_paused(paused);
        if paused {
            info!(
                speed = speed_knots,
                min_speed = self.config.min_speed_knots,
                "recording paused"
            );
        } else {
            info!(speed = speed_knots, "recording resumed");
        }
    }

    /// Commit, record the stop time, commit again.
    ///
    /// Every step is attempted even if an earlier one failed; the first
    /// error is returned.
    #[instrument(name = "session_finish", skip(self), fields(session_id = self.session_id))]
    pub fn finish(mut self) -> Result<SessionSummary, ContractError> {
        let stopped_at = Utc::now();
        let first = self.store.commit();
        let close = self.store.close_session(self.session_id, stopped_at);
        let last = self.store.commit();
        first.and(close).and(last)?;

        info!(
            positions = self.position_counter,
            depth_age = %self.depth_age.summary(),
            "session stopped"
        );

        Ok(SessionSummary {
            session_id: self.session_id,
            positions: self.position_counter,
            started_at: self.started_at,
            stopped_at,
        })
    }
}

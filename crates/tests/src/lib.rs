//! # Integration Tests
//!
//! Cross-crate tests covering:
//! - sentence decoding through the shared snapshot to the published file
//! - the scanner recording positions from that file into SQLite
//! - configuration wiring for both processes

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use contracts::{Field, PublishedState, Worker};
    use ingestion::codec::frame;
    use ingestion::{ScriptedLineSource, SentenceTemplates, Snapshot, SourceWorker, WhenExhausted};
    use publisher::{PublishedReader, PublisherConfig, PublisherWorker};
    use recorder::{IngestionSession, Outcome, ScannerWorker, SessionConfig, SqliteStore};
    use tempfile::TempDir;

    const RMC_1: &str = "GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W,A";
    const RMC_2: &str = "GPRMC,123520,A,4807.045,N,01131.012,E,022.6,084.1,230394,003.1,W,A";
    const RMC_SLOW: &str = "GPRMC,123521,A,4807.045,N,01131.012,E,000.1,084.1,230394,003.1,W,A";
    const DBT: &str = "SDDBT,32.8,f,10.0,M,5.4,F";

    fn source(name: &str, lines: Vec<String>, snapshot: Arc<Snapshot>) -> SourceWorker {
        SourceWorker::new(
            name,
            Box::new(ScriptedLineSource::new(
                name,
                lines,
                WhenExhausted::Idle(Duration::from_millis(1)),
            )),
            SentenceTemplates::standard(),
            true,
            snapshot,
        )
    }

    fn publisher(dir: &TempDir, snapshot: Arc<Snapshot>) -> PublisherWorker {
        let config = PublisherConfig::new(dir.path().join("nmea.json"))
            .with_interval(Duration::from_millis(2));
        PublisherWorker::open(config, snapshot).unwrap()
    }

    fn scanner(dir: &TempDir, config: SessionConfig) -> ScannerWorker<SqliteStore> {
        let store = SqliteStore::open(dir.path().join("positions.db")).unwrap();
        let session = IngestionSession::open(store, config).unwrap();
        ScannerWorker::new(
            PublishedReader::new(dir.path().join("nmea.json")),
            session,
            Duration::from_millis(2),
        )
    }

    #[test]
    fn test_sentences_reach_published_file() {
        let dir = TempDir::new().unwrap();
        let snapshot = Arc::new(Snapshot::new());
        let mut gps = source("GPS", vec![frame(RMC_1)], snapshot.clone());
        let mut sounder = source("sounder", vec![frame(DBT)], snapshot.clone());
        let mut writer = publisher(&dir, snapshot);

        gps.step().unwrap();
        sounder.step().unwrap();
        writer.step().unwrap();

        let bytes = fs::read(dir.path().join("nmea.json")).unwrap();
        let state = PublishedState::decode(&bytes).unwrap();
        assert_eq!(state.get(Field::Latitude).unwrap().value, "4807.038");
        assert_eq!(state.get(Field::Speed).unwrap().value, "022.4");
        assert_eq!(state.get(Field::DepthMeters).unwrap().value, "10.0");
        assert_eq!(state.get(Field::DepthFathoms).unwrap().value, "5.4");
        assert!(state.get(Field::Date).is_some());
    }

    #[test]
    fn test_corrupt_sentences_never_published() {
        let dir = TempDir::new().unwrap();
        let snapshot = Arc::new(Snapshot::new());
        let mut gps = source(
            "GPS",
            vec![
                format!("${RMC_1}*00"),
                frame("GPRMC,123519,A,4807.038,N"),
                frame(RMC_2),
            ],
            snapshot.clone(),
        );
        let mut writer = publisher(&dir, snapshot);

        for _ in 0..3 {
            gps.step().unwrap();
        }
        writer.step().unwrap();

        let stats = gps.metrics().snapshot();
        assert_eq!(stats.checksum_errors, 1);
        assert_eq!(stats.template_mismatches, 1);

        let state = PublishedReader::new(dir.path().join("nmea.json"))
            .try_read()
            .unwrap()
            .unwrap();
        assert_eq!(state.get(Field::Latitude).unwrap().value, "4807.045");
    }

    #[test]
    fn test_daemon_to_scanner_records_positions() {
        let dir = TempDir::new().unwrap();
        let snapshot = Arc::new(Snapshot::new());
        let mut gps = source(
            "GPS",
            vec![frame(RMC_1), frame(RMC_2), frame(RMC_SLOW)],
            snapshot.clone(),
        );
        let mut sounder = source("sounder", vec![frame(DBT)], snapshot.clone());
        let mut writer = publisher(&dir, snapshot);
        let mut scan = scanner(&dir, SessionConfig::default());
        let session_id = scan.session().unwrap().session_id();

        // Only GPS so far: no depth yet
        gps.step().unwrap();
        writer.step().unwrap();
        assert!(matches!(
            scan.poll_once().unwrap(),
            Some(Outcome::WarmingUp { ref missing }) if missing == &vec!["depth"]
        ));

        sounder.step().unwrap();
        writer.step().unwrap();
        assert_eq!(scan.poll_once().unwrap(), Some(Outcome::Recorded));

        // Same fix again
        assert_eq!(scan.poll_once().unwrap(), Some(Outcome::Unchanged));

        thread::sleep(Duration::from_millis(2));
        gps.step().unwrap();
        writer.step().unwrap();
        assert_eq!(scan.poll_once().unwrap(), Some(Outcome::Recorded));

        thread::sleep(Duration::from_millis(2));
        gps.step().unwrap();
        writer.step().unwrap();
        assert_eq!(scan.poll_once().unwrap(), Some(Outcome::Paused));
        assert!(scan.session().unwrap().is_paused());

        assert_eq!(scan.session().unwrap().positions(), 2);
        scan.shutdown();

        let store = SqliteStore::open(dir.path().join("positions.db")).unwrap();
        assert_eq!(store.position_count(session_id).unwrap(), 2);
        let (_, stopped) = store.session_times(session_id).unwrap().unwrap();
        assert!(stopped.is_some());
    }

    #[test]
    fn test_disabled_sentence_is_ignored() {
        let mut gps = SourceWorker::new(
            "GPS",
            Box::new(ScriptedLineSource::new(
                "GPS",
                vec![frame(RMC_1)],
                WhenExhausted::Fail,
            )),
            SentenceTemplates::standard().without(["$GPRMC"]),
            true,
            Arc::new(Snapshot::new()),
        );

        gps.step().unwrap();
        assert_eq!(gps.metrics().snapshot().unrecognized, 1);
        assert!(gps.step().is_err());
    }

    #[tokio::test]
    async fn test_supervised_pipeline_until_shutdown() {
        use nmea_cli::supervisor::Supervisor;

        let dir = TempDir::new().unwrap();
        let snapshot = Arc::new(Snapshot::new());
        let gps = source("GPS", vec![frame(RMC_1)], snapshot.clone());
        let sounder = source("sounder", vec![frame(DBT)], snapshot.clone());
        let writer = publisher(&dir, snapshot);
        let scan = scanner(
            &dir,
            SessionConfig {
                commit_interval: 1,
                ..SessionConfig::default()
            },
        );
        let session_id = scan.session().unwrap().session_id();

        let mut supervisor = Supervisor::new();
        supervisor.spawn(Box::new(gps)).unwrap();
        supervisor.spawn(Box::new(sounder)).unwrap();
        supervisor.spawn(Box::new(writer)).unwrap();
        supervisor.spawn(Box::new(scan)).unwrap();

        let report = supervisor
            .run_until(tokio::time::sleep(Duration::from_millis(300)))
            .await;

        assert!(report.signalled);
        assert_eq!(report.exits.len(), 4);
        assert!(report.into_result().is_ok());

        let store = SqliteStore::open(dir.path().join("positions.db")).unwrap();
        assert_eq!(store.position_count(session_id).unwrap(), 1);
    }
}

#[cfg(test)]
mod config_tests {
    use std::fs;

    use config_loader::ConfigLoader;
    use nmea_cli::commands::session_config;
    use tempfile::TempDir;

    #[test]
    fn test_daemon_config_from_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nmead.json");
        fs::write(
            &path,
            r#"{
                "gps": {"port": "/dev/ttyUSB0", "baud": 4800, "check_checksums": "yes"},
                "sounder": {"port": "/dev/ttyUSB1", "disable_nmea": "$SDMTW"},
                "writer": {"output_file": "/tmp/nmea", "interval": 0.25}
            }"#,
        )
        .unwrap();

        let config = ConfigLoader::load_daemon(&path).unwrap();
        assert!(config.gps.check_checksums);
        assert_eq!(config.sounder.disable_nmea, vec!["$SDMTW".to_string()]);
        assert_eq!(config.writer.interval.as_millis(), 250);
        let [first, second] = config.sources();
        assert_eq!(first.name, "gps");
        assert_eq!(second.port, "/dev/ttyUSB1");
    }

    #[test]
    fn test_scanner_config_drives_session_policy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sbscan.conf");
        fs::write(
            &path,
            "[scanner]\ndb_file = \"/var/lib/sb.db\"\nnmea_file = \"/tmp/nmea\"\npause_on_stop = \"off\"\ncommit_interval = 20\nlog_point_count_interval = 40\n",
        )
        .unwrap();

        let config = ConfigLoader::load_scanner(&path).unwrap();
        let session = session_config(&config);
        assert!(!session.pause_on_stop);
        assert_eq!(session.commit_interval, 20);
        assert_eq!(session.log_interval, Some(40));
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nmead.toml");
        fs::write(&path, "[gps]\nport = \"/dev/ttyUSB0\"\n").unwrap();

        let err = ConfigLoader::load_daemon(&path).unwrap_err();
        assert!(err.to_string().contains("sounder"));
    }
}

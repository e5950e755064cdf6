use chrono::{DateTime, Duration, Utc};
use path_tracker_lib::{fix::Fix, geo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    /// Terminal. No transition leads out of this state.
    Stopped,
}

/// In-memory state of one recording. `Idle → Recording → Stopped`, nothing
/// else. Every fix delivered while recording is accepted as-is; there is no
/// deduplication and no accuracy filtering, so GPS jitter counts towards the
/// distance. That matches how recordings have always behaved and stays until
/// a tolerance is actually decided on.
pub struct PathSession {
    path_id: i64,
    state: SessionState,
    start_time: DateTime<Utc>,
    last_position: Option<(f64, f64)>,
    total_distance_km: f64,
}

impl PathSession {
    pub fn new(path_id: i64) -> Self {
        Self {
            path_id,
            state: SessionState::Idle,
            start_time: DateTime::UNIX_EPOCH,
            last_position: None,
            total_distance_km: 0.0,
        }
    }

    pub fn path_id(&self) -> i64 {
        self.path_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    /// Begins recording. Calling this again while already recording changes
    /// nothing, and a stopped session can not be restarted.
    pub fn start(&mut self, start_time: DateTime<Utc>) {
        if self.state != SessionState::Idle {
            return;
        }

        self.state = SessionState::Recording;
        self.start_time = start_time;
    }

    /// Folds a fix into the running distance. The first fix of a session has
    /// no predecessor and contributes zero. Returns the new running total,
    /// or `None` when the session is not recording (the fix is discarded).
    pub fn accept_fix(&mut self, fix: &Fix) -> Option<f64> {
        if self.state != SessionState::Recording {
            return None;
        }

        if let Some((last_lat, last_lon)) = self.last_position {
            self.total_distance_km += geo::haversine_km(last_lat, last_lon, fix.latitude, fix.longitude);
        }
        self.last_position = Some((fix.latitude, fix.longitude));

        Some(self.total_distance_km)
    }

    /// Terminal transition. Returns the finalized average speed in km/h, or
    /// `None` when the session was not recording (repeated stops are no-ops).
    pub fn stop(&mut self, end_time: DateTime<Utc>) -> Option<f64> {
        if self.state != SessionState::Recording {
            return None;
        }

        self.state = SessionState::Stopped;
        Some(geo::average_speed_kmh(self.total_distance_km, self.start_time, end_time))
    }

    /// Wall-clock time since start, computed on demand.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64, lon: f64, secs: i64) -> Fix {
        Fix::new(lat, lon, 0.0, 5.0, DateTime::from_timestamp(secs, 0).unwrap())
    }

    #[test]
    fn start_is_idempotent() {
        let t0 = DateTime::from_timestamp(100, 0).unwrap();
        let t1 = DateTime::from_timestamp(200, 0).unwrap();

        let mut session = PathSession::new(1);
        session.start(t0);
        session.start(t1);

        assert_eq!(session.state(), SessionState::Recording);
        assert_eq!(session.elapsed(t1), Duration::seconds(100));
    }

    #[test]
    fn first_fix_contributes_no_distance() {
        let mut session = PathSession::new(1);
        session.start(DateTime::from_timestamp(0, 0).unwrap());

        assert_eq!(session.accept_fix(&fix(0.0, 0.0, 1)), Some(0.0));

        let total = session.accept_fix(&fix(0.0, 1.0, 2)).unwrap();
        assert!((total - 111.19).abs() < 0.5, "got {total}");
        assert!(session.total_distance_km() >= 0.0);
    }

    #[test]
    fn fixes_are_discarded_outside_recording() {
        let mut session = PathSession::new(1);
        assert_eq!(session.accept_fix(&fix(0.0, 0.0, 1)), None);

        session.start(DateTime::from_timestamp(0, 0).unwrap());
        session.accept_fix(&fix(0.0, 0.0, 1));
        session.stop(DateTime::from_timestamp(10, 0).unwrap());

        assert_eq!(session.accept_fix(&fix(0.0, 1.0, 11)), None);
        assert_eq!(session.total_distance_km(), 0.0);
    }

    #[test]
    fn stop_is_terminal_and_repeat_stops_are_noops() {
        let t0 = DateTime::from_timestamp(0, 0).unwrap();
        let mut session = PathSession::new(1);
        session.start(t0);

        assert!(session.stop(DateTime::from_timestamp(3600, 0).unwrap()).is_some());
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(session.stop(DateTime::from_timestamp(7200, 0).unwrap()), None);

        // no way back to recording either
        session.start(DateTime::from_timestamp(9000, 0).unwrap());
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn zero_duration_session_has_zero_average_speed() {
        let t = DateTime::from_timestamp(1000, 0).unwrap();
        let mut session = PathSession::new(1);
        session.start(t);
        session.accept_fix(&fix(0.0, 0.0, 1000));
        session.accept_fix(&fix(0.0, 1.0, 1000));

        assert_eq!(session.stop(t), Some(0.0));
    }

    #[test]
    fn average_speed_uses_elapsed_hours() {
        let start = DateTime::from_timestamp(0, 0).unwrap();
        let end = DateTime::from_timestamp(3600, 0).unwrap();

        let mut session = PathSession::new(1);
        session.start(start);
        session.accept_fix(&fix(0.0, 0.0, 0));
        session.accept_fix(&fix(0.0, 1.0, 1800));

        let speed = session.stop(end).unwrap();
        assert!((speed - session.total_distance_km()).abs() < 1e-9);
    }
}

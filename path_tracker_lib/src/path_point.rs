use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fix::Fix;

/// One persisted GPS sample of a path. Append-only, ordered by timestamp.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PathPoint {
    pub point_id: i64,
    pub path_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Accuracy radius in meters.
    pub accuracy: f64,
}

impl PathPoint {
    pub fn new(point_id: i64, path_id: i64, fix: &Fix) -> Self {
        Self {
            point_id,
            path_id,
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            timestamp: fix.timestamp,
            accuracy: fix.accuracy,
        }
    }
}

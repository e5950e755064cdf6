use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single location reading as delivered by the location feed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Accuracy radius in meters.
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, altitude: f64, accuracy: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            accuracy,
            timestamp,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded walking session. Created active (`end_time` is `None`,
/// `completed` is false), distance-only updates while recording, finalized
/// exactly once on stop — immutable thereafter.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Path {
    pub path_id: i64,
    pub name: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Cumulative distance in kilometers. Non-decreasing while active.
    pub total_distance: f64,
    /// Km/h, derived at completion. 0 until the path is finalized.
    pub average_speed: f64,
    /// User rating, 0.0 to 5.0.
    pub rating: f64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Path {
    pub fn new(path_id: i64, name: String, description: String, start_time: DateTime<Utc>, created_at: DateTime<Utc>) -> Self {
        Self {
            path_id,
            name,
            description,
            start_time,
            end_time: None,
            total_distance: 0.0,
            average_speed: 0.0,
            rating: 0.0,
            completed: false,
            created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }
}

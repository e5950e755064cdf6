use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A photo taken along a path, pinned to the position at capture time.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Photo {
    pub photo_id: i64,
    pub path_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub file_path: String,
    pub caption: String,
    pub timestamp: DateTime<Utc>,
}

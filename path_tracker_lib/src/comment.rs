use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

/// A free-text note attached to a path. Location is optional: it is absent
/// when no position was available at capture time, which is a normal case,
/// not an error.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Comment {
    pub comment_id: i64,
    pub path_id: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    /// A half-set coordinate pair is normalized to fully absent here, so a
    /// comment is either located or it is not.
    pub fn new(comment_id: i64, path_id: i64, location: Option<(f64, f64)>, body: String, timestamp: DateTime<Utc>) -> Self {
        let (latitude, longitude) = match location {
            Some((lat, lon)) => (Some(lat), Some(lon)),
            None => (None, None),
        };

        Self {
            comment_id,
            path_id,
            latitude,
            longitude,
            body,
            timestamp,
        }
    }

    /// The capture position, or `None` unless both coordinates are present.
    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for Comment {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let latitude: Option<f64> = row.try_get("latitude")?;
        let longitude: Option<f64> = row.try_get("longitude")?;
        let location = latitude.zip(longitude);

        Ok(Comment::new(
            row.try_get("comment_id")?,
            row.try_get("path_id")?,
            location,
            row.try_get("body")?,
            row.try_get("timestamp")?,
        ))
    }
}

#[test]
fn partial_location_normalizes_to_none() {
    let comment = Comment::new(1, 1, None, "no gps".into(), Default::default());
    assert_eq!(comment.latitude, None);
    assert_eq!(comment.longitude, None);
    assert_eq!(comment.location(), None);

    let located = Comment::new(2, 1, Some((56.1, 10.2)), "view".into(), Default::default());
    assert_eq!(located.location(), Some((56.1, 10.2)));

    // A row written by something else may still be half-set.
    let half = Comment {
        latitude: Some(56.1),
        longitude: None,
        ..comment
    };
    assert_eq!(half.location(), None);
}

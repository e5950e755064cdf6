pub mod database;
pub mod recording;
mod data_manager;
mod kml_util;

pub use data_manager::*;

pub const DATABASE_FILE_NAME: &str = "database.db";

#[derive(Debug, thiserror::Error)]
pub enum DataManagerError {
    /// Connection or query plumbing failed.
    #[error("database error: {0}")]
    Database(String),

    /// An append or update did not reach the store. In-memory session state
    /// is not rolled back; the caller decides about retries.
    #[error("store write failed: {0}")]
    StoreWrite(String),

    /// An append targeted a path id that does not exist.
    #[error("path {0} does not exist")]
    InvalidPathReference(i64),

    /// The location feed refused the subscription; recording never started.
    #[error("location feed unavailable: permission denied")]
    PermissionDenied,

    /// KML export could not be written. No partial file is left behind.
    #[error("kml export failed: {0}")]
    KmlIo(String),
}

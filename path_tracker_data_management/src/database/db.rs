use chrono::{DateTime, Utc};
use const_format::concatcp;
use path_tracker_lib::{comment::Comment, fix::Fix, path::Path, path_point::PathPoint, photo::Photo};
use sqlx::{Executor, Pool, Sqlite, SqlitePool, query, query_as, sqlite::SqliteConnectOptions};

use crate::DataManagerError;

use super::constants::*;

/// The durable sample store. All mutations are awaited through sqlx, so a
/// returned `Ok` means the row is in the database. Reads are snapshots and
/// safe to run while a recording is still appending.
#[derive(Clone)]
pub struct PathDatabase {
    pool: Pool<Sqlite>,
}

impl PathDatabase {
    pub async fn connect(db_file: &std::path::Path) -> Result<Self, DataManagerError> {
        let options = SqliteConnectOptions::new()
            .filename(db_file)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|err| DataManagerError::Database(format!("failed to connect to database: {err}")))?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    async fn init(&self) -> Result<(), DataManagerError> {
        self.pool.execute(concatcp!("
            CREATE TABLE IF NOT EXISTS ", PATHS_TABLE_NAME, "(",
                PATH_ID,        " INTEGER PRIMARY KEY AUTOINCREMENT,",
                NAME,           " TEXT NOT NULL,",
                DESCRIPTION,    " TEXT NOT NULL,",
                START_TIME,     " TIMESTAMP NOT NULL,",
                END_TIME,       " TIMESTAMP,",
                TOTAL_DISTANCE, " REAL NOT NULL,",
                AVERAGE_SPEED,  " REAL NOT NULL,",
                RATING,         " REAL NOT NULL,",
                COMPLETED,      " BOOLEAN NOT NULL,",
                CREATED_AT,     " TIMESTAMP NOT NULL);

            CREATE TABLE IF NOT EXISTS ", PATH_POINTS_TABLE_NAME, "(",
                POINT_ID,  " INTEGER PRIMARY KEY AUTOINCREMENT,",
                PATH_ID,   " INTEGER NOT NULL,",
                LATITUDE,  " REAL NOT NULL,",
                LONGITUDE, " REAL NOT NULL,",
                ALTITUDE,  " REAL NOT NULL,",
                TIMESTAMP, " TIMESTAMP NOT NULL,",
                ACCURACY,  " REAL NOT NULL,
                FOREIGN KEY(", PATH_ID, ") REFERENCES ", PATHS_TABLE_NAME, "(", PATH_ID, ") ON DELETE CASCADE);

            CREATE TABLE IF NOT EXISTS ", PHOTOS_TABLE_NAME, "(",
                PHOTO_ID,  " INTEGER PRIMARY KEY AUTOINCREMENT,",
                PATH_ID,   " INTEGER NOT NULL,",
                LATITUDE,  " REAL NOT NULL,",
                LONGITUDE, " REAL NOT NULL,",
                FILE_PATH, " TEXT NOT NULL,",
                CAPTION,   " TEXT NOT NULL,",
                TIMESTAMP, " TIMESTAMP NOT NULL,
                FOREIGN KEY(", PATH_ID, ") REFERENCES ", PATHS_TABLE_NAME, "(", PATH_ID, ") ON DELETE CASCADE);

            CREATE TABLE IF NOT EXISTS ", COMMENTS_TABLE_NAME, "(",
                COMMENT_ID, " INTEGER PRIMARY KEY AUTOINCREMENT,",
                PATH_ID,    " INTEGER NOT NULL,",
                LATITUDE,   " REAL,",
                LONGITUDE,  " REAL,",
                BODY,       " TEXT NOT NULL,",
                TIMESTAMP,  " TIMESTAMP NOT NULL,
                FOREIGN KEY(", PATH_ID, ") REFERENCES ", PATHS_TABLE_NAME, "(", PATH_ID, ") ON DELETE CASCADE)"))
            .await
            .map_err(|err| DataManagerError::Database(format!("failed to initialize schema: {err}")))?;

        Ok(())
    }

    pub async fn insert_path(&self, name: String, description: String, start_time: DateTime<Utc>) -> Result<Path, DataManagerError> {
        let created_at = Utc::now();
        let path_id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", PATHS_TABLE_NAME, "(",
            NAME, ", ", DESCRIPTION, ", ", START_TIME, ", ", END_TIME, ", ",
            TOTAL_DISTANCE, ", ", AVERAGE_SPEED, ", ", RATING, ", ", COMPLETED, ", ", CREATED_AT, ")
            VALUES (?1, ?2, ?3, NULL, 0, 0, 0, FALSE, ?4) RETURNING ", PATH_ID))
            .bind(&name)
            .bind(&description)
            .bind(start_time)
            .bind(created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| DataManagerError::StoreWrite(format!("failed to insert path: {err}")))
            .map(|row| row.0)?;

        Ok(Path::new(path_id, name, description, start_time, created_at))
    }

    /// Full-row replace keyed by id. Applying the same value twice is a
    /// deliberate no-op, callers may retry freely.
    pub async fn update_path(&self, path: &Path) -> Result<(), DataManagerError> {
        let result = query(concatcp!("UPDATE ", PATHS_TABLE_NAME, " SET ",
            NAME, " = ?1, ", DESCRIPTION, " = ?2, ", START_TIME, " = ?3, ", END_TIME, " = ?4, ",
            TOTAL_DISTANCE, " = ?5, ", AVERAGE_SPEED, " = ?6, ", RATING, " = ?7, ", COMPLETED, " = ?8
            WHERE ", PATH_ID, " = ?9"))
            .bind(&path.name)
            .bind(&path.description)
            .bind(path.start_time)
            .bind(path.end_time)
            .bind(path.total_distance)
            .bind(path.average_speed)
            .bind(path.rating)
            .bind(path.completed)
            .bind(path.path_id)
            .execute(&self.pool)
            .await
            .map_err(|err| DataManagerError::StoreWrite(format!("failed to update path: {err}")))?;

        if result.rows_affected() == 0 {
            return Err(DataManagerError::InvalidPathReference(path.path_id));
        }

        Ok(())
    }

    /// Distance-only mutation used on every accepted fix while recording.
    pub async fn set_path_distance(&self, path_id: i64, total_distance: f64) -> Result<(), DataManagerError> {
        query(concatcp!("UPDATE ", PATHS_TABLE_NAME, " SET ", TOTAL_DISTANCE, " = ?1 WHERE ", PATH_ID, " = ?2"))
            .bind(total_distance)
            .bind(path_id)
            .execute(&self.pool)
            .await
            .map_err(|err| DataManagerError::StoreWrite(format!("failed to set path distance: {err}")))
            .map(|_| ())
    }

    pub async fn get_path(&self, path_id: i64) -> Result<Path, DataManagerError> {
        query_as::<_, Path>(concatcp!("SELECT * FROM ", PATHS_TABLE_NAME, " WHERE ", PATH_ID, " = ?1"))
            .bind(path_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| DataManagerError::Database(format!("failed to get path: {err}")))?
            .ok_or(DataManagerError::InvalidPathReference(path_id))
    }

    /// All recorded paths, newest first.
    pub async fn get_paths(&self) -> Result<Vec<Path>, DataManagerError> {
        query_as::<_, Path>(concatcp!("SELECT * FROM ", PATHS_TABLE_NAME, " ORDER BY ", CREATED_AT, " DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|err| DataManagerError::Database(format!("failed to list paths: {err}")))
    }

    pub async fn insert_path_point(&self, path_id: i64, fix: &Fix) -> Result<PathPoint, DataManagerError> {
        let point_id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", PATH_POINTS_TABLE_NAME, "(",
            PATH_ID, ", ", LATITUDE, ", ", LONGITUDE, ", ", ALTITUDE, ", ", TIMESTAMP, ", ", ACCURACY, ")
            VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING ", POINT_ID))
            .bind(path_id)
            .bind(fix.latitude)
            .bind(fix.longitude)
            .bind(fix.altitude)
            .bind(fix.timestamp)
            .bind(fix.accuracy)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_append_error(err, path_id, "insert path point"))
            .map(|row| row.0)?;

        Ok(PathPoint::new(point_id, path_id, fix))
    }

    /// Points in capture order. `point_id` breaks timestamp ties, so the
    /// order is stable across exports.
    pub async fn get_path_points(&self, path_id: i64) -> Result<Vec<PathPoint>, DataManagerError> {
        query_as::<_, PathPoint>(concatcp!(
            "SELECT * FROM ", PATH_POINTS_TABLE_NAME,
            " WHERE ", PATH_ID, " = ?1 ORDER BY ", TIMESTAMP, " ASC, ", POINT_ID, " ASC"))
            .bind(path_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| DataManagerError::Database(format!("failed to get path points: {err}")))
    }

    pub async fn insert_photo(
        &self,
        path_id: i64,
        latitude: f64,
        longitude: f64,
        file_path: String,
        caption: String,
        timestamp: DateTime<Utc>,
    ) -> Result<Photo, DataManagerError> {
        let photo_id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", PHOTOS_TABLE_NAME, "(",
            PATH_ID, ", ", LATITUDE, ", ", LONGITUDE, ", ", FILE_PATH, ", ", CAPTION, ", ", TIMESTAMP, ")
            VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING ", PHOTO_ID))
            .bind(path_id)
            .bind(latitude)
            .bind(longitude)
            .bind(&file_path)
            .bind(&caption)
            .bind(timestamp)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_append_error(err, path_id, "insert photo"))
            .map(|row| row.0)?;

        Ok(Photo {
            photo_id,
            path_id,
            latitude,
            longitude,
            file_path,
            caption,
            timestamp,
        })
    }

    pub async fn get_photos(&self, path_id: i64) -> Result<Vec<Photo>, DataManagerError> {
        query_as::<_, Photo>(concatcp!(
            "SELECT * FROM ", PHOTOS_TABLE_NAME,
            " WHERE ", PATH_ID, " = ?1 ORDER BY ", TIMESTAMP, " ASC, ", PHOTO_ID, " ASC"))
            .bind(path_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| DataManagerError::Database(format!("failed to get photos: {err}")))
    }

    pub async fn delete_photo(&self, photo_id: i64) -> Result<(), DataManagerError> {
        query(concatcp!("DELETE FROM ", PHOTOS_TABLE_NAME, " WHERE ", PHOTO_ID, " = ?1"))
            .bind(photo_id)
            .execute(&self.pool)
            .await
            .map_err(|err| DataManagerError::StoreWrite(format!("failed to delete photo: {err}")))
            .map(|_| ())
    }

    pub async fn insert_comment(
        &self,
        path_id: i64,
        location: Option<(f64, f64)>,
        body: String,
        timestamp: DateTime<Utc>,
    ) -> Result<Comment, DataManagerError> {
        let (latitude, longitude) = match location {
            Some((lat, lon)) => (Some(lat), Some(lon)),
            None => (None, None),
        };

        let comment_id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", COMMENTS_TABLE_NAME, "(",
            PATH_ID, ", ", LATITUDE, ", ", LONGITUDE, ", ", BODY, ", ", TIMESTAMP, ")
            VALUES (?1, ?2, ?3, ?4, ?5) RETURNING ", COMMENT_ID))
            .bind(path_id)
            .bind(latitude)
            .bind(longitude)
            .bind(&body)
            .bind(timestamp)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_append_error(err, path_id, "insert comment"))
            .map(|row| row.0)?;

        Ok(Comment::new(comment_id, path_id, location, body, timestamp))
    }

    pub async fn get_comments(&self, path_id: i64) -> Result<Vec<Comment>, DataManagerError> {
        query_as::<_, Comment>(concatcp!(
            "SELECT * FROM ", COMMENTS_TABLE_NAME,
            " WHERE ", PATH_ID, " = ?1 ORDER BY ", TIMESTAMP, " ASC, ", COMMENT_ID, " ASC"))
            .bind(path_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| DataManagerError::Database(format!("failed to get comments: {err}")))
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<(), DataManagerError> {
        query(concatcp!("DELETE FROM ", COMMENTS_TABLE_NAME, " WHERE ", COMMENT_ID, " = ?1"))
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(|err| DataManagerError::StoreWrite(format!("failed to delete comment: {err}")))
            .map(|_| ())
    }
}

/// Appends against an unknown path id trip the foreign key constraint; those
/// are rejected as a distinct error instead of a generic write failure.
fn map_append_error(err: sqlx::Error, path_id: i64, what: &str) -> DataManagerError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.message().contains("FOREIGN KEY") {
            return DataManagerError::InvalidPathReference(path_id);
        }
    }

    DataManagerError::StoreWrite(format!("failed to {what}: {err}"))
}

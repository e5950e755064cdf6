use chrono::Utc;
use path_tracker_lib::{comment::Comment, path::Path, path_point::PathPoint, photo::Photo};

use crate::{DATABASE_FILE_NAME, DataManagerError, database::PathDatabase};

/// The single entry point for everything persisted. Constructed once at
/// process start from an explicit data directory and handed to whoever
/// needs it; it clones cheaply.
#[derive(Clone)]
pub struct DataManager {
    pub(crate) database: PathDatabase,
}

impl DataManager {
    pub async fn start(data_dir: &std::path::Path) -> Result<Self, DataManagerError> {
        if !data_dir.exists() {
            std::fs::create_dir_all(data_dir)
                .map_err(|err| DataManagerError::Database(format!("failed to create data directory {data_dir:?}: {err}")))?;
        }

        let database = PathDatabase::connect(&data_dir.join(DATABASE_FILE_NAME)).await?;

        Ok(DataManager { database })
    }

    pub async fn get_path(&self, path_id: i64) -> Result<Path, DataManagerError> {
        self.database.get_path(path_id).await
    }

    /// All recorded paths, newest first.
    pub async fn get_paths(&self) -> Result<Vec<Path>, DataManagerError> {
        self.database.get_paths().await
    }

    pub async fn update_path(&self, path: &Path) -> Result<(), DataManagerError> {
        self.database.update_path(path).await
    }

    pub async fn get_path_points(&self, path_id: i64) -> Result<Vec<PathPoint>, DataManagerError> {
        self.database.get_path_points(path_id).await
    }

    pub async fn add_photo(
        &self,
        path_id: i64,
        latitude: f64,
        longitude: f64,
        file_path: String,
        caption: String,
    ) -> Result<Photo, DataManagerError> {
        self.database
            .insert_photo(path_id, latitude, longitude, file_path, caption, Utc::now())
            .await
    }

    pub async fn get_photos(&self, path_id: i64) -> Result<Vec<Photo>, DataManagerError> {
        self.database.get_photos(path_id).await
    }

    pub async fn delete_photo(&self, photo_id: i64) -> Result<(), DataManagerError> {
        self.database.delete_photo(photo_id).await
    }

    /// `location` is `None` when no position was available at capture time;
    /// the comment is stored anyway.
    pub async fn add_comment(
        &self,
        path_id: i64,
        location: Option<(f64, f64)>,
        body: String,
    ) -> Result<Comment, DataManagerError> {
        self.database.insert_comment(path_id, location, body, Utc::now()).await
    }

    pub async fn get_comments(&self, path_id: i64) -> Result<Vec<Comment>, DataManagerError> {
        self.database.get_comments(path_id).await
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<(), DataManagerError> {
        self.database.delete_comment(comment_id).await
    }
}

#[tokio::test]
async fn start_creates_the_data_directory() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("nested").join("data");

    let manager = DataManager::start(&data_dir).await.unwrap();

    assert!(data_dir.join(DATABASE_FILE_NAME).exists());
    assert!(manager.get_paths().await.unwrap().is_empty());
}

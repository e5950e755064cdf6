use std::path::PathBuf;

use chrono::Utc;
use path_tracker_lib::kml;

use crate::{DataManager, DataManagerError};

impl DataManager {
    /// Renders the KML document for a path and writes it into `out_dir`
    /// under the `path_<name>_<millis>.kml` convention. Returns the path of
    /// the written file; on a write failure any partial file is removed, so
    /// a returned `Ok` always names a complete document.
    ///
    /// Exporting mid-recording is fine: the rows read here are a snapshot
    /// and the document says "In Progress" instead of an end time.
    pub async fn export_kml(&self, path_id: i64, out_dir: &std::path::Path) -> Result<PathBuf, DataManagerError> {
        let path = self.database.get_path(path_id).await?;
        let points = self.database.get_path_points(path_id).await?;
        let photos = self.database.get_photos(path_id).await?;
        let comments = self.database.get_comments(path_id).await?;

        let document = kml::path_document(&path, &points, &photos, &comments);
        let file_path = out_dir.join(kml::export_file_name(&path.name, Utc::now().timestamp_millis()));

        if let Err(err) = tokio::fs::write(&file_path, &document).await {
            let _ = tokio::fs::remove_file(&file_path).await;
            return Err(DataManagerError::KmlIo(format!("failed to write {file_path:?}: {err}")));
        }

        tracing::info!("exported path {} to {:?}", path_id, file_path);
        Ok(file_path)
    }
}

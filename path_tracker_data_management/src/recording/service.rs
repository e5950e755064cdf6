use std::sync::{Arc, OnceLock};

use chrono::Utc;
use path_tracker_lib::{fix::Fix, path::Path};
use tokio::sync::{mpsc, oneshot};

use crate::{DataManager, DataManagerError};

use super::session::PathSession;

/// Source of position fixes. Subscribing yields the receiving end of a fix
/// stream, or fails with `PermissionDenied` when the platform refuses
/// location access. Dropping the receiver is the unsubscription; it is
/// idempotent and no fix sent afterwards is delivered.
pub trait LocationFeed: Send + 'static {
    fn subscribe(&mut self) -> Result<mpsc::Receiver<Fix>, DataManagerError>;
}

/// A feed fed from a plain channel, for fixes produced in-process.
pub struct ChannelFeed {
    receiver: Option<mpsc::Receiver<Fix>>,
}

impl ChannelFeed {
    pub fn new(capacity: usize) -> (mpsc::Sender<Fix>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, ChannelFeed { receiver: Some(receiver) })
    }
}

impl LocationFeed for ChannelFeed {
    fn subscribe(&mut self) -> Result<mpsc::Receiver<Fix>, DataManagerError> {
        // A channel feed is single-use; a second subscription has no fixes
        // to offer.
        self.receiver.take().ok_or(DataManagerError::PermissionDenied)
    }
}

enum Command {
    Stop {
        rating: f64,
        description: String,
        reply: oneshot::Sender<Result<Path, DataManagerError>>,
    },
}

/// Control handle for one live recording. There is one handle per recorded
/// path; dropping it without stopping ends the task and leaves the path
/// unfinished in the store.
#[derive(Debug)]
pub struct RecordingHandle {
    path_id: i64,
    command_tx: mpsc::Sender<Command>,
    finalized: Arc<OnceLock<Path>>,
}

impl RecordingHandle {
    pub fn path_id(&self) -> i64 {
        self.path_id
    }

    /// Stops the recording: unsubscribes from the feed, finalizes the path
    /// row (end time, distance, average speed, rating, description) and
    /// returns the completed path. Stopping an already stopped recording is
    /// a no-op that returns the same finalized path.
    pub async fn stop(&self, rating: f64, description: String) -> Result<Path, DataManagerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = Command::Stop { rating, description, reply: reply_tx };

        if self.command_tx.send(command).await.is_ok() {
            if let Ok(result) = reply_rx.await {
                return result;
            }
        }

        // The task is gone, so a previous stop already won.
        self.finalized
            .get()
            .cloned()
            .ok_or_else(|| DataManagerError::StoreWrite("recording ended before it was finalized".into()))
    }
}

impl DataManager {
    /// Starts a new recording: subscribes to the feed, creates the path row
    /// and spawns the task that appends every delivered fix to the store
    /// while folding it into the running distance.
    ///
    /// If the subscription is refused nothing is persisted.
    pub async fn start_recording(
        &self,
        name: String,
        description: String,
        mut feed: impl LocationFeed,
    ) -> Result<RecordingHandle, DataManagerError> {
        let fix_rx = feed.subscribe()?;

        let path = self.database.insert_path(name, description, Utc::now()).await?;
        tracing::info!("recording started for path {} ({})", path.path_id, path.name);

        let mut session = PathSession::new(path.path_id);
        session.start(path.start_time);

        let (command_tx, command_rx) = mpsc::channel(8);
        let finalized = Arc::new(OnceLock::new());

        let handle = RecordingHandle {
            path_id: path.path_id,
            command_tx,
            finalized: finalized.clone(),
        };

        let database = self.database.clone();
        tokio::spawn(async move {
            run_recording(database, path, session, fix_rx, command_rx, finalized).await;
        });

        Ok(handle)
    }
}

async fn run_recording(
    database: crate::database::PathDatabase,
    mut path: Path,
    mut session: PathSession,
    fix_rx: mpsc::Receiver<Fix>,
    mut command_rx: mpsc::Receiver<Command>,
    finalized: Arc<OnceLock<Path>>,
) {
    let mut fix_rx = Some(fix_rx);

    loop {
        tokio::select! {
            biased;

            command = command_rx.recv() => {
                let Some(Command::Stop { rating, description, reply }) = command else {
                    tracing::warn!("handle for path {} dropped without stop, recording abandoned", path.path_id);
                    break;
                };

                // Unsubscribe first; anything still queued in the feed is
                // discarded, not stored.
                drop(fix_rx.take());

                let end_time = Utc::now();
                let average_speed = session.stop(end_time).unwrap_or(0.0);

                path.end_time = Some(end_time);
                path.completed = true;
                path.rating = rating;
                path.description = description;
                path.total_distance = session.total_distance_km();
                path.average_speed = average_speed;

                let result = database.update_path(&path).await.map(|()| path.clone());
                match &result {
                    Ok(path) => {
                        tracing::info!(
                            "recording stopped for path {}: {:.2} km at {:.2} km/h",
                            path.path_id, path.total_distance, path.average_speed,
                        );
                        let _ = finalized.set(path.clone());
                    }
                    Err(err) => tracing::error!("failed to finalize path {}: {err}", path.path_id),
                }

                let _ = reply.send(result);
                break;
            }

            fix = recv_fix(&mut fix_rx) => {
                let Some(fix) = fix else {
                    // The feed dried up on its own. The session keeps
                    // recording until an explicit stop arrives.
                    tracing::debug!("location feed for path {} ended", path.path_id);
                    fix_rx = None;
                    continue;
                };

                let Some(total) = session.accept_fix(&fix) else { continue };

                if let Err(err) = database.insert_path_point(path.path_id, &fix).await {
                    // In-memory distance is not rolled back and may drift
                    // from what is persisted.
                    tracing::error!("failed to store fix for path {}: {err}", path.path_id);
                    continue;
                }

                path.total_distance = total;
                if let Err(err) = database.set_path_distance(path.path_id, total).await {
                    tracing::error!("failed to persist distance for path {}: {err}", path.path_id);
                }
            }
        }
    }
}

async fn recv_fix(fix_rx: &mut Option<mpsc::Receiver<Fix>>) -> Option<Fix> {
    match fix_rx {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataManager;

    struct DeniedFeed;

    impl LocationFeed for DeniedFeed {
        fn subscribe(&mut self) -> Result<mpsc::Receiver<Fix>, DataManagerError> {
            Err(DataManagerError::PermissionDenied)
        }
    }

    async fn test_manager(dir: &std::path::Path) -> DataManager {
        DataManager::start(dir).await.unwrap()
    }

    fn fix(lat: f64, lon: f64) -> Fix {
        Fix::new(lat, lon, 0.0, 5.0, Utc::now())
    }

    async fn wait_for_points(manager: &DataManager, path_id: i64, count: usize) {
        for _ in 0..200 {
            if manager.get_path_points(path_id).await.unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("points for path {path_id} never reached {count}");
    }

    #[tokio::test]
    async fn denied_feed_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(dir.path()).await;

        let err = manager
            .start_recording("walk".into(), "".into(), DeniedFeed)
            .await
            .unwrap_err();

        assert!(matches!(err, DataManagerError::PermissionDenied));
        assert!(manager.get_paths().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fixes_accumulate_into_points_and_distance() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(dir.path()).await;

        let (sender, feed) = ChannelFeed::new(16);
        let handle = manager
            .start_recording("equator stroll".into(), "".into(), feed)
            .await
            .unwrap();

        sender.send(fix(0.0, 0.0)).await.unwrap();
        sender.send(fix(0.0, 1.0)).await.unwrap();
        wait_for_points(&manager, handle.path_id(), 2).await;

        // the distance row update trails the point insert slightly
        let mut stored = manager.get_path(handle.path_id()).await.unwrap();
        for _ in 0..200 {
            if stored.total_distance > 100.0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            stored = manager.get_path(handle.path_id()).await.unwrap();
        }
        assert!((stored.total_distance - 111.19).abs() < 0.5, "got {}", stored.total_distance);

        let path = handle.stop(4.0, "flat".into()).await.unwrap();
        assert!(path.completed);
        assert!(path.end_time.is_some());
        assert_eq!(path.rating, 4.0);
        assert_eq!(path.description, "flat");
        assert!((path.total_distance - 111.19).abs() < 0.5);

        let reloaded = manager.get_path(handle.path_id()).await.unwrap();
        assert_eq!(reloaded, path);
    }

    #[tokio::test]
    async fn fixes_after_stop_are_never_stored() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(dir.path()).await;

        let (sender, feed) = ChannelFeed::new(16);
        let handle = manager
            .start_recording("walk".into(), "".into(), feed)
            .await
            .unwrap();

        sender.send(fix(56.0, 10.0)).await.unwrap();
        wait_for_points(&manager, handle.path_id(), 1).await;

        handle.stop(0.0, "".into()).await.unwrap();

        // The receiver is gone, so the feed cannot even deliver anymore.
        assert!(sender.send(fix(56.1, 10.0)).await.is_err());
        assert_eq!(manager.get_path_points(handle.path_id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn repeated_stop_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(dir.path()).await;

        let (_sender, feed) = ChannelFeed::new(16);
        let handle = manager
            .start_recording("walk".into(), "".into(), feed)
            .await
            .unwrap();

        let first = handle.stop(3.0, "done".into()).await.unwrap();
        let second = handle.stop(1.0, "again".into()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.rating, 3.0);
        assert_eq!(second.description, "done");
    }

    #[tokio::test]
    async fn zero_duration_recording_guards_average_speed() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(dir.path()).await;

        let (_sender, feed) = ChannelFeed::new(4);
        let handle = manager
            .start_recording("blink".into(), "".into(), feed)
            .await
            .unwrap();

        let path = handle.stop(0.0, "".into()).await.unwrap();
        assert!(path.average_speed.is_finite());
    }
}

use path_tracker_data_management::DataManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// CLI for manual data inspection
#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let data_manager = match DataManager::start(std::path::Path::new(&data_dir)).await {
        Ok(data_manager) => data_manager,
        Err(err) => {
            tracing::error!("failed to open data directory {data_dir}: {err}");
            std::process::exit(1);
        }
    };

    match data_manager.get_paths().await {
        Ok(paths) => {
            for path in paths {
                let status = if path.completed { "completed" } else { "active" };
                println!(
                    "#{} {} [{}] {:.2} km at {:.2} km/h",
                    path.path_id, path.name, status, path.total_distance, path.average_speed,
                );
            }
        }
        Err(err) => {
            tracing::error!("failed to list paths: {err}");
            std::process::exit(1);
        }
    }
}

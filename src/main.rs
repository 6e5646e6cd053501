use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use warehouse_layout::api::{self, Workspace};
use warehouse_layout::config::AppConfig;
use warehouse_layout::store::LayoutStore;

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = dotenv {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!(error = %err, "could not load .env");
        }
    }

    let app_config = AppConfig::from_env();
    let store = match LayoutStore::open(app_config.storage.path()) {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "could not open layout store");
            return ExitCode::FAILURE;
        }
    };

    info!(
        layouts = store.len(),
        current = %store.current().name,
        "warehouse layout service starting"
    );
    let workspace = Workspace::new(app_config.placement.placement_config(), store);

    if let Err(err) = api::start_api_server(app_config.api, workspace).await {
        error!(error = %err, "API server terminated with an error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

use std::error::Error;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use directory_server::config::ServerConfig;
use directory_server::store::Database;
use directory_server::transit::{Schedule, ScheduleIndex, TransitMatcher};
use directory_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env()?;
    let resource_types = config.load_resource_types()?;
    info!(count = resource_types.len(), "loaded resource types");

    let db = Database::open(&config.database_path)?;
    info!(path = %config.database_path.display(), "opened resource database");

    // A missing or corrupt schedule is fatal: there is no fallback dataset.
    let schedule = Schedule::load(&config.gtfs_dir)?;
    let index = ScheduleIndex::build(schedule);
    info!(
        stops = index.stop_count(),
        routes = index.route_count(),
        skipped = index.skipped_stops(),
        "indexed transit schedule"
    );
    let matcher = TransitMatcher::new(Arc::new(index));

    let state = AppState::new(db, matcher, resource_types, config.transit.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Resource directory listening on http://{}", config.bind_addr);
    info!("  GET   /health             - Health check");
    info!("  GET   /resources          - List resources");
    info!("  POST  /resources          - Create a resource");
    info!("  PATCH /resources/:id      - Update a resource");
    info!("  POST  /resources/dedup    - Merge duplicate resources");
    info!("  POST  /transit-routes     - Match transit routes");

    axum::serve(listener, app).await?;
    Ok(())
}

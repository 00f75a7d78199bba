//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::dedup::{DedupError, DedupReport, Deduplicator};
use crate::domain::{
    Coordinate, DomainError, NewResource, ResourceId, ResourceType, ResourceUpdate,
};
use crate::store::{Database, ResourceStore, StoreError};
use crate::transit::{TransitOption, rank_options};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/resource-types", get(list_resource_types))
        .route("/resources", get(list_resources).post(create_resource))
        .route("/resources/dedup", post(run_dedup))
        .route("/resources/:id", get(get_resource).patch(update_resource))
        .route("/transit-routes", post(transit_routes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Run blocking database work with exclusive access to the connection.
async fn with_db<T, F>(state: &AppState, work: F) -> Result<T, AppError>
where
    F: FnOnce(&mut Database) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let mut db = state.db.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || work(&mut *db))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("database task failed: {e}"),
        })?
}

/// The provider category catalog.
async fn list_resource_types(State(state): State<AppState>) -> Json<Vec<ResourceType>> {
    Json(state.resource_types.iter().collect())
}

/// All resources, ordered by id.
async fn list_resources(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResourceResponse>>, AppError> {
    let resources = with_db(&state, |db| Ok(db.conn().fetch_all_resources()?)).await?;
    let types = &state.resource_types;
    Ok(Json(
        resources
            .into_iter()
            .map(|r| ResourceResponse::new(r, types))
            .collect(),
    ))
}

async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ResourceResponse>, AppError> {
    let id = ResourceId::new(id).map_err(DomainError::from)?;
    let resource = with_db(&state, move |db| Ok(db.conn().fetch_resource(id)?)).await?;
    Ok(Json(ResourceResponse::new(resource, &state.resource_types)))
}

/// Create a resource. Responds 201 with the stored record.
async fn create_resource(
    State(state): State<AppState>,
    Json(new): Json<NewResource>,
) -> Result<(StatusCode, Json<ResourceResponse>), AppError> {
    new.validate()?;
    state.resource_types.validate(new.resource_type_id)?;

    let resource = with_db(&state, move |db| {
        let conn = db.conn();
        let id = conn.insert_resource(&new, Utc::now())?;
        Ok(conn.fetch_resource(id)?)
    })
    .await?;
    info!(id = %resource.id, name = %resource.name, "created resource");

    Ok((
        StatusCode::CREATED,
        Json(ResourceResponse::new(resource, &state.resource_types)),
    ))
}

/// Apply a partial edit. The name is not editable.
async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<ResourceUpdate>,
) -> Result<Json<ResourceResponse>, AppError> {
    let id = ResourceId::new(id).map_err(DomainError::from)?;
    update.validate()?;
    state.resource_types.validate(update.resource_type_id)?;

    let resource = with_db(&state, move |db| {
        Ok(db.conn().update_resource(id, &update, Utc::now())?)
    })
    .await?;
    Ok(Json(ResourceResponse::new(resource, &state.resource_types)))
}

/// Merge duplicate resources in a single transaction.
async fn run_dedup(State(state): State<AppState>) -> Result<Json<DedupReport>, AppError> {
    let report = with_db(&state, |db| Ok(Deduplicator::new().run(db)?)).await?;
    Ok(Json(report))
}

/// Routes serving stops near both the start point and the resource.
async fn transit_routes(
    State(state): State<AppState>,
    Json(req): Json<TransitRoutesRequest>,
) -> Result<Json<Vec<TransitOption>>, AppError> {
    let start = Coordinate::new(req.start_lat, req.start_lon).map_err(DomainError::from)?;
    let resource =
        Coordinate::new(req.resource_lat, req.resource_lon).map_err(DomainError::from)?;
    let max_walk = state.transit.walk_radius(req.max_walk_miles);

    let options = state.matcher.find_transit_routes(
        start.lat(),
        start.lon(),
        resource.lat(),
        resource.lon(),
        max_walk,
    );
    let mut options = rank_options(options);
    options.truncate(state.transit.max_results);
    Ok(Json(options))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        if e.is_not_found() {
            AppError::NotFound {
                message: e.to_string(),
            }
        } else {
            AppError::Internal {
                message: e.to_string(),
            }
        }
    }
}

impl From<DedupError> for AppError {
    fn from(e: DedupError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

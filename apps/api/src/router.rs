use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use scheduling_cell::router::scheduling_routes;
use scheduling_cell::services::directory::StaticProviderDirectory;
use scheduling_cell::SchedulingCell;

#[derive(Debug, Deserialize)]
struct RegisterProviderRequest {
    id: Uuid,
    #[serde(default = "default_schedulable")]
    schedulable: bool,
}

fn default_schedulable() -> bool {
    true
}

/// Stand-in for the external user-management service: lets deployments
/// seed the provider directory over HTTP.
async fn register_provider(
    State(directory): State<Arc<StaticProviderDirectory>>,
    Json(request): Json<RegisterProviderRequest>,
) -> Json<Value> {
    directory.register(request.id, request.schedulable).await;
    Json(json!({ "success": true }))
}

pub fn create_router(cell: Arc<SchedulingCell>, directory: Arc<StaticProviderDirectory>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .route("/providers", post(register_provider).with_state(directory))
        .nest("/schedule", scheduling_routes(cell))
}

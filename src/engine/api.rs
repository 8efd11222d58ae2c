//! Roster API Module
//! Registration REST API with OpenAPI documentation

use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::engine::registry::{RegistrationRequest, Registry, RegistryError};

#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<Registry>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        submit_registration,
        query_registrations,
    ),
    tags(
        (name = "registrations", description = "Student registration and topic availability"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/registrations",
            post(submit_registration).get(query_registrations),
        )
        .route("/api/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
    #[serde(default)]
    pub selected_topic: String,
    #[serde(default)]
    pub matricule: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub github_username: String,
}

/// Every outcome is an HTTP 200 with a result envelope; validation failures
/// are data, not transport errors.
fn error_body(message: String) -> Json<Value> {
    Json(json!({ "result": "error", "message": message }))
}

#[utoipa::path(
    post,
    path = "/api/registrations",
    request_body = Value,
    responses(
        (status = 200, description = "Registration outcome envelope", body = Value)
    ),
    tag = "registrations"
)]
async fn submit_registration(
    State(state): State<ApiState>,
    Json(body): Json<SubmitBody>,
) -> Json<Value> {
    let request = RegistrationRequest {
        selected_topic: body.selected_topic,
        matricule: body.matricule,
        email: body.email,
        full_name: body.full_name,
        github_username: body.github_username,
    };

    match state.registry.register(request).await {
        Ok(assignment) => Json(json!({
            "result": "success",
            "message": format!(
                "Registered! You are in {}, Team {}, assigned to: {}",
                assignment.topic, assignment.team_number, assignment.sub_project
            ),
            "topic": assignment.topic,
            "team": assignment.team_number,
            "project": assignment.sub_project,
        })),
        Err(e) => {
            if let RegistryError::Store(ref inner) = e {
                tracing::error!(error = %inner, "registration storage failure");
            }
            error_body(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub action: Option<String>,
    pub matricule: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/registrations",
    params(
        ("action" = Option<String>, Query, description = "checkStatus for a per-student lookup"),
        ("matricule" = Option<String>, Query, description = "Matricule to look up"),
    ),
    responses(
        (status = 200, description = "Topic availability map, or a student status", body = Value)
    ),
    tag = "registrations"
)]
async fn query_registrations(
    State(state): State<ApiState>,
    Query(params): Query<QueryParams>,
) -> Json<Value> {
    if params.action.as_deref() == Some("checkStatus") {
        let matricule = params.matricule.unwrap_or_default();
        return match state.registry.status(&matricule) {
            Ok(status) => Json(json!(status)),
            Err(e) => error_body(e.to_string()),
        };
    }

    match state.registry.availability() {
        Ok(availability) => Json(json!(availability)),
        Err(e) => error_body(e.to_string()),
    }
}

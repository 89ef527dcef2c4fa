use crate::infra::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use caseflow::error::AppError;
use caseflow::matching::{
    Assignment, AssignmentEvent, AssignmentNotifier, AssignmentRepository, AssignmentService,
    Case, CaseId, LawyerId, MatchOutcome, MatchRequest, Reassignment,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

type SharedService<R, N> = Arc<AssignmentService<R, N>>;

#[derive(Debug, Deserialize)]
pub(crate) struct LawyerAction {
    pub(crate) lawyer_id: LawyerId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectionRequest {
    pub(crate) lawyer_id: LawyerId,
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

pub(crate) fn case_router<R, N>(service: SharedService<R, N>) -> Router
where
    R: AssignmentRepository + 'static,
    N: AssignmentNotifier + 'static,
{
    Router::new()
        .route("/api/v1/cases", post(register_case::<R, N>))
        .route("/api/v1/cases/:case_id", get(fetch_case::<R, N>))
        .route("/api/v1/cases/:case_id/match", post(match_case::<R, N>))
        .route(
            "/api/v1/cases/:case_id/assignments",
            post(assign_case::<R, N>),
        )
        .route(
            "/api/v1/cases/:case_id/rejections",
            post(reject_case::<R, N>),
        )
        .route(
            "/api/v1/cases/:case_id/acceptances",
            post(accept_case::<R, N>),
        )
        .route("/api/v1/cases/:case_id/events", get(case_events::<R, N>))
        .with_state(service)
}

pub(crate) fn with_case_routes<R, N>(service: SharedService<R, N>) -> Router
where
    R: AssignmentRepository + 'static,
    N: AssignmentNotifier + 'static,
{
    case_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "initializing")
    };

    (status, Json(json!({ "status": label })))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn register_case<R, N>(
    State(service): State<SharedService<R, N>>,
    Json(case): Json<Case>,
) -> Result<(StatusCode, Json<Case>), AppError>
where
    R: AssignmentRepository + 'static,
    N: AssignmentNotifier + 'static,
{
    let stored = service.register_case(case)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn fetch_case<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(case_id): Path<String>,
) -> Result<Json<Case>, AppError>
where
    R: AssignmentRepository + 'static,
    N: AssignmentNotifier + 'static,
{
    Ok(Json(service.get_case(&CaseId(case_id))?))
}

async fn match_case<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(case_id): Path<String>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchOutcome>, AppError>
where
    R: AssignmentRepository + 'static,
    N: AssignmentNotifier + 'static,
{
    Ok(Json(service.match_case(&CaseId(case_id), request)?))
}

async fn assign_case<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(case_id): Path<String>,
    Json(action): Json<LawyerAction>,
) -> Result<(StatusCode, Json<Assignment>), AppError>
where
    R: AssignmentRepository + 'static,
    N: AssignmentNotifier + 'static,
{
    let assignment = service.assign(&CaseId(case_id), &action.lawyer_id)?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn reject_case<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(case_id): Path<String>,
    Json(request): Json<RejectionRequest>,
) -> Result<Json<Reassignment>, AppError>
where
    R: AssignmentRepository + 'static,
    N: AssignmentNotifier + 'static,
{
    let reassignment = service.reject(&CaseId(case_id), &request.lawyer_id, request.reason)?;
    Ok(Json(reassignment))
}

async fn accept_case<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(case_id): Path<String>,
    Json(action): Json<LawyerAction>,
) -> Result<Json<Case>, AppError>
where
    R: AssignmentRepository + 'static,
    N: AssignmentNotifier + 'static,
{
    Ok(Json(service.accept(&CaseId(case_id), &action.lawyer_id)?))
}

async fn case_events<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<AssignmentEvent>>, AppError>
where
    R: AssignmentRepository + 'static,
    N: AssignmentNotifier + 'static,
{
    Ok(Json(service.events(&CaseId(case_id))?))
}

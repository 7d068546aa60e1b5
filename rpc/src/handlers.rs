//! Route handlers.
//!
//! Each handler authenticates the caller from headers, runs the synchronous
//! service call on the blocking pool and maps the result onto JSON.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use vetting_types::{RequestId, UserId, VerificationRequest};
use vetting_verification::{
    Page, ReviewDecision, ReviewError, StatusSnapshot, SubmittedDocuments, VerificationError,
    VerificationService,
};

use crate::error::RpcError;
use crate::identity::Caller;
use crate::pagination::ListParams;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    pub documents: SubmittedDocuments,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Run a service call off the async executor. Store operations are short
/// but synchronous.
async fn blocking<T, F>(service: &Arc<VerificationService>, f: F) -> Result<T, RpcError>
where
    T: Send + 'static,
    F: FnOnce(&VerificationService) -> Result<T, VerificationError> + Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| RpcError::Server(format!("service task failed: {e}")))?
        .map_err(RpcError::from)
}

fn parse_user(raw: &str) -> Result<UserId, RpcError> {
    UserId::parse(raw).map_err(|e| RpcError::InvalidRequest(e.to_string()))
}

fn outcome_label(result: &Result<impl Sized, RpcError>, ok: &'static str) -> &'static str {
    match result {
        Ok(_) => ok,
        Err(e) => e.error_code(),
    }
}

pub async fn submit(
    State(state): State<AppState>,
    Caller(actor): Caller,
    body: Result<Json<SubmitBody>, JsonRejection>,
) -> Result<(StatusCode, Json<VerificationRequest>), RpcError> {
    let Json(body) = body.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let result = blocking(&state.service, move |svc| svc.submit(&actor, body.documents)).await;

    if let Some(metrics) = &state.metrics {
        metrics.record_submission(outcome_label(&result, "accepted"));
    }
    Ok((StatusCode::CREATED, Json(result?)))
}

/// Status of the calling user.
pub async fn own_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<StatusSnapshot>, RpcError> {
    status_for(state, actor.id).await
}

/// Status of any user. Users may only read their own; reviewers read all.
pub async fn status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(user_id): Path<String>,
) -> Result<Json<StatusSnapshot>, RpcError> {
    let user = parse_user(&user_id)?;
    if !actor.can_view(&user) {
        return Err(VerificationError::from(ReviewError::Unauthorized(actor.role)).into());
    }
    status_for(state, user).await
}

async fn status_for(state: AppState, user: UserId) -> Result<Json<StatusSnapshot>, RpcError> {
    let snapshot = blocking(&state.service, move |svc| svc.status_of(&user)).await?;
    if let Some(metrics) = &state.metrics {
        metrics.status_queries.inc();
    }
    Ok(Json(snapshot))
}

pub async fn history(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<VerificationRequest>>, RpcError> {
    let user = parse_user(&user_id)?;
    let requests = blocking(&state.service, move |svc| svc.history(&actor, &user)).await?;
    Ok(Json(requests))
}

pub async fn list_requests(
    State(state): State<AppState>,
    Caller(actor): Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<VerificationRequest>>, RpcError> {
    let Query(params) = params.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let query = params.into_query()?;
    let page = blocking(&state.service, move |svc| svc.list(&actor, &query)).await?;
    if let Some(metrics) = &state.metrics {
        metrics.queue_listings.inc();
    }
    Ok(Json(page))
}

pub async fn get_request(
    State(state): State<AppState>,
    Caller(actor): Caller,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<VerificationRequest>, RpcError> {
    let id = request_id(id)?;
    let request = blocking(&state.service, move |svc| svc.get(&actor, RequestId::new(id))).await?;
    Ok(Json(request))
}

pub async fn review(
    State(state): State<AppState>,
    Caller(actor): Caller,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<ReviewBody>, JsonRejection>,
) -> Result<Json<VerificationRequest>, RpcError> {
    let id = request_id(id)?;
    let Json(body) = body.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let result = blocking(&state.service, move |svc| {
        svc.review(&actor, RequestId::new(id), body.decision, body.reason)
    })
    .await
    .map(|outcome| outcome.request);

    if let Some(metrics) = &state.metrics {
        let label = match &result {
            Ok(request) => request.status.as_str(),
            Err(e) => e.error_code(),
        };
        metrics.record_review(label);
    }
    Ok(Json(result?))
}

fn request_id(id: Result<Path<u64>, PathRejection>) -> Result<u64, RpcError> {
    let Path(id) = id.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    Ok(id)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, RpcError> {
    let metrics = state.metrics.as_ref().ok_or(RpcError::MetricsDisabled)?;
    let body = metrics
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

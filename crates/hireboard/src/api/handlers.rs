use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use super::{Hireboard, SessionUser};
use crate::auth::{LoginRequest, Session, SignupRequest, TenantContext};
use crate::error::ApiError;
use crate::recruiting::{
    CandidateFilter, CandidatePayload, DashboardSummary, JobFilter, JobPayload,
};
use crate::store::Store;

type AppState<S> = State<Arc<Hireboard<S>>>;

/// Runs store-backed work on the blocking pool. Both store backends take a mutex and
/// the SQLite backend does file I/O, so none of it may run on an async worker.
pub(super) async fn blocking<S, T, F>(app: &Arc<Hireboard<S>>, work: F) -> Result<T, ApiError>
where
    S: Store + 'static,
    T: Send + 'static,
    F: FnOnce(&Hireboard<S>) -> Result<T, ApiError> + Send + 'static,
{
    let app = Arc::clone(app);
    tokio::task::spawn_blocking(move || work(&app))
        .await
        .map_err(ApiError::unexpected)?
}

fn session_response<S>(
    app: &Hireboard<S>,
    status: StatusCode,
    message: &str,
    session: Session,
) -> Response {
    let cookie = app.cookie.issue(&session.token);
    let body = Json(json!({
        "success": true,
        "message": message,
        "user": session.user,
    }));
    (status, [(SET_COOKIE, cookie)], body).into_response()
}

pub(crate) async fn signup<S>(
    State(app): AppState<S>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let Json(request) = payload?;
    let session = blocking(&app, move |app| app.gate().signup(request)).await?;

    Ok(session_response(
        &app,
        StatusCode::CREATED,
        "Account created successfully",
        session,
    ))
}

pub(crate) async fn login<S>(
    State(app): AppState<S>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let Json(request) = payload?;
    let session = blocking(&app, move |app| app.gate().login(request)).await?;

    Ok(session_response(
        &app,
        StatusCode::OK,
        "Logged in successfully",
        session,
    ))
}

/// Always succeeds; the cookie is cleared whether or not a session was present.
pub(crate) async fn logout<S>(State(app): AppState<S>) -> Response
where
    S: Store + 'static,
{
    let body = Json(json!({
        "success": true,
        "message": "Logged out successfully",
    }));
    (StatusCode::OK, [(SET_COOKIE, app.cookie.clear())], body).into_response()
}

pub(crate) async fn me<S>(
    State(app): AppState<S>,
    SessionUser(user_id): SessionUser,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let (user, company) = blocking(&app, move |app| app.gate().profile(user_id)).await?;
    Ok(Json(json!({ "user": user, "company": company })).into_response())
}

pub(crate) async fn list_jobs<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
    query: Result<Query<JobFilter>, QueryRejection>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let Query(filter) = query?;
    let jobs = blocking(&app, move |app| app.jobs().list(tenant, filter)).await?;
    Ok(Json(json!({ "jobs": jobs })).into_response())
}

pub(crate) async fn create_job<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
    payload: Result<Json<JobPayload>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let Json(payload) = payload?;
    let job = blocking(&app, move |app| app.jobs().create(tenant, payload)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))).into_response())
}

pub(crate) async fn get_job<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let job = blocking(&app, move |app| app.jobs().get(tenant, &id)).await?;
    Ok(Json(json!({ "job": job })).into_response())
}

pub(crate) async fn update_job<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
    Path(id): Path<String>,
    payload: Result<Json<JobPayload>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let Json(payload) = payload?;
    let job = blocking(&app, move |app| app.jobs().update(tenant, &id, payload)).await?;
    Ok(Json(json!({ "job": job })).into_response())
}

pub(crate) async fn delete_job<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let report = blocking(&app, move |app| app.jobs().delete(tenant, &id)).await?;
    Ok(Json(json!({
        "message": "Job deleted successfully",
        "deleted": report,
    }))
    .into_response())
}

pub(crate) async fn list_candidates<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
    query: Result<Query<CandidateFilter>, QueryRejection>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let Query(filter) = query?;
    let candidates = blocking(&app, move |app| app.candidates().list(tenant, filter)).await?;
    Ok(Json(json!({ "candidates": candidates })).into_response())
}

pub(crate) async fn create_candidate<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
    payload: Result<Json<CandidatePayload>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let Json(payload) = payload?;
    let candidate = blocking(&app, move |app| app.candidates().create(tenant, payload)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "candidate": candidate }))).into_response())
}

pub(crate) async fn get_candidate<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let candidate = blocking(&app, move |app| app.candidates().get(tenant, &id)).await?;
    Ok(Json(json!({ "candidate": candidate })).into_response())
}

pub(crate) async fn update_candidate<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
    Path(id): Path<String>,
    payload: Result<Json<CandidatePayload>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let Json(payload) = payload?;
    let candidate = blocking(&app, move |app| {
        app.candidates().update(tenant, &id, payload)
    })
    .await?;
    Ok(Json(json!({ "candidate": candidate })).into_response())
}

pub(crate) async fn delete_candidate<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let report = blocking(&app, move |app| app.candidates().delete(tenant, &id)).await?;
    Ok(Json(json!({
        "message": "Candidate deleted successfully",
        "deleted": report,
    }))
    .into_response())
}

pub(crate) async fn dashboard<S>(
    State(app): AppState<S>,
    tenant: TenantContext,
) -> Result<Response, ApiError>
where
    S: Store + 'static,
{
    let summary = blocking(&app, move |app| {
        DashboardSummary::for_tenant(app.store().as_ref(), tenant)
    })
    .await?;
    Ok(Json(summary).into_response())
}

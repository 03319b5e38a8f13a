//! HTTP surface: shared state, the session extractors, and the `/api` router.

mod extract;
mod handlers;

pub use extract::SessionUser;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::auth::{AccessGate, PasswordHasher, SessionCookie, SessionTokens};
use crate::config::AuthConfig;
use crate::error::AppError;
use crate::pipeline::PipelinePolicy;
use crate::recruiting::{CandidateService, JobService};
use crate::store::Store;

/// Everything a request handler needs, built once at startup.
pub struct Hireboard<S> {
    store: Arc<S>,
    gate: AccessGate<S>,
    jobs: JobService<S>,
    candidates: CandidateService<S>,
    cookie: SessionCookie,
}

impl<S> Hireboard<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>, auth: &AuthConfig, policy: PipelinePolicy) -> Result<Self, AppError> {
        let hasher = PasswordHasher::new(auth.password)?;
        let tokens = SessionTokens::new(auth.jwt_secret.as_bytes(), auth.session_ttl());
        let gate = AccessGate::new(Arc::clone(&store), hasher, tokens)?;

        Ok(Self {
            gate,
            jobs: JobService::new(Arc::clone(&store)),
            candidates: CandidateService::new(Arc::clone(&store), policy),
            cookie: SessionCookie::new(auth.secure_cookies, auth.session_ttl()),
            store,
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn gate(&self) -> &AccessGate<S> {
        &self.gate
    }

    pub fn jobs(&self) -> &JobService<S> {
        &self.jobs
    }

    pub fn candidates(&self) -> &CandidateService<S> {
        &self.candidates
    }
}

/// Router builder for the authentication and tenant-scoped endpoints.
pub fn hireboard_router<S>(app: Arc<Hireboard<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route("/api/auth/signup", post(handlers::signup::<S>))
        .route("/api/auth/login", post(handlers::login::<S>))
        .route("/api/auth/logout", post(handlers::logout::<S>))
        .route("/api/auth/me", get(handlers::me::<S>))
        .route(
            "/api/jobs",
            get(handlers::list_jobs::<S>).post(handlers::create_job::<S>),
        )
        .route(
            "/api/jobs/:id",
            get(handlers::get_job::<S>)
                .put(handlers::update_job::<S>)
                .delete(handlers::delete_job::<S>),
        )
        .route(
            "/api/candidates",
            get(handlers::list_candidates::<S>).post(handlers::create_candidate::<S>),
        )
        .route(
            "/api/candidates/:id",
            get(handlers::get_candidate::<S>)
                .put(handlers::update_candidate::<S>)
                .delete(handlers::delete_candidate::<S>),
        )
        .route("/api/dashboard", get(handlers::dashboard::<S>))
        .with_state(app)
}

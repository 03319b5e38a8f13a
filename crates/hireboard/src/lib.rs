//! Multi-tenant applicant tracking core.
//!
//! Recruiters sign up together with the company they own, authenticate with a signed
//! session cookie, and manage job postings and candidates that never leave their
//! company's boundary. The HTTP surface lives in [`api`]; everything below it is plain
//! synchronous code over the [`store::Store`] trait.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod recruiting;
pub mod store;
pub mod telemetry;

pub use api::{hireboard_router, Hireboard};
pub use error::{ApiError, AppError};

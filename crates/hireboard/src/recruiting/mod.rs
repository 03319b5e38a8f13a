//! Tenant-scoped jobs and candidates.
//!
//! Every operation takes a [`TenantContext`](crate::auth::TenantContext) and checks
//! ownership before reading or writing. A record owned by another company is reported
//! exactly like a record that does not exist.

mod candidates;
mod dashboard;
pub mod input;
mod jobs;
mod views;

pub use candidates::CandidateService;
pub use dashboard::{DashboardSummary, JobStatusCounts};
pub use input::{CandidateFilter, CandidatePayload, Field, JobFilter, JobPayload};
pub use jobs::JobService;
pub use views::{CandidateDetail, CandidateView, JobSummary, JobView};

//! Records owned by a company, plus the account records that establish ownership.

pub mod account;
pub mod activity;
pub mod candidate;
mod ids;
pub mod job;

pub use account::{Company, Role, User, UserProfile, UserSummary};
pub use activity::{
    Application, ApplicationStatus, CandidateActivity, Feedback, Interview, InterviewKind,
};
pub use candidate::{normalize_email, Candidate, Rating};
pub use ids::{ApplicationId, CandidateId, CompanyId, FeedbackId, InterviewId, JobId, UserId};
pub use job::{classify_job_type, Job, JobStatus, JobType, DEFAULT_EMPLOYMENT_TYPE};

//! Durable storage boundary.
//!
//! One trait covers credentials and tenant-scoped records so that the two operations
//! needing atomicity, account creation and cascade deletion, each run inside a single
//! backend transaction. The store knows nothing about sessions; tenant checks happen in
//! [`crate::recruiting`] before any call that could reveal another company's data.

pub mod memory;
pub mod sqlite;


pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::domain::{
    Application, Candidate, CandidateActivity, CandidateId, Company, CompanyId, Feedback,
    Interview, Job, JobId, Role, User, UserId,
};

/// Columns carrying a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    UserEmail,
    CandidateEmail,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::UserEmail => f.write_str("user email"),
            UniqueField::CandidateEmail => f.write_str("candidate email"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0}")]
    Conflict(UniqueField),
    #[error("record not found")]
    NotFound,
    /// A candidate's `job_id` names a job that is absent or owned by another company.
    #[error("referenced job not found in company")]
    UnknownJob,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A user and the company they own, written together or not at all.
#[derive(Debug, Clone)]
pub struct NewAccount {
    user: User,
    company: Company,
}

impl NewAccount {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        company_name: String,
        now: DateTime<Utc>,
    ) -> Self {
        let user_id = UserId::new();
        let company_id = CompanyId::new();

        Self {
            user: User {
                id: user_id,
                email,
                password_hash,
                first_name,
                last_name,
                role: Role::Recruiter,
                owned_company_id: Some(company_id),
                created_at: now,
            },
            company: Company {
                id: company_id,
                name: company_name,
                owner_id: user_id,
                created_at: now,
            },
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn company(&self) -> &Company {
        &self.company
    }

    pub fn into_parts(self) -> (User, Company) {
        (self.user, self.company)
    }
}

/// One step of a cascade, applied in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStep {
    ApplicationsForJob(JobId),
    InterviewsForJob(JobId),
    DetachCandidatesFromJob(JobId),
    Job(JobId),
    FeedbackForCandidate(CandidateId),
    InterviewsForCandidate(CandidateId),
    ApplicationsForCandidate(CandidateId),
    Candidate(CandidateId),
}

/// Ordered deletion, dependents before their parent. The final step removes the target;
/// if the target is already gone the whole plan is rolled back with
/// [`StoreError::NotFound`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    steps: Vec<DeletionStep>,
}

impl DeletionPlan {
    /// Removes the job's applications and interviews and unlinks its candidates.
    /// Candidates themselves stay with the company.
    pub fn for_job(id: JobId) -> Self {
        Self {
            steps: vec![
                DeletionStep::ApplicationsForJob(id),
                DeletionStep::InterviewsForJob(id),
                DeletionStep::DetachCandidatesFromJob(id),
                DeletionStep::Job(id),
            ],
        }
    }

    pub fn for_candidate(id: CandidateId) -> Self {
        Self {
            steps: vec![
                DeletionStep::FeedbackForCandidate(id),
                DeletionStep::InterviewsForCandidate(id),
                DeletionStep::ApplicationsForCandidate(id),
                DeletionStep::Candidate(id),
            ],
        }
    }

    pub fn steps(&self) -> &[DeletionStep] {
        &self.steps
    }
}

/// Rows touched by an executed plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub applications: usize,
    pub interviews: usize,
    pub feedback: usize,
    pub detached_candidates: usize,
}

impl DeletionReport {
    pub(crate) fn record(&mut self, step: DeletionStep, affected: usize) {
        match step {
            DeletionStep::ApplicationsForJob(_) | DeletionStep::ApplicationsForCandidate(_) => {
                self.applications += affected
            }
            DeletionStep::InterviewsForJob(_) | DeletionStep::InterviewsForCandidate(_) => {
                self.interviews += affected
            }
            DeletionStep::FeedbackForCandidate(_) => self.feedback += affected,
            DeletionStep::DetachCandidatesFromJob(_) => self.detached_candidates += affected,
            DeletionStep::Job(_) | DeletionStep::Candidate(_) => {}
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub applications: usize,
    pub candidates: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CandidateCounts {
    pub applications: usize,
    pub interviews: usize,
}

/// Storage abstraction shared by the memory and SQLite backends.
///
/// Uniqueness is enforced here at write time, so two racing inserts with the same email
/// produce one success and one [`StoreError::Conflict`]. Listing methods return
/// newest-first.
pub trait Store: Send + Sync {
    fn create_account(&self, account: NewAccount) -> Result<(), StoreError>;
    fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    fn company_owned_by(&self, owner: UserId) -> Result<Option<Company>, StoreError>;

    fn insert_job(&self, job: Job) -> Result<(), StoreError>;
    fn job(&self, id: JobId) -> Result<Option<Job>, StoreError>;
    fn jobs_for_company(&self, company: CompanyId) -> Result<Vec<Job>, StoreError>;
    fn update_job(&self, job: Job) -> Result<(), StoreError>;
    fn job_counts(&self, id: JobId) -> Result<JobCounts, StoreError>;

    fn insert_candidate(&self, candidate: Candidate) -> Result<(), StoreError>;
    fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError>;
    fn candidates_for_company(&self, company: CompanyId) -> Result<Vec<Candidate>, StoreError>;
    fn update_candidate(&self, candidate: Candidate) -> Result<(), StoreError>;
    fn candidate_counts(&self, id: CandidateId) -> Result<CandidateCounts, StoreError>;
    fn candidate_activity(&self, id: CandidateId) -> Result<CandidateActivity, StoreError>;

    /// Rejects with [`StoreError::NotFound`] unless candidate and job exist in the
    /// application's company.
    fn insert_application(&self, application: Application) -> Result<(), StoreError>;
    fn insert_interview(&self, interview: Interview) -> Result<(), StoreError>;
    fn insert_feedback(&self, feedback: Feedback) -> Result<(), StoreError>;
    fn applications_for_job(&self, job: JobId) -> Result<Vec<Application>, StoreError>;

    fn execute_deletion(&self, plan: &DeletionPlan) -> Result<DeletionReport, StoreError>;
}

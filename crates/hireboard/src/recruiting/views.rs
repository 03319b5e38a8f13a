use serde::Serialize;

use crate::domain::{Candidate, CandidateActivity, Job, JobId, JobStatus, JobType, UserSummary};
use crate::store::{CandidateCounts, JobCounts};

/// Job as returned by the jobs endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    #[serde(flatten)]
    pub job: Job,
    pub posted_by: Option<UserSummary>,
    #[serde(rename = "_count")]
    pub counts: JobCounts,
}

/// Compact job reference embedded in candidate views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub department: String,
    pub location: String,
    pub job_type: JobType,
    pub status: JobStatus,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            department: job.department.clone(),
            location: job.location.clone(),
            job_type: job.job_type,
            status: job.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub job: Option<JobSummary>,
    #[serde(rename = "_count")]
    pub counts: CandidateCounts,
}

/// Single-candidate read with its dependent records.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateDetail {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub job: Option<JobSummary>,
    #[serde(flatten)]
    pub activity: CandidateActivity,
}

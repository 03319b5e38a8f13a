//! Dependent records hanging off candidates. Read-mostly here: they are written by
//! seeding and imports and removed only through cascade plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candidate::Rating;
use super::ids::{ApplicationId, CandidateId, CompanyId, FeedbackId, InterviewId, JobId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Applied,
    Reviewing,
    Offered,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "APPLIED",
            ApplicationStatus::Reviewing => "REVIEWING",
            ApplicationStatus::Offered => "OFFERED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "APPLIED" => Some(ApplicationStatus::Applied),
            "REVIEWING" => Some(ApplicationStatus::Reviewing),
            "OFFERED" => Some(ApplicationStatus::Offered),
            "REJECTED" => Some(ApplicationStatus::Rejected),
            "WITHDRAWN" => Some(ApplicationStatus::Withdrawn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub company_id: CompanyId,
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewKind {
    Phone,
    Video,
    Onsite,
    Technical,
}

impl InterviewKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            InterviewKind::Phone => "PHONE",
            InterviewKind::Video => "VIDEO",
            InterviewKind::Onsite => "ONSITE",
            InterviewKind::Technical => "TECHNICAL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PHONE" => Some(InterviewKind::Phone),
            "VIDEO" => Some(InterviewKind::Video),
            "ONSITE" => Some(InterviewKind::Onsite),
            "TECHNICAL" => Some(InterviewKind::Technical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: InterviewId,
    pub company_id: CompanyId,
    pub candidate_id: CandidateId,
    pub job_id: Option<JobId>,
    pub kind: InterviewKind,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: FeedbackId,
    pub company_id: CompanyId,
    pub candidate_id: CandidateId,
    pub author_id: UserId,
    pub rating: Option<Rating>,
    pub comments: String,
    pub created_at: DateTime<Utc>,
}

/// Everything attached to one candidate, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateActivity {
    pub applications: Vec<Application>,
    pub interviews: Vec<Interview>,
    pub feedback: Vec<Feedback>,
}

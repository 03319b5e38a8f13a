use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ids::{CompanyId, JobId, UserId};

pub const DEFAULT_EMPLOYMENT_TYPE: &str = "Full-time";

/// Publication lifecycle of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Active,
    Closed,
    Draft,
}

impl JobStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            JobStatus::Active => "ACTIVE",
            JobStatus::Closed => "CLOSED",
            JobStatus::Draft => "DRAFT",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(JobStatus::Active),
            "CLOSED" => Ok(JobStatus::Closed),
            "DRAFT" => Ok(JobStatus::Draft),
            _ => Err(format!(
                "Invalid status '{}'. Expected one of: ACTIVE, CLOSED, DRAFT",
                value.trim()
            )),
        }
    }
}

/// Closed classification derived from the free-text employment type and location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Remote,
}

impl JobType {
    pub const fn as_str(self) -> &'static str {
        match self {
            JobType::FullTime => "FULL_TIME",
            JobType::PartTime => "PART_TIME",
            JobType::Contract => "CONTRACT",
            JobType::Remote => "REMOTE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FULL_TIME" => Some(JobType::FullTime),
            "PART_TIME" => Some(JobType::PartTime),
            "CONTRACT" => Some(JobType::Contract),
            "REMOTE" => Some(JobType::Remote),
            _ => None,
        }
    }
}

/// Ordered rules: explicit part-time, explicit contract, remote location, full-time.
///
/// Evaluated on every write, so editing only the location can reclassify a posting.
pub fn classify_job_type(employment_type: &str, location: &str) -> JobType {
    match employment_type.trim() {
        "Part-time" => JobType::PartTime,
        "Contract" => JobType::Contract,
        _ if location.to_lowercase().contains("remote") => JobType::Remote,
        _ => JobType::FullTime,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub company_id: CompanyId,
    pub posted_by_id: UserId,
    pub title: String,
    pub department: String,
    pub location: String,
    pub description: String,
    pub requirements: String,
    pub employment_type: String,
    pub job_type: JobType,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub status: JobStatus,
    pub posted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Recomputes the derived classification from the current fields.
    pub fn reclassify(&mut self) {
        self.job_type = classify_job_type(&self.employment_type, &self.location);
    }

    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.title, &self.department, &self.location]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

use chrono::Utc;
use std::sync::Arc;

use super::input::{Field, JobFilter, JobPayload};
use super::views::JobView;
use crate::auth::TenantContext;
use crate::domain::{classify_job_type, Job, JobId, JobStatus, DEFAULT_EMPLOYMENT_TYPE};
use crate::error::{ApiError, ResourceKind};
use crate::store::{DeletionPlan, DeletionReport, Store, StoreError};

const MISSING_FIELDS: &str = "Missing required fields";

/// Tenant-scoped job postings.
pub struct JobService<S> {
    store: Arc<S>,
}

fn required(field: Field<String>, current: String) -> Result<String, ApiError> {
    match field {
        Field::Missing => Ok(current),
        Field::Set(value) => Ok(value),
        Field::Cleared => Err(ApiError::validation(MISSING_FIELDS)),
    }
}

fn parse_status(raw: &str) -> Result<JobStatus, ApiError> {
    raw.parse::<JobStatus>().map_err(ApiError::Validation)
}

fn check_salary(min: Option<i64>, max: Option<i64>) -> Result<(), ApiError> {
    if min.is_some_and(|value| value < 0) || max.is_some_and(|value| value < 0) {
        return Err(ApiError::validation("Salary cannot be negative"));
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ApiError::validation(
                "Minimum salary cannot exceed maximum salary",
            ));
        }
    }
    Ok(())
}

impl<S> JobService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn list(&self, tenant: TenantContext, filter: JobFilter) -> Result<Vec<JobView>, ApiError> {
        let status = filter
            .status
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(parse_status)
            .transpose()?;
        let search = filter
            .search
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty());

        self.store
            .jobs_for_company(tenant.company_id)?
            .into_iter()
            .filter(|job| status.map_or(true, |status| job.status == status))
            .filter(|job| search.as_deref().map_or(true, |needle| job.matches_search(needle)))
            .map(|job| self.view(job))
            .collect()
    }

    pub fn create(&self, tenant: TenantContext, payload: JobPayload) -> Result<JobView, ApiError> {
        let (Some(title), Some(department), Some(location), Some(description), Some(requirements)) = (
            payload.title.set(),
            payload.department.set(),
            payload.location.set(),
            payload.description.set(),
            payload.requirements.set(),
        ) else {
            return Err(ApiError::validation(MISSING_FIELDS));
        };

        let salary_min = payload.salary_min.set();
        let salary_max = payload.salary_max.set();
        check_salary(salary_min, salary_max)?;

        let status = match payload.status.set() {
            Some(raw) => parse_status(&raw)?,
            None => JobStatus::Active,
        };
        let employment_type = payload
            .employment_type
            .set()
            .unwrap_or_else(|| DEFAULT_EMPLOYMENT_TYPE.to_string());

        let now = Utc::now();
        let job = Job {
            id: JobId::new(),
            company_id: tenant.company_id,
            posted_by_id: tenant.user_id,
            job_type: classify_job_type(&employment_type, &location),
            title,
            department,
            location,
            description,
            requirements,
            employment_type,
            salary_min,
            salary_max,
            status,
            posted_at: now,
            updated_at: now,
        };

        self.store.insert_job(job.clone())?;
        tracing::info!(
            company_id = %tenant.company_id,
            job_id = %job.id,
            job_type = job.job_type.as_str(),
            "job created"
        );
        self.view(job)
    }

    pub fn get(&self, tenant: TenantContext, id: &str) -> Result<JobView, ApiError> {
        let job = self.owned(tenant, id)?;
        self.view(job)
    }

    /// Merges the payload over the stored posting; the job type is recomputed from the
    /// merged fields.
    pub fn update(
        &self,
        tenant: TenantContext,
        id: &str,
        payload: JobPayload,
    ) -> Result<JobView, ApiError> {
        let mut job = self.owned(tenant, id)?;

        job.title = required(payload.title, job.title)?;
        job.department = required(payload.department, job.department)?;
        job.location = required(payload.location, job.location)?;
        job.description = required(payload.description, job.description)?;
        job.requirements = required(payload.requirements, job.requirements)?;
        job.employment_type = match payload.employment_type {
            Field::Missing => job.employment_type,
            Field::Cleared => DEFAULT_EMPLOYMENT_TYPE.to_string(),
            Field::Set(value) => value,
        };
        job.salary_min = payload.salary_min.merge(job.salary_min);
        job.salary_max = payload.salary_max.merge(job.salary_max);
        check_salary(job.salary_min, job.salary_max)?;
        if let Field::Set(raw) = payload.status {
            job.status = parse_status(&raw)?;
        }

        job.reclassify();
        job.updated_at = Utc::now();
        self.store.update_job(job.clone()).map_err(|err| match err {
            StoreError::NotFound => ApiError::NotFound(ResourceKind::Job),
            other => other.into(),
        })?;
        tracing::info!(company_id = %tenant.company_id, job_id = %job.id, "job updated");
        self.view(job)
    }

    /// Removes the posting with its applications and interviews; candidates linked to
    /// it stay in the company, unlinked.
    pub fn delete(&self, tenant: TenantContext, id: &str) -> Result<DeletionReport, ApiError> {
        let job = self.owned(tenant, id)?;
        let report = self
            .store
            .execute_deletion(&DeletionPlan::for_job(job.id))
            .map_err(|err| match err {
                StoreError::NotFound => ApiError::NotFound(ResourceKind::Job),
                other => other.into(),
            })?;

        tracing::info!(
            company_id = %tenant.company_id,
            job_id = %job.id,
            applications = report.applications,
            interviews = report.interviews,
            detached_candidates = report.detached_candidates,
            "job deleted"
        );
        Ok(report)
    }

    /// Fetch and authorize. Absent, malformed, and foreign ids are all "Job not found".
    fn owned(&self, tenant: TenantContext, id: &str) -> Result<Job, ApiError> {
        let not_found = ApiError::NotFound(ResourceKind::Job);
        let Some(job_id) = JobId::parse(id) else {
            return Err(not_found);
        };

        match self.store.job(job_id)? {
            Some(job) if job.company_id == tenant.company_id => Ok(job),
            Some(_) => {
                tracing::warn!(
                    company_id = %tenant.company_id,
                    job_id = %job_id,
                    "cross-tenant job access denied"
                );
                Err(not_found)
            }
            None => Err(not_found),
        }
    }

    fn view(&self, job: Job) -> Result<JobView, ApiError> {
        let posted_by = self.store.user(job.posted_by_id)?.map(|user| user.summary());
        let counts = self.store.job_counts(job.id)?;
        Ok(JobView {
            job,
            posted_by,
            counts,
        })
    }
}

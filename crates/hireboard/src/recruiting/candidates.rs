use chrono::Utc;
use std::sync::Arc;

use super::input::{CandidateFilter, CandidatePayload, Field};
use super::views::{CandidateDetail, CandidateView, JobSummary};
use crate::auth::TenantContext;
use crate::domain::{normalize_email, Candidate, CandidateId, JobId, Rating};
use crate::error::{ApiError, ResourceKind, INVALID_JOB};
use crate::pipeline::{PipelinePolicy, Stage};
use crate::store::{DeletionPlan, DeletionReport, Store, StoreError};

const MISSING_FIELDS: &str = "First name, last name, and email are required";

/// Tenant-scoped candidates and their pipeline stage.
pub struct CandidateService<S> {
    store: Arc<S>,
    policy: PipelinePolicy,
}

fn required(field: Field<String>, current: String) -> Result<String, ApiError> {
    match field {
        Field::Missing => Ok(current),
        Field::Set(value) => Ok(value),
        Field::Cleared => Err(ApiError::validation(MISSING_FIELDS)),
    }
}

fn checked_email(raw: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    if !email.contains('@') {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(email)
}

const MAX_EXPERIENCE_YEARS: u32 = 80;

fn checked_experience(years: i64) -> Result<u32, ApiError> {
    u32::try_from(years)
        .ok()
        .filter(|years| *years <= MAX_EXPERIENCE_YEARS)
        .ok_or_else(|| {
            ApiError::validation(format!(
                "Experience must be between 0 and {MAX_EXPERIENCE_YEARS} years"
            ))
        })
}

fn checked_rating(score: i64) -> Result<Rating, ApiError> {
    Rating::new(score).ok_or_else(|| ApiError::validation("Rating must be between 1 and 5"))
}

fn store_failure(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::NotFound(ResourceKind::Candidate),
        other => other.into(),
    }
}

impl<S> CandidateService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>, policy: PipelinePolicy) -> Self {
        Self { store, policy }
    }

    pub fn list(
        &self,
        tenant: TenantContext,
        filter: CandidateFilter,
    ) -> Result<Vec<CandidateView>, ApiError> {
        let stage = filter
            .stage
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(str::parse::<Stage>)
            .transpose()?;
        let job = match filter.job_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => match JobId::parse(raw) {
                Some(id) => Some(id),
                None => return Ok(Vec::new()),
            },
            _ => None,
        };
        let search = filter
            .search
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty());

        self.store
            .candidates_for_company(tenant.company_id)?
            .into_iter()
            .filter(|candidate| stage.map_or(true, |stage| candidate.stage == stage))
            .filter(|candidate| job.map_or(true, |job| candidate.job_id == Some(job)))
            .filter(|candidate| {
                search
                    .as_deref()
                    .map_or(true, |needle| candidate.matches_search(needle))
            })
            .map(|candidate| self.view(tenant, candidate))
            .collect()
    }

    pub fn create(
        &self,
        tenant: TenantContext,
        payload: CandidatePayload,
    ) -> Result<CandidateView, ApiError> {
        let (Some(first_name), Some(last_name), Some(email)) = (
            payload.first_name.set(),
            payload.last_name.set(),
            payload.email.set(),
        ) else {
            return Err(ApiError::validation(MISSING_FIELDS));
        };

        let email = checked_email(&email)?;
        let job_id = self.job_reference(tenant, payload.job_id, None)?;
        let experience = payload.experience.set().map(checked_experience).transpose()?;
        let rating = payload.rating.set().map(checked_rating).transpose()?;
        let stage = match payload.stage.set() {
            Some(raw) => raw.parse::<Stage>()?,
            None => Stage::default(),
        };

        let now = Utc::now();
        let candidate = Candidate {
            id: CandidateId::new(),
            company_id: tenant.company_id,
            job_id,
            first_name,
            last_name,
            email,
            phone: payload.phone.set(),
            location: payload.location.set(),
            skills: payload.skills.set().unwrap_or_default(),
            experience,
            education: payload.education.set(),
            linkedin_url: payload.linkedin_url.set(),
            portfolio_url: payload.portfolio_url.set(),
            resume_url: payload.resume_url.set(),
            summary: payload.summary.set(),
            stage,
            rating,
            notes: payload.notes.set(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_candidate(candidate.clone())?;
        tracing::info!(
            company_id = %tenant.company_id,
            candidate_id = %candidate.id,
            stage = %candidate.stage,
            "candidate created"
        );
        self.view(tenant, candidate)
    }

    pub fn get(&self, tenant: TenantContext, id: &str) -> Result<CandidateDetail, ApiError> {
        let candidate = self.owned(tenant, id)?;
        let job = self.job_summary(tenant, candidate.job_id)?;
        let activity = self.store.candidate_activity(candidate.id)?;
        Ok(CandidateDetail {
            candidate,
            job,
            activity,
        })
    }

    /// Merges the payload over the stored candidate. A stage change is checked against
    /// the configured [`PipelinePolicy`] before anything is written.
    pub fn update(
        &self,
        tenant: TenantContext,
        id: &str,
        payload: CandidatePayload,
    ) -> Result<CandidateView, ApiError> {
        let mut candidate = self.owned(tenant, id)?;

        if let Field::Set(raw) = &payload.stage {
            let next = raw.parse::<Stage>()?;
            self.policy.check(candidate.stage, next)?;
            if next != candidate.stage {
                tracing::info!(
                    candidate_id = %candidate.id,
                    from = %candidate.stage,
                    to = %next,
                    "candidate stage changed"
                );
            }
            candidate.stage = next;
        }

        candidate.first_name = required(payload.first_name, candidate.first_name)?;
        candidate.last_name = required(payload.last_name, candidate.last_name)?;
        candidate.email = match payload.email {
            Field::Missing => candidate.email,
            Field::Set(raw) => checked_email(&raw)?,
            Field::Cleared => return Err(ApiError::validation(MISSING_FIELDS)),
        };
        candidate.job_id = self.job_reference(tenant, payload.job_id, candidate.job_id)?;
        candidate.phone = payload.phone.merge(candidate.phone);
        candidate.location = payload.location.merge(candidate.location);
        candidate.skills = match payload.skills {
            Field::Missing => candidate.skills,
            Field::Cleared => Vec::new(),
            Field::Set(skills) => skills,
        };
        candidate.experience = payload
            .experience
            .map(checked_experience)
            .merge(candidate.experience.map(Ok))
            .transpose()?;
        candidate.education = payload.education.merge(candidate.education);
        candidate.linkedin_url = payload.linkedin_url.merge(candidate.linkedin_url);
        candidate.portfolio_url = payload.portfolio_url.merge(candidate.portfolio_url);
        candidate.resume_url = payload.resume_url.merge(candidate.resume_url);
        candidate.summary = payload.summary.merge(candidate.summary);
        candidate.rating = payload
            .rating
            .map(checked_rating)
            .merge(candidate.rating.map(Ok))
            .transpose()?;
        candidate.notes = payload.notes.merge(candidate.notes);
        candidate.updated_at = Utc::now();

        self.store
            .update_candidate(candidate.clone())
            .map_err(store_failure)?;
        tracing::info!(
            company_id = %tenant.company_id,
            candidate_id = %candidate.id,
            "candidate updated"
        );
        self.view(tenant, candidate)
    }

    /// Removes the candidate with its feedback, interviews, and applications.
    pub fn delete(&self, tenant: TenantContext, id: &str) -> Result<DeletionReport, ApiError> {
        let candidate = self.owned(tenant, id)?;
        let report = self
            .store
            .execute_deletion(&DeletionPlan::for_candidate(candidate.id))
            .map_err(store_failure)?;

        tracing::info!(
            company_id = %tenant.company_id,
            candidate_id = %candidate.id,
            applications = report.applications,
            interviews = report.interviews,
            feedback = report.feedback,
            "candidate deleted"
        );
        Ok(report)
    }

    fn owned(&self, tenant: TenantContext, id: &str) -> Result<Candidate, ApiError> {
        let not_found = ApiError::NotFound(ResourceKind::Candidate);
        let Some(candidate_id) = CandidateId::parse(id) else {
            return Err(not_found);
        };

        match self.store.candidate(candidate_id)? {
            Some(candidate) if candidate.company_id == tenant.company_id => Ok(candidate),
            Some(_) => {
                tracing::warn!(
                    company_id = %tenant.company_id,
                    candidate_id = %candidate_id,
                    "cross-tenant candidate access denied"
                );
                Err(not_found)
            }
            None => Err(not_found),
        }
    }

    /// Resolves a `jobId` field. Unknown and foreign jobs get the same message.
    fn job_reference(
        &self,
        tenant: TenantContext,
        field: Field<String>,
        current: Option<JobId>,
    ) -> Result<Option<JobId>, ApiError> {
        let raw = match field {
            Field::Missing => return Ok(current),
            Field::Cleared => return Ok(None),
            Field::Set(raw) => raw,
        };

        let job = JobId::parse(&raw)
            .map(|id| self.store.job(id))
            .transpose()?
            .flatten();
        match job {
            Some(job) if job.company_id == tenant.company_id => Ok(Some(job.id)),
            _ => Err(ApiError::validation(INVALID_JOB)),
        }
    }

    fn job_summary(
        &self,
        tenant: TenantContext,
        job_id: Option<JobId>,
    ) -> Result<Option<JobSummary>, ApiError> {
        let Some(job_id) = job_id else {
            return Ok(None);
        };
        Ok(self
            .store
            .job(job_id)?
            .filter(|job| job.company_id == tenant.company_id)
            .map(|job| JobSummary::from(&job)))
    }

    fn view(&self, tenant: TenantContext, candidate: Candidate) -> Result<CandidateView, ApiError> {
        let job = self.job_summary(tenant, candidate.job_id)?;
        let counts = self.store.candidate_counts(candidate.id)?;
        Ok(CandidateView {
            candidate,
            job,
            counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompanyId, Job, JobStatus, JobType, UserId};
    use crate::store::{MemoryStore, NewAccount};
    use serde_json::json;

    fn tenant(store: &MemoryStore, email: &str) -> TenantContext {
        let account = NewAccount::new(
            email.to_string(),
            "hash".to_string(),
            "Rosa".to_string(),
            "Diaz".to_string(),
            "Acme".to_string(),
            Utc::now(),
        );
        let tenant = TenantContext {
            user_id: account.user().id,
            company_id: account.company().id,
        };
        store.create_account(account).expect("account");
        tenant
    }

    fn job_for(store: &MemoryStore, tenant: TenantContext) -> JobId {
        let now = Utc::now();
        let job = Job {
            id: JobId::new(),
            company_id: tenant.company_id,
            posted_by_id: tenant.user_id,
            title: "Backend Engineer".to_string(),
            department: "Engineering".to_string(),
            location: "Berlin".to_string(),
            description: "Own the API".to_string(),
            requirements: "Rust".to_string(),
            employment_type: "Full-time".to_string(),
            job_type: JobType::FullTime,
            salary_min: None,
            salary_max: None,
            status: JobStatus::Active,
            posted_at: now,
            updated_at: now,
        };
        let id = job.id;
        store.insert_job(job).expect("job");
        id
    }

    fn payload(value: serde_json::Value) -> CandidatePayload {
        serde_json::from_value(value).expect("valid payload")
    }

    fn ada() -> CandidatePayload {
        payload(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "Ada@Example.com",
            "skills": ["Rust", "Math"],
            "experience": "7",
            "rating": 4,
        }))
    }

    #[test]
    fn create_defaults_stage_and_normalizes_email() {
        let store = Arc::new(MemoryStore::default());
        let tenant = tenant(&store, "rosa@acme.test");
        let service = CandidateService::new(store, PipelinePolicy::Permissive);

        let view = service.create(tenant, ada()).expect("created");
        assert_eq!(view.candidate.stage, Stage::New);
        assert_eq!(view.candidate.email, "ada@example.com");
        assert_eq!(view.candidate.experience, Some(7));
        assert_eq!(view.candidate.rating.map(Rating::get), Some(4));
        assert_eq!(view.candidate.company_id, tenant.company_id);
    }

    #[test]
    fn create_validates_ranges_and_stage() {
        let store = Arc::new(MemoryStore::default());
        let tenant = tenant(&store, "rosa@acme.test");
        let service = CandidateService::new(store, PipelinePolicy::Permissive);

        let mut bad_rating = ada();
        bad_rating.rating = Field::Set(6);
        assert!(matches!(
            service.create(tenant, bad_rating),
            Err(ApiError::Validation(_))
        ));

        let mut bad_experience = ada();
        bad_experience.experience = Field::Set(-1);
        assert!(matches!(
            service.create(tenant, bad_experience),
            Err(ApiError::Validation(_))
        ));

        for years in [81, i64::from(u32::MAX) + 1] {
            let mut too_long = ada();
            too_long.experience = Field::Set(years);
            let err = service.create(tenant, too_long).expect_err("out of range");
            assert_eq!(err.to_string(), "Experience must be between 0 and 80 years");
        }

        let mut veteran = ada();
        veteran.experience = Field::Set(80);
        veteran.email = Field::Set("veteran@example.com".to_string());
        assert_eq!(
            service.create(tenant, veteran).expect("at the limit").candidate.experience,
            Some(80)
        );

        let mut bad_stage = ada();
        bad_stage.stage = Field::Set("phone-screen".to_string());
        let err = service.create(tenant, bad_stage).expect_err("unknown stage");
        assert!(err.to_string().starts_with("Invalid stage 'phone-screen'"));

        let missing = payload(json!({ "firstName": "Ada" }));
        let err = service.create(tenant, missing).expect_err("missing fields");
        assert_eq!(err.to_string(), MISSING_FIELDS);
    }

    #[test]
    fn job_reference_must_stay_inside_the_tenant() {
        let store = Arc::new(MemoryStore::default());
        let acme = tenant(&store, "rosa@acme.test");
        let globex = tenant(&store, "hank@globex.test");
        let globex_job = job_for(&store, globex);
        let acme_job = job_for(&store, acme);
        let service = CandidateService::new(store, PipelinePolicy::Permissive);

        let mut foreign = ada();
        foreign.job_id = Field::Set(globex_job.to_string());
        let err = service.create(acme, foreign).expect_err("foreign job");
        assert_eq!(err.to_string(), INVALID_JOB);

        let mut unknown = ada();
        unknown.job_id = Field::Set(JobId::new().to_string());
        let err = service.create(acme, unknown).expect_err("unknown job");
        assert_eq!(err.to_string(), INVALID_JOB);

        let mut linked = ada();
        linked.job_id = Field::Set(acme_job.to_string());
        let view = service.create(acme, linked).expect("linked");
        assert_eq!(view.job.map(|job| job.id), Some(acme_job));
    }

    #[test]
    fn update_merges_and_clears_optional_fields() {
        let store = Arc::new(MemoryStore::default());
        let tenant = tenant(&store, "rosa@acme.test");
        let service = CandidateService::new(store, PipelinePolicy::Permissive);
        let mut created = ada();
        created.phone = Field::Set("+1 555 0100".to_string());
        let id = service.create(tenant, created).expect("created").candidate.id;

        let updated = service
            .update(
                tenant,
                &id.to_string(),
                payload(json!({ "phone": "", "stage": "interview", "notes": "Strong" })),
            )
            .expect("updated");
        assert_eq!(updated.candidate.phone, None);
        assert_eq!(updated.candidate.stage, Stage::Interview);
        assert_eq!(updated.candidate.notes.as_deref(), Some("Strong"));
        assert_eq!(updated.candidate.first_name, "Ada");
        assert_eq!(updated.candidate.rating.map(Rating::get), Some(4));
    }

    #[test]
    fn progressive_policy_blocks_backward_moves() {
        let store = Arc::new(MemoryStore::default());
        let tenant = tenant(&store, "rosa@acme.test");
        let service = CandidateService::new(store, PipelinePolicy::Progressive);
        let mut offer = ada();
        offer.stage = Field::Set("offer".to_string());
        let id = service.create(tenant, offer).expect("created").candidate.id.to_string();

        let err = service
            .update(tenant, &id, payload(json!({ "stage": "screening" })))
            .expect_err("backward move");
        assert_eq!(err.to_string(), "Cannot move candidate from offer to screening");

        let hired = service
            .update(tenant, &id, payload(json!({ "stage": "hired" })))
            .expect("forward move");
        assert_eq!(hired.candidate.stage, Stage::Hired);
    }

    #[test]
    fn foreign_candidates_are_not_found() {
        let store = Arc::new(MemoryStore::default());
        let tenant = tenant(&store, "rosa@acme.test");
        let service = CandidateService::new(store, PipelinePolicy::Permissive);
        let id = service.create(tenant, ada()).expect("created").candidate.id.to_string();

        let stranger = TenantContext {
            user_id: UserId::new(),
            company_id: CompanyId::new(),
        };
        for result in [
            service.get(stranger, &id).map(|_| ()),
            service
                .update(stranger, &id, payload(json!({ "notes": "x" })))
                .map(|_| ()),
            service.delete(stranger, &id).map(|_| ()),
        ] {
            assert!(matches!(
                result,
                Err(ApiError::NotFound(ResourceKind::Candidate))
            ));
        }

        let untouched = service.get(tenant, &id).expect("still there");
        assert_eq!(untouched.candidate.notes, None);
    }
}

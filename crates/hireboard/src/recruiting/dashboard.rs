use serde::Serialize;

use crate::auth::TenantContext;
use crate::domain::JobStatus;
use crate::error::ApiError;
use crate::pipeline::PipelineSummary;
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobStatusCounts {
    pub total: usize,
    pub active: usize,
    pub draft: usize,
    pub closed: usize,
}

impl JobStatusCounts {
    fn record(&mut self, status: JobStatus) {
        self.total += 1;
        match status {
            JobStatus::Active => self.active += 1,
            JobStatus::Draft => self.draft += 1,
            JobStatus::Closed => self.closed += 1,
        }
    }
}

/// Company-wide aggregates, recomputed from current state on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub pipeline: PipelineSummary,
    pub jobs: JobStatusCounts,
}

impl DashboardSummary {
    pub fn for_tenant<S>(store: &S, tenant: TenantContext) -> Result<Self, ApiError>
    where
        S: Store + ?Sized,
    {
        let candidates = store.candidates_for_company(tenant.company_id)?;
        let pipeline = PipelineSummary::from_stages(candidates.iter().map(|c| c.stage));

        let mut jobs = JobStatusCounts::default();
        for job in store.jobs_for_company(tenant.company_id)? {
            jobs.record(job.status);
        }

        Ok(Self { pipeline, jobs })
    }
}

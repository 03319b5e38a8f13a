//! Store calls never occupy the async worker.
//!
//! The store below parks `jobs_for_company` until the test opens a gate. On a
//! single-threaded runtime, a handler that called the store inline would stall the only
//! worker, so the test could neither serve another request nor open the gate in time.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::app_with;
use hireboard::domain::{
    Application, Candidate, CandidateActivity, CandidateId, Company, CompanyId, Feedback,
    Interview, Job, JobId, User, UserId,
};
use hireboard::pipeline::PipelinePolicy;
use hireboard::store::{
    CandidateCounts, DeletionPlan, DeletionReport, JobCounts, MemoryStore, NewAccount, Store,
    StoreError,
};

#[derive(Default)]
struct GatedStore {
    inner: MemoryStore,
    open: Mutex<bool>,
    opened: Condvar,
    timed_out: AtomicBool,
}

impl GatedStore {
    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }
}

impl Store for GatedStore {
    fn create_account(&self, account: NewAccount) -> Result<(), StoreError> {
        self.inner.create_account(account)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.user(id)
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.user_by_email(email)
    }

    fn company_owned_by(&self, owner: UserId) -> Result<Option<Company>, StoreError> {
        self.inner.company_owned_by(owner)
    }

    fn insert_job(&self, job: Job) -> Result<(), StoreError> {
        self.inner.insert_job(job)
    }

    fn job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        self.inner.job(id)
    }

    fn jobs_for_company(&self, company: CompanyId) -> Result<Vec<Job>, StoreError> {
        let open = self.open.lock().unwrap();
        let (open, wait) = self
            .opened
            .wait_timeout_while(open, Duration::from_secs(2), |open| !*open)
            .unwrap();
        if wait.timed_out() {
            self.timed_out.store(true, Ordering::SeqCst);
        }
        drop(open);
        self.inner.jobs_for_company(company)
    }

    fn update_job(&self, job: Job) -> Result<(), StoreError> {
        self.inner.update_job(job)
    }

    fn job_counts(&self, id: JobId) -> Result<JobCounts, StoreError> {
        self.inner.job_counts(id)
    }

    fn insert_candidate(&self, candidate: Candidate) -> Result<(), StoreError> {
        self.inner.insert_candidate(candidate)
    }

    fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        self.inner.candidate(id)
    }

    fn candidates_for_company(&self, company: CompanyId) -> Result<Vec<Candidate>, StoreError> {
        self.inner.candidates_for_company(company)
    }

    fn update_candidate(&self, candidate: Candidate) -> Result<(), StoreError> {
        self.inner.update_candidate(candidate)
    }

    fn candidate_counts(&self, id: CandidateId) -> Result<CandidateCounts, StoreError> {
        self.inner.candidate_counts(id)
    }

    fn candidate_activity(&self, id: CandidateId) -> Result<CandidateActivity, StoreError> {
        self.inner.candidate_activity(id)
    }

    fn insert_application(&self, application: Application) -> Result<(), StoreError> {
        self.inner.insert_application(application)
    }

    fn insert_interview(&self, interview: Interview) -> Result<(), StoreError> {
        self.inner.insert_interview(interview)
    }

    fn insert_feedback(&self, feedback: Feedback) -> Result<(), StoreError> {
        self.inner.insert_feedback(feedback)
    }

    fn applications_for_job(&self, job: JobId) -> Result<Vec<Application>, StoreError> {
        self.inner.applications_for_job(job)
    }

    fn execute_deletion(&self, plan: &DeletionPlan) -> Result<DeletionReport, StoreError> {
        self.inner.execute_deletion(plan)
    }
}

#[tokio::test(flavor = "current_thread")]
async fn a_slow_store_leaves_the_runtime_free() {
    let store = Arc::new(GatedStore::default());
    let app = Arc::new(app_with(Arc::clone(&store), PipelinePolicy::Permissive));
    let token = app.recruiter("slow@x.com", "Acme").await;

    let pending = {
        let app = Arc::clone(&app);
        let token = token.clone();
        tokio::spawn(async move { app.get("/api/jobs", &token).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let me = app.get("/api/auth/me", &token).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["company"]["name"], "Acme");

    store.open();
    let jobs = pending.await.unwrap();

    assert_eq!(jobs.status, StatusCode::OK);
    assert_eq!(jobs.body, json!({ "jobs": [] }));
    assert!(!store.timed_out.load(Ordering::SeqCst));
}

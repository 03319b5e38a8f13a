use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    CandidateCounts, DeletionPlan, DeletionReport, DeletionStep, JobCounts, NewAccount, Store,
    StoreError, UniqueField,
};
use crate::domain::{
    Application, ApplicationId, Candidate, CandidateActivity, CandidateId, Company, CompanyId,
    Feedback, FeedbackId, Interview, InterviewId, Job, JobId, User, UserId,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    companies: HashMap<CompanyId, Company>,
    jobs: HashMap<JobId, Job>,
    candidates: HashMap<CandidateId, Candidate>,
    applications: HashMap<ApplicationId, Application>,
    interviews: HashMap<InterviewId, Interview>,
    feedback: HashMap<FeedbackId, Feedback>,
}

impl Tables {
    fn candidate_email_taken(&self, email: &str, except: Option<CandidateId>) -> bool {
        self.candidates
            .values()
            .any(|candidate| candidate.email == email && Some(candidate.id) != except)
    }

    fn target_exists(&self, step: DeletionStep) -> bool {
        match step {
            DeletionStep::Job(id) => self.jobs.contains_key(&id),
            DeletionStep::Candidate(id) => self.candidates.contains_key(&id),
            _ => true,
        }
    }

    fn apply(&mut self, step: DeletionStep) -> usize {
        fn remove_where<K, V>(map: &mut HashMap<K, V>, doomed: impl Fn(&V) -> bool) -> usize {
            let before = map.len();
            map.retain(|_, value| !doomed(value));
            before - map.len()
        }

        match step {
            DeletionStep::ApplicationsForJob(job) => {
                remove_where(&mut self.applications, |app| app.job_id == job)
            }
            DeletionStep::InterviewsForJob(job) => {
                remove_where(&mut self.interviews, |interview| {
                    interview.job_id == Some(job)
                })
            }
            DeletionStep::DetachCandidatesFromJob(job) => {
                let mut detached = 0;
                for candidate in self.candidates.values_mut() {
                    if candidate.job_id == Some(job) {
                        candidate.job_id = None;
                        detached += 1;
                    }
                }
                detached
            }
            DeletionStep::Job(job) => usize::from(self.jobs.remove(&job).is_some()),
            DeletionStep::FeedbackForCandidate(candidate) => {
                remove_where(&mut self.feedback, |entry| entry.candidate_id == candidate)
            }
            DeletionStep::InterviewsForCandidate(candidate) => {
                remove_where(&mut self.interviews, |interview| {
                    interview.candidate_id == candidate
                })
            }
            DeletionStep::ApplicationsForCandidate(candidate) => {
                remove_where(&mut self.applications, |app| app.candidate_id == candidate)
            }
            DeletionStep::Candidate(candidate) => {
                usize::from(self.candidates.remove(&candidate).is_some())
            }
        }
    }

    fn candidate_in_company(&self, id: CandidateId, company: CompanyId) -> bool {
        self.candidates
            .get(&id)
            .is_some_and(|candidate| candidate.company_id == company)
    }

    fn job_in_company(&self, id: JobId, company: CompanyId) -> bool {
        self.jobs.get(&id).is_some_and(|job| job.company_id == company)
    }

    fn job_link_valid(&self, candidate: &Candidate) -> bool {
        candidate
            .job_id
            .map_or(true, |job| self.job_in_company(job, candidate.company_id))
    }
}

/// Process-local store. Every operation holds one mutex for its whole duration, which
/// gives the same all-or-nothing behavior the SQLite backend gets from transactions.
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

impl Store for MemoryStore {
    fn create_account(&self, account: NewAccount) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables
            .users
            .values()
            .any(|user| user.email == account.user().email)
        {
            return Err(StoreError::Conflict(UniqueField::UserEmail));
        }

        let (user, company) = account.into_parts();
        tables.companies.insert(company.id, company);
        tables.users.insert(user.id, user);
        Ok(())
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn company_owned_by(&self, owner: UserId) -> Result<Option<Company>, StoreError> {
        Ok(self
            .lock()?
            .companies
            .values()
            .find(|company| company.owner_id == owner)
            .cloned())
    }

    fn insert_job(&self, job: Job) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.companies.contains_key(&job.company_id) {
            return Err(StoreError::NotFound);
        }
        tables.jobs.insert(job.id, job);
        Ok(())
    }

    fn job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.lock()?.jobs.get(&id).cloned())
    }

    fn jobs_for_company(&self, company: CompanyId) -> Result<Vec<Job>, StoreError> {
        let jobs = self
            .lock()?
            .jobs
            .values()
            .filter(|job| job.company_id == company)
            .cloned()
            .collect();
        Ok(newest_first(jobs, |job| job.posted_at))
    }

    fn update_job(&self, job: Job) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        match tables.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn job_counts(&self, id: JobId) -> Result<JobCounts, StoreError> {
        let tables = self.lock()?;
        Ok(JobCounts {
            applications: tables
                .applications
                .values()
                .filter(|app| app.job_id == id)
                .count(),
            candidates: tables
                .candidates
                .values()
                .filter(|candidate| candidate.job_id == Some(id))
                .count(),
        })
    }

    fn insert_candidate(&self, candidate: Candidate) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.companies.contains_key(&candidate.company_id) {
            return Err(StoreError::NotFound);
        }
        if !tables.job_link_valid(&candidate) {
            return Err(StoreError::UnknownJob);
        }
        if tables.candidate_email_taken(&candidate.email, None) {
            return Err(StoreError::Conflict(UniqueField::CandidateEmail));
        }
        tables.candidates.insert(candidate.id, candidate);
        Ok(())
    }

    fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.lock()?.candidates.get(&id).cloned())
    }

    fn candidates_for_company(&self, company: CompanyId) -> Result<Vec<Candidate>, StoreError> {
        let candidates = self
            .lock()?
            .candidates
            .values()
            .filter(|candidate| candidate.company_id == company)
            .cloned()
            .collect();
        Ok(newest_first(candidates, |candidate| candidate.created_at))
    }

    fn update_candidate(&self, candidate: Candidate) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.candidates.contains_key(&candidate.id) {
            return Err(StoreError::NotFound);
        }
        if !tables.job_link_valid(&candidate) {
            return Err(StoreError::UnknownJob);
        }
        if tables.candidate_email_taken(&candidate.email, Some(candidate.id)) {
            return Err(StoreError::Conflict(UniqueField::CandidateEmail));
        }
        tables.candidates.insert(candidate.id, candidate);
        Ok(())
    }

    fn candidate_counts(&self, id: CandidateId) -> Result<CandidateCounts, StoreError> {
        let tables = self.lock()?;
        Ok(CandidateCounts {
            applications: tables
                .applications
                .values()
                .filter(|app| app.candidate_id == id)
                .count(),
            interviews: tables
                .interviews
                .values()
                .filter(|interview| interview.candidate_id == id)
                .count(),
        })
    }

    fn candidate_activity(&self, id: CandidateId) -> Result<CandidateActivity, StoreError> {
        let tables = self.lock()?;
        let applications = tables
            .applications
            .values()
            .filter(|app| app.candidate_id == id)
            .cloned()
            .collect();
        let interviews = tables
            .interviews
            .values()
            .filter(|interview| interview.candidate_id == id)
            .cloned()
            .collect();
        let feedback = tables
            .feedback
            .values()
            .filter(|entry| entry.candidate_id == id)
            .cloned()
            .collect();

        Ok(CandidateActivity {
            applications: newest_first(applications, |app| app.applied_at),
            interviews: newest_first(interviews, |interview| interview.scheduled_at),
            feedback: newest_first(feedback, |entry| entry.created_at),
        })
    }

    fn insert_application(&self, application: Application) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.candidate_in_company(application.candidate_id, application.company_id)
            || !tables.job_in_company(application.job_id, application.company_id)
        {
            return Err(StoreError::NotFound);
        }
        tables.applications.insert(application.id, application);
        Ok(())
    }

    fn insert_interview(&self, interview: Interview) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let job_ok = interview
            .job_id
            .map_or(true, |job| tables.job_in_company(job, interview.company_id));
        if !tables.candidate_in_company(interview.candidate_id, interview.company_id) || !job_ok {
            return Err(StoreError::NotFound);
        }
        tables.interviews.insert(interview.id, interview);
        Ok(())
    }

    fn insert_feedback(&self, feedback: Feedback) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.candidate_in_company(feedback.candidate_id, feedback.company_id) {
            return Err(StoreError::NotFound);
        }
        tables.feedback.insert(feedback.id, feedback);
        Ok(())
    }

    fn applications_for_job(&self, job: JobId) -> Result<Vec<Application>, StoreError> {
        let applications = self
            .lock()?
            .applications
            .values()
            .filter(|app| app.job_id == job)
            .cloned()
            .collect();
        Ok(newest_first(applications, |app| app.applied_at))
    }

    fn execute_deletion(&self, plan: &DeletionPlan) -> Result<DeletionReport, StoreError> {
        let mut tables = self.lock()?;
        if !plan.steps().iter().all(|step| tables.target_exists(*step)) {
            return Err(StoreError::NotFound);
        }

        let mut report = DeletionReport::default();
        for step in plan.steps() {
            let affected = tables.apply(*step);
            report.record(*step, affected);
        }
        Ok(report)
    }
}

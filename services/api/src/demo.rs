use crate::infra::parse_policy;
use chrono::Utc;
use clap::Args;
use hireboard::auth::{PasswordCost, SignupRequest, TenantContext};
use hireboard::config::{AuthConfig, DEVELOPMENT_JWT_SECRET};
use hireboard::domain::{
    Application, ApplicationId, ApplicationStatus, CandidateId, Interview, InterviewId,
    InterviewKind, JobId,
};
use hireboard::error::{ApiError, AppError};
use hireboard::pipeline::PipelinePolicy;
use hireboard::recruiting::{CandidateFilter, CandidatePayload, DashboardSummary, JobPayload};
use hireboard::store::{MemoryStore, Store};
use hireboard::Hireboard;
use serde_json::json;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Stage transition policy: permissive or progressive
    #[arg(long, value_parser = parse_policy, default_value = "permissive")]
    pub(crate) policy: PipelinePolicy,
    /// Print the closing dashboard summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let auth = AuthConfig {
        jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
        session_ttl_days: 7,
        secure_cookies: false,
        password: PasswordCost::default(),
    };
    run_with(Arc::new(MemoryStore::default()), &auth, &args)
}

fn run_with(store: Arc<MemoryStore>, auth: &AuthConfig, args: &DemoArgs) -> Result<(), AppError> {
    let app = Hireboard::new(Arc::clone(&store), auth, args.policy)?;

    println!("Hireboard demo (pipeline policy: {:?})", args.policy);
    walkthrough(&app, &store, args.json)?;
    Ok(())
}

fn payload<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::validation(err.to_string()))
}

fn walkthrough(
    app: &Hireboard<MemoryStore>,
    store: &MemoryStore,
    as_json: bool,
) -> Result<(), ApiError> {
    let session = app.gate().signup(SignupRequest {
        email: Some("rosa@acme.test".to_string()),
        password: Some("correct horse battery".to_string()),
        first_name: Some("Rosa".to_string()),
        last_name: Some("Diaz".to_string()),
        company_name: Some("Acme Robotics".to_string()),
    })?;
    let tenant = app.gate().authorize(Some(&session.token))?;
    println!(
        "- Signed up {} {} <{}> (session token redacted)",
        session.user.first_name, session.user.last_name, session.user.email
    );

    println!("\nJob postings");
    let postings = [
        json!({
            "title": "Backend Engineer",
            "department": "Engineering",
            "location": "Remote - EU",
            "description": "Own the hiring API",
            "requirements": "Rust, SQL",
            "salaryMin": "90000",
            "salaryMax": 120000,
        }),
        json!({
            "title": "Recruiting Coordinator",
            "department": "People",
            "location": "Austin, TX",
            "description": "Keep interviews moving",
            "requirements": "Scheduling",
            "employmentType": "Part-time",
        }),
        json!({
            "title": "Firmware Contractor",
            "department": "Hardware",
            "location": "Remote",
            "description": "Motor controller firmware",
            "requirements": "Embedded C",
            "employmentType": "Contract",
            "status": "draft",
        }),
    ];
    let mut job_ids: Vec<JobId> = Vec::new();
    for posting in postings {
        let view = app.jobs().create(tenant, payload::<JobPayload>(posting)?)?;
        println!(
            "  - {} [{}] {} / {}",
            view.job.title,
            view.job.status.as_str(),
            view.job.employment_type,
            view.job.job_type.as_str()
        );
        job_ids.push(view.job.id);
    }

    println!("\nCandidates");
    let backend_job = job_ids.first().map(|id| id.to_string());
    let people = [
        ("Ada", "Lovelace", "ada@example.com", "interview"),
        ("Grace", "Hopper", "grace@example.com", "offer"),
        ("Alan", "Turing", "alan@example.com", "screening"),
        ("Edsger", "Dijkstra", "edsger@example.com", "new"),
        ("Barbara", "Liskov", "barbara@example.com", "new"),
    ];
    let mut candidate_ids: Vec<CandidateId> = Vec::new();
    for (first, last, email, stage) in people {
        let body = json!({
            "firstName": first,
            "lastName": last,
            "email": email,
            "stage": stage,
            "jobId": backend_job,
            "skills": "Rust, Distributed systems",
        });
        let view = app.candidates().create(tenant, payload::<CandidatePayload>(body)?)?;
        println!("  - {} ({})", view.candidate.full_name(), view.candidate.stage);
        candidate_ids.push(view.candidate.id);
    }

    let duplicate = payload::<CandidatePayload>(json!({
        "firstName": "Ada",
        "lastName": "Byron",
        "email": "ADA@example.com",
    }))?;
    match app.candidates().create(tenant, duplicate) {
        Ok(_) => println!("  Duplicate email accepted unexpectedly"),
        Err(err) => println!("  Duplicate email rejected: {err}"),
    }

    println!("\nPipeline moves");
    if let Some(alan) = candidate_ids.get(2) {
        for stage in ["interview", "screening"] {
            let body = payload::<CandidatePayload>(json!({ "stage": stage }))?;
            match app.candidates().update(tenant, &alan.to_string(), body) {
                Ok(view) => println!("  - Alan Turing -> {}", view.candidate.stage),
                Err(err) => println!("  - Alan Turing -> {stage} refused: {err}"),
            }
        }
    }

    if let (Some(job), Some(ada)) = (job_ids.first(), candidate_ids.first()) {
        seed_activity(store, tenant, *job, *ada)?;
        let report = app.jobs().delete(tenant, &job.to_string())?;
        println!(
            "\nDeleted the backend posting: {} applications, {} interviews removed, {} candidates unlinked",
            report.applications, report.interviews, report.detached_candidates
        );
    }

    let remaining = app.candidates().list(tenant, CandidateFilter::default())?;
    println!("{} candidates remain with the company", remaining.len());

    let summary = DashboardSummary::for_tenant(store, tenant)?;
    if as_json {
        match serde_json::to_string_pretty(&summary) {
            Ok(rendered) => println!("\n{rendered}"),
            Err(err) => println!("\nDashboard summary unavailable: {err}"),
        }
        return Ok(());
    }

    println!("\nFunnel ({} candidates)", summary.pipeline.total);
    for entry in &summary.pipeline.funnel {
        println!(
            "  - {:<10} {:>2} ({:.1}%)",
            entry.stage.as_str(),
            entry.count,
            entry.percentage
        );
    }
    println!(
        "Jobs: {} total | {} active | {} draft | {} closed",
        summary.jobs.total, summary.jobs.active, summary.jobs.draft, summary.jobs.closed
    );
    Ok(())
}

fn seed_activity(
    store: &MemoryStore,
    tenant: TenantContext,
    job: JobId,
    candidate: CandidateId,
) -> Result<(), ApiError> {
    let now = Utc::now();
    store.insert_application(Application {
        id: ApplicationId::new(),
        company_id: tenant.company_id,
        candidate_id: candidate,
        job_id: job,
        status: ApplicationStatus::Reviewing,
        applied_at: now,
    })?;
    store.insert_interview(Interview {
        id: InterviewId::new(),
        company_id: tenant.company_id,
        candidate_id: candidate,
        job_id: Some(job),
        kind: InterviewKind::Technical,
        scheduled_at: now,
    })?;
    Ok(())
}

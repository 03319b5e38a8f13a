use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

use super::{
    CandidateCounts, DeletionPlan, DeletionReport, DeletionStep, JobCounts, NewAccount, Store,
    StoreError, UniqueField,
};
use crate::domain::{
    Application, ApplicationId, ApplicationStatus, Candidate, CandidateActivity, CandidateId,
    Company, CompanyId, Feedback, FeedbackId, Interview, InterviewId, InterviewKind, Job, JobId,
    JobStatus, JobType, Rating, Role, User, UserId,
};
use crate::pipeline::Stage;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('RECRUITER', 'ADMIN')),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    owner_id TEXT NOT NULL UNIQUE REFERENCES users(id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(id),
    posted_by_id TEXT NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    department TEXT NOT NULL,
    location TEXT NOT NULL,
    description TEXT NOT NULL,
    requirements TEXT NOT NULL,
    employment_type TEXT NOT NULL,
    job_type TEXT NOT NULL CHECK (job_type IN ('FULL_TIME', 'PART_TIME', 'CONTRACT', 'REMOTE')),
    salary_min INTEGER,
    salary_max INTEGER,
    status TEXT NOT NULL CHECK (status IN ('ACTIVE', 'CLOSED', 'DRAFT')),
    posted_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS candidates (
    id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(id),
    job_id TEXT REFERENCES jobs(id),
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone TEXT,
    location TEXT,
    skills TEXT NOT NULL DEFAULT '[]',
    experience INTEGER CHECK (experience IS NULL OR experience >= 0),
    education TEXT,
    linkedin_url TEXT,
    portfolio_url TEXT,
    resume_url TEXT,
    summary TEXT,
    stage TEXT NOT NULL
        CHECK (stage IN ('new', 'screening', 'interview', 'offer', 'hired', 'rejected')),
    rating INTEGER CHECK (rating IS NULL OR rating BETWEEN 1 AND 5),
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS applications (
    id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(id),
    candidate_id TEXT NOT NULL REFERENCES candidates(id),
    job_id TEXT NOT NULL REFERENCES jobs(id),
    status TEXT NOT NULL,
    applied_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS interviews (
    id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(id),
    candidate_id TEXT NOT NULL REFERENCES candidates(id),
    job_id TEXT REFERENCES jobs(id),
    kind TEXT NOT NULL,
    scheduled_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS feedback (
    id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(id),
    candidate_id TEXT NOT NULL REFERENCES candidates(id),
    author_id TEXT NOT NULL REFERENCES users(id),
    rating INTEGER CHECK (rating IS NULL OR rating BETWEEN 1 AND 5),
    comments TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jobs_company ON jobs(company_id);
CREATE INDEX IF NOT EXISTS idx_candidates_company ON candidates(company_id);
CREATE INDEX IF NOT EXISTS idx_candidates_job ON candidates(job_id);
CREATE INDEX IF NOT EXISTS idx_applications_candidate ON applications(candidate_id);
CREATE INDEX IF NOT EXISTS idx_applications_job ON applications(job_id);
CREATE INDEX IF NOT EXISTS idx_interviews_candidate ON interviews(candidate_id);
CREATE INDEX IF NOT EXISTS idx_feedback_candidate ON feedback(candidate_id);
"#;

const USER_SELECT: &str = "SELECT u.id, u.email, u.password_hash, u.first_name, u.last_name, \
     u.role, c.id, u.created_at FROM users u LEFT JOIN companies c ON c.owner_id = u.id";

const JOB_COLUMNS: &str = "id, company_id, posted_by_id, title, department, location, \
     description, requirements, employment_type, job_type, salary_min, salary_max, status, \
     posted_at, updated_at";

const CANDIDATE_COLUMNS: &str = "id, company_id, job_id, first_name, last_name, email, phone, \
     location, skills, experience, education, linkedin_url, portfolio_url, resume_url, summary, \
     stage, rating, notes, created_at, updated_at";

/// SQLite-backed store. Foreign keys are enforced, so a cascade plan that deleted a
/// parent before its dependents would fail instead of orphaning rows.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection mutex poisoned".to_string()))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

fn unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn write_error(err: rusqlite::Error, field: UniqueField) -> StoreError {
    if unique_violation(&err) {
        StoreError::Conflict(field)
    } else {
        err.into()
    }
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|err| conversion_error(idx, err))
}

fn optional_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| Uuid::parse_str(&value).map_err(|err| conversion_error(idx, err)))
        .transpose()
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| conversion_error(idx, err))
}

fn enum_at<T>(row: &Row<'_>, idx: usize, parse: impl Fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, format!("unexpected value '{raw}'")))
}

fn rating_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Rating>> {
    let raw: Option<i64> = row.get(idx)?;
    raw.map(|value| {
        Rating::new(value).ok_or_else(|| conversion_error(idx, format!("rating {value} out of range")))
    })
    .transpose()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(uuid_at(row, 0)?),
        email: row.get(1)?,
        password_hash: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        role: enum_at(row, 5, Role::parse)?,
        owned_company_id: optional_uuid_at(row, 6)?.map(CompanyId),
        created_at: timestamp_at(row, 7)?,
    })
}

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: CompanyId(uuid_at(row, 0)?),
        name: row.get(1)?,
        owner_id: UserId(uuid_at(row, 2)?),
        created_at: timestamp_at(row, 3)?,
    })
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    Ok(Job {
        id: JobId(uuid_at(row, 0)?),
        company_id: CompanyId(uuid_at(row, 1)?),
        posted_by_id: UserId(uuid_at(row, 2)?),
        title: row.get(3)?,
        department: row.get(4)?,
        location: row.get(5)?,
        description: row.get(6)?,
        requirements: row.get(7)?,
        employment_type: row.get(8)?,
        job_type: enum_at(row, 9, JobType::parse)?,
        salary_min: row.get(10)?,
        salary_max: row.get(11)?,
        status: enum_at(row, 12, |raw| raw.parse::<JobStatus>().ok())?,
        posted_at: timestamp_at(row, 13)?,
        updated_at: timestamp_at(row, 14)?,
    })
}

fn candidate_from_row(row: &Row<'_>) -> rusqlite::Result<Candidate> {
    let skills: String = row.get(8)?;
    let experience: Option<i64> = row.get(9)?;
    Ok(Candidate {
        id: CandidateId(uuid_at(row, 0)?),
        company_id: CompanyId(uuid_at(row, 1)?),
        job_id: optional_uuid_at(row, 2)?.map(JobId),
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        location: row.get(7)?,
        skills: serde_json::from_str(&skills).map_err(|err| conversion_error(8, err))?,
        experience: experience
            .map(|years| u32::try_from(years).map_err(|err| conversion_error(9, err)))
            .transpose()?,
        education: row.get(10)?,
        linkedin_url: row.get(11)?,
        portfolio_url: row.get(12)?,
        resume_url: row.get(13)?,
        summary: row.get(14)?,
        stage: enum_at(row, 15, |raw| raw.parse::<Stage>().ok())?,
        rating: rating_at(row, 16)?,
        notes: row.get(17)?,
        created_at: timestamp_at(row, 18)?,
        updated_at: timestamp_at(row, 19)?,
    })
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<Application> {
    Ok(Application {
        id: ApplicationId(uuid_at(row, 0)?),
        company_id: CompanyId(uuid_at(row, 1)?),
        candidate_id: CandidateId(uuid_at(row, 2)?),
        job_id: JobId(uuid_at(row, 3)?),
        status: enum_at(row, 4, ApplicationStatus::parse)?,
        applied_at: timestamp_at(row, 5)?,
    })
}

fn interview_from_row(row: &Row<'_>) -> rusqlite::Result<Interview> {
    Ok(Interview {
        id: InterviewId(uuid_at(row, 0)?),
        company_id: CompanyId(uuid_at(row, 1)?),
        candidate_id: CandidateId(uuid_at(row, 2)?),
        job_id: optional_uuid_at(row, 3)?.map(JobId),
        kind: enum_at(row, 4, InterviewKind::parse)?,
        scheduled_at: timestamp_at(row, 5)?,
    })
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: FeedbackId(uuid_at(row, 0)?),
        company_id: CompanyId(uuid_at(row, 1)?),
        candidate_id: CandidateId(uuid_at(row, 2)?),
        author_id: UserId(uuid_at(row, 3)?),
        rating: rating_at(row, 4)?,
        comments: row.get(5)?,
        created_at: timestamp_at(row, 6)?,
    })
}

fn count(conn: &Connection, sql: &str, id: String) -> Result<usize, StoreError> {
    let total: i64 = conn.query_row(sql, params![id], |row| row.get(0))?;
    Ok(usize::try_from(total).unwrap_or_default())
}

fn owned_by(conn: &Connection, table: &str, id: String, company: CompanyId) -> Result<bool, StoreError> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?1 AND company_id = ?2");
    let total: i64 = conn.query_row(&sql, params![id, company.to_string()], |row| row.get(0))?;
    Ok(total > 0)
}

/// Must run on the candidate write's own transaction.
fn check_job_link(conn: &Connection, candidate: &Candidate) -> Result<(), StoreError> {
    match candidate.job_id {
        Some(job) if !owned_by(conn, "jobs", job.to_string(), candidate.company_id)? => {
            Err(StoreError::UnknownJob)
        }
        _ => Ok(()),
    }
}

fn skills_json(skills: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(skills).map_err(|err| StoreError::Unavailable(err.to_string()))
}

impl Store for SqliteStore {
    fn create_account(&self, account: NewAccount) -> Result<(), StoreError> {
        let (user, company) = account.into_parts();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO users (id, email, password_hash, first_name, last_name, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.first_name,
                user.last_name,
                user.role.as_str(),
                timestamp(user.created_at),
            ],
        )
        .map_err(|err| write_error(err, UniqueField::UserEmail))?;

        tx.execute(
            "INSERT INTO companies (id, name, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                company.id.to_string(),
                company.name,
                company.owner_id.to_string(),
                timestamp(company.created_at),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("{USER_SELECT} WHERE u.id = ?1");
        Ok(conn
            .query_row(&sql, params![id.to_string()], user_from_row)
            .optional()?)
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("{USER_SELECT} WHERE u.email = ?1");
        Ok(conn.query_row(&sql, params![email], user_from_row).optional()?)
    }

    fn company_owned_by(&self, owner: UserId) -> Result<Option<Company>, StoreError> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT id, name, owner_id, created_at FROM companies WHERE owner_id = ?1",
                params![owner.to_string()],
                company_from_row,
            )
            .optional()?)
    }

    fn insert_job(&self, job: Job) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "INSERT INTO jobs ({JOB_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        );
        conn.execute(
            &sql,
            params![
                job.id.to_string(),
                job.company_id.to_string(),
                job.posted_by_id.to_string(),
                job.title,
                job.department,
                job.location,
                job.description,
                job.requirements,
                job.employment_type,
                job.job_type.as_str(),
                job.salary_min,
                job.salary_max,
                job.status.as_str(),
                timestamp(job.posted_at),
                timestamp(job.updated_at),
            ],
        )?;
        Ok(())
    }

    fn job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1");
        Ok(conn
            .query_row(&sql, params![id.to_string()], job_from_row)
            .optional()?)
    }

    fn jobs_for_company(&self, company: CompanyId) -> Result<Vec<Job>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE company_id = ?1 ORDER BY posted_at DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![company.to_string()], job_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn update_job(&self, job: Job) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE jobs SET title = ?2, department = ?3, location = ?4, description = ?5,
                 requirements = ?6, employment_type = ?7, job_type = ?8, salary_min = ?9,
                 salary_max = ?10, status = ?11, updated_at = ?12
             WHERE id = ?1",
            params![
                job.id.to_string(),
                job.title,
                job.department,
                job.location,
                job.description,
                job.requirements,
                job.employment_type,
                job.job_type.as_str(),
                job.salary_min,
                job.salary_max,
                job.status.as_str(),
                timestamp(job.updated_at),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn job_counts(&self, id: JobId) -> Result<JobCounts, StoreError> {
        let conn = self.lock()?;
        Ok(JobCounts {
            applications: count(
                &conn,
                "SELECT COUNT(*) FROM applications WHERE job_id = ?1",
                id.to_string(),
            )?,
            candidates: count(
                &conn,
                "SELECT COUNT(*) FROM candidates WHERE job_id = ?1",
                id.to_string(),
            )?,
        })
    }

    fn insert_candidate(&self, candidate: Candidate) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        check_job_link(&tx, &candidate)?;
        let sql = format!(
            "INSERT INTO candidates ({CANDIDATE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                     ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
        );
        tx.execute(
            &sql,
            params![
                candidate.id.to_string(),
                candidate.company_id.to_string(),
                candidate.job_id.map(|job| job.to_string()),
                candidate.first_name,
                candidate.last_name,
                candidate.email,
                candidate.phone,
                candidate.location,
                skills_json(&candidate.skills)?,
                candidate.experience.map(i64::from),
                candidate.education,
                candidate.linkedin_url,
                candidate.portfolio_url,
                candidate.resume_url,
                candidate.summary,
                candidate.stage.as_str(),
                candidate.rating.map(|rating| i64::from(rating.get())),
                candidate.notes,
                timestamp(candidate.created_at),
                timestamp(candidate.updated_at),
            ],
        )
        .map_err(|err| write_error(err, UniqueField::CandidateEmail))?;
        tx.commit()?;
        Ok(())
    }

    fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?1");
        Ok(conn
            .query_row(&sql, params![id.to_string()], candidate_from_row)
            .optional()?)
    }

    fn candidates_for_company(&self, company: CompanyId) -> Result<Vec<Candidate>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE company_id = ?1
             ORDER BY created_at DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![company.to_string()], candidate_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn update_candidate(&self, candidate: Candidate) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if !owned_by(&tx, "candidates", candidate.id.to_string(), candidate.company_id)? {
            return Err(StoreError::NotFound);
        }
        check_job_link(&tx, &candidate)?;
        let updated = tx
            .execute(
                "UPDATE candidates SET job_id = ?2, first_name = ?3, last_name = ?4, email = ?5,
                     phone = ?6, location = ?7, skills = ?8, experience = ?9, education = ?10,
                     linkedin_url = ?11, portfolio_url = ?12, resume_url = ?13, summary = ?14,
                     stage = ?15, rating = ?16, notes = ?17, updated_at = ?18
                 WHERE id = ?1",
                params![
                    candidate.id.to_string(),
                    candidate.job_id.map(|job| job.to_string()),
                    candidate.first_name,
                    candidate.last_name,
                    candidate.email,
                    candidate.phone,
                    candidate.location,
                    skills_json(&candidate.skills)?,
                    candidate.experience.map(i64::from),
                    candidate.education,
                    candidate.linkedin_url,
                    candidate.portfolio_url,
                    candidate.resume_url,
                    candidate.summary,
                    candidate.stage.as_str(),
                    candidate.rating.map(|rating| i64::from(rating.get())),
                    candidate.notes,
                    timestamp(candidate.updated_at),
                ],
            )
            .map_err(|err| write_error(err, UniqueField::CandidateEmail))?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit()?;
        Ok(())
    }

    fn candidate_counts(&self, id: CandidateId) -> Result<CandidateCounts, StoreError> {
        let conn = self.lock()?;
        Ok(CandidateCounts {
            applications: count(
                &conn,
                "SELECT COUNT(*) FROM applications WHERE candidate_id = ?1",
                id.to_string(),
            )?,
            interviews: count(
                &conn,
                "SELECT COUNT(*) FROM interviews WHERE candidate_id = ?1",
                id.to_string(),
            )?,
        })
    }

    fn candidate_activity(&self, id: CandidateId) -> Result<CandidateActivity, StoreError> {
        let conn = self.lock()?;
        let id = id.to_string();

        let mut stmt = conn.prepare(
            "SELECT id, company_id, candidate_id, job_id, status, applied_at FROM applications
             WHERE candidate_id = ?1 ORDER BY applied_at DESC",
        )?;
        let applications = stmt
            .query_map(params![id], application_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT id, company_id, candidate_id, job_id, kind, scheduled_at FROM interviews
             WHERE candidate_id = ?1 ORDER BY scheduled_at DESC",
        )?;
        let interviews = stmt
            .query_map(params![id], interview_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT id, company_id, candidate_id, author_id, rating, comments, created_at
             FROM feedback WHERE candidate_id = ?1 ORDER BY created_at DESC",
        )?;
        let feedback = stmt
            .query_map(params![id], feedback_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CandidateActivity {
            applications,
            interviews,
            feedback,
        })
    }

    fn insert_application(&self, application: Application) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let company = application.company_id;
        if !owned_by(&tx, "candidates", application.candidate_id.to_string(), company)?
            || !owned_by(&tx, "jobs", application.job_id.to_string(), company)?
        {
            return Err(StoreError::NotFound);
        }

        tx.execute(
            "INSERT INTO applications (id, company_id, candidate_id, job_id, status, applied_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                application.id.to_string(),
                company.to_string(),
                application.candidate_id.to_string(),
                application.job_id.to_string(),
                application.status.as_str(),
                timestamp(application.applied_at),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn insert_interview(&self, interview: Interview) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let company = interview.company_id;
        let job_ok = match interview.job_id {
            Some(job) => owned_by(&tx, "jobs", job.to_string(), company)?,
            None => true,
        };
        if !job_ok || !owned_by(&tx, "candidates", interview.candidate_id.to_string(), company)? {
            return Err(StoreError::NotFound);
        }

        tx.execute(
            "INSERT INTO interviews (id, company_id, candidate_id, job_id, kind, scheduled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                interview.id.to_string(),
                company.to_string(),
                interview.candidate_id.to_string(),
                interview.job_id.map(|job| job.to_string()),
                interview.kind.as_str(),
                timestamp(interview.scheduled_at),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn insert_feedback(&self, feedback: Feedback) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let company = feedback.company_id;
        if !owned_by(&tx, "candidates", feedback.candidate_id.to_string(), company)? {
            return Err(StoreError::NotFound);
        }

        tx.execute(
            "INSERT INTO feedback (id, company_id, candidate_id, author_id, rating, comments,
                 created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                feedback.id.to_string(),
                company.to_string(),
                feedback.candidate_id.to_string(),
                feedback.author_id.to_string(),
                feedback.rating.map(|rating| i64::from(rating.get())),
                feedback.comments,
                timestamp(feedback.created_at),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn applications_for_job(&self, job: JobId) -> Result<Vec<Application>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, company_id, candidate_id, job_id, status, applied_at FROM applications
             WHERE job_id = ?1 ORDER BY applied_at DESC",
        )?;
        let rows = stmt.query_map(params![job.to_string()], application_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn execute_deletion(&self, plan: &DeletionPlan) -> Result<DeletionReport, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut report = DeletionReport::default();

        for step in plan.steps() {
            let (sql, id) = match *step {
                DeletionStep::ApplicationsForJob(id) => {
                    ("DELETE FROM applications WHERE job_id = ?1", id.to_string())
                }
                DeletionStep::InterviewsForJob(id) => {
                    ("DELETE FROM interviews WHERE job_id = ?1", id.to_string())
                }
                DeletionStep::DetachCandidatesFromJob(id) => (
                    "UPDATE candidates SET job_id = NULL WHERE job_id = ?1",
                    id.to_string(),
                ),
                DeletionStep::Job(id) => ("DELETE FROM jobs WHERE id = ?1", id.to_string()),
                DeletionStep::FeedbackForCandidate(id) => {
                    ("DELETE FROM feedback WHERE candidate_id = ?1", id.to_string())
                }
                DeletionStep::InterviewsForCandidate(id) => {
                    ("DELETE FROM interviews WHERE candidate_id = ?1", id.to_string())
                }
                DeletionStep::ApplicationsForCandidate(id) => {
                    ("DELETE FROM applications WHERE candidate_id = ?1", id.to_string())
                }
                DeletionStep::Candidate(id) => {
                    ("DELETE FROM candidates WHERE id = ?1", id.to_string())
                }
            };

            let affected = tx.execute(sql, params![id])?;
            let is_target = matches!(step, DeletionStep::Job(_) | DeletionStep::Candidate(_));
            if is_target && affected == 0 {
                // Dropping the transaction rolls back the dependent steps.
                return Err(StoreError::NotFound);
            }
            report.record(*step, affected);
        }

        tx.commit()?;
        Ok(report)
    }
}

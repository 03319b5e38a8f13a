//! Request payloads for job and candidate writes.
//!
//! Dashboard forms send every value as text, API clients send numbers and arrays, and
//! updates send only the fields that changed. [`Field`] keeps those three situations
//! apart: a key that was never sent, a key sent empty or `null`, and a real value.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    #[default]
    Missing,
    Cleared,
    Set(T),
}

impl<T> Field<T> {
    pub fn set(self) -> Option<T> {
        match self {
            Field::Set(value) => Some(value),
            Field::Missing | Field::Cleared => None,
        }
    }

    /// Resolves the field against the stored value during an update.
    pub fn merge(self, current: Option<T>) -> Option<T> {
        match self {
            Field::Missing => current,
            Field::Cleared => None,
            Field::Set(value) => Some(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Missing => Field::Missing,
            Field::Cleared => Field::Cleared,
            Field::Set(value) => Field::Set(f(value)),
        }
    }
}

fn text<'de, D>(deserializer: D) -> Result<Field<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(match value.map(|raw| raw.trim().to_string()) {
        Some(trimmed) if !trimmed.is_empty() => Field::Set(trimmed),
        _ => Field::Cleared,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

fn whole_number<'de, D>(deserializer: D) -> Result<Field<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(Field::Cleared),
        Some(NumberOrText::Number(number)) => number
            .as_i64()
            .map(Field::Set)
            .ok_or_else(|| de::Error::custom(format!("expected a whole number, got {number}"))),
        Some(NumberOrText::Text(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(Field::Cleared);
            }
            trimmed
                .parse::<i64>()
                .map(Field::Set)
                .map_err(|_| de::Error::custom(format!("expected a whole number, got '{trimmed}'")))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrText {
    List(Vec<String>),
    Text(String),
}

/// Accepts `["Rust", "SQL"]` or the form encoding `"Rust, SQL"`.
fn string_list<'de, D>(deserializer: D) -> Result<Field<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<ListOrText>::deserialize(deserializer)? {
        None => return Ok(Field::Cleared),
        Some(ListOrText::List(items)) => items,
        Some(ListOrText::Text(raw)) => raw.split(',').map(str::to_string).collect(),
    };

    let cleaned: Vec<String> = items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    Ok(Field::Set(cleaned))
}

/// Create and update body for `/api/jobs`. Unknown keys, `companyId` included, are
/// ignored: ownership always comes from the session.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobPayload {
    #[serde(deserialize_with = "text")]
    pub title: Field<String>,
    #[serde(deserialize_with = "text")]
    pub department: Field<String>,
    #[serde(deserialize_with = "text")]
    pub location: Field<String>,
    #[serde(deserialize_with = "text")]
    pub description: Field<String>,
    #[serde(deserialize_with = "text")]
    pub requirements: Field<String>,
    #[serde(deserialize_with = "text")]
    pub employment_type: Field<String>,
    #[serde(deserialize_with = "whole_number")]
    pub salary_min: Field<i64>,
    #[serde(deserialize_with = "whole_number")]
    pub salary_max: Field<i64>,
    #[serde(deserialize_with = "text")]
    pub status: Field<String>,
}

/// Create and update body for `/api/candidates`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidatePayload {
    #[serde(deserialize_with = "text")]
    pub first_name: Field<String>,
    #[serde(deserialize_with = "text")]
    pub last_name: Field<String>,
    #[serde(deserialize_with = "text")]
    pub email: Field<String>,
    #[serde(deserialize_with = "text")]
    pub phone: Field<String>,
    #[serde(deserialize_with = "text")]
    pub location: Field<String>,
    #[serde(deserialize_with = "text")]
    pub job_id: Field<String>,
    #[serde(deserialize_with = "string_list")]
    pub skills: Field<Vec<String>>,
    #[serde(deserialize_with = "whole_number")]
    pub experience: Field<i64>,
    #[serde(deserialize_with = "text")]
    pub education: Field<String>,
    #[serde(deserialize_with = "text")]
    pub linkedin_url: Field<String>,
    #[serde(deserialize_with = "text")]
    pub portfolio_url: Field<String>,
    #[serde(deserialize_with = "text")]
    pub resume_url: Field<String>,
    #[serde(deserialize_with = "text")]
    pub summary: Field<String>,
    #[serde(deserialize_with = "text")]
    pub stage: Field<String>,
    #[serde(deserialize_with = "whole_number")]
    pub rating: Field<i64>,
    #[serde(deserialize_with = "text")]
    pub notes: Field<String>,
}

/// Query parameters for `GET /api/jobs`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JobFilter {
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Query parameters for `GET /api/candidates`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateFilter {
    pub stage: Option<String>,
    pub job_id: Option<String>,
    pub search: Option<String>,
}

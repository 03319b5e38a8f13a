use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::password::{PasswordError, PasswordHasher};
use super::token::SessionTokens;
use crate::domain::{normalize_email, Company, CompanyId, User, UserId, UserProfile};
use crate::error::ApiError;
use crate::store::{NewAccount, Store};

const MIN_PASSWORD_CHARS: usize = 8;
const DECOY_PASSWORD: &str = "hireboard-decoy-password";

/// Identity and tenant resolved for one request. Every tenant-scoped operation takes
/// this by value; there is no ambient "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantContext {
    pub user_id: UserId,
    pub company_id: CompanyId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Authenticated user plus the freshly issued token for the cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
}

/// Credential checks and per-request session resolution.
pub struct AccessGate<S> {
    store: Arc<S>,
    hasher: PasswordHasher,
    tokens: SessionTokens,
    decoy_hash: String,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

impl<S> AccessGate<S>
where
    S: Store + 'static,
{
    pub fn new(
        store: Arc<S>,
        hasher: PasswordHasher,
        tokens: SessionTokens,
    ) -> Result<Self, PasswordError> {
        let decoy_hash = hasher.hash(DECOY_PASSWORD)?;
        Ok(Self {
            store,
            hasher,
            tokens,
            decoy_hash,
        })
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    /// Creates the user and the company they own in one store write.
    pub fn signup(&self, request: SignupRequest) -> Result<Session, ApiError> {
        let (Some(email), Some(password), Some(first_name), Some(last_name), Some(company_name)) = (
            present(request.email),
            request.password.filter(|password| !password.is_empty()),
            present(request.first_name),
            present(request.last_name),
            present(request.company_name),
        ) else {
            return Err(ApiError::validation("Missing required fields"));
        };

        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ApiError::validation(
                "Password must be at least 8 characters",
            ));
        }

        let email = normalize_email(&email);
        if self.store.user_by_email(&email)?.is_some() {
            tracing::info!("signup rejected: email already registered");
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let password_hash = self.hasher.hash(&password).map_err(ApiError::unexpected)?;
        let account = NewAccount::new(
            email,
            password_hash,
            first_name,
            last_name,
            company_name,
            Utc::now(),
        );
        let profile = account.user().profile();
        let company_id = account.company().id;

        // The pre-check above can race; the store's uniqueness check is authoritative.
        self.store.create_account(account)?;

        let token = self.tokens.issue(profile.id).map_err(ApiError::unexpected)?;
        tracing::info!(user_id = %profile.id, company_id = %company_id, "account created");
        Ok(Session {
            user: profile,
            token,
        })
    }

    /// Unknown email and wrong password are indistinguishable to the caller, and both
    /// pay for one hash verification.
    pub fn login(&self, request: LoginRequest) -> Result<Session, ApiError> {
        let (Some(email), Some(password)) = (
            present(request.email),
            request.password.filter(|password| !password.is_empty()),
        ) else {
            return Err(ApiError::validation("Email and password required"));
        };

        let email = normalize_email(&email);
        let user = self.store.user_by_email(&email)?;
        let stored_hash = user
            .as_ref()
            .map_or(self.decoy_hash.as_str(), |user| user.password_hash.as_str());
        let verified = self.hasher.verify(&password, stored_hash);

        let user = match user {
            Some(user) if verified => user,
            _ => {
                tracing::info!("login rejected");
                return Err(ApiError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(user.id).map_err(ApiError::unexpected)?;
        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(Session {
            user: user.profile(),
            token,
        })
    }

    /// Steps one and two of the gate: a present, valid session token.
    pub fn authenticate(&self, token: Option<&str>) -> Result<UserId, ApiError> {
        token
            .and_then(|token| self.tokens.verify(token))
            .ok_or(ApiError::Unauthenticated)
    }

    /// Resolves the company owned by an authenticated user.
    pub fn resolve_tenant(&self, user_id: UserId) -> Result<TenantContext, ApiError> {
        match self.store.company_owned_by(user_id)? {
            Some(company) => Ok(TenantContext {
                user_id,
                company_id: company.id,
            }),
            None => {
                tracing::warn!(user_id = %user_id, "authenticated user owns no company");
                Err(ApiError::NoCompany)
            }
        }
    }

    pub fn authorize(&self, token: Option<&str>) -> Result<TenantContext, ApiError> {
        let user_id = self.authenticate(token)?;
        self.resolve_tenant(user_id)
    }

    /// Public user fields and owned company for an authenticated user. A token that
    /// outlived its account is treated as unauthenticated.
    pub fn profile(&self, user_id: UserId) -> Result<(UserProfile, Option<Company>), ApiError> {
        let user: User = self
            .store
            .user(user_id)?
            .ok_or(ApiError::Unauthenticated)?;
        let company = self.store.company_owned_by(user_id)?;
        Ok((user.profile(), company))
    }
}

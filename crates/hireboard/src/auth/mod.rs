//! Authentication and tenant resolution.
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`token`]: signed, time-bounded session tokens
//! - [`cookie`]: the `auth_token` cookie that carries a session
//! - [`gate`]: signup, login, and per-request tenant resolution

pub mod cookie;
pub mod gate;
pub mod password;
pub mod token;

pub use cookie::{session_token, SessionCookie, SESSION_COOKIE};
pub use gate::{AccessGate, LoginRequest, Session, SignupRequest, TenantContext};
pub use password::{PasswordCost, PasswordError, PasswordHasher};
pub use token::{SessionTokens, TokenError};

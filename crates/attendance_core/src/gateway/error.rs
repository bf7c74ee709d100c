//! Structured gateway failure.
//!
//! # Invariants
//! - `Display` renders the gateway message verbatim; callers never
//!   reclassify or reword it.
//! - `code` carries the machine-readable family when one is known
//!   (auth error codes or Postgres-style SQLSTATE values).

use crate::db::DbError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Known error codes emitted by gateway implementations in this crate.
pub mod codes {
    pub const INVALID_CREDENTIALS: &str = "invalid_credentials";
    pub const USER_ALREADY_EXISTS: &str = "user_already_exists";
    pub const WEAK_PASSWORD: &str = "weak_password";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_ADMIN: &str = "not_admin";
    pub const USER_NOT_FOUND: &str = "user_not_found";
    pub const INVALID_DATA: &str = "invalid_data";
    pub const INTERNAL: &str = "internal";
    pub const INSUFFICIENT_PRIVILEGE: &str = "42501";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const CHECK_VIOLATION: &str = "23514";
    pub const NOT_NULL_VIOLATION: &str = "23502";
}

/// Failure returned by any gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub code: Option<String>,
    pub message: String,
}

impl GatewayError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Failure without a machine-readable code (e.g. transport errors).
    pub fn uncoded(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Insert rejected by row-level ownership rules.
    pub fn row_level_security(table: &str) -> Self {
        Self::new(
            codes::INSUFFICIENT_PRIVILEGE,
            format!("new row violates row-level security policy for table \"{table}\""),
        )
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_DATA, message)
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for GatewayError {}

impl From<rusqlite::Error> for GatewayError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                let code = match failure.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => codes::FOREIGN_KEY_VIOLATION,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => codes::UNIQUE_VIOLATION,
                    rusqlite::ffi::SQLITE_CONSTRAINT_CHECK => codes::CHECK_VIOLATION,
                    rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL => codes::NOT_NULL_VIOLATION,
                    _ => codes::INTERNAL,
                };
                let message = message.clone().unwrap_or_else(|| value.to_string());
                Self::new(code, message)
            }
            _ => Self::new(codes::INTERNAL, value.to_string()),
        }
    }
}

impl From<DbError> for GatewayError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::new(codes::INTERNAL, other.to_string()),
        }
    }
}

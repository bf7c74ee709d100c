//! Account, credential and client-session persistence for the SQLite gateway.
//!
//! # Invariants
//! - Emails are stored trimmed and lower-cased.
//! - Passwords are only ever persisted as Argon2 PHC strings.
//! - At most one client session row exists (`slot = 1`).

use super::now_epoch_ms;
use crate::gateway::{codes, GatewayError, GatewayResult};
use crate::model::identity::UserId;
use crate::model::session::{AuthUser, Session};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use rand_core::OsRng;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub(crate) const MIN_PASSWORD_CHARS: usize = 6;

/// Stored account row needed to verify a password outside the connection lock.
pub(super) struct StoredAccount {
    pub user: AuthUser,
    pub password_hash: String,
}

pub(super) fn normalize_email(raw: &str) -> GatewayResult<String> {
    let email = raw.trim().to_ascii_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(GatewayError::new(
            codes::VALIDATION_FAILED,
            "Unable to validate email address: invalid format",
        ));
    }
    Ok(email)
}

pub(super) fn check_password_strength(password: &str) -> GatewayResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(GatewayError::new(
            codes::WEAK_PASSWORD,
            format!("Password should be at least {MIN_PASSWORD_CHARS} characters."),
        ));
    }
    Ok(())
}

pub(super) fn hash_password(password: &str) -> GatewayResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| GatewayError::new(codes::INTERNAL, format!("password hashing failed: {err}")))
}

pub(super) fn verify_password(password: &str, stored_hash: &str) -> GatewayResult<()> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| {
        GatewayError::invalid_data("invalid password hash in auth_users.password_hash")
    })?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| invalid_credentials())
}

pub(super) fn invalid_credentials() -> GatewayError {
    GatewayError::new(codes::INVALID_CREDENTIALS, "Invalid login credentials")
}

pub(super) fn create_account(
    conn: &Connection,
    email: &str,
    password_hash: &str,
) -> GatewayResult<AuthUser> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM auth_users WHERE email = ?1);",
        [email],
        |row| row.get(0),
    )?;
    if exists {
        return Err(GatewayError::new(
            codes::USER_ALREADY_EXISTS,
            "User already registered",
        ));
    }

    let user = AuthUser {
        id: Uuid::new_v4(),
        email: email.to_string(),
    };
    let now = now_epoch_ms();
    conn.execute(
        "INSERT INTO auth_users (id, email, password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4);",
        params![user.id.to_string(), user.email.as_str(), password_hash, now],
    )?;
    Ok(user)
}

pub(super) fn find_account(conn: &Connection, email: &str) -> GatewayResult<Option<StoredAccount>> {
    let row = conn
        .query_row(
            "SELECT id, email, password_hash FROM auth_users WHERE email = ?1;",
            [email],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, email, password_hash)| {
        Ok(StoredAccount {
            user: AuthUser {
                id: parse_user_id(&id, "auth_users.id")?,
                email,
            },
            password_hash,
        })
    })
    .transpose()
}

/// Replaces the persisted client session with a fresh one for `user`.
pub(super) fn start_session(conn: &Connection, user: AuthUser) -> GatewayResult<Session> {
    let session = Session {
        access_token: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
        user,
        created_at: now_epoch_ms(),
    };
    conn.execute(
        "INSERT OR REPLACE INTO client_session (slot, access_token, user_id, created_at)
         VALUES (1, ?1, ?2, ?3);",
        params![
            session.access_token.as_str(),
            session.user.id.to_string(),
            session.created_at
        ],
    )?;
    Ok(session)
}

pub(super) fn current_session(conn: &Connection) -> GatewayResult<Option<Session>> {
    let row = conn
        .query_row(
            "SELECT s.access_token, s.created_at, u.id, u.email
             FROM client_session s
             JOIN auth_users u ON u.id = s.user_id
             WHERE s.slot = 1;",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(access_token, created_at, id, email)| {
        Ok(Session {
            access_token,
            user: AuthUser {
                id: parse_user_id(&id, "client_session.user_id")?,
                email,
            },
            created_at,
        })
    })
    .transpose()
}

/// Id of the signed-in account, used as the row-ownership principal.
pub(super) fn current_user_id(conn: &Connection) -> GatewayResult<Option<UserId>> {
    Ok(current_session(conn)?.map(|session| session.user.id))
}

/// Removes the client session. Returns whether one existed.
pub(super) fn end_session(conn: &Connection) -> GatewayResult<bool> {
    let removed = conn.execute("DELETE FROM client_session WHERE slot = 1;", [])?;
    Ok(removed > 0)
}

/// Deletes an account; owned rows and its session cascade.
pub(super) fn delete_account(conn: &Connection, user_id: UserId) -> GatewayResult<()> {
    let removed = conn.execute(
        "DELETE FROM auth_users WHERE id = ?1;",
        [user_id.to_string()],
    )?;
    if removed == 0 {
        return Err(GatewayError::new(codes::USER_NOT_FOUND, "User not found"));
    }
    Ok(())
}

pub(super) fn parse_user_id(value: &str, column: &str) -> GatewayResult<UserId> {
    Uuid::parse_str(value)
        .map_err(|_| GatewayError::invalid_data(format!("invalid uuid value `{value}` in {column}")))
}

#[cfg(test)]
mod tests {
    use super::{check_password_strength, hash_password, normalize_email, verify_password};
    use crate::gateway::codes;

    #[test]
    fn normalize_email_lowercases_and_validates() {
        assert_eq!(
            normalize_email("  Student@Example.COM ").unwrap(),
            "student@example.com"
        );
        let err = normalize_email("not-an-email").unwrap_err();
        assert!(err.has_code(codes::VALIDATION_FAILED));
    }

    #[test]
    fn short_passwords_are_rejected() {
        let err = check_password_strength("12345").unwrap_err();
        assert!(err.has_code(codes::WEAK_PASSWORD));
        assert!(check_password_strength("123456").is_ok());
    }

    #[test]
    fn hashed_password_verifies_only_with_original() {
        let hash = hash_password("correct horse").unwrap();
        assert!(!hash.contains("correct horse"));
        assert!(verify_password("correct horse", &hash).is_ok());
        let err = verify_password("battery staple", &hash).unwrap_err();
        assert!(err.has_code(codes::INVALID_CREDENTIALS));
    }
}

//! Identity (profile) record created alongside each account.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account identifier issued by the auth side of the gateway.
pub type UserId = Uuid;

/// Per-account profile row.
///
/// Exactly one exists per registered account; `id` equals the account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub roll_number: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert shape for [`Identity`]; timestamps are assigned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIdentity {
    pub id: UserId,
    pub roll_number: String,
}

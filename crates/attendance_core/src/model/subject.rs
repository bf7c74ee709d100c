//! Subject definitions owned by one account.
//!
//! # Invariants
//! - `attendance_threshold` defaults to [`DEFAULT_ATTENDANCE_THRESHOLD`] when
//!   omitted on insert.
//! - Threshold bounds (`0..=100`) are a form concern and are not checked here.

use crate::model::identity::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type SubjectId = Uuid;

/// Threshold (percent) applied when a subject is created without one.
pub const DEFAULT_ATTENDANCE_THRESHOLD: i32 = 75;

/// Session format of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubjectKind {
    Lecture,
    Lab,
}

impl SubjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lecture => "LECTURE",
            Self::Lab => "LAB",
        }
    }
}

/// Unknown subject kind text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSubjectKind(pub String);

impl Display for UnknownSubjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown subject kind `{}`; expected LECTURE|LAB", self.0)
    }
}

impl Error for UnknownSubjectKind {}

impl FromStr for SubjectKind {
    type Err = UnknownSubjectKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LECTURE" => Ok(Self::Lecture),
            "LAB" => Ok(Self::Lab),
            _ => Err(UnknownSubjectKind(value.trim().to_string())),
        }
    }
}

impl Display for SubjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Persisted subject row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    /// Serialized as `type` to match the remote column name.
    #[serde(rename = "type")]
    pub kind: SubjectKind,
    pub attendance_threshold: i32,
    pub user_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Subject data supplied by a caller; the owner is attached by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubject {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SubjectKind,
    pub attendance_threshold: Option<i32>,
}

impl NewSubject {
    pub fn new(name: impl Into<String>, kind: SubjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attendance_threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: i32) -> Self {
        self.attendance_threshold = Some(threshold);
        self
    }

    /// Attaches the owning account, producing the gateway insert row.
    pub fn owned_by(self, user_id: UserId) -> SubjectInsert {
        SubjectInsert {
            name: self.name,
            kind: self.kind,
            attendance_threshold: self.attendance_threshold,
            user_id,
        }
    }
}

/// Insert row for the `subjects` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInsert {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SubjectKind,
    pub attendance_threshold: Option<i32>,
    pub user_id: UserId,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<SubjectKind>,
    pub attendance_threshold: Option<i32>,
}

impl SubjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.attendance_threshold.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{NewSubject, SubjectKind, SubjectPatch};
    use uuid::Uuid;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("lab".parse::<SubjectKind>().unwrap(), SubjectKind::Lab);
        assert_eq!(" Lecture ".parse::<SubjectKind>().unwrap(), SubjectKind::Lecture);
        assert!("seminar".parse::<SubjectKind>().is_err());
    }

    #[test]
    fn owned_by_keeps_threshold_unset_when_omitted() {
        let owner = Uuid::new_v4();
        let insert = NewSubject::new("Algorithms", SubjectKind::Lecture).owned_by(owner);
        assert_eq!(insert.user_id, owner);
        assert_eq!(insert.attendance_threshold, None);
    }

    #[test]
    fn default_patch_is_empty() {
        assert!(SubjectPatch::default().is_empty());
        let patch = SubjectPatch {
            attendance_threshold: Some(80),
            ..SubjectPatch::default()
        };
        assert!(!patch.is_empty());
    }
}

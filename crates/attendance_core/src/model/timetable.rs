//! Weekly timetable entries and their subject-joined read shape.
//!
//! # Invariants
//! - `day_of_week` counts from Sunday (`0`) to Saturday (`6`).
//! - `start_time < end_time` is expected but not enforced.
//! - Occupancy uses half-open `[start_time, end_time)` intervals.

use crate::model::identity::UserId;
use crate::model::subject::{SubjectId, SubjectKind};
use crate::model::time_of_day::TimeOfDay;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TimetableEntryId = Uuid;

/// Persisted timetable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: TimetableEntryId,
    pub subject_id: SubjectId,
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub user_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TimetableEntry {
    /// Returns whether this entry covers the slot starting at `slot_start` on `day`.
    pub fn occupies(&self, day: u8, slot_start: TimeOfDay) -> bool {
        self.day_of_week == day && self.start_time <= slot_start && self.end_time > slot_start
    }
}

impl AsRef<TimetableEntry> for TimetableEntry {
    fn as_ref(&self) -> &TimetableEntry {
        self
    }
}

/// Subject columns embedded into each fetched entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub id: SubjectId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SubjectKind,
}

/// Timetable entry joined with its subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    #[serde(flatten)]
    pub entry: TimetableEntry,
    pub subject: SubjectSummary,
}

impl AsRef<TimetableEntry> for ScheduledEntry {
    fn as_ref(&self) -> &TimetableEntry {
        &self.entry
    }
}

/// Entry data supplied by a caller; the owner is attached by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimetableEntry {
    pub subject_id: SubjectId,
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl NewTimetableEntry {
    pub fn owned_by(self, user_id: UserId) -> TimetableEntryInsert {
        TimetableEntryInsert {
            subject_id: self.subject_id,
            day_of_week: self.day_of_week,
            start_time: self.start_time,
            end_time: self.end_time,
            user_id,
        }
    }
}

/// Insert row for the `timetable_entries` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntryInsert {
    pub subject_id: SubjectId,
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub user_id: UserId,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntryPatch {
    pub subject_id: Option<SubjectId>,
    pub day_of_week: Option<u8>,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
}

impl TimetableEntryPatch {
    pub fn is_empty(&self) -> bool {
        self.subject_id.is_none()
            && self.day_of_week.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{ScheduledEntry, SubjectSummary, TimetableEntry};
    use crate::model::subject::SubjectKind;
    use crate::model::time_of_day::TimeOfDay;
    use uuid::Uuid;

    fn scheduled(start: &str, end: &str) -> ScheduledEntry {
        let subject_id = Uuid::new_v4();
        ScheduledEntry {
            entry: TimetableEntry {
                id: Uuid::new_v4(),
                subject_id,
                day_of_week: 2,
                start_time: start.parse().unwrap(),
                end_time: end.parse().unwrap(),
                user_id: Uuid::new_v4(),
                created_at: 1,
                updated_at: 1,
            },
            subject: SubjectSummary {
                id: subject_id,
                name: "Operating Systems".to_string(),
                kind: SubjectKind::Lecture,
            },
        }
    }

    #[test]
    fn occupancy_is_half_open() {
        let entry = scheduled("09:00", "10:30").entry;
        assert!(entry.occupies(2, TimeOfDay::from_hm(9, 0).unwrap()));
        assert!(entry.occupies(2, TimeOfDay::from_hm(10, 0).unwrap()));
        assert!(!entry.occupies(2, TimeOfDay::from_hm(10, 30).unwrap()));
        assert!(!entry.occupies(3, TimeOfDay::from_hm(9, 0).unwrap()));
    }

    #[test]
    fn json_shape_flattens_entry_and_names_subject_type() {
        let value = serde_json::to_value(scheduled("09:00", "10:00:30")).unwrap();
        assert_eq!(value["day_of_week"], 2);
        assert_eq!(value["start_time"], "09:00");
        assert_eq!(value["end_time"], "10:00:30");
        assert_eq!(value["subject"]["type"], "LECTURE");
        assert_eq!(value["subject"]["name"], "Operating Systems");
        assert!(value.get("entry").is_none());
    }
}

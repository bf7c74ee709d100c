//! Owner-scoped SQL for `profiles`, `subjects` and `timetable_entries`.
//!
//! # Invariants
//! - Every statement is filtered by the signed-in owner; with no owner,
//!   reads return nothing and writes touch nothing.
//! - Inserts whose owner differs from the signed-in account are rejected as
//!   row-level security violations, as are timetable writes pointing at a
//!   subject the account does not own.
//! - Updates and deletes of unknown or foreign ids succeed with no effect.
//! - Read paths reject malformed persisted values instead of masking them.

use super::now_epoch_ms;
use crate::gateway::{EntryOrder, GatewayError, GatewayResult, SubjectOrder};
use crate::model::identity::{Identity, NewIdentity, UserId};
use crate::model::subject::{
    Subject, SubjectId, SubjectInsert, SubjectKind, SubjectPatch, DEFAULT_ATTENDANCE_THRESHOLD,
};
use crate::model::time_of_day::TimeOfDay;
use crate::model::timetable::{
    ScheduledEntry, SubjectSummary, TimetableEntry, TimetableEntryId, TimetableEntryInsert,
    TimetableEntryPatch,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const SUBJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    type,
    attendance_threshold,
    user_id,
    created_at,
    updated_at
FROM subjects";

const ENTRY_SELECT_SQL: &str = "SELECT
    t.id,
    t.subject_id,
    t.day_of_week,
    t.start_time,
    t.end_time,
    t.user_id,
    t.created_at,
    t.updated_at,
    s.name AS subject_name,
    s.type AS subject_type
FROM timetable_entries t
JOIN subjects s ON s.id = t.subject_id AND s.user_id = t.user_id";

pub(super) fn insert_profile(
    conn: &Connection,
    owner: Option<UserId>,
    profile: &NewIdentity,
) -> GatewayResult<()> {
    if owner != Some(profile.id) {
        return Err(GatewayError::row_level_security("profiles"));
    }

    let now = now_epoch_ms();
    conn.execute(
        "INSERT INTO profiles (id, roll_number, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3);",
        params![profile.id.to_string(), profile.roll_number.as_str(), now],
    )?;
    Ok(())
}

pub(super) fn select_profile(
    conn: &Connection,
    owner: Option<UserId>,
    id: UserId,
) -> GatewayResult<Option<Identity>> {
    if owner != Some(id) {
        return Ok(None);
    }

    let row = conn
        .query_row(
            "SELECT id, roll_number, created_at, updated_at FROM profiles WHERE id = ?1;",
            [id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, roll_number, created_at, updated_at)| {
        Ok(Identity {
            id: parse_uuid(&id, "profiles.id")?,
            roll_number,
            created_at,
            updated_at,
        })
    })
    .transpose()
}

pub(super) fn select_subjects(
    conn: &Connection,
    owner: Option<UserId>,
    order_by: &[SubjectOrder],
) -> GatewayResult<Vec<Subject>> {
    let Some(owner) = owner else {
        return Ok(Vec::new());
    };

    let mut ordering = order_by
        .iter()
        .map(|order| match order {
            SubjectOrder::Name => "name COLLATE NOCASE ASC, name ASC",
        })
        .collect::<Vec<_>>();
    ordering.push("id ASC");

    let sql = format!(
        "{SUBJECT_SELECT_SQL} WHERE user_id = ?1 ORDER BY {};",
        ordering.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([owner.to_string()])?;
    let mut subjects = Vec::new();
    while let Some(row) = rows.next()? {
        subjects.push(parse_subject_row(row)?);
    }
    Ok(subjects)
}

pub(super) fn insert_subject(
    conn: &Connection,
    owner: Option<UserId>,
    row: &SubjectInsert,
) -> GatewayResult<()> {
    if owner != Some(row.user_id) {
        return Err(GatewayError::row_level_security("subjects"));
    }

    let now = now_epoch_ms();
    conn.execute(
        "INSERT INTO subjects (
            id,
            name,
            type,
            attendance_threshold,
            user_id,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
        params![
            Uuid::new_v4().to_string(),
            row.name.as_str(),
            row.kind.as_str(),
            row.attendance_threshold
                .unwrap_or(DEFAULT_ATTENDANCE_THRESHOLD),
            row.user_id.to_string(),
            now,
        ],
    )?;
    Ok(())
}

pub(super) fn update_subject(
    conn: &Connection,
    owner: Option<UserId>,
    id: SubjectId,
    patch: &SubjectPatch,
) -> GatewayResult<()> {
    let Some(owner) = owner else {
        return Ok(());
    };
    if patch.is_empty() {
        return Ok(());
    }

    let mut assignments = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(name) = &patch.name {
        assignments.push("name = ?");
        bind_values.push(Value::Text(name.clone()));
    }
    if let Some(kind) = patch.kind {
        assignments.push("type = ?");
        bind_values.push(Value::Text(kind.as_str().to_string()));
    }
    if let Some(threshold) = patch.attendance_threshold {
        assignments.push("attendance_threshold = ?");
        bind_values.push(Value::Integer(i64::from(threshold)));
    }

    execute_owned_update(conn, "subjects", assignments, bind_values, id, owner)
}

pub(super) fn delete_subject(
    conn: &Connection,
    owner: Option<UserId>,
    id: SubjectId,
) -> GatewayResult<()> {
    execute_owned_delete(conn, "subjects", id, owner)
}

pub(super) fn select_timetable_entries(
    conn: &Connection,
    owner: Option<UserId>,
    order_by: &[EntryOrder],
) -> GatewayResult<Vec<ScheduledEntry>> {
    let Some(owner) = owner else {
        return Ok(Vec::new());
    };

    let mut ordering = order_by
        .iter()
        .map(|order| match order {
            EntryOrder::DayOfWeek => "t.day_of_week ASC",
            EntryOrder::StartTime => "t.start_time ASC",
        })
        .collect::<Vec<_>>();
    ordering.push("t.id ASC");

    let sql = format!(
        "{ENTRY_SELECT_SQL} WHERE t.user_id = ?1 ORDER BY {};",
        ordering.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([owner.to_string()])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_scheduled_row(row)?);
    }
    Ok(entries)
}

pub(super) fn insert_timetable_entry(
    conn: &Connection,
    owner: Option<UserId>,
    row: &TimetableEntryInsert,
) -> GatewayResult<()> {
    if owner != Some(row.user_id) {
        return Err(GatewayError::row_level_security("timetable_entries"));
    }
    ensure_subject_owned(conn, row.user_id, row.subject_id)?;

    let now = now_epoch_ms();
    conn.execute(
        "INSERT INTO timetable_entries (
            id,
            subject_id,
            day_of_week,
            start_time,
            end_time,
            user_id,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
        params![
            Uuid::new_v4().to_string(),
            row.subject_id.to_string(),
            i64::from(row.day_of_week),
            row.start_time.to_storage_string(),
            row.end_time.to_storage_string(),
            row.user_id.to_string(),
            now,
        ],
    )?;
    Ok(())
}

pub(super) fn update_timetable_entry(
    conn: &Connection,
    owner: Option<UserId>,
    id: TimetableEntryId,
    patch: &TimetableEntryPatch,
) -> GatewayResult<()> {
    let Some(owner) = owner else {
        return Ok(());
    };
    if patch.is_empty() {
        return Ok(());
    }

    let mut assignments = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(subject_id) = patch.subject_id {
        ensure_subject_owned(conn, owner, subject_id)?;
        assignments.push("subject_id = ?");
        bind_values.push(Value::Text(subject_id.to_string()));
    }
    if let Some(day) = patch.day_of_week {
        assignments.push("day_of_week = ?");
        bind_values.push(Value::Integer(i64::from(day)));
    }
    if let Some(start_time) = patch.start_time {
        assignments.push("start_time = ?");
        bind_values.push(Value::Text(start_time.to_storage_string()));
    }
    if let Some(end_time) = patch.end_time {
        assignments.push("end_time = ?");
        bind_values.push(Value::Text(end_time.to_storage_string()));
    }

    execute_owned_update(
        conn,
        "timetable_entries",
        assignments,
        bind_values,
        id,
        owner,
    )
}

pub(super) fn delete_timetable_entry(
    conn: &Connection,
    owner: Option<UserId>,
    id: TimetableEntryId,
) -> GatewayResult<()> {
    execute_owned_delete(conn, "timetable_entries", id, owner)
}

/// Entries may only reference subjects of the same owner.
fn ensure_subject_owned(
    conn: &Connection,
    owner: UserId,
    subject_id: SubjectId,
) -> GatewayResult<()> {
    let owned: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM subjects WHERE id = ?1 AND user_id = ?2);",
        params![subject_id.to_string(), owner.to_string()],
        |row| row.get(0),
    )?;
    if owned {
        Ok(())
    } else {
        Err(GatewayError::row_level_security("timetable_entries"))
    }
}

fn execute_owned_update(
    conn: &Connection,
    table: &'static str,
    mut assignments: Vec<&'static str>,
    mut bind_values: Vec<Value>,
    id: Uuid,
    owner: UserId,
) -> GatewayResult<()> {
    assignments.push("updated_at = ?");
    bind_values.push(Value::Integer(now_epoch_ms()));
    bind_values.push(Value::Text(id.to_string()));
    bind_values.push(Value::Text(owner.to_string()));

    let sql = format!(
        "UPDATE {table} SET {} WHERE id = ? AND user_id = ?;",
        assignments.join(", ")
    );
    conn.execute(&sql, params_from_iter(bind_values))?;
    Ok(())
}

fn execute_owned_delete(
    conn: &Connection,
    table: &'static str,
    id: Uuid,
    owner: Option<UserId>,
) -> GatewayResult<()> {
    let Some(owner) = owner else {
        return Ok(());
    };
    conn.execute(
        &format!("DELETE FROM {table} WHERE id = ?1 AND user_id = ?2;"),
        params![id.to_string(), owner.to_string()],
    )?;
    Ok(())
}

fn parse_subject_row(row: &Row<'_>) -> GatewayResult<Subject> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("user_id")?;
    let kind_text: String = row.get("type")?;
    let threshold: i64 = row.get("attendance_threshold")?;

    Ok(Subject {
        id: parse_uuid(&id_text, "subjects.id")?,
        name: row.get("name")?,
        kind: parse_kind(&kind_text, "subjects.type")?,
        attendance_threshold: i32::try_from(threshold).map_err(|_| {
            GatewayError::invalid_data(format!(
                "invalid attendance threshold `{threshold}` in subjects.attendance_threshold"
            ))
        })?,
        user_id: parse_uuid(&owner_text, "subjects.user_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_scheduled_row(row: &Row<'_>) -> GatewayResult<ScheduledEntry> {
    let id_text: String = row.get("id")?;
    let subject_text: String = row.get("subject_id")?;
    let owner_text: String = row.get("user_id")?;
    let day: i64 = row.get("day_of_week")?;
    let start_text: String = row.get("start_time")?;
    let end_text: String = row.get("end_time")?;
    let subject_kind: String = row.get("subject_type")?;

    let subject_id = parse_uuid(&subject_text, "timetable_entries.subject_id")?;
    let entry = TimetableEntry {
        id: parse_uuid(&id_text, "timetable_entries.id")?,
        subject_id,
        day_of_week: u8::try_from(day).map_err(|_| {
            GatewayError::invalid_data(format!(
                "invalid day `{day}` in timetable_entries.day_of_week"
            ))
        })?,
        start_time: parse_time(&start_text, "timetable_entries.start_time")?,
        end_time: parse_time(&end_text, "timetable_entries.end_time")?,
        user_id: parse_uuid(&owner_text, "timetable_entries.user_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };

    Ok(ScheduledEntry {
        entry,
        subject: SubjectSummary {
            id: subject_id,
            name: row.get("subject_name")?,
            kind: parse_kind(&subject_kind, "subjects.type")?,
        },
    })
}

fn parse_uuid(value: &str, column: &str) -> GatewayResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| GatewayError::invalid_data(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_kind(value: &str, column: &str) -> GatewayResult<SubjectKind> {
    match value {
        "LECTURE" => Ok(SubjectKind::Lecture),
        "LAB" => Ok(SubjectKind::Lab),
        other => Err(GatewayError::invalid_data(format!(
            "invalid subject type `{other}` in {column}"
        ))),
    }
}

fn parse_time(value: &str, column: &str) -> GatewayResult<TimeOfDay> {
    value.parse().map_err(|_| {
        GatewayError::invalid_data(format!("invalid time value `{value}` in {column}"))
    })
}

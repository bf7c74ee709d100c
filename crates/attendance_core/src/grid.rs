//! Weekly grid projection of timetable entries.
//!
//! Pure derivations recomputed per render; nothing is cached. Cells use
//! half-open `[start_time, end_time)` occupancy, so an entry ending exactly
//! at a slot boundary does not occupy that slot and a zero-length entry
//! occupies none.

use crate::model::time_of_day::TimeOfDay;
use crate::model::timetable::TimetableEntry;

/// Day labels indexed by `day_of_week`.
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub fn day_name(day: u8) -> Option<&'static str> {
    DAY_NAMES.get(usize::from(day)).copied()
}

/// The 24 slot starts `00:00`, `01:00`, ..., `23:00`.
pub fn hourly_slots() -> Vec<TimeOfDay> {
    (0..24).filter_map(|hour| TimeOfDay::from_hm(hour, 0)).collect()
}

/// Entries occupying the cell at (`day`, `slot_start`), in input order.
pub fn cell_occupants<T: AsRef<TimetableEntry>>(
    entries: &[T],
    day: u8,
    slot_start: TimeOfDay,
) -> Vec<&T> {
    entries
        .iter()
        .filter(|entry| entry.as_ref().occupies(day, slot_start))
        .collect()
}

/// One time-slot row of the week grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow<'a, T> {
    pub slot: TimeOfDay,
    /// Occupants per day, indexed by `day_of_week`.
    pub cells: [Vec<&'a T>; 7],
}

impl<T> GridRow<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }
}

/// Slot-by-day projection of a timetable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekGrid<'a, T> {
    pub rows: Vec<GridRow<'a, T>>,
}

impl<'a, T> WeekGrid<'a, T> {
    /// Rows with at least one occupied cell.
    pub fn occupied_rows(&self) -> impl Iterator<Item = &GridRow<'a, T>> {
        self.rows.iter().filter(|row| !row.is_empty())
    }
}

/// Projects entries onto `slots` x seven days.
pub fn project_week<'a, T: AsRef<TimetableEntry>>(
    entries: &'a [T],
    slots: &[TimeOfDay],
) -> WeekGrid<'a, T> {
    let rows = slots
        .iter()
        .map(|&slot| GridRow {
            slot,
            cells: std::array::from_fn(|day| {
                let day = u8::try_from(day).unwrap_or(u8::MAX);
                cell_occupants(entries, day, slot)
            }),
        })
        .collect();
    WeekGrid { rows }
}

#[cfg(test)]
mod tests {
    use super::{cell_occupants, day_name, hourly_slots, project_week};
    use crate::model::time_of_day::TimeOfDay;
    use crate::model::timetable::TimetableEntry;
    use uuid::Uuid;

    fn entry(day: u8, start: &str, end: &str) -> TimetableEntry {
        TimetableEntry {
            id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            day_of_week: day,
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            user_id: Uuid::new_v4(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn at(raw: &str) -> TimeOfDay {
        raw.parse().unwrap()
    }

    #[test]
    fn occupancy_is_half_open() {
        let entries = vec![entry(1, "09:00", "10:00")];
        assert_eq!(cell_occupants(&entries, 1, at("09:00")).len(), 1);
        assert_eq!(cell_occupants(&entries, 1, at("09:59:59")).len(), 1);
        assert!(cell_occupants(&entries, 1, at("10:00")).is_empty());
        assert!(cell_occupants(&entries, 1, at("08:59")).is_empty());
        assert!(cell_occupants(&entries, 2, at("09:00")).is_empty());
    }

    #[test]
    fn degenerate_entry_occupies_nothing() {
        let entries = vec![entry(3, "11:00", "11:00")];
        for slot in hourly_slots() {
            for day in 0..7 {
                assert!(cell_occupants(&entries, day, slot).is_empty());
            }
        }
    }

    #[test]
    fn occupants_match_brute_force_filter() {
        let entries = vec![
            entry(0, "08:00", "10:00"),
            entry(0, "09:30", "11:00"),
            entry(4, "13:00", "15:30"),
            entry(4, "15:00", "14:00"),
            entry(6, "00:00", "23:59"),
        ];

        for day in 0..7u8 {
            for slot in hourly_slots() {
                let expected = entries
                    .iter()
                    .filter(|e| e.day_of_week == day && e.start_time <= slot && slot < e.end_time)
                    .map(|e| e.id)
                    .collect::<Vec<_>>();
                let actual = cell_occupants(&entries, day, slot)
                    .into_iter()
                    .map(|e| e.id)
                    .collect::<Vec<_>>();
                assert_eq!(actual, expected, "day {day} slot {slot}");
            }
        }
    }

    #[test]
    fn project_week_spreads_entries_over_rows_and_days() {
        let entries = vec![entry(1, "09:00", "11:00"), entry(5, "14:00", "15:00")];
        let grid = project_week(&entries, &hourly_slots());

        assert_eq!(grid.rows.len(), 24);
        let occupied = grid
            .occupied_rows()
            .map(|row| row.slot.to_string())
            .collect::<Vec<_>>();
        assert_eq!(occupied, vec!["09:00", "10:00", "14:00"]);
        assert_eq!(grid.rows[9].cells[1].len(), 1);
        assert!(grid.rows[9].cells[5].is_empty());
        assert_eq!(grid.rows[14].cells[5][0].id, entries[1].id);
    }

    #[test]
    fn day_names_start_on_sunday() {
        assert_eq!(day_name(0), Some("Sunday"));
        assert_eq!(day_name(6), Some("Saturday"));
        assert_eq!(day_name(7), None);
    }
}

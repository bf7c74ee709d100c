//! Core of the student attendance tracker.
//! Stores, gateway contract and weekly grid projection live here; views
//! render from store snapshots and never talk to the gateway directly.

pub mod config;
pub mod context;
pub mod db;
pub mod gateway;
pub mod grid;
pub mod logging;
pub mod model;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use context::AppContext;
pub use gateway::sqlite::{GatewayOptions, SqliteGateway};
pub use gateway::{
    session_listener, AuthGateway, DataGateway, Gateway, GatewayError, GatewayResult,
    Subscription,
};
pub use grid::{cell_occupants, project_week, WeekGrid};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::session::{AuthChangeEvent, AuthUser, Session};
pub use model::subject::{NewSubject, Subject, SubjectKind, SubjectPatch};
pub use model::time_of_day::TimeOfDay;
pub use model::timetable::{NewTimetableEntry, ScheduledEntry, TimetableEntry, TimetableEntryPatch};
pub use store::{StoreError, StoreResult, StoreStatus};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

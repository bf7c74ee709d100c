//! Command-line surface for the attendance tracker.

use attendance_core::model::subject::SubjectId;
use attendance_core::model::timetable::TimetableEntryId;
use attendance_core::{SubjectKind, TimeOfDay};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Track subjects and a weekly timetable against a local store.
#[derive(Parser, Debug)]
#[command(name = "attendance", version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file (overrides ATTENDANCE_DB_PATH)
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error (overrides ATTENDANCE_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory for rolling log files (overrides ATTENDANCE_LOG_DIR)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Allow account deletion, needed to roll back a failed registration
    #[arg(long, global = true)]
    pub admin: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account with its roll number and sign in
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        roll_number: String,

        #[command(flatten)]
        password: PasswordArg,
    },

    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,

        #[command(flatten)]
        password: PasswordArg,
    },

    /// End the current session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Manage subjects
    Subjects {
        #[command(subcommand)]
        command: SubjectCommand,
    },

    /// Manage the weekly timetable
    Timetable {
        #[command(subcommand)]
        command: TimetableCommand,
    },
}

#[derive(Args, Debug)]
pub struct PasswordArg {
    /// Account password
    #[arg(long, env = "ATTENDANCE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum SubjectCommand {
    /// List subjects ordered by name
    List,

    /// Add a subject
    Add {
        name: String,

        /// LECTURE or LAB
        #[arg(long, default_value = "LECTURE")]
        kind: SubjectKind,

        /// Minimum attendance percentage (defaults to 75)
        #[arg(long)]
        threshold: Option<i32>,
    },

    /// Change fields of a subject
    Update {
        id: SubjectId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        kind: Option<SubjectKind>,

        #[arg(long)]
        threshold: Option<i32>,
    },

    /// Delete a subject
    Delete { id: SubjectId },
}

#[derive(Subcommand, Debug)]
pub enum TimetableCommand {
    /// List entries ordered by day, then start time
    List,

    /// Add a weekly slot for a subject
    Add {
        #[arg(long)]
        subject: SubjectId,

        /// 0 = Sunday ... 6 = Saturday
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6))]
        day: u8,

        /// HH:MM or HH:MM:SS
        #[arg(long)]
        start: TimeOfDay,

        #[arg(long)]
        end: TimeOfDay,
    },

    /// Change fields of an entry
    Update {
        id: TimetableEntryId,

        #[arg(long)]
        subject: Option<SubjectId>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6))]
        day: Option<u8>,

        #[arg(long)]
        start: Option<TimeOfDay>,

        #[arg(long)]
        end: Option<TimeOfDay>,
    },

    /// Delete an entry
    Delete { id: TimetableEntryId },

    /// Render the week as an hourly grid
    Grid {
        /// Include hours with no classes
        #[arg(long)]
        all: bool,
    },
}

//! `attendance` command-line client.
//!
//! # Responsibility
//! - Resolve configuration (environment first, then flags) and compose an
//!   [`AppContext`] over the local SQLite gateway.
//! - Run exactly one store operation per invocation and render the result.

mod cli;

use anyhow::{Context, Result};
use attendance_core::grid::{day_name, hourly_slots, project_week, DAY_NAMES};
use attendance_core::model::timetable::ScheduledEntry;
use attendance_core::{
    init_from_config, AppConfig, AppContext, Gateway, NewSubject,
    NewTimetableEntry, SubjectPatch, TimetableEntryPatch,
};
use clap::Parser;
use cli::{Cli, Command, SubjectCommand, TimetableCommand};
use log::info;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_from_config(&config).context("failed to start logging")?;

    let gateway: Arc<dyn Gateway> = Arc::new(
        config
            .open_gateway()
            .with_context(|| format!("failed to open `{}`", config.db_path.display()))?,
    );
    let context = AppContext::start(gateway).await?;
    info!("event=cli_start module=cli status=ok db_path={}", config.db_path.display());

    let outcome = run(&context, cli.command, cli.json).await;
    context.shutdown();
    outcome
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::from_env()?;
    if let Some(path) = &cli.db_path {
        config.db_path = path.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(absolute(dir)?);
    }
    if cli.admin {
        config.admin_privileges = true;
    }
    Ok(config)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    Ok(cwd.join(path))
}

async fn run(context: &AppContext, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Register {
            email,
            roll_number,
            password,
        } => {
            context
                .session()
                .sign_up(&email, &password.password, &roll_number)
                .await?;
            println!("registered {email}");
        }
        Command::Login { email, password } => {
            context.session().sign_in(&email, &password.password).await?;
            println!("signed in as {email}");
        }
        Command::Logout => {
            context.session().sign_out().await?;
            println!("signed out");
        }
        Command::Whoami => whoami(context, json).await?,
        Command::Subjects { command } => subjects(context, command, json).await?,
        Command::Timetable { command } => timetable(context, command, json).await?,
    }
    Ok(())
}

async fn whoami(context: &AppContext, json: bool) -> Result<()> {
    let Some(session) = context.session().session() else {
        println!("not signed in");
        return Ok(());
    };
    let profile = context.session().profile().await?;
    let roll_number = profile.map(|identity| identity.roll_number);

    if json {
        let body = json!({
            "id": session.user.id,
            "email": session.user.email,
            "roll_number": roll_number,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{} ({})", session.user.email, session.user.id);
        println!("roll number: {}", roll_number.as_deref().unwrap_or("-"));
    }
    Ok(())
}

async fn subjects(context: &AppContext, command: SubjectCommand, json: bool) -> Result<()> {
    let store = context.subjects();
    match command {
        SubjectCommand::List => store.fetch_subjects().await?,
        SubjectCommand::Add {
            name,
            kind,
            threshold,
        } => {
            let mut subject = NewSubject::new(name, kind);
            if let Some(threshold) = threshold {
                subject = subject.with_threshold(threshold);
            }
            store.create_subject(subject).await?;
        }
        SubjectCommand::Update {
            id,
            name,
            kind,
            threshold,
        } => {
            let patch = SubjectPatch {
                name,
                kind,
                attendance_threshold: threshold,
            };
            store.update_subject(id, patch).await?;
        }
        SubjectCommand::Delete { id } => store.delete_subject(id).await?,
    }

    let subjects = store.subjects();
    if json {
        println!("{}", serde_json::to_string_pretty(&subjects)?);
        return Ok(());
    }
    if subjects.is_empty() {
        println!("no subjects");
    }
    for subject in &subjects {
        println!(
            "{}  {:<28} {:<7} {:>3}%",
            subject.id, subject.name, subject.kind, subject.attendance_threshold
        );
    }
    Ok(())
}

async fn timetable(context: &AppContext, command: TimetableCommand, json: bool) -> Result<()> {
    let store = context.timetable();
    let mut show_all_rows = None;
    match command {
        TimetableCommand::List => store.fetch_entries().await?,
        TimetableCommand::Add {
            subject,
            day,
            start,
            end,
        } => {
            store
                .create_entry(NewTimetableEntry {
                    subject_id: subject,
                    day_of_week: day,
                    start_time: start,
                    end_time: end,
                })
                .await?;
        }
        TimetableCommand::Update {
            id,
            subject,
            day,
            start,
            end,
        } => {
            let patch = TimetableEntryPatch {
                subject_id: subject,
                day_of_week: day,
                start_time: start,
                end_time: end,
            };
            store.update_entry(id, patch).await?;
        }
        TimetableCommand::Delete { id } => store.delete_entry(id).await?,
        TimetableCommand::Grid { all } => {
            store.fetch_entries().await?;
            show_all_rows = Some(all);
        }
    }

    let entries = store.entries();
    match show_all_rows {
        Some(all) => print_grid(&entries, all, json),
        None => print_entries(&entries, json),
    }
}

fn print_entries(entries: &[ScheduledEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("no timetable entries");
    }
    for scheduled in entries {
        let entry = &scheduled.entry;
        println!(
            "{}  {:<9} {:>5}-{:<5}  {} ({})",
            entry.id,
            day_name(entry.day_of_week).unwrap_or("?"),
            entry.start_time,
            entry.end_time,
            scheduled.subject.name,
            scheduled.subject.kind
        );
    }
    Ok(())
}

fn print_grid(entries: &[ScheduledEntry], all: bool, json: bool) -> Result<()> {
    let slots = hourly_slots();
    let grid = project_week(entries, &slots);
    let rows = grid
        .rows
        .iter()
        .filter(|row| all || !row.is_empty())
        .collect::<Vec<_>>();

    if json {
        let body = rows
            .iter()
            .map(|row| {
                let cells = row
                    .cells
                    .iter()
                    .map(|cell| cell.iter().map(|s| s.subject.name.as_str()).collect::<Vec<_>>())
                    .collect::<Vec<_>>();
                json!({ "slot": row.slot, "cells": cells })
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let header = DAY_NAMES
        .iter()
        .map(|name| format!("{:<12}", &name[..3]))
        .collect::<String>();
    println!("{:<6}{}", "", header.trim_end());
    for row in rows {
        let cells = row
            .cells
            .iter()
            .map(|cell| {
                let names = cell
                    .iter()
                    .map(|s| s.subject.name.as_str())
                    .collect::<Vec<_>>()
                    .join("/");
                let label = if names.is_empty() { "-".to_string() } else { names };
                format!("{:<12}", truncate(&label, 11))
            })
            .collect::<String>();
        println!("{:<6}{}", row.slot, cells.trim_end());
    }
    Ok(())
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

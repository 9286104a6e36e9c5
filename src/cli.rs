//! This module contains the command-line interface [`Cli`] parser for taking and reconciling
//! attendance.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{Status, Student};

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// The different commands available for taking attendance.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new student to the roster.
    AddStudent(Student),

    /// Remove a student from the roster.
    RemoveStudent { id: String },

    /// Sync the roster with a CSV file of `id,name` rows.
    ImportRoster { file_path: PathBuf },

    /// Display the roster.
    ShowRoster,

    /// Display the active session, starting one if necessary.
    Session,

    /// List every session.
    History,

    /// Mark students as present in the active session.
    MarkPresent {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Override the status of an attendance record.
    SetStatus { record: i32, status: Status },

    /// Record an estimated headcount for the active session.
    AiEstimate { count: u32 },

    /// Send a recorded clip to the headcount estimator and record its answer.
    Estimate { clip: PathBuf },

    /// Accept the estimated headcount as the final headcount.
    ConfirmAi,

    /// Set the final headcount of the active session.
    SetHeadcount { count: u32 },

    /// Check whether the active session is ready to be finalized.
    Check,

    /// Finalize the active session if its headcount matches.
    Finalize {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the dashboard of the active session.
    Dashboard,
}

//! Updates the roster of students.
//!
//! This binary will look at the roster provided in [`ROSTER_PATH`] (or the path given as the first
//! argument) and look at the diff between the current roster stored in the database. It will then
//! add / delete students according to the CSV roster.

use anyhow::Result;
use rollcall::roster;
use std::env;

/// The default path to the roster of students.
const ROSTER_PATH: &str = "roster.csv";

pub fn main() -> Result<()> {
    rollcall::init_logging();

    let (manager, _) = rollcall::create_default_manager()?;

    let roster_path = env::args().nth(1).unwrap_or_else(|| ROSTER_PATH.to_string());
    let new_roster = roster::read_roster(&roster_path)?;

    let diff = roster::sync_roster(&manager, &new_roster)?;
    println!("Students dropped: {:#?}", diff.dropped);
    println!("Students added: {:#?}", diff.added);

    Ok(())
}

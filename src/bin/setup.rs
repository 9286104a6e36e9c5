//! Prepares a fresh attendance database.
//!
//! Creates the tables in the configured database and, if given a CSV roster path, imports the
//! roster into it.

use anyhow::Result;
use rollcall::roster;
use std::env;

pub fn main() -> Result<()> {
    rollcall::init_logging();

    let (manager, settings) = rollcall::create_default_manager()?;
    println!("Database ready at {}", settings.database.url);

    if let Some(roster_path) = env::args().nth(1) {
        let students = roster::read_roster(&roster_path)?;
        let inserted = manager.insert_students(&students)?;
        println!("Imported {inserted} student(s) from {roster_path}");
    }

    rollcall::display::show_roster(&manager)?;

    Ok(())
}

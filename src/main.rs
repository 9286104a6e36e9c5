use anyhow::{Result, bail};
use clap::Parser;
use rollcall::cli::{Cli, Command};
use rollcall::display;
use rollcall::estimator::{HttpEstimator, spawn_estimate};
use rollcall::roster;
use std::io::{self, Write};
use std::sync::Arc;

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} y/[N]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn main() -> Result<()> {
    rollcall::init_logging();

    let cli = Cli::parse();
    let (manager, settings) = rollcall::create_default_manager()?;

    match cli.command {
        Command::AddStudent(student) => {
            manager.insert_students(std::slice::from_ref(&student))?;
            println!("Added {} ({}) to the roster.", student.name, student.id);
        }
        Command::RemoveStudent { id } => {
            let student = manager.delete_student(&id)?;
            println!("Removed {} ({}) from the roster.", student.name, student.id);
        }
        Command::ImportRoster { file_path } => {
            let new_roster = roster::read_roster(&file_path)?;
            let diff = roster::sync_roster(&manager, &new_roster)?;
            println!("Students added: {:#?}", diff.added);
            println!("Students dropped: {:#?}", diff.dropped);
        }
        Command::ShowRoster => display::show_roster(&manager)?,
        Command::Session => {
            let session = manager.resolve_active_session()?;
            display::show_sessions(&[session]);
        }
        Command::History => display::show_sessions(&manager.list_sessions()?),
        Command::MarkPresent { ids } => {
            let session = manager.resolve_active_session()?;
            for id in &ids {
                match manager.mark_present(session.id, id) {
                    Ok(_) => println!("Attendance marked for {id}."),
                    Err(e) => eprintln!("Could not mark {id}: {e}"),
                }
            }
        }
        Command::SetStatus { record, status } => {
            let record = manager.set_status(record, status)?;
            println!(
                "Record {} ({}) is now {}.",
                record.id, record.student_id, record.status
            );
        }
        Command::AiEstimate { count } => {
            let session = manager.resolve_active_session()?;
            manager.record_ai_estimate(session.id, count)?;
            println!("Recorded an estimated headcount of {count}.");
        }
        Command::Estimate { clip } => {
            let session = manager.resolve_active_session()?;
            let estimator = HttpEstimator::new(&settings.estimator.url, settings.estimator.timeout())?;

            let handle = spawn_estimate(Arc::new(manager), Arc::new(estimator), session.id, clip);
            match handle.join() {
                Ok(Some(count)) => println!("Estimated headcount: {count}."),
                Ok(None) => println!("Estimate unavailable, enter the headcount manually."),
                Err(_) => bail!("estimator thread panicked"),
            }
        }
        Command::ConfirmAi => {
            let session = manager.resolve_active_session()?;
            let session = manager.confirm_ai_estimate(session.id)?;
            display::show_sessions(&[session]);
        }
        Command::SetHeadcount { count } => {
            let session = manager.resolve_active_session()?;
            manager.set_final_headcount(session.id, count)?;
            println!("Final headcount set to {count}.");
        }
        Command::Check => {
            let session = manager.resolve_active_session()?;
            match manager.check_ready_for_finalization(session.id) {
                Ok(reconciliation) => println!(
                    "Ready to finalize: {} students present.",
                    reconciliation.present()
                ),
                Err(e) => println!("{}", display::explain_check_failure(&e)),
            }
        }
        Command::Finalize { yes } => {
            let session = manager.resolve_active_session()?;
            let reconciliation = match manager.check_ready_for_finalization(session.id) {
                Ok(reconciliation) => reconciliation,
                Err(e) => bail!(display::explain_check_failure(&e)),
            };

            if !yes && !confirm("Are you sure you want to finalize and submit this attendance?")? {
                println!("Finalization canceled!");
                return Ok(());
            }

            let session = manager.finalize_session(reconciliation)?;
            println!("Attendance for {} has been finalized.", session.course);
        }
        Command::Dashboard => {
            let session = manager.resolve_active_session()?;
            display::show_dashboard(&manager.dashboard(session.id)?);
        }
    }

    Ok(())
}

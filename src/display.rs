use crate::dashboard::Dashboard;
use crate::error::{AttendanceError, Result};
use crate::manager::AttendanceManager;
use crate::models::Session;
use chrono::NaiveDateTime;
use tabled::{Table, Tabled, settings::Style};

fn format_time(time: &Option<NaiveDateTime>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "--".to_string())
}

fn format_count(count: &Option<i32>) -> String {
    count.map_or_else(|| "--".to_string(), |c| c.to_string())
}

#[derive(Tabled)]
struct SessionRow {
    id: i32,
    course: String,
    status: String,
    started: String,
    #[tabled(display = "format_time")]
    ended: Option<NaiveDateTime>,
    #[tabled(rename = "ai count", display = "format_count")]
    ai_headcount: Option<i32>,
    #[tabled(rename = "headcount", display = "format_count")]
    final_headcount: Option<i32>,
}

impl From<&Session> for SessionRow {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            course: session.course.clone(),
            status: session.status.to_string(),
            started: session.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            ended: session.end_time,
            ai_headcount: session.ai_headcount,
            final_headcount: session.final_headcount,
        }
    }
}

fn sessions_table(sessions: &[Session]) -> Table {
    let mut table = Table::new(sessions.iter().map(SessionRow::from));
    table.with(Style::modern());
    table
}

/// Pretty prints a list of sessions.
pub fn show_sessions(sessions: &[Session]) {
    println!("{}", sessions_table(sessions));
}

/// Pretty prints the dashboard of a session: its headcounts, the summary, and every record.
pub fn show_dashboard(dashboard: &Dashboard) {
    #[derive(Tabled)]
    struct RecordRow {
        record: i32,
        id: String,
        name: String,
        status: String,
        #[tabled(rename = "last seen", display = "format_time")]
        last_seen: Option<NaiveDateTime>,
        #[tabled(rename = "override")]
        manual_override: bool,
    }

    show_sessions(std::slice::from_ref(&dashboard.session));

    let summary = dashboard.summary;
    println!(
        "Students: {}  Present: {}  Absent: {}  Pending: {}",
        summary.total_students, summary.present, summary.absent, summary.pending
    );

    let rows = dashboard.records.iter().map(|(record, student)| RecordRow {
        record: record.id,
        id: student.id.clone(),
        name: student.name.clone(),
        status: record.status.to_string(),
        last_seen: record.last_seen,
        manual_override: record.manual_override,
    });

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

/// Pretty prints the roster.
pub fn show_roster(manager: &AttendanceManager) -> Result<()> {
    let roster = manager.get_roster()?;

    let mut table = Table::new(roster);
    table.with(Style::modern());
    println!("Roster:\n{table}");

    Ok(())
}

/// Describes a failed finalization check so the operator knows what to correct.
pub fn explain_check_failure(error: &AttendanceError) -> String {
    match error {
        AttendanceError::HeadcountMissing(_) => "Headcount required: perform a headcount \
             verification or enter the count manually before submitting."
            .to_string(),
        AttendanceError::HeadcountMismatch { present, headcount } => format!(
            "Headcount mismatch: the final headcount ({headcount}) does not match the number of \
             present students ({present}). Correct the numbers before submitting."
        ),
        other => other.to_string(),
    }
}

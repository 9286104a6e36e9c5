use crate::error::Result;
use crate::manager::{AttendanceManager, count_students};
use crate::models::{AttendanceRecord, Session, Status, Student};
use crate::schema;
use crate::session::find_session;
use diesel::prelude::*;

/// Counts of a session's records by status, next to the size of the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_students: usize,
    pub present: usize,
    pub absent: usize,
    pub pending: usize,
}

/// Everything an operator looks at while taking attendance.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub session: Session,
    pub summary: Summary,
    /// Every record of the session with its student, ordered by student name.
    pub records: Vec<(AttendanceRecord, Student)>,
}

fn tally(conn: &mut SqliteConnection, session: i32) -> Result<Summary> {
    use schema::attendance::dsl::*;

    let statuses: Vec<Status> = attendance
        .filter(session_id.eq(session))
        .select(status)
        .load(conn)?;

    let mut summary = Summary {
        total_students: count_students(conn)?,
        ..Summary::default()
    };

    for record_status in statuses {
        match record_status {
            Status::Present => summary.present += 1,
            Status::Absent => summary.absent += 1,
            Status::Pending => summary.pending += 1,
        }
    }

    Ok(summary)
}

impl AttendanceManager {
    /// Counts the records of a session by status. Recomputed from the ledger on every call.
    pub fn summarize(&self, session: i32) -> Result<Summary> {
        let mut conn = self.conn();
        find_session(&mut conn, session)?;
        tally(&mut conn, session)
    }

    /// Returns the session, its summary, and its records joined with the roster.
    pub fn dashboard(&self, session: i32) -> Result<Dashboard> {
        use schema::{attendance, students};

        let mut conn = self.conn();
        let current = find_session(&mut conn, session)?;
        let summary = tally(&mut conn, session)?;

        let records = attendance::table
            .inner_join(students::table)
            .filter(attendance::session_id.eq(session))
            .order((students::name.asc(), students::id.asc()))
            .select((AttendanceRecord::as_select(), Student::as_select()))
            .load::<(AttendanceRecord, Student)>(&mut *conn)?;

        Ok(Dashboard {
            session: current,
            summary,
            records,
        })
    }
}

//! The attendance ledger: one record per (session, student) pair.

use crate::error::{AttendanceError, Result};
use crate::manager::{AttendanceManager, find_student};
use crate::models::{AttendanceRecord, NewAttendanceRecord, Status};
use crate::schema;
use crate::session::{find_open_session, find_session};
use chrono::Utc;
use diesel::prelude::*;
use log::debug;

fn pending_records(session_id: i32, student_ids: &[String]) -> Vec<NewAttendanceRecord<'_>> {
    student_ids
        .iter()
        .map(|student_id| NewAttendanceRecord {
            session_id,
            student_id,
            status: Status::Pending,
            last_seen: None,
            manual_override: false,
        })
        .collect()
}

/// Inserts one [`Status::Pending`] record per student for a freshly created session.
///
/// Records that already exist are left untouched. Returns the number of records inserted.
pub(crate) fn bootstrap(
    conn: &mut SqliteConnection,
    session_id: i32,
    student_ids: &[String],
) -> Result<usize> {
    if student_ids.is_empty() {
        return Ok(0);
    }

    let records = pending_records(session_id, student_ids);
    let inserted = diesel::insert_or_ignore_into(schema::attendance::table)
        .values(&records)
        .execute(conn)?;

    if inserted != records.len() {
        debug!(
            "session {session_id}: {} record(s) already existed during bootstrap",
            records.len() - inserted
        );
    }

    Ok(inserted)
}

pub(crate) fn count_with_status(
    conn: &mut SqliteConnection,
    session: i32,
    wanted: Status,
) -> Result<i64> {
    use schema::attendance::dsl::*;

    Ok(attendance
        .filter(session_id.eq(session))
        .filter(status.eq(wanted))
        .count()
        .get_result(conn)?)
}

fn find_record(
    conn: &mut SqliteConnection,
    session: i32,
    student: &str,
) -> Result<Option<AttendanceRecord>> {
    use schema::attendance::dsl::*;

    Ok(attendance
        .filter(session_id.eq(session))
        .filter(student_id.eq(student))
        .select(AttendanceRecord::as_select())
        .first(conn)
        .optional()?)
}

impl AttendanceManager {
    /// Inserts a [`Status::Pending`] record for each of the given students in an open session.
    ///
    /// Sessions are bootstrapped automatically when they are created, so this only matters for
    /// students added to the roster afterwards. A student who already has a record in the session
    /// is a constraint violation, and nothing is inserted.
    pub fn bootstrap(&self, session_id: i32, student_ids: &[String]) -> Result<usize> {
        if student_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn();

        conn.immediate_transaction(|conn| {
            find_open_session(conn, session_id)?;

            Ok(diesel::insert_into(schema::attendance::table)
                .values(&pending_records(session_id, student_ids))
                .execute(conn)?)
        })
    }

    /// Marks a student as [`Status::Present`] in the given session and refreshes their last-seen
    /// time.
    ///
    /// Marking is idempotent: repeated calls leave exactly one record, whose last-seen time is that
    /// of the latest call. A student missing from the ledger (added to the roster after the session
    /// began) gets a record on the spot.
    pub fn mark_present(&self, session: i32, student: &str) -> Result<AttendanceRecord> {
        use schema::attendance::dsl::*;

        let mut conn = self.conn();

        conn.immediate_transaction(|conn| {
            find_open_session(conn, session)?;
            find_student(conn, student)?;

            let now = Utc::now().naive_utc();
            let record = diesel::insert_into(attendance)
                .values(&NewAttendanceRecord {
                    session_id: session,
                    student_id: student,
                    status: Status::Present,
                    last_seen: Some(now),
                    manual_override: false,
                })
                .on_conflict((session_id, student_id))
                .do_update()
                .set((status.eq(Status::Present), last_seen.eq(Some(now))))
                .returning(AttendanceRecord::as_returning())
                .get_result(conn)?;

            debug!("session {session}: marked `{student}` present");

            Ok(record)
        })
    }

    /// Manually overrides the status of a record, whatever it was before.
    ///
    /// The record is flagged as manually overridden. Only the flag is kept, not the previous
    /// status.
    pub fn set_status(&self, record_id: i32, new_status: Status) -> Result<AttendanceRecord> {
        use schema::attendance::dsl::*;

        let mut conn = self.conn();

        conn.immediate_transaction(|conn| {
            let record = attendance
                .find(record_id)
                .select(AttendanceRecord::as_select())
                .first(conn)
                .optional()?
                .ok_or(AttendanceError::RecordNotFound(record_id))?;

            find_open_session(conn, record.session_id)?;

            let updated = diesel::update(attendance.find(record_id))
                .set((status.eq(new_status), manual_override.eq(true)))
                .returning(AttendanceRecord::as_returning())
                .get_result(conn)?;

            debug!(
                "record {record_id}: `{}` overridden from {} to {new_status}",
                record.student_id, record.status
            );

            Ok(updated)
        })
    }

    /// Retrieves every record of a session, ordered by student ID.
    pub fn session_records(&self, session: i32) -> Result<Vec<AttendanceRecord>> {
        use schema::attendance::dsl::*;

        let mut conn = self.conn();
        find_session(&mut conn, session)?;

        Ok(attendance
            .filter(session_id.eq(session))
            .order(student_id.asc())
            .select(AttendanceRecord::as_select())
            .load(&mut *conn)?)
    }

    /// Retrieves the record of one student in one session, if there is one.
    pub fn get_record(&self, session: i32, student: &str) -> Result<Option<AttendanceRecord>> {
        let mut conn = self.conn();
        find_record(&mut conn, session, student)
    }
}

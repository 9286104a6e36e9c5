//! Session lifecycle: resolving the single active session and finalizing it.

use crate::error::{AttendanceError, Result};
use crate::headcount::Reconciliation;
use crate::manager::{AttendanceManager, roster_ids};
use crate::models::{NewSession, Session, SessionStatus};
use crate::{ledger, schema};
use chrono::{Local, Utc};
use diesel::prelude::*;
use log::info;

/// Looks up a session by ID, failing with [`AttendanceError::NoActiveSession`] if it does not
/// exist.
pub(crate) fn find_session(conn: &mut SqliteConnection, session_id: i32) -> Result<Session> {
    schema::sessions::table
        .find(session_id)
        .select(Session::as_select())
        .first(conn)
        .optional()?
        .ok_or(AttendanceError::NoActiveSession(session_id))
}

/// Looks up a session that is about to be written to, failing with
/// [`AttendanceError::SessionClosed`] if it has already been finalized.
pub(crate) fn find_open_session(conn: &mut SqliteConnection, session_id: i32) -> Result<Session> {
    let session = find_session(conn, session_id)?;
    if !session.is_active() {
        return Err(AttendanceError::SessionClosed(session_id));
    }
    Ok(session)
}

pub(crate) fn find_active(conn: &mut SqliteConnection) -> Result<Option<Session>> {
    use schema::sessions::dsl::*;

    Ok(sessions
        .filter(status.eq(SessionStatus::Active))
        .select(Session::as_select())
        .first(conn)
        .optional()?)
}

impl AttendanceManager {
    /// Returns the current active session, creating one if none exists.
    ///
    /// A new session gets a course label derived from today's date and one
    /// [`Status::Pending`](crate::models::Status::Pending) record for every student on the roster,
    /// all within the same transaction. Concurrent callers are serialized, so at most one session
    /// is ever created and every caller observes the same one.
    pub fn resolve_active_session(&self) -> Result<Session> {
        let mut conn = self.conn();

        conn.immediate_transaction(|conn| {
            if let Some(session) = find_active(conn)? {
                return Ok(session);
            }

            let course = format!("{} {}", self.course_prefix(), Local::now().format("%Y-%m-%d"));
            let session = diesel::insert_into(schema::sessions::table)
                .values(&NewSession {
                    course: &course,
                    start_time: Utc::now().naive_utc(),
                    status: SessionStatus::Active,
                })
                .returning(Session::as_returning())
                .get_result(conn)?;

            let student_ids = roster_ids(conn)?;
            let bootstrapped = ledger::bootstrap(conn, session.id, &student_ids)?;

            info!(
                "created session {} ({}) with {bootstrapped} pending record(s)",
                session.id, session.course
            );

            Ok(session)
        })
    }

    /// Returns the current active session without creating one.
    pub fn active_session(&self) -> Result<Option<Session>> {
        let mut conn = self.conn();
        find_active(&mut conn)
    }

    /// Retrieves a session by ID, whatever its status.
    pub fn get_session(&self, session_id: i32) -> Result<Session> {
        let mut conn = self.conn();
        find_session(&mut conn, session_id)
    }

    /// Retrieves every session, most recent first.
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        use schema::sessions::dsl::*;

        let mut conn = self.conn();
        Ok(sessions
            .order(id.desc())
            .select(Session::as_select())
            .load(&mut *conn)?)
    }

    /// Moves the reconciled session from `Active` to `Completed` and stamps its end time.
    ///
    /// The [`Reconciliation`] can only be obtained from
    /// [`check_ready_for_finalization`](AttendanceManager::check_ready_for_finalization), so a
    /// session is never finalized without a matching headcount. Fails with
    /// [`AttendanceError::InvalidState`] if the session is not the current active session, which
    /// includes a second attempt to finalize the same session. Fails with
    /// [`AttendanceError::HeadcountMismatch`] if the final headcount was changed after the check.
    pub fn finalize_session(&self, confirmation: Reconciliation) -> Result<Session> {
        use schema::sessions::dsl::*;

        let session_id = confirmation.session_id();
        let mut conn = self.conn();

        conn.immediate_transaction(|conn| {
            let session = find_session(conn, session_id)?;
            let current = find_active(conn)?.map(|active| active.id);

            if !session.is_active() || current != Some(session.id) {
                return Err(AttendanceError::InvalidState {
                    session_id,
                    actual: session.status.to_string(),
                });
            }

            if session.final_headcount != Some(confirmation.headcount()) {
                return Err(AttendanceError::HeadcountMismatch {
                    present: confirmation.present(),
                    headcount: session.final_headcount.map_or(0, i64::from),
                });
            }

            let finalized = diesel::update(sessions.find(session_id))
                .set((
                    status.eq(SessionStatus::Completed),
                    end_time.eq(Some(Utc::now().naive_utc())),
                ))
                .returning(Session::as_returning())
                .get_result(conn)?;

            info!(
                "finalized session {} with {} present",
                finalized.id,
                confirmation.present()
            );

            Ok(finalized)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::DEFAULT_COURSE_PREFIX;
    use crate::models::{Status, Student};

    fn manager_with_roster(ids: &[&str]) -> AttendanceManager {
        let manager = AttendanceManager::in_memory().unwrap();
        let roster: Vec<Student> = ids
            .iter()
            .map(|id| Student {
                id: id.to_string(),
                name: id.to_uppercase(),
            })
            .collect();
        manager.insert_students(&roster).unwrap();
        manager
    }

    #[test]
    fn resolve_creates_session_once() {
        let manager = manager_with_roster(&["a", "b", "c"]);

        assert!(manager.active_session().unwrap().is_none());

        let first = manager.resolve_active_session().unwrap();
        let second = manager.resolve_active_session().unwrap();

        assert_eq!(first, second);
        assert!(first.is_active());
        assert!(first.end_time.is_none());
        assert!(first.ai_headcount.is_none());
        assert!(first.final_headcount.is_none());
        assert!(first.course.starts_with(DEFAULT_COURSE_PREFIX));
        assert_eq!(manager.list_sessions().unwrap().len(), 1);
    }

    #[test]
    fn new_session_bootstraps_pending_records() {
        let manager = manager_with_roster(&["a", "b", "c"]);
        let session = manager.resolve_active_session().unwrap();

        let records = manager.session_records(session.id).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.status == Status::Pending));
        assert!(records.iter().all(|r| r.last_seen.is_none() && !r.manual_override));
    }

    #[test]
    fn course_prefix_is_configurable() {
        let manager = AttendanceManager::in_memory()
            .unwrap()
            .with_course_prefix("Rust StuCo");

        let session = manager.resolve_active_session().unwrap();
        assert!(session.course.starts_with("Rust StuCo "));
    }

    #[test]
    fn finalize_completes_session_and_next_resolve_starts_fresh() {
        let manager = manager_with_roster(&["a"]);
        let session = manager.resolve_active_session().unwrap();

        manager.mark_present(session.id, "a").unwrap();
        manager.set_final_headcount(session.id, 1).unwrap();
        let confirmation = manager.check_ready_for_finalization(session.id).unwrap();

        let finalized = manager.finalize_session(confirmation).unwrap();
        assert_eq!(finalized.status, SessionStatus::Completed);
        assert!(finalized.end_time.is_some());
        assert!(manager.active_session().unwrap().is_none());

        let next = manager.resolve_active_session().unwrap();
        assert_ne!(next.id, session.id);
        assert_eq!(
            manager.session_records(next.id).unwrap()[0].status,
            Status::Pending
        );
    }

    #[test]
    fn finalizing_twice_is_invalid() {
        let manager = manager_with_roster(&[]);
        let session = manager.resolve_active_session().unwrap();
        manager.set_final_headcount(session.id, 0).unwrap();

        let first = manager.check_ready_for_finalization(session.id).unwrap();
        let second = manager.check_ready_for_finalization(session.id).unwrap();

        manager.finalize_session(first).unwrap();
        assert!(matches!(
            manager.finalize_session(second),
            Err(AttendanceError::InvalidState { session_id, .. }) if session_id == session.id
        ));
    }

    #[test]
    fn headcount_changed_after_check_blocks_finalization() {
        let manager = manager_with_roster(&["a"]);
        let session = manager.resolve_active_session().unwrap();
        manager.mark_present(session.id, "a").unwrap();
        manager.set_final_headcount(session.id, 1).unwrap();

        let stale = manager.check_ready_for_finalization(session.id).unwrap();
        manager.set_final_headcount(session.id, 7).unwrap();

        assert!(matches!(
            manager.finalize_session(stale),
            Err(AttendanceError::HeadcountMismatch {
                present: 1,
                headcount: 7
            })
        ));
        let unchanged = manager.get_session(session.id).unwrap();
        assert!(unchanged.is_active());
        assert!(unchanged.end_time.is_none());

        manager.set_final_headcount(session.id, 1).unwrap();
        let fresh = manager.check_ready_for_finalization(session.id).unwrap();
        let finalized = manager.finalize_session(fresh).unwrap();
        assert_eq!(finalized.final_headcount, Some(1));
    }

    #[test]
    fn unknown_session_is_reported() {
        let manager = manager_with_roster(&[]);

        assert!(matches!(
            manager.get_session(42),
            Err(AttendanceError::NoActiveSession(42))
        ));
    }
}

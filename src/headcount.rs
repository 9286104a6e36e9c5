//! Headcount reconciliation: recording headcounts and checking them against the ledger.

use crate::error::{AttendanceError, Result};
use crate::ledger::count_with_status;
use crate::manager::AttendanceManager;
use crate::models::{Session, Status};
use crate::schema;
use crate::session::{find_open_session, find_session};
use diesel::prelude::*;
use log::info;

/// Proof that a session's final headcount matched its present count when it was checked.
///
/// Only [`AttendanceManager::check_ready_for_finalization`] hands these out, and
/// [`AttendanceManager::finalize_session`] consumes one.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reconciliation does nothing unless passed to `finalize_session`"]
pub struct Reconciliation {
    session_id: i32,
    present: i64,
    headcount: i32,
}

impl Reconciliation {
    pub fn session_id(&self) -> i32 {
        self.session_id
    }

    /// The number of present students, which is also the final headcount.
    pub fn present(&self) -> i64 {
        self.present
    }

    /// The final headcount that was checked. Finalization fails if the session's final headcount
    /// has changed since.
    pub fn headcount(&self) -> i32 {
        self.headcount
    }
}

fn to_column(count: u32) -> Result<i32> {
    i32::try_from(count).map_err(|_| AttendanceError::InvalidHeadcount(count))
}

impl AttendanceManager {
    /// Stores the estimator's headcount on the session, replacing any earlier estimate.
    ///
    /// The estimate is advisory and leaves the final headcount alone.
    pub fn record_ai_estimate(&self, session: i32, count: u32) -> Result<Session> {
        use schema::sessions::dsl::*;

        let value = to_column(count)?;
        let mut conn = self.conn();

        conn.immediate_transaction(|conn| {
            find_open_session(conn, session)?;

            let updated = diesel::update(sessions.find(session))
                .set(ai_headcount.eq(Some(value)))
                .returning(Session::as_returning())
                .get_result(conn)?;

            info!("session {session}: estimated headcount {count}");
            Ok(updated)
        })
    }

    /// Entry point for the estimator's asynchronous result. Same as
    /// [`record_ai_estimate`](AttendanceManager::record_ai_estimate).
    pub fn on_estimate_ready(&self, session: i32, count: u32) -> Result<Session> {
        self.record_ai_estimate(session, count)
    }

    /// Sets the authoritative final headcount of a session, replacing any earlier value.
    pub fn set_final_headcount(&self, session: i32, count: u32) -> Result<Session> {
        use schema::sessions::dsl::*;

        let value = to_column(count)?;
        let mut conn = self.conn();

        conn.immediate_transaction(|conn| {
            find_open_session(conn, session)?;

            let updated = diesel::update(sessions.find(session))
                .set(final_headcount.eq(Some(value)))
                .returning(Session::as_returning())
                .get_result(conn)?;

            info!("session {session}: final headcount set to {count}");
            Ok(updated)
        })
    }

    /// Accepts the current estimate as the final headcount.
    ///
    /// Fails with [`AttendanceError::HeadcountMissing`] if no estimate has arrived.
    pub fn confirm_ai_estimate(&self, session: i32) -> Result<Session> {
        use schema::sessions::dsl::*;

        let mut conn = self.conn();

        conn.immediate_transaction(|conn| {
            let current = find_open_session(conn, session)?;
            let estimate = current
                .ai_headcount
                .ok_or(AttendanceError::HeadcountMissing(session))?;

            let updated = diesel::update(sessions.find(session))
                .set(final_headcount.eq(Some(estimate)))
                .returning(Session::as_returning())
                .get_result(conn)?;

            info!("session {session}: confirmed estimated headcount {estimate}");
            Ok(updated)
        })
    }

    /// Compares the number of present students with the final headcount.
    ///
    /// Read-only, so it can be polled freely. Returns the [`Reconciliation`] required by
    /// [`finalize_session`](AttendanceManager::finalize_session) when the two agree, and fails
    /// with [`AttendanceError::HeadcountMissing`] or [`AttendanceError::HeadcountMismatch`]
    /// otherwise. The estimate never stands in for a missing final headcount.
    pub fn check_ready_for_finalization(&self, session: i32) -> Result<Reconciliation> {
        let mut conn = self.conn();

        let current = find_session(&mut conn, session)?;
        if !current.is_active() {
            return Err(AttendanceError::InvalidState {
                session_id: session,
                actual: current.status.to_string(),
            });
        }

        let headcount = current
            .final_headcount
            .ok_or(AttendanceError::HeadcountMissing(session))?;
        let present = count_with_status(&mut conn, session, Status::Present)?;

        if i64::from(headcount) != present {
            return Err(AttendanceError::HeadcountMismatch {
                present,
                headcount: i64::from(headcount),
            });
        }

        Ok(Reconciliation {
            session_id: session,
            present,
            headcount,
        })
    }
}

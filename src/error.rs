use thiserror::Error;

/// Everything that can go wrong while recording, reconciling, or finalizing attendance.
///
/// The lifecycle variants are precondition violations and are reported to the caller as-is; none
/// of them are retried.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("no session with id {0} exists")]
    NoActiveSession(i32),

    #[error("student `{0}` is not on the roster")]
    StudentNotFound(String),

    #[error("attendance record {0} does not exist")]
    RecordNotFound(i32),

    #[error("session {session_id} is {actual}, expected the current active session")]
    InvalidState { session_id: i32, actual: String },

    #[error("session {0} has been finalized and no longer accepts changes")]
    SessionClosed(i32),

    #[error("session {0} has no final headcount, record one before finalizing")]
    HeadcountMissing(i32),

    #[error(
        "final headcount ({headcount}) does not match the number of present students ({present})"
    )]
    HeadcountMismatch { present: i64, headcount: i64 },

    #[error("headcount {0} is out of range")]
    InvalidHeadcount(u32),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("could not connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("could not run migrations: {0}")]
    Migration(String),

    #[error("roster error: {0}")]
    Roster(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AttendanceError>;

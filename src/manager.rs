use crate::error::{AttendanceError, Result};
use crate::models::Student;
use crate::schema;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::debug;
use std::sync::{Mutex, MutexGuard};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// The course label prefix used when no other is configured.
pub const DEFAULT_COURSE_PREFIX: &str = "Class Session";

/// The manager for recording, reconciling, and finalizing attendance data.
///
/// All operations take `&self`: the underlying connection sits behind a mutex, so a manager can be
/// shared between threads with an [`Arc`](std::sync::Arc). Session creation and finalization
/// additionally run in `IMMEDIATE` transactions so that other processes writing to the same
/// database file are serialized as well.
pub struct AttendanceManager {
    db: Mutex<SqliteConnection>,
    course_prefix: String,
}

impl AttendanceManager {
    /// Connects to the `sqlite3` database at `database_url`, creating the tables if needed.
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut connection = SqliteConnection::establish(database_url)?;

        connection.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;

        let applied = connection
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| AttendanceError::Migration(e.to_string()))?;
        debug!("applied {} migration(s) to {database_url}", applied.len());

        Ok(Self {
            db: Mutex::new(connection),
            course_prefix: DEFAULT_COURSE_PREFIX.to_string(),
        })
    }

    /// Creates a manager backed by a fresh in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::connect(":memory:")
    }

    /// Sets the prefix of the course label given to newly created sessions.
    pub fn with_course_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.course_prefix = prefix.into();
        self
    }

    pub fn course_prefix(&self) -> &str {
        &self.course_prefix
    }

    /// Locks the connection. Every multi-statement write is transactional, so a poisoned lock is
    /// safe to recover.
    pub(crate) fn conn(&self) -> MutexGuard<'_, SqliteConnection> {
        self.db
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the total number of students on the roster.
    pub fn num_students(&self) -> Result<usize> {
        let mut conn = self.conn();
        count_students(&mut conn)
    }

    /// Retrieves all students on the roster, ordered by name.
    pub fn get_roster(&self) -> Result<Vec<Student>> {
        let mut conn = self.conn();
        load_roster(&mut conn)
    }

    /// Retrieves the IDs of all students on the roster.
    pub fn get_roster_ids(&self) -> Result<Vec<String>> {
        let mut conn = self.conn();
        roster_ids(&mut conn)
    }

    /// Retrieves a specific student from the roster based on their ID.
    pub fn get_student(&self, student_id: &str) -> Result<Student> {
        let mut conn = self.conn();
        find_student(&mut conn, student_id)
    }

    /// Inserts students into the roster.
    ///
    /// Students added while a session is active are not bootstrapped into it; they get a record
    /// the first time they are marked present.
    pub fn insert_students(&self, new_students: &[Student]) -> Result<usize> {
        let mut conn = self.conn();
        insert_students(&mut conn, new_students)
    }

    /// Removes and returns a student from the roster given their ID.
    ///
    /// Fails with a database error if the student already has attendance records, since those are
    /// never deleted.
    pub fn delete_student(&self, student_id: &str) -> Result<Student> {
        let mut conn = self.conn();
        delete_student(&mut conn, student_id)
    }
}

pub(crate) fn insert_students(
    conn: &mut SqliteConnection,
    new_students: &[Student],
) -> Result<usize> {
    if new_students.is_empty() {
        return Ok(0);
    }

    Ok(diesel::insert_into(schema::students::table)
        .values(new_students)
        .execute(conn)?)
}

pub(crate) fn delete_student(conn: &mut SqliteConnection, student_id: &str) -> Result<Student> {
    use schema::students::dsl::*;

    diesel::delete(students.filter(id.eq(student_id)))
        .returning(Student::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AttendanceError::StudentNotFound(student_id.to_string()))
}

pub(crate) fn load_roster(conn: &mut SqliteConnection) -> Result<Vec<Student>> {
    use schema::students::dsl::*;

    Ok(students
        .order((name.asc(), id.asc()))
        .select(Student::as_select())
        .load(conn)?)
}

pub(crate) fn count_students(conn: &mut SqliteConnection) -> Result<usize> {
    use schema::students::dsl::*;

    let count: i64 = students.count().get_result(conn)?;
    Ok(count as usize)
}

pub(crate) fn roster_ids(conn: &mut SqliteConnection) -> Result<Vec<String>> {
    use schema::students::dsl::*;

    Ok(students.select(id).order(id.asc()).load(conn)?)
}

pub(crate) fn find_student(conn: &mut SqliteConnection, student_id: &str) -> Result<Student> {
    use schema::students::dsl::*;

    students
        .find(student_id)
        .select(Student::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AttendanceError::StudentNotFound(student_id.to_string()))
}

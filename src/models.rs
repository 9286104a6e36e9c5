use crate::schema::{attendance, sessions, students};
use chrono::NaiveDateTime;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// A student on the roster.
#[derive(
    Queryable,
    Selectable,
    Insertable,
    Serialize,
    Deserialize,
    Tabled,
    clap::Args,
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    /// The student's unique external identifier.
    pub id: String,
    /// The student's display name.
    pub name: String,
}

/// The attendance status of a single student within a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Status {
    Pending,
    Present,
    Absent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Present => "Present",
            Status::Absent => "Absent",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "present" => Ok(Status::Present),
            "absent" => Ok(Status::Absent),
            other => Err(format!("unrecognized attendance status `{other}`")),
        }
    }
}

impl ToSql<Text, Sqlite> for Status {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Status {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(value.parse()?)
    }
}

/// Lifecycle state of a [`Session`]. A session only ever moves from `Active` to `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql<Text, Sqlite> for SessionStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for SessionStatus {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        match value.as_str() {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(format!("unrecognized session status `{other}`").into()),
        }
    }
}

/// One attendance-taking period.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Session {
    pub id: i32,
    pub course: String,
    pub start_time: NaiveDateTime,
    /// `None` until the session is finalized.
    pub end_time: Option<NaiveDateTime>,
    pub status: SessionStatus,
    /// Advisory estimate from the headcount estimator. Never gates finalization.
    pub ai_headcount: Option<i32>,
    /// The authoritative headcount that finalization is checked against.
    pub final_headcount: Option<i32>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession<'a> {
    pub course: &'a str,
    pub start_time: NaiveDateTime,
    pub status: SessionStatus,
}

/// The status row of one student within one session.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AttendanceRecord {
    pub id: i32,
    pub session_id: i32,
    pub student_id: String,
    pub status: Status,
    pub last_seen: Option<NaiveDateTime>,
    /// Set once an operator has overridden the status by hand.
    pub manual_override: bool,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = attendance)]
pub struct NewAttendanceRecord<'a> {
    pub session_id: i32,
    pub student_id: &'a str,
    pub status: Status,
    pub last_seen: Option<NaiveDateTime>,
    pub manual_override: bool,
}

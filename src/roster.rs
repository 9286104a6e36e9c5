//! Importing the student roster from CSV.
//!
//! The roster file has an `id,name` header followed by one student per row.

use crate::error::{AttendanceError, Result};
use crate::manager::{AttendanceManager, delete_student, insert_students, load_roster};
use crate::models::Student;
use log::info;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Reads a roster from a CSV file.
pub fn read_roster(path: impl AsRef<Path>) -> Result<Vec<Student>> {
    let reader = csv::Reader::from_path(path)?;
    parse_roster(reader)
}

fn parse_roster<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Student>> {
    let mut students = Vec::new();
    for record in reader.deserialize() {
        let student: Student = record?;
        students.push(Student {
            id: student.id.trim().to_string(),
            name: student.name.trim().to_string(),
        });
    }
    Ok(students)
}

/// The students added to and dropped from the roster by [`sync_roster`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RosterDiff {
    pub added: Vec<Student>,
    pub dropped: Vec<Student>,
}

/// Brings the stored roster in line with `new_roster`, adding new students and dropping missing
/// ones.
///
/// The whole diff is applied in one transaction. Students who already have attendance records
/// cannot be dropped, since records are never deleted; that case fails with a database error and
/// leaves the roster as it was.
pub fn sync_roster(manager: &AttendanceManager, new_roster: &[Student]) -> Result<RosterDiff> {
    let mut conn = manager.conn();

    let diff = conn.immediate_transaction(|conn| {
        let curr_roster = load_roster(conn)?;

        let new_ids: HashSet<&str> = new_roster.iter().map(|s| s.id.as_str()).collect();
        let curr_ids: HashSet<&str> = curr_roster.iter().map(|s| s.id.as_str()).collect();

        let added: Vec<Student> = new_roster
            .iter()
            .filter(|student| !curr_ids.contains(student.id.as_str()))
            .cloned()
            .collect();

        let mut dropped = Vec::new();
        for student in curr_roster
            .iter()
            .filter(|student| !new_ids.contains(student.id.as_str()))
        {
            dropped.push(delete_student(conn, &student.id)?);
        }

        insert_students(conn, &added)?;

        Ok::<_, AttendanceError>(RosterDiff { added, dropped })
    })?;

    info!(
        "roster synced: {} added, {} dropped",
        diff.added.len(),
        diff.dropped.len()
    );

    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, name: &str) -> Student {
        Student {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn parses_csv_roster() {
        let data = "id,name\ncjtsui, Connor Tsui\nferris,Ferris The Crab\n";
        let roster = parse_roster(csv::Reader::from_reader(data.as_bytes())).unwrap();

        assert_eq!(
            roster,
            [
                student("cjtsui", "Connor Tsui"),
                student("ferris", "Ferris The Crab")
            ]
        );
    }

    #[test]
    fn malformed_row_is_an_error() {
        let data = "id,name\ncjtsui\n";
        assert!(matches!(
            parse_roster(csv::Reader::from_reader(data.as_bytes())),
            Err(AttendanceError::Roster(_))
        ));
    }

    #[test]
    fn sync_adds_and_drops() {
        let manager = AttendanceManager::in_memory().unwrap();
        manager
            .insert_students(&[student("a", "Alice"), student("b", "Bob")])
            .unwrap();

        let diff = sync_roster(&manager, &[student("b", "Bob"), student("c", "Carol")]).unwrap();

        assert_eq!(diff.added, [student("c", "Carol")]);
        assert_eq!(diff.dropped, [student("a", "Alice")]);
        assert_eq!(manager.get_roster_ids().unwrap(), ["b", "c"]);
    }

    #[test]
    fn students_with_records_cannot_be_dropped() {
        let manager = AttendanceManager::in_memory().unwrap();
        manager.insert_students(&[student("b", "Bob")]).unwrap();
        manager.resolve_active_session().unwrap();
        // Alice joins after the session started, so she has no record and could be dropped alone.
        manager.insert_students(&[student("a", "Alice")]).unwrap();

        assert!(matches!(
            sync_roster(&manager, &[student("c", "Carol")]),
            Err(AttendanceError::Database(_))
        ));
        assert_eq!(manager.get_roster_ids().unwrap(), ["a", "b"]);
    }
}

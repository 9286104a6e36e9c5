use rollcall::AttendanceError;
use rollcall::dashboard::Summary;
use rollcall::manager::AttendanceManager;
use rollcall::models::{SessionStatus, Status, Student};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn roster(ids: &[&str]) -> Vec<Student> {
    ids.iter()
        .map(|id| Student {
            id: id.to_string(),
            name: format!("Student {id}"),
        })
        .collect()
}

#[test]
fn full_session_lifecycle() {
    let manager = AttendanceManager::in_memory().unwrap();
    manager.insert_students(&roster(&["A", "B", "C"])).unwrap();

    let session = manager.resolve_active_session().unwrap();
    let records = manager.session_records(session.id).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.status == Status::Pending));

    manager.mark_present(session.id, "A").unwrap();
    manager.mark_present(session.id, "B").unwrap();
    assert_eq!(
        manager.summarize(session.id).unwrap(),
        Summary {
            total_students: 3,
            present: 2,
            absent: 0,
            pending: 1,
        }
    );

    manager.set_final_headcount(session.id, 3).unwrap();
    assert!(matches!(
        manager.check_ready_for_finalization(session.id),
        Err(AttendanceError::HeadcountMismatch {
            present: 2,
            headcount: 3
        })
    ));

    manager.set_final_headcount(session.id, 2).unwrap();
    let confirmation = manager.check_ready_for_finalization(session.id).unwrap();
    let finalized = manager.finalize_session(confirmation).unwrap();
    assert_eq!(finalized.status, SessionStatus::Completed);

    let next = manager.resolve_active_session().unwrap();
    assert_ne!(next.id, session.id);
    let records = manager.session_records(next.id).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.status == Status::Pending));

    // The finalized session keeps its records as they were.
    assert_eq!(
        manager.summarize(session.id).unwrap(),
        Summary {
            total_students: 3,
            present: 2,
            absent: 0,
            pending: 1,
        }
    );
}

#[test]
fn finalized_session_rejects_ledger_writes() {
    let manager = AttendanceManager::in_memory().unwrap();
    manager.insert_students(&roster(&["A", "B"])).unwrap();

    let session = manager.resolve_active_session().unwrap();
    let record = manager.mark_present(session.id, "A").unwrap();
    manager.set_final_headcount(session.id, 1).unwrap();
    let confirmation = manager.check_ready_for_finalization(session.id).unwrap();
    manager.finalize_session(confirmation).unwrap();

    assert!(matches!(
        manager.mark_present(session.id, "B"),
        Err(AttendanceError::SessionClosed(id)) if id == session.id
    ));
    assert!(matches!(
        manager.set_status(record.id, Status::Absent),
        Err(AttendanceError::SessionClosed(id)) if id == session.id
    ));
    assert!(matches!(
        manager.bootstrap(session.id, &["B".to_string()]),
        Err(AttendanceError::SessionClosed(_))
    ));

    let unchanged = manager.get_record(session.id, "A").unwrap().unwrap();
    assert_eq!(unchanged, record);
}

#[test]
fn repeated_marks_converge() {
    let manager = Arc::new(AttendanceManager::in_memory().unwrap());
    manager.insert_students(&roster(&["A", "B"])).unwrap();
    let session = manager.resolve_active_session().unwrap().id;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&manager);
            let student = if i % 2 == 0 { "A" } else { "B" };
            thread::spawn(move || manager.mark_present(session, student).unwrap())
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let records = manager.session_records(session).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == Status::Present));
    assert!(records.iter().all(|r| r.last_seen.is_some()));
}

#[test]
fn concurrent_resolves_share_one_session() {
    const CALLERS: usize = 16;

    let manager = Arc::new(AttendanceManager::in_memory().unwrap());
    manager.insert_students(&roster(&["A", "B", "C"])).unwrap();
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.resolve_active_session().unwrap().id
            })
        })
        .collect();

    let ids: HashSet<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), 1);

    assert_eq!(manager.list_sessions().unwrap().len(), 1);
    let session = *ids.iter().next().unwrap();
    assert_eq!(manager.session_records(session).unwrap().len(), 3);
}

#[test]
fn concurrent_resolves_across_connections_share_one_session() {
    const CALLERS: usize = 4;

    let dir = tempfile::tempdir().unwrap();
    let url = dir.path().join("attendance.db");
    let url = url.to_str().unwrap();

    let managers: Vec<AttendanceManager> = (0..CALLERS)
        .map(|_| AttendanceManager::connect(url).unwrap())
        .collect();
    managers[0].insert_students(&roster(&["A", "B"])).unwrap();

    let barrier = Arc::new(Barrier::new(CALLERS));
    let handles: Vec<_> = managers
        .into_iter()
        .map(|manager| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let session = manager.resolve_active_session().unwrap();
                (session.id, manager)
            })
        })
        .collect();

    let results: Vec<(i32, AttendanceManager)> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    let ids: HashSet<i32> = results.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids.len(), 1);

    let (session, manager) = &results[0];
    assert_eq!(manager.list_sessions().unwrap().len(), 1);
    assert_eq!(manager.session_records(*session).unwrap().len(), 2);
}

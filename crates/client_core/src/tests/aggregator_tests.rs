use std::collections::HashSet;

use shared::domain::{CompletionId, CompletionStatus};

use super::*;
use crate::fake_api::{employee, enrollment, program, session, ts, FakeState, FakeTrainingApi};

fn completion(id: i64, employee_id: i64, program_id: i64, stored_name: &str) -> Completion {
    Completion {
        id: CompletionId(id),
        employee_id: EmployeeId(employee_id),
        employee_name: stored_name.into(),
        program_id: ProgramId(program_id),
        program_name: "Old program name".into(),
        completion_date: ts(20, 12),
        score: 88.0,
        status: CompletionStatus::Complete,
        certificate_url: None,
        completed_by: "hr".into(),
    }
}

fn seeded() -> FakeState {
    let mut state = FakeState {
        programs: vec![
            program(1, "Safety", "Compliance"),
            program(2, "Rust 101", "Engineering"),
        ],
        employees: vec![
            employee(10, "Ada", "Lovelace", "R&D"),
            employee(11, "Brian", "Kernighan", "Ops"),
            employee(12, "Cleo", "Patra", "Sales"),
        ],
        ..FakeState::default()
    };
    state.enrollments.insert(
        EmployeeId(10),
        vec![
            enrollment(100, 1, "stale", EnrollmentStatus::Enrolled, ts(2, 9)),
            enrollment(101, 2, "Rust 101", EnrollmentStatus::Completed, ts(3, 9)),
        ],
    );
    state.enrollments.insert(
        EmployeeId(11),
        vec![enrollment(110, 1, "Safety", EnrollmentStatus::Dropped, ts(4, 9))],
    );
    state.enrollments.insert(
        EmployeeId(12),
        vec![enrollment(120, 2, "Rust 101", EnrollmentStatus::InProgress, ts(5, 9))],
    );
    state
}

fn aggregator(api: Arc<FakeTrainingApi>) -> Aggregator {
    Aggregator::new(api, 2)
}

#[tokio::test]
async fn all_enrollments_tags_rows_with_employee_and_current_program_name() {
    let api = FakeTrainingApi::new(seeded());

    let roster = aggregator(api).all_enrollments().await.expect("roster");

    assert!(!roster.is_partial());
    let ids: Vec<i64> = roster.rows.iter().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![100, 101, 110, 120]);
    let first = &roster.rows[0];
    assert_eq!(first.employee_id, EmployeeId(10));
    assert_eq!(first.employee_name, "Ada Lovelace");
    assert_eq!(first.employee_email, "ada@corp.test");
    assert_eq!(first.program_name, "Safety");
}

#[tokio::test]
async fn enrollment_rows_serialize_with_wire_field_names() {
    let api = FakeTrainingApi::new(seeded());
    let roster = aggregator(api).all_enrollments().await.expect("roster");

    let value = serde_json::to_value(&roster.rows[0]).expect("serialize");

    assert_eq!(value["id"], 100);
    assert_eq!(value["employeeId"], 10);
    assert_eq!(value["employeeName"], "Ada Lovelace");
    assert_eq!(value["programName"], "Safety");
    assert_eq!(value["enrollmentDate"], "2024-05-02T09:00:00");
    assert_eq!(value["status"], "ENROLLED");
}

#[tokio::test]
async fn one_failing_employee_does_not_abort_the_roster() {
    let mut state = seeded();
    state.failing_employees = HashSet::from([EmployeeId(11)]);
    let api = FakeTrainingApi::new(state);

    let roster = aggregator(api).all_enrollments().await.expect("roster");

    assert!(roster.is_partial());
    assert_eq!(roster.skipped.len(), 1);
    assert_eq!(roster.skipped[0].employee_id, EmployeeId(11));
    assert_eq!(roster.skipped[0].source.status(), Some(500));
    let ids: Vec<i64> = roster.rows.iter().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![100, 101, 120]);
}

#[tokio::test]
async fn no_employees_yields_an_empty_roster() {
    let api = FakeTrainingApi::new(FakeState::default());
    let aggregator = aggregator(api);

    let roster = aggregator.all_enrollments().await.expect("empty roster");

    assert!(roster.rows.is_empty());
    assert!(!roster.is_partial());
}

#[tokio::test]
async fn find_enrollment_scans_employees_and_skips_failures() {
    let mut state = seeded();
    state.failing_employees = HashSet::from([EmployeeId(10)]);
    let api = FakeTrainingApi::new(state);
    let aggregator = aggregator(api);

    let found = aggregator
        .find_enrollment(EnrollmentId(120))
        .await
        .expect("lookup")
        .expect("enrollment exists");
    assert_eq!(found.employee_name, "Cleo Patra");
    assert_eq!(found.program_id, ProgramId(2));

    let missing = aggregator
        .find_enrollment(EnrollmentId(999))
        .await
        .expect("lookup");
    assert_eq!(missing, None);
}

#[test]
fn upcoming_sessions_are_strictly_future_sorted_and_capped() {
    let now = ts(10, 12);
    let sessions = vec![
        session(1, "past", ts(9, 9), Some(1)),
        session(2, "now", now, Some(1)),
        session(3, "d", ts(14, 9), Some(1)),
        session(4, "a", ts(11, 9), None),
        session(5, "f", ts(16, 9), Some(2)),
        session(6, "b", ts(12, 9), Some(2)),
        session(7, "e", ts(15, 9), Some(2)),
        session(8, "c", ts(13, 9), Some(1)),
    ];

    let upcoming = upcoming_sessions(&sessions, now);

    let titles: Vec<&str> = upcoming.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn sessions_for_program_keeps_api_order_and_skips_unlinked() {
    let sessions = vec![
        session(1, "late", ts(20, 9), Some(1)),
        session(2, "other", ts(11, 9), Some(2)),
        session(3, "early", ts(12, 9), Some(1)),
        session(4, "orphan", ts(13, 9), None),
    ];

    let ids: Vec<i64> = sessions_for_program(sessions, ProgramId(1))
        .iter()
        .map(|s| s.id.0)
        .collect();

    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn session_rows_fall_back_to_unknown_program() {
    let programs = vec![program(1, "Safety", "Compliance")];
    let rows = session_rows(
        vec![
            session(1, "s1", ts(11, 9), Some(1)),
            session(2, "s2", ts(11, 9), Some(9)),
            session(3, "s3", ts(11, 9), None),
        ],
        &programs,
    );

    let names: Vec<&str> = rows.iter().map(|r| r.program_name.as_str()).collect();
    assert_eq!(names, vec!["Safety", UNKNOWN_PROGRAM, UNKNOWN_PROGRAM]);
}

#[tokio::test]
async fn tracking_rows_use_current_names_and_keep_stored_ones_for_dangling_refs() {
    let mut state = seeded();
    state.completions = vec![
        completion(1, 10, 2, "Ada Byron"),
        completion(2, 99, 77, "Former Employee"),
    ];
    let api = FakeTrainingApi::new(state);

    let rows = aggregator(api).completion_rows().await.expect("completions");

    assert_eq!(rows[0].employee_name, "Ada Lovelace");
    assert_eq!(rows[0].program_name, "Rust 101");
    assert_eq!(rows[1].employee_name, "Former Employee");
    assert_eq!(rows[1].program_name, "Old program name");
}

#[tokio::test]
async fn employee_profile_filters_completions_and_propagates_not_found() {
    let mut state = seeded();
    state.completions = vec![completion(1, 10, 2, "x"), completion(2, 11, 1, "y")];
    let api = FakeTrainingApi::new(state);
    let aggregator = aggregator(api);

    let profile = aggregator
        .employee_profile(EmployeeId(10))
        .await
        .expect("profile");
    assert_eq!(profile.employee.first_name, "Ada");
    assert_eq!(profile.enrollments.len(), 2);
    assert_eq!(profile.completions.len(), 1);
    assert_eq!(profile.completions[0].employee_id, EmployeeId(10));
    assert_eq!(profile.completions[0].employee_name, "Ada Lovelace");
    assert_eq!(profile.completions[0].program_name, "Rust 101");
    assert_eq!(profile.enrollments[0].program_name, "Safety");

    let listed = aggregator.completion_rows().await.expect("completions");
    let same = listed
        .iter()
        .find(|c| c.id == profile.completions[0].id)
        .expect("listed");
    assert_eq!(same, &profile.completions[0]);

    let err = aggregator
        .employee_profile(EmployeeId(404))
        .await
        .expect_err("missing employee");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn program_overview_lists_only_that_programs_sessions() {
    let mut state = seeded();
    state.sessions = vec![
        session(1, "a", ts(11, 9), Some(1)),
        session(2, "b", ts(12, 9), Some(2)),
    ];
    let api = FakeTrainingApi::new(state);

    let overview = aggregator(api)
        .program_overview(ProgramId(2))
        .await
        .expect("overview");

    assert_eq!(overview.program.name, "Rust 101");
    assert_eq!(overview.sessions.len(), 1);
    assert_eq!(overview.sessions[0].id, SessionId(2));
}

#[tokio::test]
async fn dashboard_counts_and_lists() {
    let mut state = seeded();
    state.programs = (1..=7)
        .map(|id| program(id, &format!("P{id}"), "General"))
        .collect();
    state.sessions = vec![
        session(1, "past", ts(1, 9), Some(1)),
        session(2, "soon", ts(12, 9), Some(1)),
    ];
    state.completions = vec![completion(1, 10, 2, "x")];
    let api = FakeTrainingApi::new(state);

    let summary = aggregator(api).dashboard(ts(10, 0)).await.expect("dashboard");

    assert_eq!(summary.total_programs, 7);
    assert_eq!(summary.total_employees, 3);
    assert_eq!(summary.active_enrollments, 2);
    assert_eq!(summary.total_completions, 1);
    let recent: Vec<i64> = summary.recent_programs.iter().map(|p| p.id.0).collect();
    assert_eq!(recent, vec![1, 2, 3, 4, 5]);
    assert_eq!(summary.upcoming_sessions.len(), 1);
    assert_eq!(summary.upcoming_sessions[0].title, "soon");
}

#[tokio::test]
async fn fan_out_requests_each_employee_once() {
    let api = FakeTrainingApi::new(seeded());
    aggregator(api.clone())
        .all_enrollments()
        .await
        .expect("roster");

    let per_employee = api
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("enrollments_for_employee"))
        .count();
    assert_eq!(per_employee, 3);
}

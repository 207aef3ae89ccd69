use std::sync::Arc;

use shared::domain::{AttendanceId, FeedbackId};

use super::*;
use crate::{
    aggregator::session_rows,
    fake_api::{employee, enrollment, program, session, ts, FakeState, FakeTrainingApi},
};

fn roster_rows() -> Vec<EnrollmentRow> {
    let ada = employee(10, "Ada", "Lovelace", "R&D");
    let brian = employee(11, "Brian", "Kernighan", "Ops");
    vec![
        EnrollmentRow::new(
            &ada,
            enrollment(100, 1, "Safety", EnrollmentStatus::Enrolled, ts(2, 9)),
        ),
        EnrollmentRow::new(
            &ada,
            enrollment(101, 2, "Rust 101", EnrollmentStatus::InProgress, ts(6, 9)),
        ),
        EnrollmentRow::new(
            &brian,
            enrollment(110, 1, "Safety", EnrollmentStatus::Completed, ts(4, 9)),
        ),
    ]
}

fn enrollment_fake() -> Arc<FakeTrainingApi> {
    let mut state = FakeState::default();
    state.enrollments.insert(
        EmployeeId(10),
        vec![
            enrollment(100, 1, "Safety", EnrollmentStatus::Enrolled, ts(2, 9)),
            enrollment(101, 2, "Rust 101", EnrollmentStatus::InProgress, ts(6, 9)),
        ],
    );
    state.enrollments.insert(
        EmployeeId(11),
        vec![enrollment(110, 1, "Safety", EnrollmentStatus::Completed, ts(4, 9))],
    );
    FakeTrainingApi::new(state)
}

fn loaded<T, F: ListFilter<T> + Default>(records: Vec<T>) -> ListView<T, F> {
    let mut view = ListView::default();
    view.load(Ok(records));
    view
}

#[test]
fn empty_filters_keep_every_record_in_api_order() {
    let view: EmployeeListView = loaded(vec![
        employee(3, "Cleo", "Patra", "Sales"),
        employee(1, "Ada", "Lovelace", "R&D"),
        employee(2, "Brian", "Kernighan", "Ops"),
    ]);

    let ids: Vec<i64> = view.visible().iter().map(|e| e.id.0).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(view.state(), &LoadState::Ready);
}

#[test]
fn employee_search_is_case_insensitive_and_combines_with_department() {
    let mut view: EmployeeListView = loaded(vec![
        employee(1, "Ada", "Lovelace", "R&D"),
        employee(2, "Adam", "Smith", "Ops"),
        employee(3, "Brian", "Kernighan", "R&D"),
    ]);

    view.filter.search = "ADA".into();
    let ids: Vec<i64> = view.visible().iter().map(|e| e.id.0).collect();
    assert_eq!(ids, vec![1, 2]);

    view.filter.department = "R&D".into();
    let ids: Vec<i64> = view.visible().iter().map(|e| e.id.0).collect();
    assert_eq!(ids, vec![1]);

    view.filter.search = "e003".into();
    view.filter.department.clear();
    let ids: Vec<i64> = view.visible().iter().map(|e| e.id.0).collect();
    assert_eq!(ids, vec![3]);
}

#[test]
fn department_and_category_choices_are_distinct() {
    let employees: EmployeeListView = loaded(vec![
        employee(1, "Ada", "Lovelace", "R&D"),
        employee(2, "Brian", "Kernighan", "Ops"),
        employee(3, "Cleo", "Patra", "R&D"),
    ]);
    assert_eq!(employees.departments(), vec!["R&D", "Ops"]);

    let programs: ProgramListView = loaded(vec![
        program(1, "Safety", "Compliance"),
        program(2, "Rust", "Engineering"),
        program(3, "Fire drills", "Compliance"),
    ]);
    assert_eq!(programs.categories(), vec!["Compliance", "Engineering"]);
}

#[test]
fn program_search_matches_description_too() {
    let mut view: ProgramListView = loaded(vec![
        program(1, "Safety", "Compliance"),
        program(2, "Rust 101", "Engineering"),
    ]);

    view.filter.search = "rust 101 DESCRIPTION".into();

    let ids: Vec<i64> = view.visible().iter().map(|p| p.id.0).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn sessions_sort_latest_first_and_filter_by_program() {
    let rows = session_rows(
        vec![
            session(1, "Intro", ts(3, 9), Some(1)),
            session(2, "Deep dive", ts(9, 9), Some(2)),
            session(3, "Refresher", ts(6, 9), Some(1)),
        ],
        &[program(1, "Safety", "Compliance")],
    );
    let mut view: SessionListView = loaded(rows);

    let ids: Vec<i64> = view.visible().iter().map(|r| r.session.id.0).collect();
    assert_eq!(ids, vec![2, 3, 1]);

    view.filter.program = Some(ProgramId(1));
    let ids: Vec<i64> = view.visible().iter().map(|r| r.session.id.0).collect();
    assert_eq!(ids, vec![3, 1]);

    view.filter.search = "INTRO".into();
    let ids: Vec<i64> = view.visible().iter().map(|r| r.session.id.0).collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn enrollments_sort_newest_first_and_filter_by_status() {
    let mut view: EnrollmentListView = loaded(roster_rows());

    let ids: Vec<i64> = view.visible().iter().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![101, 110, 100]);

    view.filter.status = Some(EnrollmentStatus::Completed);
    let ids: Vec<i64> = view.visible().iter().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![110]);

    view.filter.status = None;
    view.filter.search = "kernighan".into();
    let ids: Vec<i64> = view.visible().iter().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![110]);
}

#[test]
fn attendance_filters_by_day_and_presence() {
    let record = |id: i64, day: u32, present: bool| Attendance {
        id: AttendanceId(id),
        employee_id: EmployeeId(10),
        employee_name: "Ada Lovelace".into(),
        session_id: SessionId(1),
        session_name: "Intro".into(),
        attendance_time: ts(day, 9),
        present,
        notes: None,
    };
    let mut view: AttendanceListView = loaded(vec![
        record(1, 3, true),
        record(2, 3, false),
        record(3, 4, true),
    ]);

    view.filter.date = chrono::NaiveDate::from_ymd_opt(2024, 5, 3);
    let ids: Vec<i64> = view.visible().iter().map(|a| a.id.0).collect();
    assert_eq!(ids, vec![1, 2]);

    view.filter.present = Some(false);
    let ids: Vec<i64> = view.visible().iter().map(|a| a.id.0).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn feedback_search_covers_comments_and_type() {
    let record = |id: i64, kind: FeedbackType, comments: Option<&str>| Feedback {
        id: FeedbackId(id),
        employee_id: EmployeeId(10),
        employee_name: "Ada Lovelace".into(),
        program_id: ProgramId(1),
        program_name: "Safety".into(),
        rating: Some(4),
        comments: comments.map(str::to_string),
        provided_by: "Ada".into(),
        feedback_date: ts(id as u32, 9),
        kind,
    };
    let mut view: FeedbackListView = loaded(vec![
        record(1, FeedbackType::EmployeeToProgram, Some("Great pacing")),
        record(2, FeedbackType::TrainerToEmployee, None),
    ]);

    view.filter.search = "PACING".into();
    let ids: Vec<i64> = view.visible().iter().map(|f| f.id.0).collect();
    assert_eq!(ids, vec![1]);

    view.filter.search.clear();
    view.filter.kind = Some(FeedbackType::TrainerToEmployee);
    let ids: Vec<i64> = view.visible().iter().map(|f| f.id.0).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn list_failures_show_a_message_and_only_details_report_not_found() {
    let mut view: ProgramListView = loaded(vec![program(1, "Safety", "Compliance")]);
    view.load(Err(ClientError::Network {
        status: 503,
        path: "/api/training/programs".into(),
        body: String::new(),
    }));
    assert!(view.records().is_empty());
    assert_eq!(view.state().message(), Some("Server returned HTTP 503"));

    view.load(Err(ClientError::NotFound {
        path: "/api/training/programs".into(),
    }));
    assert_eq!(
        view.state(),
        &LoadState::Failed("The requested record was not found".into())
    );

    let mut detail: DetailView<TrainingProgram> = DetailView::default();
    assert!(detail.state().is_loading());
    detail.load(Err(ClientError::NotFound {
        path: "/api/training/programs/9".into(),
    }));
    assert_eq!(detail.state(), &LoadState::NotFound);
    assert!(detail.record().is_none());
}

#[test]
fn completed_enrollments_only_offer_a_completion() {
    assert_eq!(
        enrollment_actions(EnrollmentStatus::Completed),
        vec![EnrollmentAction::GenerateCompletion]
    );
    assert_eq!(
        enrollment_actions(EnrollmentStatus::Enrolled),
        vec![
            EnrollmentAction::ChangeStatus(EnrollmentStatus::InProgress),
            EnrollmentAction::ChangeStatus(EnrollmentStatus::Completed),
            EnrollmentAction::ChangeStatus(EnrollmentStatus::Dropped),
        ]
    );
}

#[tokio::test]
async fn status_update_changes_only_the_target_row_and_is_idempotent() {
    let api = enrollment_fake();
    let mut view: EnrollmentListView = loaded(roster_rows());

    for _ in 0..2 {
        update_enrollment_status(
            &*api,
            &mut view,
            EnrollmentId(100),
            EnrollmentStatus::Dropped,
        )
        .await
        .expect("status update");
    }

    let statuses: Vec<EnrollmentStatus> = view.records().iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            EnrollmentStatus::Dropped,
            EnrollmentStatus::InProgress,
            EnrollmentStatus::Completed,
        ]
    );
    assert_eq!(
        api.enrollment_status(EnrollmentId(100)),
        Some(EnrollmentStatus::Dropped)
    );
}

#[tokio::test]
async fn failed_status_update_leaves_local_state_untouched() {
    let api = enrollment_fake();
    api.state.lock().unwrap().fail_status_update = true;
    let mut view: EnrollmentListView = loaded(roster_rows());
    let before = view.records().to_vec();

    let err = update_enrollment_status(
        &*api,
        &mut view,
        EnrollmentId(100),
        EnrollmentStatus::Completed,
    )
    .await
    .expect_err("backend failure");

    assert_eq!(err.status(), Some(500));
    assert_eq!(view.records(), before.as_slice());
}

#[tokio::test]
async fn delete_removes_exactly_one_record() {
    let api = FakeTrainingApi::new(FakeState {
        employees: vec![
            employee(1, "Ada", "Lovelace", "R&D"),
            employee(2, "Brian", "Kernighan", "Ops"),
            employee(3, "Cleo", "Patra", "Sales"),
        ],
        ..FakeState::default()
    });
    let mut view: EmployeeListView = loaded(api.list_employees().await.expect("list"));

    delete_employee(&*api, &mut view, EmployeeId(2))
        .await
        .expect("delete");

    let ids: Vec<i64> = view.records().iter().map(|e| e.id.0).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(view.get(EmployeeId(2)).is_none());
    assert_eq!(api.list_employees().await.expect("list").len(), 2);
}

#[tokio::test]
async fn failed_delete_keeps_the_record() {
    let api = FakeTrainingApi::new(FakeState {
        programs: vec![program(1, "Safety", "Compliance")],
        fail_deletes: true,
        ..FakeState::default()
    });
    let mut view: ProgramListView = loaded(vec![program(1, "Safety", "Compliance")]);

    delete_program(&*api, &mut view, ProgramId(1))
        .await
        .expect_err("delete fails");

    assert!(view.get(ProgramId(1)).is_some());
}

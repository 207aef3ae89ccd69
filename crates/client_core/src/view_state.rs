//! Per-screen derived state: free-text and categorical filters and the fixed
//! sort of each list screen, plus the local mutations that follow a
//! successful status update or delete.

use chrono::{NaiveDate, NaiveDateTime};
use shared::{
    domain::{
        CompletionStatus, EmployeeId, EnrollmentId, EnrollmentStatus, FeedbackType, ProgramId,
        SessionId,
    },
    protocol::{Attendance, Completion, Employee, Feedback, TrainingProgram},
};
use tracing::info;

use crate::{
    aggregator::{EnrollmentRow, SessionRow},
    error::ClientError,
    resources::{ApiResult, TrainingApi},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    NotFound,
    Failed(String),
}

impl LoadState {
    /// Detail screens distinguish a missing record from other failures.
    pub fn from_detail_error(err: &ClientError) -> Self {
        if err.is_not_found() {
            LoadState::NotFound
        } else {
            LoadState::Failed(err.user_message())
        }
    }

    /// List screens show every failure, 404 included, as a message.
    pub fn from_list_error(err: &ClientError) -> Self {
        LoadState::Failed(err.user_message())
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Case-insensitive substring match against any of `fields`. An empty
/// needle matches everything.
pub fn matches_text(needle: &str, fields: &[&str]) -> bool {
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Exact categorical match where an empty choice means "no filter".
pub fn matches_choice(choice: &str, value: &str) -> bool {
    choice.is_empty() || choice == value
}

pub fn same_day(timestamp: NaiveDateTime, day: Option<NaiveDate>) -> bool {
    day.map_or(true, |day| timestamp.date() == day)
}

/// Distinct non-empty values in first-seen order.
pub fn distinct_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !seen.iter().any(|v| v == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

pub trait ListFilter<T> {
    fn matches(&self, record: &T) -> bool;

    /// Reorders the visible records. Must be stable; the default keeps API order.
    fn sort(&self, _records: &mut [&T]) {}
}

pub trait Keyed {
    type Key: Copy + Eq;

    fn key(&self) -> Self::Key;
}

impl Keyed for Employee {
    type Key = EmployeeId;

    fn key(&self) -> EmployeeId {
        self.id
    }
}

impl Keyed for TrainingProgram {
    type Key = ProgramId;

    fn key(&self) -> ProgramId {
        self.id
    }
}

impl Keyed for SessionRow {
    type Key = SessionId;

    fn key(&self) -> SessionId {
        self.session.id
    }
}

impl Keyed for EnrollmentRow {
    type Key = EnrollmentId;

    fn key(&self) -> EnrollmentId {
        self.id
    }
}

/// Raw records owned by one screen together with its filter state.
#[derive(Debug, Clone)]
pub struct ListView<T, F> {
    records: Vec<T>,
    pub filter: F,
    state: LoadState,
}

impl<T, F: ListFilter<T> + Default> Default for ListView<T, F> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            filter: F::default(),
            state: LoadState::Loading,
        }
    }
}

impl<T, F: ListFilter<T>> ListView<T, F> {
    pub fn new(filter: F) -> Self {
        Self {
            records: Vec::new(),
            filter,
            state: LoadState::Loading,
        }
    }

    /// Applies a fetch result. On failure the previous records are dropped and
    /// the screen shows the error message instead.
    pub fn load(&mut self, result: ApiResult<Vec<T>>) {
        match result {
            Ok(records) => {
                self.records = records;
                self.state = LoadState::Ready;
            }
            Err(err) => {
                self.records.clear();
                self.state = LoadState::from_list_error(&err);
            }
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn visible(&self) -> Vec<&T> {
        let mut visible: Vec<&T> = self
            .records
            .iter()
            .filter(|record| self.filter.matches(record))
            .collect();
        self.filter.sort(&mut visible);
        visible
    }
}

impl<T: Keyed, F> ListView<T, F> {
    /// Drops exactly the record with `key`; returns whether it was present.
    pub fn remove(&mut self, key: T::Key) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.key() != key);
        self.records.len() != before
    }

    pub fn get(&self, key: T::Key) -> Option<&T> {
        self.records.iter().find(|record| record.key() == key)
    }

    fn get_mut(&mut self, key: T::Key) -> Option<&mut T> {
        self.records.iter_mut().find(|record| record.key() == key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub search: String,
    pub department: String,
}

impl ListFilter<Employee> for EmployeeFilter {
    fn matches(&self, e: &Employee) -> bool {
        let haystack = format!(
            "{} {} {} {}",
            e.first_name, e.last_name, e.email, e.employee_id
        );
        matches_text(&self.search, &[haystack.as_str()])
            && matches_choice(&self.department, &e.department)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgramFilter {
    pub search: String,
    pub category: String,
}

impl ListFilter<TrainingProgram> for ProgramFilter {
    fn matches(&self, p: &TrainingProgram) -> bool {
        matches_text(&self.search, &[p.name.as_str(), p.description.as_str()])
            && matches_choice(&self.category, &p.category)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub search: String,
    pub program: Option<ProgramId>,
}

impl ListFilter<SessionRow> for SessionFilter {
    fn matches(&self, row: &SessionRow) -> bool {
        let session = &row.session;
        let description = session.description.as_deref().unwrap_or_default();
        matches_text(&self.search, &[session.title.as_str(), description])
            && self
                .program
                .map_or(true, |id| session.training_program_id == Some(id))
    }

    fn sort(&self, records: &mut [&SessionRow]) {
        records.sort_by(|a, b| b.session.start_time.cmp(&a.session.start_time));
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub search: String,
    pub status: Option<EnrollmentStatus>,
}

impl ListFilter<EnrollmentRow> for EnrollmentFilter {
    fn matches(&self, row: &EnrollmentRow) -> bool {
        matches_text(
            &self.search,
            &[row.program_name.as_str(), row.employee_name.as_str()],
        ) && self.status.map_or(true, |status| row.status == status)
    }

    fn sort(&self, records: &mut [&EnrollmentRow]) {
        records.sort_by(|a, b| b.enrollment_date.cmp(&a.enrollment_date));
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub search: String,
    pub date: Option<NaiveDate>,
    /// `Some(true)` keeps present records, `Some(false)` absent ones.
    pub present: Option<bool>,
}

impl ListFilter<Attendance> for AttendanceFilter {
    fn matches(&self, a: &Attendance) -> bool {
        matches_text(
            &self.search,
            &[a.employee_name.as_str(), a.session_name.as_str()],
        ) && same_day(a.attendance_time, self.date)
            && self.present.map_or(true, |present| a.present == present)
    }

    fn sort(&self, records: &mut [&Attendance]) {
        records.sort_by(|a, b| b.attendance_time.cmp(&a.attendance_time));
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompletionFilter {
    pub search: String,
    pub date: Option<NaiveDate>,
    pub status: Option<CompletionStatus>,
}

impl ListFilter<Completion> for CompletionFilter {
    fn matches(&self, c: &Completion) -> bool {
        matches_text(
            &self.search,
            &[c.employee_name.as_str(), c.program_name.as_str()],
        ) && same_day(c.completion_date, self.date)
            && self.status.map_or(true, |status| c.status == status)
    }

    fn sort(&self, records: &mut [&Completion]) {
        records.sort_by(|a, b| b.completion_date.cmp(&a.completion_date));
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub search: String,
    pub kind: Option<FeedbackType>,
}

impl ListFilter<Feedback> for FeedbackFilter {
    fn matches(&self, f: &Feedback) -> bool {
        let comments = f.comments.as_deref().unwrap_or_default();
        matches_text(
            &self.search,
            &[f.employee_name.as_str(), f.program_name.as_str(), comments],
        ) && self.kind.map_or(true, |kind| f.kind == kind)
    }

    fn sort(&self, records: &mut [&Feedback]) {
        records.sort_by(|a, b| b.feedback_date.cmp(&a.feedback_date));
    }
}

pub type EmployeeListView = ListView<Employee, EmployeeFilter>;
pub type ProgramListView = ListView<TrainingProgram, ProgramFilter>;
pub type SessionListView = ListView<SessionRow, SessionFilter>;
pub type EnrollmentListView = ListView<EnrollmentRow, EnrollmentFilter>;
pub type AttendanceListView = ListView<Attendance, AttendanceFilter>;
pub type CompletionListView = ListView<Completion, CompletionFilter>;
pub type FeedbackListView = ListView<Feedback, FeedbackFilter>;

impl EmployeeListView {
    pub fn departments(&self) -> Vec<String> {
        distinct_values(self.records.iter().map(|e| e.department.as_str()))
    }
}

impl ProgramListView {
    pub fn categories(&self) -> Vec<String> {
        distinct_values(self.records.iter().map(|p| p.category.as_str()))
    }
}

/// What the enrollment screen offers for a record in `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentAction {
    ChangeStatus(EnrollmentStatus),
    GenerateCompletion,
}

pub fn enrollment_actions(status: EnrollmentStatus) -> Vec<EnrollmentAction> {
    if status == EnrollmentStatus::Completed {
        return vec![EnrollmentAction::GenerateCompletion];
    }
    EnrollmentStatus::ALL
        .into_iter()
        .filter(|candidate| *candidate != status)
        .map(EnrollmentAction::ChangeStatus)
        .collect()
}

/// Patches one enrollment's status, then mirrors the change locally without
/// refetching. Local state is untouched when the API call fails.
pub async fn update_enrollment_status(
    api: &dyn TrainingApi,
    view: &mut EnrollmentListView,
    id: EnrollmentId,
    status: EnrollmentStatus,
) -> ApiResult<()> {
    api.update_enrollment_status(id, status).await?;
    if let Some(row) = view.get_mut(id) {
        row.status = status;
    }
    info!(enrollment_id = %id, status = status.as_str(), "enrollment status updated");
    Ok(())
}

pub async fn delete_employee(
    api: &dyn TrainingApi,
    view: &mut EmployeeListView,
    id: EmployeeId,
) -> ApiResult<()> {
    api.delete_employee(id).await?;
    view.remove(id);
    info!(employee_id = %id, "employee deleted");
    Ok(())
}

pub async fn delete_program(
    api: &dyn TrainingApi,
    view: &mut ProgramListView,
    id: ProgramId,
) -> ApiResult<()> {
    api.delete_program(id).await?;
    view.remove(id);
    info!(program_id = %id, "program deleted");
    Ok(())
}

pub async fn delete_session(
    api: &dyn TrainingApi,
    view: &mut SessionListView,
    id: SessionId,
) -> ApiResult<()> {
    api.delete_session(id).await?;
    view.remove(id);
    info!(session_id = %id, "session deleted");
    Ok(())
}

/// Single-record screen (employee or program detail).
#[derive(Debug, Clone)]
pub struct DetailView<T> {
    record: Option<T>,
    state: LoadState,
}

impl<T> Default for DetailView<T> {
    fn default() -> Self {
        Self {
            record: None,
            state: LoadState::Loading,
        }
    }
}

impl<T> DetailView<T> {
    pub fn load(&mut self, result: ApiResult<T>) {
        match result {
            Ok(record) => {
                self.record = Some(record);
                self.state = LoadState::Ready;
            }
            Err(err) => {
                self.record = None;
                self.state = LoadState::from_detail_error(&err);
            }
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn record(&self) -> Option<&T> {
        self.record.as_ref()
    }
}

#[cfg(test)]
#[path = "tests/view_state_tests.rs"]
mod tests;

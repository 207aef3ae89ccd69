//! Joins the per-resource lists returned by the backend into the
//! denormalized rows the list and detail screens render.
//!
//! Denormalized names (`employeeName`, `programName`, `sessionName`) are
//! always recomputed here from the referenced records. A name stored on a
//! record is only used when its reference no longer resolves.

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDateTime;
use futures::{stream, StreamExt};
use serde::Serialize;
use shared::{
    domain::{EmployeeId, EnrollmentId, EnrollmentStatus, ProgramId, SessionId},
    protocol::{Attendance, Completion, Employee, Enrollment, Feedback, Session, TrainingProgram},
};
use tracing::{debug, warn};

use crate::{
    error::PartialAggregationError,
    resources::{ApiResult, TrainingApi},
};

pub const UPCOMING_SESSION_LIMIT: usize = 5;
pub const DASHBOARD_PROGRAM_LIMIT: usize = 5;
pub const UNKNOWN_PROGRAM: &str = "Unknown Program";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRow {
    pub id: EnrollmentId,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub employee_email: String,
    pub program_id: ProgramId,
    pub program_name: String,
    pub enrollment_date: NaiveDateTime,
    pub status: EnrollmentStatus,
}

impl EnrollmentRow {
    pub fn new(employee: &Employee, enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            employee_id: employee.id,
            employee_name: employee.display_name(),
            employee_email: employee.email.clone(),
            program_id: enrollment.program_id,
            program_name: enrollment.program_name,
            enrollment_date: enrollment.enrollment_date,
            status: enrollment.status,
        }
    }
}

/// Result of the all-employees enrollment fan-out. `skipped` lists the
/// employees whose enrollments could not be fetched.
#[derive(Debug, Default)]
pub struct EnrollmentRoster {
    pub rows: Vec<EnrollmentRow>,
    pub skipped: Vec<PartialAggregationError>,
}

impl EnrollmentRoster {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub session: Session,
    pub program_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    pub employee: Employee,
    pub enrollments: Vec<EnrollmentRow>,
    pub completions: Vec<Completion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramOverview {
    pub program: TrainingProgram,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_programs: usize,
    pub total_employees: usize,
    pub active_enrollments: usize,
    pub total_completions: usize,
    pub recent_programs: Vec<TrainingProgram>,
    pub upcoming_sessions: Vec<Session>,
}

/// Current display names for every employee, program and session.
#[derive(Debug, Clone, Default)]
pub struct NameDirectory {
    employees: HashMap<EmployeeId, Employee>,
    programs: HashMap<ProgramId, String>,
    sessions: HashMap<SessionId, String>,
}

impl NameDirectory {
    pub fn from_records(
        employees: Vec<Employee>,
        programs: &[TrainingProgram],
        sessions: &[Session],
    ) -> Self {
        Self {
            employees: employees.into_iter().map(|e| (e.id, e)).collect(),
            programs: programs.iter().map(|p| (p.id, p.name.clone())).collect(),
            sessions: sessions.iter().map(|s| (s.id, s.title.clone())).collect(),
        }
    }

    pub fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.get(&id)
    }

    pub fn employee_name(&self, id: EmployeeId) -> Option<String> {
        self.employees.get(&id).map(Employee::display_name)
    }

    pub fn program_name(&self, id: ProgramId) -> Option<&str> {
        self.programs.get(&id).map(String::as_str)
    }

    pub fn session_name(&self, id: SessionId) -> Option<&str> {
        self.sessions.get(&id).map(String::as_str)
    }

    pub fn refresh_attendance(&self, record: &mut Attendance) {
        if let Some(name) = self.employee_name(record.employee_id) {
            record.employee_name = name;
        }
        if let Some(name) = self.session_name(record.session_id) {
            record.session_name = name.to_string();
        }
    }

    pub fn refresh_completion(&self, record: &mut Completion) {
        if let Some(name) = self.employee_name(record.employee_id) {
            record.employee_name = name;
        }
        if let Some(name) = self.program_name(record.program_id) {
            record.program_name = name.to_string();
        }
    }

    pub fn refresh_feedback(&self, record: &mut Feedback) {
        if let Some(name) = self.employee_name(record.employee_id) {
            record.employee_name = name;
        }
        if let Some(name) = self.program_name(record.program_id) {
            record.program_name = name.to_string();
        }
    }

    fn refresh_enrollment(&self, row: &mut EnrollmentRow) {
        if let Some(name) = self.program_name(row.program_id) {
            row.program_name = name.to_string();
        }
    }
}

/// Sessions belonging to one program, in API order.
pub fn sessions_for_program(sessions: Vec<Session>, program_id: ProgramId) -> Vec<Session> {
    sessions
        .into_iter()
        .filter(|session| session.training_program_id == Some(program_id))
        .collect()
}

/// The next [`UPCOMING_SESSION_LIMIT`] sessions starting strictly after `now`,
/// earliest first.
pub fn upcoming_sessions(sessions: &[Session], now: NaiveDateTime) -> Vec<Session> {
    let mut upcoming: Vec<Session> = sessions
        .iter()
        .filter(|session| session.start_time > now)
        .cloned()
        .collect();
    upcoming.sort_by_key(|session| session.start_time);
    upcoming.truncate(UPCOMING_SESSION_LIMIT);
    upcoming
}

pub fn session_rows(sessions: Vec<Session>, programs: &[TrainingProgram]) -> Vec<SessionRow> {
    let names: HashMap<ProgramId, &str> =
        programs.iter().map(|p| (p.id, p.name.as_str())).collect();
    sessions
        .into_iter()
        .map(|session| {
            let program_name = session
                .training_program_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(UNKNOWN_PROGRAM)
                .to_string();
            SessionRow {
                session,
                program_name,
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct Aggregator {
    api: Arc<dyn TrainingApi>,
    fanout_concurrency: usize,
}

impl Aggregator {
    pub fn new(api: Arc<dyn TrainingApi>, fanout_concurrency: usize) -> Self {
        Self {
            api,
            fanout_concurrency: fanout_concurrency.max(1),
        }
    }

    pub fn api(&self) -> &Arc<dyn TrainingApi> {
        &self.api
    }

    /// Every employee's enrollments, tagged with the employee's name and email.
    ///
    /// Only the employee list fetch is fatal. A failed per-employee fetch is
    /// logged and recorded in [`EnrollmentRoster::skipped`]; the rows of the
    /// other employees are still returned, in employee order.
    pub async fn all_enrollments(&self) -> ApiResult<EnrollmentRoster> {
        let employees = self.api.list_employees().await?;
        Ok(self.enrollments_for(employees).await)
    }

    async fn enrollments_for(&self, employees: Vec<Employee>) -> EnrollmentRoster {
        let api = &self.api;
        let results: Vec<(Employee, ApiResult<Vec<Enrollment>>)> = stream::iter(employees)
            .map(|employee| async move {
                let result = api.enrollments_for_employee(employee.id).await;
                (employee, result)
            })
            .buffered(self.fanout_concurrency)
            .collect()
            .await;

        let mut roster = EnrollmentRoster::default();
        for (employee, result) in results {
            match result {
                Ok(enrollments) => roster.rows.extend(
                    enrollments
                        .into_iter()
                        .map(|enrollment| EnrollmentRow::new(&employee, enrollment)),
                ),
                Err(source) => {
                    warn!(employee_id = %employee.id, error = %source, "skipping enrollments for employee");
                    roster.skipped.push(PartialAggregationError {
                        employee_id: employee.id,
                        source,
                    });
                }
            }
        }

        self.project_program_names(&mut roster.rows).await;
        debug!(
            rows = roster.rows.len(),
            skipped = roster.skipped.len(),
            "aggregated enrollments"
        );
        roster
    }

    /// Looks an enrollment up by id. The backend has no route for this, so
    /// employees are scanned in order until one owns the enrollment.
    pub async fn find_enrollment(&self, id: EnrollmentId) -> ApiResult<Option<EnrollmentRow>> {
        let employees = self.api.list_employees().await?;
        for employee in employees {
            match self.api.enrollments_for_employee(employee.id).await {
                Ok(enrollments) => {
                    if let Some(found) = enrollments.into_iter().find(|e| e.id == id) {
                        let mut row = EnrollmentRow::new(&employee, found);
                        self.project_program_names(std::slice::from_mut(&mut row))
                            .await;
                        return Ok(Some(row));
                    }
                }
                Err(err) => {
                    warn!(employee_id = %employee.id, error = %err, "skipping enrollments for employee")
                }
            }
        }
        Ok(None)
    }

    pub async fn sessions_by_program(&self, program_id: ProgramId) -> ApiResult<Vec<Session>> {
        let sessions = self.api.list_sessions().await?;
        Ok(sessions_for_program(sessions, program_id))
    }

    pub async fn upcoming_sessions(&self, now: NaiveDateTime) -> ApiResult<Vec<Session>> {
        let sessions = self.api.list_sessions().await?;
        Ok(upcoming_sessions(&sessions, now))
    }

    pub async fn session_rows(&self) -> ApiResult<Vec<SessionRow>> {
        let (sessions, programs) =
            futures::try_join!(self.api.list_sessions(), self.api.list_programs())?;
        Ok(session_rows(sessions, &programs))
    }

    pub async fn directory(&self) -> ApiResult<NameDirectory> {
        let (employees, programs, sessions) = futures::try_join!(
            self.api.list_employees(),
            self.api.list_programs(),
            self.api.list_sessions()
        )?;
        Ok(NameDirectory::from_records(employees, &programs, &sessions))
    }

    pub async fn attendance_rows(&self) -> ApiResult<Vec<Attendance>> {
        let mut records = self.api.list_attendance().await?;
        if let Some(directory) = self.optional_directory().await {
            records
                .iter_mut()
                .for_each(|record| directory.refresh_attendance(record));
        }
        Ok(records)
    }

    pub async fn completion_rows(&self) -> ApiResult<Vec<Completion>> {
        let mut records = self.api.list_completions().await?;
        if let Some(directory) = self.optional_directory().await {
            records
                .iter_mut()
                .for_each(|record| directory.refresh_completion(record));
        }
        Ok(records)
    }

    pub async fn feedback_rows(&self) -> ApiResult<Vec<Feedback>> {
        let mut records = self.api.list_feedback().await?;
        if let Some(directory) = self.optional_directory().await {
            records
                .iter_mut()
                .for_each(|record| directory.refresh_feedback(record));
        }
        Ok(records)
    }

    /// Employee detail screen: the employee (404 propagates), its enrollments
    /// and its completions.
    pub async fn employee_profile(&self, id: EmployeeId) -> ApiResult<EmployeeProfile> {
        let employee = self.api.get_employee(id).await?;
        let (enrollments, completions) = futures::try_join!(
            self.api.enrollments_for_employee(id),
            self.api.list_completions()
        )?;

        let mut enrollments: Vec<EnrollmentRow> = enrollments
            .into_iter()
            .map(|enrollment| EnrollmentRow::new(&employee, enrollment))
            .collect();
        let mut completions: Vec<Completion> = completions
            .into_iter()
            .filter(|completion| completion.employee_id == id)
            .collect();

        if !enrollments.is_empty() || !completions.is_empty() {
            match self.api.list_programs().await {
                Ok(programs) => {
                    let directory =
                        NameDirectory::from_records(vec![employee.clone()], &programs, &[]);
                    enrollments
                        .iter_mut()
                        .for_each(|row| directory.refresh_enrollment(row));
                    completions
                        .iter_mut()
                        .for_each(|record| directory.refresh_completion(record));
                }
                Err(err) => warn!(error = %err, "program names unavailable; keeping stored names"),
            }
        }

        Ok(EmployeeProfile {
            employee,
            enrollments,
            completions,
        })
    }

    pub async fn program_overview(&self, id: ProgramId) -> ApiResult<ProgramOverview> {
        let program = self.api.get_program(id).await?;
        let sessions = self.sessions_by_program(id).await?;
        Ok(ProgramOverview { program, sessions })
    }

    pub async fn dashboard(&self, now: NaiveDateTime) -> ApiResult<DashboardSummary> {
        let (programs, sessions, employees, completions) = futures::try_join!(
            self.api.list_programs(),
            self.api.list_sessions(),
            self.api.list_employees(),
            self.api.list_completions()
        )?;
        let total_employees = employees.len();
        let roster = self.enrollments_for(employees).await;

        let active_enrollments = roster
            .rows
            .iter()
            .filter(|row| {
                matches!(
                    row.status,
                    EnrollmentStatus::Enrolled | EnrollmentStatus::InProgress
                )
            })
            .count();

        Ok(DashboardSummary {
            total_programs: programs.len(),
            total_employees,
            active_enrollments,
            total_completions: completions.len(),
            recent_programs: programs.into_iter().take(DASHBOARD_PROGRAM_LIMIT).collect(),
            upcoming_sessions: upcoming_sessions(&sessions, now),
        })
    }

    async fn optional_directory(&self) -> Option<NameDirectory> {
        match self.directory().await {
            Ok(directory) => Some(directory),
            Err(err) => {
                warn!(error = %err, "name directory unavailable; keeping stored names");
                None
            }
        }
    }

    async fn project_program_names(&self, rows: &mut [EnrollmentRow]) {
        if rows.is_empty() {
            return;
        }
        match self.api.list_programs().await {
            Ok(programs) => {
                let directory = NameDirectory::from_records(Vec::new(), &programs, &[]);
                rows.iter_mut()
                    .for_each(|row| directory.refresh_enrollment(row));
            }
            Err(err) => warn!(error = %err, "program names unavailable; keeping stored names"),
        }
    }
}

#[cfg(test)]
#[path = "tests/aggregator_tests.rs"]
mod tests;

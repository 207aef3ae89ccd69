//! Form drafts, their validation rules, and the submitter that writes them
//! back to the API.

use chrono::NaiveDateTime;
use shared::{
    domain::{
        CompletionStatus, EmployeeId, EnrollmentId, EnrollmentStatus, FeedbackType, ProgramId,
        SessionId,
    },
    error::ValidationErrors,
    protocol::{
        Attendance, AttendancePayload, Completion, CompletionPayload, Employee, EmployeePayload,
        Enrollment, Feedback, FeedbackPayload, ProgramPayload, Session, SessionPayload,
        TrainingProgram,
    },
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    aggregator::{Aggregator, EnrollmentRow, NameDirectory},
    error::ClientError,
    route::Route,
};

pub const DEFAULT_MAX_ATTENDEES: i64 = 20;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ClientError,
    },
}

impl FormError {
    fn api(action: &str, source: ClientError) -> Self {
        Self::Api {
            message: format!("Failed to {action}: {}", source.user_message()),
            source,
        }
    }

    /// The single line shown above the form.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// A successful submit: the saved record, where to navigate next, and an
/// optional warning about a follow-up step that did not go through.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome<T> {
    pub saved: T,
    pub redirect: Route,
    pub warning: Option<String>,
}

impl<T> SubmitOutcome<T> {
    fn new(saved: T, redirect: Route) -> Self {
        Self {
            saved,
            redirect,
            warning: None,
        }
    }
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !value.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.contains('@'))
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeForm {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub position: String,
}

impl EmployeeForm {
    pub fn from_employee(employee: &Employee) -> Self {
        Self {
            employee_id: employee.employee_id.clone(),
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            email: employee.email.clone(),
            department: employee.department.clone(),
            position: employee.position.clone(),
        }
    }

    pub fn validate(&self) -> Result<EmployeePayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("firstName", &self.first_name, "First name is required");
        errors.require("lastName", &self.last_name, "Last name is required");
        if self.email.trim().is_empty() {
            errors.push("email", "Email is required");
        } else if !looks_like_email(&self.email) {
            errors.push("email", "Invalid email format");
        }
        errors.require("department", &self.department, "Department is required");
        errors.require("position", &self.position, "Position is required");
        errors.require("employeeId", &self.employee_id, "Employee ID is required");

        errors.into_result(|| EmployeePayload {
            employee_id: self.employee_id.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            department: self.department.trim().to_string(),
            position: self.position.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramForm {
    pub name: String,
    pub category: String,
    pub description: String,
    pub created_by: String,
}

impl ProgramForm {
    pub fn from_program(program: &TrainingProgram) -> Self {
        Self {
            name: program.name.clone(),
            category: program.category.clone(),
            description: program.description.clone(),
            created_by: program.created_by.clone(),
        }
    }

    pub fn validate(&self) -> Result<ProgramPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, "Program name is required");
        errors.require("description", &self.description, "Description is required");
        errors.require("category", &self.category, "Category is required");
        errors.require("createdBy", &self.created_by, "Creator name is required");

        errors.into_result(|| ProgramPayload {
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            description: self.description.trim().to_string(),
            created_by: self.created_by.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionForm {
    pub title: String,
    pub description: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub location: String,
    pub trainer: String,
    pub max_attendees: i64,
    pub training_program_id: Option<ProgramId>,
}

impl Default for SessionForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            start_time: None,
            end_time: None,
            location: String::new(),
            trainer: String::new(),
            max_attendees: DEFAULT_MAX_ATTENDEES,
            training_program_id: None,
        }
    }
}

impl SessionForm {
    pub fn from_session(session: &Session) -> Self {
        Self {
            title: session.title.clone(),
            description: session.description.clone().unwrap_or_default(),
            start_time: Some(session.start_time),
            end_time: Some(session.end_time),
            location: session.location.clone(),
            trainer: session.trainer.clone(),
            max_attendees: i64::from(session.max_attendees),
            training_program_id: session.training_program_id,
        }
    }

    pub fn validate(&self) -> Result<SessionPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, "Title is required");
        errors.require("description", &self.description, "Description is required");
        if self.start_time.is_none() {
            errors.push("startTime", "Start time is required");
        }
        match (self.start_time, self.end_time) {
            (_, None) => errors.push("endTime", "End time is required"),
            (Some(start), Some(end)) if end < start => {
                errors.push("endTime", "End time must be after start time")
            }
            _ => {}
        }
        errors.require("location", &self.location, "Location is required");
        errors.require("trainer", &self.trainer, "Trainer name is required");
        let max_attendees = u32::try_from(self.max_attendees).ok().filter(|n| *n >= 1);
        if max_attendees.is_none() {
            errors.push("maxAttendees", "Must have at least 1 attendee");
        }
        if self.training_program_id.is_none() {
            errors.push("trainingProgramId", "Program is required");
        }

        match (
            self.start_time,
            self.end_time,
            max_attendees,
            self.training_program_id,
        ) {
            (Some(start_time), Some(end_time), Some(max_attendees), Some(program_id))
                if errors.is_empty() =>
            {
                Ok(SessionPayload {
                    title: self.title.trim().to_string(),
                    description: self.description.trim().to_string(),
                    start_time,
                    end_time,
                    location: self.location.trim().to_string(),
                    trainer: self.trainer.trim().to_string(),
                    max_attendees,
                    training_program_id: program_id,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentForm {
    pub employee_id: Option<EmployeeId>,
    pub program_id: Option<ProgramId>,
}

impl EnrollmentForm {
    pub fn validate(&self) -> Result<(EmployeeId, ProgramId), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.employee_id.is_none() {
            errors.push("employeeId", "Employee is required");
        }
        if self.program_id.is_none() {
            errors.push("programId", "Training program is required");
        }
        match (self.employee_id, self.program_id) {
            (Some(employee_id), Some(program_id)) => Ok((employee_id, program_id)),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceForm {
    pub employee_id: Option<EmployeeId>,
    pub session_id: Option<SessionId>,
    pub attendance_time: Option<NaiveDateTime>,
    pub present: bool,
    pub notes: String,
}

impl AttendanceForm {
    /// Validates the draft and projects the employee and session names from
    /// `directory`.
    pub fn validate(&self, directory: &NameDirectory) -> Result<AttendancePayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let employee_name = match self.employee_id {
            None => {
                errors.push("employeeId", "Employee is required");
                None
            }
            Some(id) => {
                let name = directory.employee_name(id);
                if name.is_none() {
                    errors.push("employeeId", format!("Employee {id} no longer exists"));
                }
                name
            }
        };
        let session_name = match self.session_id {
            None => {
                errors.push("sessionId", "Training session is required");
                None
            }
            Some(id) => {
                let name = directory.session_name(id).map(str::to_string);
                if name.is_none() {
                    errors.push("sessionId", format!("Session {id} no longer exists"));
                }
                name
            }
        };
        if self.attendance_time.is_none() {
            errors.push("attendanceTime", "Attendance time is required");
        }

        match (
            self.employee_id,
            employee_name,
            self.session_id,
            session_name,
            self.attendance_time,
        ) {
            (
                Some(employee_id),
                Some(employee_name),
                Some(session_id),
                Some(session_name),
                Some(attendance_time),
            ) => Ok(AttendancePayload {
                employee_id,
                employee_name,
                session_id,
                session_name,
                attendance_time,
                present: self.present,
                notes: optional_text(&self.notes),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionForm {
    /// Set when the form was opened from an existing enrollment.
    pub enrollment_id: Option<EnrollmentId>,
    pub employee_id: Option<EmployeeId>,
    pub program_id: Option<ProgramId>,
    pub completion_date: Option<NaiveDateTime>,
    pub score: f64,
    pub status: Option<CompletionStatus>,
    pub certificate_url: String,
    pub completed_by: String,
}

impl CompletionForm {
    pub fn from_enrollment(row: &EnrollmentRow) -> Self {
        Self {
            enrollment_id: Some(row.id),
            employee_id: Some(row.employee_id),
            program_id: Some(row.program_id),
            ..Self::default()
        }
    }

    pub fn validate(&self, directory: &NameDirectory) -> Result<CompletionPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let (employee_name, program_name) =
            resolve_pair(&mut errors, directory, self.employee_id, self.program_id);
        if self.completion_date.is_none() {
            errors.push("completionDate", "Completion date is required");
        }
        if !self.score.is_finite() || self.score < 0.0 {
            errors.push("score", "Score cannot be negative");
        } else if self.score > 100.0 {
            errors.push("score", "Score cannot exceed 100");
        }
        if self.status.is_none() {
            errors.push("status", "Status is required");
        }
        errors.require("completedBy", &self.completed_by, "Completed by is required");

        match (
            self.employee_id,
            employee_name,
            self.program_id,
            program_name,
            self.completion_date,
            self.status,
        ) {
            (
                Some(employee_id),
                Some(employee_name),
                Some(program_id),
                Some(program_name),
                Some(completion_date),
                Some(status),
            ) if errors.is_empty() => Ok(CompletionPayload {
                employee_id,
                employee_name,
                program_id,
                program_name,
                completion_date,
                score: self.score,
                status,
                certificate_url: optional_text(&self.certificate_url),
                completed_by: self.completed_by.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackForm {
    pub employee_id: Option<EmployeeId>,
    pub program_id: Option<ProgramId>,
    pub rating: Option<u8>,
    pub comments: String,
    pub provided_by: String,
    pub feedback_date: Option<NaiveDateTime>,
    pub kind: Option<FeedbackType>,
}

impl Default for FeedbackForm {
    fn default() -> Self {
        Self {
            employee_id: None,
            program_id: None,
            rating: None,
            comments: String::new(),
            provided_by: String::new(),
            feedback_date: None,
            kind: Some(FeedbackType::EmployeeToProgram),
        }
    }
}

impl FeedbackForm {
    pub fn validate(&self, directory: &NameDirectory) -> Result<FeedbackPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let (employee_name, program_name) =
            resolve_pair(&mut errors, directory, self.employee_id, self.program_id);
        // A zero rating is what an untouched star widget submits.
        let rating = self.rating.filter(|r| *r != 0);
        if rating.is_some_and(|r| r > 5) {
            errors.push("rating", "Rating must be between 1 and 5");
        }
        errors.require("comments", &self.comments, "Comments are required");
        errors.require("providedBy", &self.provided_by, "Provider name is required");
        if self.feedback_date.is_none() {
            errors.push("feedbackDate", "Feedback date is required");
        }
        if self.kind.is_none() {
            errors.push("type", "Feedback type is required");
        }

        match (
            self.employee_id,
            employee_name,
            self.program_id,
            program_name,
            self.feedback_date,
            self.kind,
        ) {
            (
                Some(employee_id),
                Some(employee_name),
                Some(program_id),
                Some(program_name),
                Some(feedback_date),
                Some(kind),
            ) if errors.is_empty() => Ok(FeedbackPayload {
                employee_id,
                employee_name,
                program_id,
                program_name,
                rating,
                comments: self.comments.trim().to_string(),
                provided_by: self.provided_by.trim().to_string(),
                feedback_date,
                kind,
            }),
            _ => Err(errors),
        }
    }
}

fn resolve_pair(
    errors: &mut ValidationErrors,
    directory: &NameDirectory,
    employee_id: Option<EmployeeId>,
    program_id: Option<ProgramId>,
) -> (Option<String>, Option<String>) {
    let employee_name = match employee_id {
        None => {
            errors.push("employeeId", "Employee is required");
            None
        }
        Some(id) => {
            let name = directory.employee_name(id);
            if name.is_none() {
                errors.push("employeeId", format!("Employee {id} no longer exists"));
            }
            name
        }
    };
    let program_name = match program_id {
        None => {
            errors.push("programId", "Program is required");
            None
        }
        Some(id) => {
            let name = directory.program_name(id).map(str::to_string);
            if name.is_none() {
                errors.push("programId", format!("Program {id} no longer exists"));
            }
            name
        }
    };
    (employee_name, program_name)
}

/// Validates drafts, posts them, and reports the list route to open next.
/// The form value is borrowed, so a failed submit leaves it intact.
#[derive(Clone)]
pub struct FormSubmitter {
    aggregator: Aggregator,
}

impl FormSubmitter {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    /// Creates an employee, or updates `existing`. The business employee id
    /// cannot change once created.
    pub async fn save_employee(
        &self,
        form: &EmployeeForm,
        existing: Option<&Employee>,
    ) -> Result<SubmitOutcome<Employee>, FormError> {
        let payload = form.validate()?;
        let api = self.aggregator.api();
        let saved = match existing {
            Some(current) => {
                if payload.employee_id != current.employee_id {
                    let mut errors = ValidationErrors::new();
                    errors.push("employeeId", "Employee ID cannot be changed");
                    return Err(errors.into());
                }
                api.update_employee(current.id, &payload)
                    .await
                    .map_err(|err| FormError::api("save the employee", err))?
            }
            None => api
                .create_employee(&payload)
                .await
                .map_err(|err| FormError::api("save the employee", err))?,
        };
        info!(employee_id = %saved.id, "employee saved");
        Ok(SubmitOutcome::new(saved, Route::Employees))
    }

    pub async fn save_program(
        &self,
        form: &ProgramForm,
        existing: Option<ProgramId>,
    ) -> Result<SubmitOutcome<TrainingProgram>, FormError> {
        let payload = form.validate()?;
        let api = self.aggregator.api();
        let saved = match existing {
            Some(id) => api.update_program(id, &payload).await,
            None => api.create_program(&payload).await,
        }
        .map_err(|err| FormError::api("save the program", err))?;
        info!(program_id = %saved.id, "program saved");
        Ok(SubmitOutcome::new(saved, Route::Programs))
    }

    pub async fn save_session(
        &self,
        form: &SessionForm,
        existing: Option<SessionId>,
    ) -> Result<SubmitOutcome<Session>, FormError> {
        let payload = form.validate()?;
        let api = self.aggregator.api();
        let saved = match existing {
            Some(id) => api.update_session(id, &payload).await,
            None => {
                api.create_session(payload.training_program_id, &payload)
                    .await
            }
        }
        .map_err(|err| FormError::api("save the session", err))?;
        info!(session_id = %saved.id, "session saved");
        Ok(SubmitOutcome::new(saved, Route::Sessions))
    }

    pub async fn enroll(&self, form: &EnrollmentForm) -> Result<SubmitOutcome<Enrollment>, FormError> {
        let (employee_id, program_id) = form.validate()?;
        let saved = self
            .aggregator
            .api()
            .enroll(employee_id, program_id)
            .await
            .map_err(|err| FormError::api("enroll the employee", err))?;
        info!(enrollment_id = %saved.id, %employee_id, %program_id, "employee enrolled");
        Ok(SubmitOutcome::new(saved, Route::Enrollments))
    }

    pub async fn record_attendance(
        &self,
        form: &AttendanceForm,
    ) -> Result<SubmitOutcome<Attendance>, FormError> {
        let directory = self.directory().await?;
        let payload = form.validate(&directory)?;
        let saved = self
            .aggregator
            .api()
            .record_attendance(&payload)
            .await
            .map_err(|err| FormError::api("record attendance", err))?;
        info!(attendance_id = %saved.id, "attendance recorded");
        Ok(SubmitOutcome::new(saved, Route::Attendance))
    }

    /// Records a completion. When the form came from an enrollment, that
    /// enrollment is then marked COMPLETED; a failure there only produces a
    /// warning because the completion is already stored.
    pub async fn record_completion(
        &self,
        form: &CompletionForm,
    ) -> Result<SubmitOutcome<Completion>, FormError> {
        let directory = self.directory().await?;
        let payload = form.validate(&directory)?;
        let api = self.aggregator.api();
        let saved = api
            .record_completion(&payload)
            .await
            .map_err(|err| FormError::api("record completion", err))?;
        info!(completion_id = %saved.id, "completion recorded");

        let mut outcome = SubmitOutcome::new(saved, Route::Completions);
        if let Some(enrollment_id) = form.enrollment_id {
            if let Err(err) = api
                .update_enrollment_status(enrollment_id, EnrollmentStatus::Completed)
                .await
            {
                warn!(%enrollment_id, error = %err, "completion recorded but enrollment status was not updated");
                outcome.warning = Some(format!(
                    "Completion recorded, but enrollment {enrollment_id} could not be marked COMPLETED: {}",
                    err.user_message()
                ));
            }
        }
        Ok(outcome)
    }

    pub async fn record_feedback(
        &self,
        form: &FeedbackForm,
    ) -> Result<SubmitOutcome<Feedback>, FormError> {
        let directory = self.directory().await?;
        let payload = form.validate(&directory)?;
        let saved = self
            .aggregator
            .api()
            .record_feedback(&payload)
            .await
            .map_err(|err| FormError::api("record feedback", err))?;
        info!(feedback_id = %saved.id, "feedback recorded");
        Ok(SubmitOutcome::new(saved, Route::Feedback))
    }

    /// Prefills a completion form from an enrollment, if it still exists.
    pub async fn completion_form_for(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<CompletionForm>, FormError> {
        let row = self
            .aggregator
            .find_enrollment(enrollment_id)
            .await
            .map_err(|err| FormError::api("load enrollment details", err))?;
        Ok(row.as_ref().map(CompletionForm::from_enrollment))
    }

    async fn directory(&self) -> Result<NameDirectory, FormError> {
        self.aggregator
            .directory()
            .await
            .map_err(|err| FormError::api("load employees and programs", err))
    }
}

#[cfg(test)]
#[path = "tests/forms_tests.rs"]
mod tests;

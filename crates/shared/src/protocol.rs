use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AttendanceId, CompletionId, CompletionStatus, EmployeeId, EnrollmentId, EnrollmentStatus,
    FeedbackId, FeedbackType, ProgramId, SessionId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
}

impl Employee {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingProgram {
    pub id: ProgramId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramPayload {
    pub name: String,
    pub category: String,
    pub description: String,
    pub created_by: String,
}

/// A scheduled occurrence of a program. The backend omits `trainingProgramId`
/// on some responses, so it is optional here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub trainer: String,
    #[serde(default)]
    pub max_attendees: u32,
    #[serde(default)]
    pub training_program_id: Option<ProgramId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub title: String,
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: String,
    pub trainer: String,
    pub max_attendees: u32,
    pub training_program_id: ProgramId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    pub program_id: ProgramId,
    #[serde(default)]
    pub program_name: String,
    pub enrollment_date: NaiveDateTime,
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: AttendanceId,
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub employee_name: String,
    pub session_id: SessionId,
    #[serde(default)]
    pub session_name: String,
    pub attendance_time: NaiveDateTime,
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePayload {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub session_id: SessionId,
    pub session_name: String,
    pub attendance_time: NaiveDateTime,
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub id: CompletionId,
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub employee_name: String,
    pub program_id: ProgramId,
    #[serde(default)]
    pub program_name: String,
    pub completion_date: NaiveDateTime,
    #[serde(default)]
    pub score: f64,
    pub status: CompletionStatus,
    #[serde(default)]
    pub certificate_url: Option<String>,
    #[serde(default)]
    pub completed_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub program_id: ProgramId,
    pub program_name: String,
    pub completion_date: NaiveDateTime,
    pub score: f64,
    pub status: CompletionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_url: Option<String>,
    pub completed_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: FeedbackId,
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub employee_name: String,
    pub program_id: ProgramId,
    #[serde(default)]
    pub program_name: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub provided_by: String,
    pub feedback_date: NaiveDateTime,
    #[serde(rename = "type")]
    pub kind: FeedbackType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPayload {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub program_id: ProgramId,
    pub program_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub comments: String,
    pub provided_by: String,
    pub feedback_date: NaiveDateTime,
    #[serde(rename = "type")]
    pub kind: FeedbackType,
}

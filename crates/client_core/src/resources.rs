use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{EmployeeId, EnrollmentId, EnrollmentStatus, ProgramId, SessionId},
    protocol::{
        Attendance, AttendancePayload, Completion, CompletionPayload, Employee, EmployeePayload,
        Enrollment, Feedback, FeedbackPayload, ProgramPayload, Session, SessionPayload,
        StatusUpdate, TrainingProgram,
    },
};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{config::ClientSettings, error::ClientError, session::AuthSession, ClientEvent};

pub type ApiResult<T> = std::result::Result<T, ClientError>;

const PROGRAMS: &str = "/api/training/programs";
const SESSIONS: &str = "/api/training/sessions";
const EMPLOYEES: &str = "/api/employees";
const ENROLLMENTS: &str = "/api/employees/enrollments";
const ATTENDANCE: &str = "/api/tracking/attendance";
const COMPLETIONS: &str = "/api/tracking/completions";
const FEEDBACK: &str = "/api/tracking/feedback";

/// One operation per (resource, verb) pair exposed by the training backend.
/// No retries happen at this layer.
#[async_trait]
pub trait TrainingApi: Send + Sync {
    async fn list_programs(&self) -> ApiResult<Vec<TrainingProgram>>;
    async fn get_program(&self, id: ProgramId) -> ApiResult<TrainingProgram>;
    async fn create_program(&self, payload: &ProgramPayload) -> ApiResult<TrainingProgram>;
    async fn update_program(
        &self,
        id: ProgramId,
        payload: &ProgramPayload,
    ) -> ApiResult<TrainingProgram>;
    async fn delete_program(&self, id: ProgramId) -> ApiResult<()>;

    async fn list_sessions(&self) -> ApiResult<Vec<Session>>;
    async fn get_session(&self, id: SessionId) -> ApiResult<Session>;
    async fn create_session(
        &self,
        program_id: ProgramId,
        payload: &SessionPayload,
    ) -> ApiResult<Session>;
    async fn update_session(&self, id: SessionId, payload: &SessionPayload) -> ApiResult<Session>;
    async fn delete_session(&self, id: SessionId) -> ApiResult<()>;

    async fn list_employees(&self) -> ApiResult<Vec<Employee>>;
    async fn get_employee(&self, id: EmployeeId) -> ApiResult<Employee>;
    async fn create_employee(&self, payload: &EmployeePayload) -> ApiResult<Employee>;
    async fn update_employee(
        &self,
        id: EmployeeId,
        payload: &EmployeePayload,
    ) -> ApiResult<Employee>;
    async fn delete_employee(&self, id: EmployeeId) -> ApiResult<()>;

    async fn enrollments_for_employee(&self, employee_id: EmployeeId)
        -> ApiResult<Vec<Enrollment>>;
    async fn enroll(&self, employee_id: EmployeeId, program_id: ProgramId)
        -> ApiResult<Enrollment>;
    async fn update_enrollment_status(
        &self,
        enrollment_id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> ApiResult<()>;

    async fn list_attendance(&self) -> ApiResult<Vec<Attendance>>;
    async fn record_attendance(&self, payload: &AttendancePayload) -> ApiResult<Attendance>;
    async fn list_completions(&self) -> ApiResult<Vec<Completion>>;
    async fn record_completion(&self, payload: &CompletionPayload) -> ApiResult<Completion>;
    async fn list_feedback(&self) -> ApiResult<Vec<Feedback>>;
    async fn record_feedback(&self, payload: &FeedbackPayload) -> ApiResult<Feedback>;
}

/// reqwest-backed [`TrainingApi`]. Attaches the session's bearer token to
/// every request and clears it when the backend answers 401.
pub struct ResourceClient {
    http: Client,
    base_url: String,
    session: AuthSession,
    events: broadcast::Sender<ClientEvent>,
}

impl ResourceClient {
    pub fn new(settings: &ClientSettings, session: AuthSession) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(ClientError::Setup)?;
        Ok(Self::with_http_client(
            http,
            settings.api_base_url.clone(),
            session,
        ))
    }

    pub fn with_http_client(http: Client, base_url: impl Into<String>, session: AuthSession) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            events,
        }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    async fn dispatch(&self, builder: RequestBuilder, method: &Method, path: &str) -> ApiResult<Response> {
        let builder = match self.session.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|err| ClientError::from_transport(path, err))?;
        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "api request");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => {
                if self.session.clear().await {
                    warn!(path, "api rejected the session token; token cleared");
                }
                let _ = self.events.send(ClientEvent::SessionExpired);
                Err(ClientError::Unauthorized {
                    path: path.to_string(),
                })
            }
            StatusCode::NOT_FOUND => Err(ClientError::NotFound {
                path: path.to_string(),
            }),
            _ => Err(ClientError::Network {
                status: status.as_u16(),
                path: path.to_string(),
                body,
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: String) -> ApiResult<T> {
        let builder = self.http.get(format!("{}{path}", self.base_url));
        let response = self.dispatch(builder, &Method::GET, &path).await?;
        decode(response, &path).await
    }

    async fn send_json<B, T>(&self, method: Method, path: String, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self
            .http
            .request(method.clone(), format!("{}{path}", self.base_url))
            .json(body);
        let response = self.dispatch(builder, &method, &path).await?;
        decode(response, &path).await
    }

    async fn send_empty(&self, method: Method, path: String) -> ApiResult<Response> {
        let builder = self
            .http
            .request(method.clone(), format!("{}{path}", self.base_url));
        self.dispatch(builder, &method, &path).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> ApiResult<T> {
    response.json::<T>().await.map_err(|source| {
        if source.is_timeout() {
            ClientError::Timeout {
                path: path.to_string(),
            }
        } else {
            ClientError::Decode {
                path: path.to_string(),
                source,
            }
        }
    })
}

#[async_trait]
impl TrainingApi for ResourceClient {
    async fn list_programs(&self) -> ApiResult<Vec<TrainingProgram>> {
        self.get_json(PROGRAMS.to_string()).await
    }

    async fn get_program(&self, id: ProgramId) -> ApiResult<TrainingProgram> {
        self.get_json(format!("{PROGRAMS}/{id}")).await
    }

    async fn create_program(&self, payload: &ProgramPayload) -> ApiResult<TrainingProgram> {
        self.send_json(Method::POST, PROGRAMS.to_string(), payload)
            .await
    }

    async fn update_program(
        &self,
        id: ProgramId,
        payload: &ProgramPayload,
    ) -> ApiResult<TrainingProgram> {
        self.send_json(Method::PUT, format!("{PROGRAMS}/{id}"), payload)
            .await
    }

    async fn delete_program(&self, id: ProgramId) -> ApiResult<()> {
        self.send_empty(Method::DELETE, format!("{PROGRAMS}/{id}"))
            .await?;
        Ok(())
    }

    async fn list_sessions(&self) -> ApiResult<Vec<Session>> {
        self.get_json(SESSIONS.to_string()).await
    }

    async fn get_session(&self, id: SessionId) -> ApiResult<Session> {
        self.get_json(format!("{SESSIONS}/{id}")).await
    }

    async fn create_session(
        &self,
        program_id: ProgramId,
        payload: &SessionPayload,
    ) -> ApiResult<Session> {
        self.send_json(
            Method::POST,
            format!("{SESSIONS}/program/{program_id}"),
            payload,
        )
        .await
    }

    async fn update_session(&self, id: SessionId, payload: &SessionPayload) -> ApiResult<Session> {
        self.send_json(Method::PUT, format!("{SESSIONS}/{id}"), payload)
            .await
    }

    async fn delete_session(&self, id: SessionId) -> ApiResult<()> {
        self.send_empty(Method::DELETE, format!("{SESSIONS}/{id}"))
            .await?;
        Ok(())
    }

    async fn list_employees(&self) -> ApiResult<Vec<Employee>> {
        self.get_json(EMPLOYEES.to_string()).await
    }

    async fn get_employee(&self, id: EmployeeId) -> ApiResult<Employee> {
        self.get_json(format!("{EMPLOYEES}/{id}")).await
    }

    async fn create_employee(&self, payload: &EmployeePayload) -> ApiResult<Employee> {
        self.send_json(Method::POST, EMPLOYEES.to_string(), payload)
            .await
    }

    async fn update_employee(
        &self,
        id: EmployeeId,
        payload: &EmployeePayload,
    ) -> ApiResult<Employee> {
        self.send_json(Method::PUT, format!("{EMPLOYEES}/{id}"), payload)
            .await
    }

    async fn delete_employee(&self, id: EmployeeId) -> ApiResult<()> {
        self.send_empty(Method::DELETE, format!("{EMPLOYEES}/{id}"))
            .await?;
        Ok(())
    }

    async fn enrollments_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> ApiResult<Vec<Enrollment>> {
        self.get_json(format!("{ENROLLMENTS}/employee/{employee_id}"))
            .await
    }

    async fn enroll(
        &self,
        employee_id: EmployeeId,
        program_id: ProgramId,
    ) -> ApiResult<Enrollment> {
        let path = format!("{ENROLLMENTS}/{employee_id}/program/{program_id}");
        let response = self.send_empty(Method::POST, path.clone()).await?;
        decode(response, &path).await
    }

    async fn update_enrollment_status(
        &self,
        enrollment_id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> ApiResult<()> {
        let path = format!("{ENROLLMENTS}/{enrollment_id}/status");
        // Backend reads `status` from the query; the body mirrors it.
        let builder = self
            .http
            .patch(format!("{}{path}", self.base_url))
            .query(&[("status", status.as_str())])
            .json(&StatusUpdate { status });
        self.dispatch(builder, &Method::PATCH, &path).await?;
        Ok(())
    }

    async fn list_attendance(&self) -> ApiResult<Vec<Attendance>> {
        self.get_json(ATTENDANCE.to_string()).await
    }

    async fn record_attendance(&self, payload: &AttendancePayload) -> ApiResult<Attendance> {
        self.send_json(Method::POST, ATTENDANCE.to_string(), payload)
            .await
    }

    async fn list_completions(&self) -> ApiResult<Vec<Completion>> {
        self.get_json(COMPLETIONS.to_string()).await
    }

    async fn record_completion(&self, payload: &CompletionPayload) -> ApiResult<Completion> {
        self.send_json(Method::POST, COMPLETIONS.to_string(), payload)
            .await
    }

    async fn list_feedback(&self) -> ApiResult<Vec<Feedback>> {
        self.get_json(FEEDBACK.to_string()).await
    }

    async fn record_feedback(&self, payload: &FeedbackPayload) -> ApiResult<Feedback> {
        self.send_json(Method::POST, FEEDBACK.to_string(), payload)
            .await
    }
}

#[cfg(test)]
#[path = "tests/resources_tests.rs"]
mod tests;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use client_core::{
    forms::{
        AttendanceForm, CompletionForm, EmployeeForm, EnrollmentForm, FeedbackForm, ProgramForm,
        SessionForm, SubmitOutcome,
    },
    load_settings,
    view_state::{
        self, AttendanceFilter, AttendanceListView, CompletionFilter, CompletionListView,
        DetailView, EmployeeFilter, EmployeeListView, EnrollmentFilter, EnrollmentListView,
        FeedbackFilter, FeedbackListView, ListView, ProgramFilter, ProgramListView,
        SessionFilter, SessionListView,
    },
    ClientEvent, TrackerClient, TrainingApi,
};
use shared::domain::{
    CompletionStatus, EmployeeId, EnrollmentId, EnrollmentStatus, FeedbackType, ProgramId,
    SessionId,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "tracker", about = "Employee training tracker client")]
struct Cli {
    /// Overrides the configured API base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Bearer token sent with every request.
    #[arg(long, global = true)]
    token: Option<String>,
    /// Print records as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Dashboard,
    Upcoming,
    Employees {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "")]
        department: String,
    },
    Employee {
        id: i64,
    },
    Programs {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "")]
        category: String,
    },
    Program {
        id: i64,
    },
    Sessions {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        program: Option<i64>,
    },
    Enrollments {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_parser = parse_enrollment_status)]
        status: Option<EnrollmentStatus>,
    },
    Attendance {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        present: Option<bool>,
    },
    Completions {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_completion_status)]
        status: Option<CompletionStatus>,
    },
    Feedback {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_parser = parse_feedback_type)]
        kind: Option<FeedbackType>,
    },
    AddEmployee {
        #[arg(long)]
        employee_id: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        position: String,
    },
    AddProgram {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        created_by: String,
    },
    AddSession {
        #[arg(long)]
        program: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        start: NaiveDateTime,
        #[arg(long)]
        end: NaiveDateTime,
        #[arg(long)]
        location: String,
        #[arg(long)]
        trainer: String,
        #[arg(long, default_value_t = client_core::forms::DEFAULT_MAX_ATTENDEES)]
        max_attendees: i64,
    },
    /// Updates an employee; omitted flags keep their current values.
    EditEmployee {
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        position: Option<String>,
    },
    EditProgram {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        created_by: Option<String>,
    },
    EditSession {
        id: i64,
        #[arg(long)]
        program: Option<i64>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        start: Option<NaiveDateTime>,
        #[arg(long)]
        end: Option<NaiveDateTime>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        trainer: Option<String>,
        #[arg(long)]
        max_attendees: Option<i64>,
    },
    Enroll {
        employee_id: i64,
        program_id: i64,
    },
    SetStatus {
        enrollment_id: i64,
        #[arg(value_parser = parse_enrollment_status)]
        status: EnrollmentStatus,
    },
    /// Records a completion for an enrollment and marks it COMPLETED.
    Complete {
        enrollment_id: i64,
        #[arg(long)]
        score: f64,
        #[arg(long, value_parser = parse_completion_status, default_value = "COMPLETE")]
        status: CompletionStatus,
        #[arg(long)]
        completed_by: String,
        #[arg(long, default_value = "")]
        certificate_url: String,
        #[arg(long)]
        date: Option<NaiveDateTime>,
    },
    RecordAttendance {
        employee_id: i64,
        session_id: i64,
        #[arg(long)]
        absent: bool,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long)]
        time: Option<NaiveDateTime>,
    },
    AddFeedback {
        employee_id: i64,
        program_id: i64,
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long)]
        comments: String,
        #[arg(long)]
        provided_by: String,
        #[arg(long, value_parser = parse_feedback_type, default_value = "EMPLOYEE_TO_PROGRAM")]
        kind: FeedbackType,
    },
    DeleteEmployee {
        id: i64,
    },
    DeleteProgram {
        id: i64,
    },
    DeleteSession {
        id: i64,
    },
}

fn parse_enrollment_status(raw: &str) -> Result<EnrollmentStatus, String> {
    EnrollmentStatus::parse(raw).ok_or_else(|| format!("unknown enrollment status `{raw}`"))
}

fn parse_completion_status(raw: &str) -> Result<CompletionStatus, String> {
    CompletionStatus::parse(raw).ok_or_else(|| format!("unknown completion status `{raw}`"))
}

fn parse_feedback_type(raw: &str) -> Result<FeedbackType, String> {
    FeedbackType::parse(raw).ok_or_else(|| format!("unknown feedback type `{raw}`"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(url) = cli.api_url.as_deref() {
        settings.api_base_url = client_core::config::normalize_base_url(url);
    }
    if let Some(token) = cli.token.clone() {
        settings.auth_token = Some(token);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let client = TrackerClient::new(&settings).context("failed to set up the api client")?;
    let mut events = client.subscribe_events();

    let result = run(&client, cli.command, cli.json).await;
    if let Ok(event) = events.try_recv() {
        match event {
            ClientEvent::SessionExpired => eprintln!(
                "session expired; sign in again ({})",
                event.redirect().path()
            ),
        }
    }
    result
}

async fn run(client: &TrackerClient, command: Command, json: bool) -> Result<()> {
    let aggregator = client.aggregator();
    let forms = client.forms();
    let now = Local::now().naive_local();

    match command {
        Command::Dashboard => {
            let summary = aggregator.dashboard(now).await?;
            render::dashboard(&summary, json)?;
        }
        Command::Upcoming => {
            let sessions = aggregator.upcoming_sessions(now).await?;
            render::sessions(&sessions.iter().collect::<Vec<_>>(), json)?;
        }
        Command::Employees { search, department } => {
            let mut view: EmployeeListView = ListView::new(EmployeeFilter { search, department });
            view.load(client.api().list_employees().await);
            ensure_ready(view.state())?;
            render::employees(&view.visible(), json)?;
        }
        Command::Employee { id } => {
            let mut detail = DetailView::default();
            detail.load(aggregator.employee_profile(EmployeeId(id)).await);
            ensure_ready(detail.state())?;
            if let Some(profile) = detail.record() {
                render::profile(profile, json)?;
            }
        }
        Command::Programs { search, category } => {
            let mut view: ProgramListView = ListView::new(ProgramFilter { search, category });
            view.load(client.api().list_programs().await);
            ensure_ready(view.state())?;
            render::programs(&view.visible(), json)?;
        }
        Command::Program { id } => {
            let mut detail = DetailView::default();
            detail.load(aggregator.program_overview(ProgramId(id)).await);
            ensure_ready(detail.state())?;
            if let Some(overview) = detail.record() {
                render::overview(overview, json)?;
            }
        }
        Command::Sessions { search, program } => {
            let mut view: SessionListView = ListView::new(SessionFilter {
                search,
                program: program.map(ProgramId),
            });
            view.load(aggregator.session_rows().await);
            ensure_ready(view.state())?;
            render::session_rows(&view.visible(), json)?;
        }
        Command::Enrollments { search, status } => {
            let roster = aggregator.all_enrollments().await;
            let mut view: EnrollmentListView = ListView::new(EnrollmentFilter { search, status });
            let roster = match roster {
                Ok(roster) => roster,
                Err(err) => {
                    view.load(Err(err));
                    return ensure_ready(view.state());
                }
            };
            for skipped in &roster.skipped {
                eprintln!("warning: {skipped}");
            }
            view.load(Ok(roster.rows));
            render::enrollments(&view.visible(), json)?;
        }
        Command::Attendance {
            search,
            date,
            present,
        } => {
            let mut view: AttendanceListView = ListView::new(AttendanceFilter {
                search,
                date,
                present,
            });
            view.load(aggregator.attendance_rows().await);
            ensure_ready(view.state())?;
            render::attendance(&view.visible(), json)?;
        }
        Command::Completions {
            search,
            date,
            status,
        } => {
            let mut view: CompletionListView = ListView::new(CompletionFilter {
                search,
                date,
                status,
            });
            view.load(aggregator.completion_rows().await);
            ensure_ready(view.state())?;
            render::completions(&view.visible(), json)?;
        }
        Command::Feedback { search, kind } => {
            let mut view: FeedbackListView = ListView::new(FeedbackFilter { search, kind });
            view.load(aggregator.feedback_rows().await);
            ensure_ready(view.state())?;
            render::feedback(&view.visible(), json)?;
        }
        Command::AddEmployee {
            employee_id,
            first_name,
            last_name,
            email,
            department,
            position,
        } => {
            let form = EmployeeForm {
                employee_id,
                first_name,
                last_name,
                email,
                department,
                position,
            };
            let outcome = forms.save_employee(&form, None).await?;
            report(&outcome, format!("created employee {}", outcome.saved.id));
        }
        Command::AddProgram {
            name,
            category,
            description,
            created_by,
        } => {
            let form = ProgramForm {
                name,
                category,
                description,
                created_by,
            };
            let outcome = forms.save_program(&form, None).await?;
            report(&outcome, format!("created program {}", outcome.saved.id));
        }
        Command::AddSession {
            program,
            title,
            description,
            start,
            end,
            location,
            trainer,
            max_attendees,
        } => {
            let form = SessionForm {
                title,
                description,
                start_time: Some(start),
                end_time: Some(end),
                location,
                trainer,
                max_attendees,
                training_program_id: Some(ProgramId(program)),
            };
            let outcome = forms.save_session(&form, None).await?;
            report(&outcome, format!("created session {}", outcome.saved.id));
        }
        Command::EditEmployee {
            id,
            first_name,
            last_name,
            email,
            department,
            position,
        } => {
            let existing = client.api().get_employee(EmployeeId(id)).await?;
            let current = EmployeeForm::from_employee(&existing);
            let form = EmployeeForm {
                first_name: first_name.unwrap_or(current.first_name),
                last_name: last_name.unwrap_or(current.last_name),
                email: email.unwrap_or(current.email),
                department: department.unwrap_or(current.department),
                position: position.unwrap_or(current.position),
                employee_id: current.employee_id,
            };
            let outcome = forms.save_employee(&form, Some(&existing)).await?;
            report(&outcome, format!("updated employee {}", outcome.saved.id));
        }
        Command::EditProgram {
            id,
            name,
            category,
            description,
            created_by,
        } => {
            let existing = client.api().get_program(ProgramId(id)).await?;
            let current = ProgramForm::from_program(&existing);
            let form = ProgramForm {
                name: name.unwrap_or(current.name),
                category: category.unwrap_or(current.category),
                description: description.unwrap_or(current.description),
                created_by: created_by.unwrap_or(current.created_by),
            };
            let outcome = forms.save_program(&form, Some(existing.id)).await?;
            report(&outcome, format!("updated program {}", outcome.saved.id));
        }
        Command::EditSession {
            id,
            program,
            title,
            description,
            start,
            end,
            location,
            trainer,
            max_attendees,
        } => {
            let existing = client.api().get_session(SessionId(id)).await?;
            let current = SessionForm::from_session(&existing);
            let form = SessionForm {
                title: title.unwrap_or(current.title),
                description: description.unwrap_or(current.description),
                start_time: start.or(current.start_time),
                end_time: end.or(current.end_time),
                location: location.unwrap_or(current.location),
                trainer: trainer.unwrap_or(current.trainer),
                max_attendees: max_attendees.unwrap_or(current.max_attendees),
                training_program_id: program.map(ProgramId).or(current.training_program_id),
            };
            let outcome = forms.save_session(&form, Some(existing.id)).await?;
            report(&outcome, format!("updated session {}", outcome.saved.id));
        }
        Command::Enroll {
            employee_id,
            program_id,
        } => {
            let form = EnrollmentForm {
                employee_id: Some(EmployeeId(employee_id)),
                program_id: Some(ProgramId(program_id)),
            };
            let outcome = forms.enroll(&form).await?;
            report(&outcome, format!("created enrollment {}", outcome.saved.id));
        }
        Command::SetStatus {
            enrollment_id,
            status,
        } => {
            let id = EnrollmentId(enrollment_id);
            let mut view = EnrollmentListView::default();
            if let Some(row) = aggregator.find_enrollment(id).await? {
                view.load(Ok(vec![row]));
            }
            view_state::update_enrollment_status(client.api(), &mut view, id, status).await?;
            println!("enrollment {id} is now {}", status.as_str());
        }
        Command::Complete {
            enrollment_id,
            score,
            status,
            completed_by,
            certificate_url,
            date,
        } => {
            let id = EnrollmentId(enrollment_id);
            let Some(prefilled) = forms.completion_form_for(id).await? else {
                bail!("enrollment {id} was not found");
            };
            let form = CompletionForm {
                completion_date: Some(date.unwrap_or(now)),
                score,
                status: Some(status),
                certificate_url,
                completed_by,
                ..prefilled
            };
            let outcome = forms.record_completion(&form).await?;
            report(&outcome, format!("recorded completion {}", outcome.saved.id));
        }
        Command::RecordAttendance {
            employee_id,
            session_id,
            absent,
            notes,
            time,
        } => {
            let form = AttendanceForm {
                employee_id: Some(EmployeeId(employee_id)),
                session_id: Some(SessionId(session_id)),
                attendance_time: Some(time.unwrap_or(now)),
                present: !absent,
                notes,
            };
            let outcome = forms.record_attendance(&form).await?;
            report(&outcome, format!("recorded attendance {}", outcome.saved.id));
        }
        Command::AddFeedback {
            employee_id,
            program_id,
            rating,
            comments,
            provided_by,
            kind,
        } => {
            let form = FeedbackForm {
                employee_id: Some(EmployeeId(employee_id)),
                program_id: Some(ProgramId(program_id)),
                rating,
                comments,
                provided_by,
                feedback_date: Some(now),
                kind: Some(kind),
            };
            let outcome = forms.record_feedback(&form).await?;
            report(&outcome, format!("recorded feedback {}", outcome.saved.id));
        }
        Command::DeleteEmployee { id } => {
            let mut view: EmployeeListView = ListView::default();
            view.load(client.api().list_employees().await);
            ensure_ready(view.state())?;
            view_state::delete_employee(client.api(), &mut view, EmployeeId(id)).await?;
            println!("deleted employee {id}; {} remaining", view.records().len());
        }
        Command::DeleteProgram { id } => {
            let mut view: ProgramListView = ListView::default();
            view.load(client.api().list_programs().await);
            ensure_ready(view.state())?;
            view_state::delete_program(client.api(), &mut view, ProgramId(id)).await?;
            println!("deleted program {id}; {} remaining", view.records().len());
        }
        Command::DeleteSession { id } => {
            let mut view: SessionListView = ListView::default();
            view.load(aggregator.session_rows().await);
            ensure_ready(view.state())?;
            view_state::delete_session(client.api(), &mut view, SessionId(id)).await?;
            println!("deleted session {id}; {} remaining", view.records().len());
        }
    }

    Ok(())
}

fn ensure_ready(state: &view_state::LoadState) -> Result<()> {
    match state {
        view_state::LoadState::Ready | view_state::LoadState::Loading => Ok(()),
        view_state::LoadState::NotFound => bail!("not found"),
        view_state::LoadState::Failed(message) => bail!("{message}"),
    }
}

fn report<T>(outcome: &SubmitOutcome<T>, message: String) {
    println!("{message} (next: {})", outcome.redirect.path());
    if let Some(warning) = &outcome.warning {
        warn!(%warning, "submit finished with a warning");
        eprintln!("warning: {warning}");
    }
}


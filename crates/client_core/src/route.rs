use shared::domain::{EmployeeId, ProgramId};

/// Navigation targets reported back to the caller after a submit or a
/// rejected session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Employees,
    Employee(EmployeeId),
    Programs,
    Program(ProgramId),
    Sessions,
    Enrollments,
    Attendance,
    Completions,
    Feedback,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::Employees => "/employees".to_string(),
            Route::Employee(id) => format!("/employees/{id}"),
            Route::Programs => "/programs".to_string(),
            Route::Program(id) => format!("/programs/{id}"),
            Route::Sessions => "/sessions".to_string(),
            Route::Enrollments => "/enrollments".to_string(),
            Route::Attendance => "/attendance".to_string(),
            Route::Completions => "/completions".to_string(),
            Route::Feedback => "/feedback".to_string(),
        }
    }
}

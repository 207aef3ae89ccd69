use anyhow::Result;
use chrono::NaiveDateTime;
use client_core::{
    aggregator::{EmployeeProfile, ProgramOverview, SessionRow},
    DashboardSummary, EnrollmentRow,
};
use serde::Serialize;
use shared::protocol::{Attendance, Completion, Employee, Feedback, Session, TrainingProgram};

const TIMESTAMP: &str = "%Y-%m-%d %H:%M";

fn when(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP).to_string()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn empty(records: usize, noun: &str) -> bool {
    if records == 0 {
        println!("No {noun} found.");
    }
    records == 0
}

pub fn dashboard(summary: &DashboardSummary, json: bool) -> Result<()> {
    if json {
        return print_json(summary);
    }
    println!("Training programs:   {}", summary.total_programs);
    println!("Employees:           {}", summary.total_employees);
    println!("Active enrollments:  {}", summary.active_enrollments);
    println!("Completions:         {}", summary.total_completions);
    println!();
    println!("Recent programs");
    for program in &summary.recent_programs {
        println!("  #{:<5} {} ({})", program.id, program.name, program.category);
    }
    println!();
    println!("Upcoming sessions");
    if summary.upcoming_sessions.is_empty() {
        println!("  none scheduled");
    }
    for session in &summary.upcoming_sessions {
        println!(
            "  {}  {} @ {}",
            when(session.start_time),
            session.title,
            session.location
        );
    }
    Ok(())
}

pub fn employees(records: &[&Employee], json: bool) -> Result<()> {
    if json {
        return print_json(records);
    }
    if empty(records.len(), "employees") {
        return Ok(());
    }
    for e in records {
        println!(
            "#{:<5} {:<8} {:<24} {:<28} {:<14} {}",
            e.id,
            e.employee_id,
            e.display_name(),
            e.email,
            e.department,
            e.position
        );
    }
    Ok(())
}

pub fn profile(profile: &EmployeeProfile, json: bool) -> Result<()> {
    let employee = &profile.employee;
    if json {
        return print_json(profile);
    }
    println!("{} ({})", employee.display_name(), employee.employee_id);
    println!("  {} / {} / {}", employee.email, employee.department, employee.position);
    println!();
    println!("Enrollments");
    if profile.enrollments.is_empty() {
        println!("  none");
    }
    for row in &profile.enrollments {
        println!(
            "  #{:<5} {:<28} {:<12} since {}",
            row.id,
            row.program_name,
            row.status.as_str(),
            when(row.enrollment_date)
        );
    }
    println!();
    println!("Completions");
    if profile.completions.is_empty() {
        println!("  none");
    }
    for c in &profile.completions {
        println!(
            "  {:<28} {:>6.1} {:<8} {}",
            c.program_name,
            c.score,
            c.status.as_str(),
            when(c.completion_date)
        );
    }
    Ok(())
}

pub fn programs(records: &[&TrainingProgram], json: bool) -> Result<()> {
    if json {
        return print_json(records);
    }
    if empty(records.len(), "training programs") {
        return Ok(());
    }
    for p in records {
        println!(
            "#{:<5} {:<28} {:<16} by {}",
            p.id, p.name, p.category, p.created_by
        );
    }
    Ok(())
}

pub fn overview(overview: &ProgramOverview, json: bool) -> Result<()> {
    if json {
        return print_json(overview);
    }
    let program = &overview.program;
    println!("{} [{}]", program.name, program.category);
    println!("  {}", program.description);
    println!();
    sessions(&overview.sessions.iter().collect::<Vec<_>>(), false)
}

pub fn sessions(records: &[&Session], json: bool) -> Result<()> {
    if json {
        return print_json(records);
    }
    if empty(records.len(), "sessions") {
        return Ok(());
    }
    for s in records {
        println!(
            "#{:<5} {}  {:<28} {:<16} {} (max {})",
            s.id,
            when(s.start_time),
            s.title,
            s.location,
            s.trainer,
            s.max_attendees
        );
    }
    Ok(())
}

pub fn session_rows(records: &[&SessionRow], json: bool) -> Result<()> {
    if json {
        return print_json(records);
    }
    if empty(records.len(), "sessions") {
        return Ok(());
    }
    for row in records {
        let s = &row.session;
        println!(
            "#{:<5} {}  {:<28} {:<24} {}",
            s.id,
            when(s.start_time),
            s.title,
            row.program_name,
            s.location
        );
    }
    Ok(())
}

pub fn enrollments(records: &[&EnrollmentRow], json: bool) -> Result<()> {
    if json {
        return print_json(records);
    }
    if empty(records.len(), "enrollments") {
        return Ok(());
    }
    for row in records {
        println!(
            "#{:<5} {:<24} {:<28} {:<12} {}",
            row.id,
            row.employee_name,
            row.program_name,
            row.status.as_str(),
            when(row.enrollment_date)
        );
    }
    Ok(())
}

pub fn attendance(records: &[&Attendance], json: bool) -> Result<()> {
    if json {
        return print_json(records);
    }
    if empty(records.len(), "attendance records") {
        return Ok(());
    }
    for a in records {
        println!(
            "#{:<5} {}  {:<24} {:<28} {:<8} {}",
            a.id,
            when(a.attendance_time),
            a.employee_name,
            a.session_name,
            if a.present { "present" } else { "absent" },
            a.notes.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

pub fn completions(records: &[&Completion], json: bool) -> Result<()> {
    if json {
        return print_json(records);
    }
    if empty(records.len(), "completions") {
        return Ok(());
    }
    for c in records {
        println!(
            "#{:<5} {}  {:<24} {:<28} {:>6.1} {:<8} {}",
            c.id,
            when(c.completion_date),
            c.employee_name,
            c.program_name,
            c.score,
            c.status.as_str(),
            c.certificate_url.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub fn feedback(records: &[&Feedback], json: bool) -> Result<()> {
    if json {
        return print_json(records);
    }
    if empty(records.len(), "feedback") {
        return Ok(());
    }
    for f in records {
        let rating = f.rating.map_or_else(|| "-".to_string(), |r| format!("{r}/5"));
        println!(
            "#{:<5} {}  {:<24} {:<28} {:<20} {:<4} {}",
            f.id,
            when(f.feedback_date),
            f.employee_name,
            f.program_name,
            f.kind.as_str(),
            rating,
            f.comments.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

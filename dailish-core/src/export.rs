use std::fmt::{self, Write};

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::errors::TaskError;
use crate::models::Task;
use crate::view::UNCATEGORIZED;
use crate::TaskResult;

const SEPARATOR: &str = "----------------------------------------";

/// When and for whom an export is produced. Timestamps in the output are
/// shown in the offset of `generated_at`.
#[derive(Debug, Clone)]
pub struct ExportContext<'a> {
    pub username: &'a str,
    pub generated_at: DateTime<FixedOffset>,
    pub today: NaiveDate,
}

pub fn export_filename(username: &str) -> String {
    format!("{username}_tasks.txt")
}

/// `Mon, Jan 5` style, or `No deadline`.
pub fn format_deadline(deadline: Option<NaiveDate>) -> String {
    match deadline {
        Some(date) => date.format("%a, %b %-d").to_string(),
        None => "No deadline".to_string(),
    }
}

pub fn is_overdue(deadline: Option<NaiveDate>, today: NaiveDate) -> bool {
    deadline.is_some_and(|date| date < today)
}

fn format_timestamp(at: DateTime<FixedOffset>) -> String {
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

pub fn export_text(tasks: &[Task], ctx: &ExportContext<'_>) -> TaskResult<String> {
    if tasks.is_empty() {
        return Err(TaskError::NothingToExport);
    }

    let mut out = String::new();
    writeln!(out, "My Task List")?;
    writeln!(out)?;
    writeln!(out, "Username: {}", ctx.username)?;
    writeln!(out, "Generated on: {}", format_timestamp(ctx.generated_at))?;
    writeln!(out, "Total tasks: {}", tasks.len())?;
    writeln!(out)?;
    writeln!(out, "{SEPARATOR}")?;
    writeln!(out)?;

    for (index, task) in tasks.iter().enumerate() {
        write_task(&mut out, index + 1, task, ctx)?;
    }
    Ok(out)
}

fn write_task(
    out: &mut impl Write,
    number: usize,
    task: &Task,
    ctx: &ExportContext<'_>,
) -> fmt::Result {
    let overdue = !task.completed && is_overdue(task.deadline, ctx.today);
    let status = if task.completed { "Completed" } else { "Pending" };

    writeln!(out, "{number}. {}", task.title)?;
    writeln!(out, "   Status: {status}")?;
    writeln!(out, "   Pinned: {}", if task.pinned { "Yes" } else { "No" })?;
    writeln!(
        out,
        "   Category: {}",
        task.category_label().unwrap_or(UNCATEGORIZED)
    )?;
    writeln!(out, "   Icon: {}", task.icon.label())?;
    writeln!(
        out,
        "   Priority: {}",
        task.priority.to_string().to_uppercase()
    )?;
    writeln!(
        out,
        "   Deadline: {}{}",
        format_deadline(task.deadline),
        if overdue { " (Overdue)" } else { "" }
    )?;
    if let Some(brief) = task.brief_text() {
        writeln!(out, "   Details: {brief}")?;
    }
    if !task.revisions.is_empty() {
        let offset = ctx.generated_at.timezone();
        writeln!(out, "   Revisions:")?;
        for (rev_index, revision) in task.revisions.iter().enumerate() {
            writeln!(
                out,
                "     {}. {}: {}",
                rev_index + 1,
                format_timestamp(revision.date.with_timezone(&offset)),
                revision.note
            )?;
        }
    }
    writeln!(out)?;
    writeln!(out, "{SEPARATOR}")?;
    writeln!(out)
}

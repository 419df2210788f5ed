use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use uuid::Uuid;

use crate::errors::TaskError;
use crate::TaskResult;

/// Opaque task identifier. New ids are time-ordered UUIDs; ids written by
/// older clients (millisecond timestamps) are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first `chars` characters of the id, or the whole id when shorter.
    pub fn prefix(&self, chars: usize) -> &str {
        self.0
            .char_indices()
            .nth(chars)
            .map_or(self.0.as_str(), |(end, _)| &self.0[..end])
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ordering is significant: `High < Medium < Low`, so an ascending sort puts
/// high priority first.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(from = "String", into = "String")]
pub enum Icon {
    #[default]
    #[strum(serialize = "fa-tag")]
    Tag,
    #[strum(serialize = "fa-briefcase")]
    Briefcase,
    #[strum(serialize = "fa-user")]
    User,
    #[strum(serialize = "fa-umbrella-beach")]
    UmbrellaBeach,
    #[strum(serialize = "fa-graduation-cap")]
    GraduationCap,
    #[strum(serialize = "fa-home")]
    Home,
    #[strum(serialize = "fa-shopping-cart")]
    ShoppingCart,
    #[strum(serialize = "fa-heartbeat")]
    Heartbeat,
}

impl Icon {
    /// Human readable label, as shown in exports and icon pickers.
    pub fn label(self) -> &'static str {
        match self {
            Icon::Tag => "Tag",
            Icon::Briefcase => "Work",
            Icon::User => "Personal",
            Icon::UmbrellaBeach => "Holiday",
            Icon::GraduationCap => "School",
            Icon::Home => "Home",
            Icon::ShoppingCart => "Shopping",
            Icon::Heartbeat => "Health",
        }
    }

    /// Accepts either the identifier (`fa-briefcase`) or the label (`Work`).
    pub fn parse_lenient(value: &str) -> Option<Icon> {
        let value = value.trim();
        value.parse::<Icon>().ok().or_else(|| {
            Icon::iter().find(|icon| icon.label().eq_ignore_ascii_case(value))
        })
    }
}

impl From<String> for Icon {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<Icon> for String {
    fn from(icon: Icon) -> Self {
        icon.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub date: DateTime<Utc>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub icon: Icon,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "lenient_deadline")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

impl Task {
    /// Trimmed category, `None` when absent or blank.
    pub fn category_label(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
    }

    pub fn brief_text(&self) -> Option<&str> {
        self.brief.as_deref().filter(|brief| !brief.trim().is_empty())
    }
}

/// Reads a deadline without failing the whole document: anything that is not
/// a `YYYY-MM-DD` date (or an RFC 3339 timestamp) becomes "no deadline".
fn lenient_deadline<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_deadline))
}

pub fn parse_deadline(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Trimmed text, `None` when absent or blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_title(title: &str) -> TaskResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    Ok(title.to_string())
}

/// Input of the add operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub brief: Option<String>,
    pub category: Option<String>,
    pub icon: Icon,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> TaskResult<()> {
        required_title(&self.title).map(|_| ())
    }

    pub fn into_task(self, now: DateTime<Utc>) -> TaskResult<Task> {
        Ok(Task {
            id: TaskId::generate(),
            title: required_title(&self.title)?,
            brief: non_blank(self.brief),
            category: non_blank(self.category),
            icon: self.icon,
            priority: self.priority,
            deadline: self.deadline,
            completed: false,
            pinned: false,
            created_at: now,
            revisions: Vec::new(),
        })
    }
}

/// Input of the edit operation. Every editable field is replaced; the
/// revision note, when non-blank, is appended to the task's history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub title: String,
    pub brief: Option<String>,
    pub category: Option<String>,
    pub icon: Icon,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
    pub revision_note: Option<String>,
}

impl TaskEdit {
    /// Prefills the edit with the task's current values.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            brief: task.brief.clone(),
            category: task.category.clone(),
            icon: task.icon,
            priority: task.priority,
            deadline: task.deadline,
            revision_note: None,
        }
    }

    pub fn validate(&self) -> TaskResult<()> {
        required_title(&self.title).map(|_| ())
    }

    pub(crate) fn apply_to(&self, task: &mut Task, at: DateTime<Utc>) -> TaskResult<()> {
        task.title = required_title(&self.title)?;
        task.brief = non_blank(self.brief.clone());
        task.category = non_blank(self.category.clone());
        task.icon = self.icon;
        task.priority = self.priority;
        task.deadline = self.deadline;
        if let Some(note) = non_blank(self.revision_note.clone()) {
            task.revisions.push(Revision { date: at, note });
        }
        Ok(())
    }
}

/// The per-user document held by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pin: Option<String>,
}

impl UserDocument {
    pub fn new(pin: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            tasks: Vec::new(),
            created_at: now,
            pin,
        }
    }

    pub fn has_pin(&self) -> bool {
        self.pin.as_deref().is_some_and(|pin| !pin.is_empty())
    }

    /// Plain string comparison. The PIN is stored in clear text next to the
    /// tasks and is not a security boundary.
    pub fn pin_matches(&self, pin: &str) -> bool {
        match self.pin.as_deref() {
            Some(stored) if !stored.is_empty() => stored == pin,
            _ => true,
        }
    }
}

/// Checks the invariants every stored task list must hold: non-blank titles
/// and unique ids.
pub fn validate_task_list(tasks: &[Task]) -> TaskResult<()> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if task.title.trim().is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        if !seen.insert(task.id.as_str()) {
            return Err(TaskError::DuplicateTaskId(task.id.to_string()));
        }
    }
    Ok(())
}

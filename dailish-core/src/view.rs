//! Filtering, ordering and grouping of a task list for display.
//!
//! [`render`] is a pure function of the task list and a [`ViewState`]; it
//! never reorders the input and borrows the tasks it returns.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::categories::CategorySet;
use crate::models::{Icon, Task};

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Filter {
    All,
    #[default]
    Active,
    Completed,
}

impl Filter {
    pub fn admits(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortKey {
    /// Newest first, by creation time.
    #[default]
    #[serde(alias = "default", alias = "filter")]
    #[strum(to_string = "newest", serialize = "default", serialize = "filter")]
    Newest,
    Deadline,
    Priority,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActiveSort {
    #[default]
    Default,
    Category,
}

/// Per-session view configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub filter: Filter,
    pub sort: SortKey,
    /// Only consulted when `filter` is [`Filter::Active`].
    pub active_sort: ActiveSort,
    pub search: String,
    pub categories: CategorySet,
    pub editing: Option<Task>,
}

impl ViewState {
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_active_sort(mut self, active_sort: ActiveSort) -> Self {
        self.active_sort = active_sort;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn groups_by_category(&self) -> bool {
        self.filter == Filter::Active && self.active_sort == ActiveSort::Category
    }

    pub fn begin_edit(&mut self, task: Task) {
        tracing::debug!(task_id = %task.id, "Editing task");
        self.editing = Some(task);
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskGroup<'a> {
    pub label: String,
    pub icon: Icon,
    pub tasks: Vec<&'a Task>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered<'a> {
    /// Nothing matched; callers show their empty state.
    Empty,
    Flat(Vec<&'a Task>),
    Grouped(Vec<TaskGroup<'a>>),
}

impl<'a> Rendered<'a> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Rendered::Empty)
    }

    /// All rendered tasks in display order, across groups.
    pub fn tasks(&self) -> Vec<&'a Task> {
        match self {
            Rendered::Empty => Vec::new(),
            Rendered::Flat(tasks) => tasks.clone(),
            Rendered::Grouped(groups) => groups
                .iter()
                .flat_map(|group| group.tasks.iter().copied())
                .collect(),
        }
    }
}

pub fn render<'a>(tasks: &'a [Task], view: &ViewState) -> Rendered<'a> {
    let needle = view.search.to_lowercase();
    let visible: Vec<&Task> = tasks
        .iter()
        .filter(|task| needle.is_empty() || matches_search(task, &needle))
        .filter(|task| view.filter.admits(task))
        .collect();

    if view.groups_by_category() {
        let groups = group_by_category(visible, view.sort);
        if groups.is_empty() {
            return Rendered::Empty;
        }
        return Rendered::Grouped(groups);
    }

    let ordered = pinned_first(visible, view.sort);
    if ordered.is_empty() {
        Rendered::Empty
    } else {
        Rendered::Flat(ordered)
    }
}

/// `needle` must already be lowercase.
fn matches_search(task: &Task, needle: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);
    contains(&task.title)
        || task.brief.as_deref().is_some_and(contains)
        || task.category.as_deref().is_some_and(contains)
}

/// Pinned tasks first, each partition sorted independently by `sort`.
fn pinned_first(tasks: Vec<&Task>, sort: SortKey) -> Vec<&Task> {
    let (mut pinned, mut unpinned): (Vec<&Task>, Vec<&Task>) =
        tasks.into_iter().partition(|task| task.pinned);
    sort_tasks(&mut pinned, sort);
    sort_tasks(&mut unpinned, sort);
    pinned.extend(unpinned);
    pinned
}

/// Stable: equal keys keep their relative input order.
pub fn sort_tasks(tasks: &mut [&Task], sort: SortKey) {
    match sort {
        SortKey::Deadline => tasks.sort_by(|a, b| compare_deadlines(a.deadline, b.deadline)),
        SortKey::Priority => tasks.sort_by_key(|task| task.priority),
        SortKey::Newest => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

/// Tasks without a deadline go last.
fn compare_deadlines(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn group_by_category(tasks: Vec<&Task>, sort: SortKey) -> Vec<TaskGroup<'_>> {
    let mut buckets: BTreeMap<String, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        let label = task.category_label().unwrap_or(UNCATEGORIZED);
        buckets.entry(label.to_string()).or_default().push(task);
    }

    buckets
        .into_iter()
        .map(|(label, tasks)| {
            let tasks = pinned_first(tasks, sort);
            let icon = tasks.first().map(|task| task.icon).unwrap_or_default();
            TaskGroup { label, icon, tasks }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TaskDraft};
    use chrono::{Duration, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn task(title: &str, priority: Priority, deadline: Option<NaiveDate>, pinned: bool) -> Task {
        let mut task = TaskDraft {
            title: title.into(),
            priority,
            deadline,
            ..Default::default()
        }
        .into_task(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .unwrap();
        task.pinned = pinned;
        task
    }

    fn titles(rendered: &Rendered<'_>) -> Vec<String> {
        rendered.tasks().iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_pinned_overrides_deadline() {
        let tasks = vec![
            task("A", Priority::High, date(2024, 1, 5), false),
            task("B", Priority::Low, date(2024, 1, 1), true),
        ];
        let view = ViewState::default()
            .with_filter(Filter::All)
            .with_sort(SortKey::Deadline);

        assert_eq!(titles(&render(&tasks, &view)), vec!["B", "A"]);
    }

    #[test]
    fn test_pinned_first_even_with_later_deadline() {
        let tasks = vec![
            task("early", Priority::Medium, date(2024, 1, 1), false),
            task("late-pinned", Priority::Medium, date(2024, 6, 1), true),
        ];
        let view = ViewState::default().with_sort(SortKey::Deadline);

        assert_eq!(titles(&render(&tasks, &view)), vec!["late-pinned", "early"]);
    }

    #[test]
    fn test_status_filters() {
        let mut done = task("done", Priority::Medium, None, false);
        done.completed = true;
        let tasks = vec![done, task("open", Priority::Medium, None, false)];

        let active = render(&tasks, &ViewState::default());
        assert_eq!(titles(&active), vec!["open"]);

        let completed = render(&tasks, &ViewState::default().with_filter(Filter::Completed));
        assert_eq!(titles(&completed), vec!["done"]);

        let all = render(&tasks, &ViewState::default().with_filter(Filter::All));
        assert_eq!(all.tasks().len(), 2);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut with_brief = task("Call", Priority::Medium, None, false);
        with_brief.brief = Some("Ask about the INVOICE".into());
        let mut with_category = task("Paperwork", Priority::Medium, None, false);
        with_category.category = Some("Invoices".into());
        let tasks = vec![
            with_brief,
            with_category,
            task("Walk dog", Priority::Medium, None, false),
        ];

        let view = ViewState::default()
            .with_filter(Filter::All)
            .with_search("invoice");
        let mut found = titles(&render(&tasks, &view));
        found.sort();
        assert_eq!(found, vec!["Call", "Paperwork"]);
    }

    #[test]
    fn test_priority_sort_is_stable() {
        let tasks = vec![
            task("low-1", Priority::Low, None, false),
            task("high-1", Priority::High, None, false),
            task("medium", Priority::Medium, None, false),
            task("high-2", Priority::High, None, false),
            task("low-2", Priority::Low, None, false),
        ];
        let view = ViewState::default().with_sort(SortKey::Priority);

        assert_eq!(
            titles(&render(&tasks, &view)),
            vec!["high-1", "high-2", "medium", "low-1", "low-2"]
        );
    }

    #[test]
    fn test_missing_deadlines_sort_last() {
        let tasks = vec![
            task("none", Priority::Medium, None, false),
            task("feb", Priority::Medium, date(2024, 2, 1), false),
            task("jan", Priority::Medium, date(2024, 1, 1), false),
        ];
        let view = ViewState::default().with_sort(SortKey::Deadline);

        assert_eq!(titles(&render(&tasks, &view)), vec!["jan", "feb", "none"]);
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut older = task("older", Priority::Medium, None, false);
        older.created_at = base;
        let mut newer = task("newer", Priority::Medium, None, false);
        newer.created_at = base + Duration::hours(1);

        let tasks = vec![older, newer];
        assert_eq!(titles(&render(&tasks, &ViewState::default())), vec!["newer", "older"]);
    }

    #[test]
    fn test_category_grouping() {
        let mut work = task("report", Priority::Low, None, false);
        work.category = Some("Work".into());
        work.icon = Icon::Briefcase;
        let mut work_pinned = task("standup", Priority::Low, None, true);
        work_pinned.category = Some("Work".into());
        work_pinned.icon = Icon::User;
        let mut home = task("dishes", Priority::High, None, false);
        home.category = Some("Home".into());
        home.icon = Icon::Home;
        let mut blank = task("misc", Priority::Medium, None, false);
        blank.category = Some("   ".into());

        let tasks = vec![work, home, blank, work_pinned];
        let view = ViewState::default().with_active_sort(ActiveSort::Category);

        let Rendered::Grouped(groups) = render(&tasks, &view) else {
            panic!("expected grouped rendering");
        };
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Home", UNCATEGORIZED, "Work"]);

        let work_group = &groups[2];
        assert_eq!(work_group.tasks[0].title, "standup");
        assert_eq!(work_group.icon, Icon::User);
        assert_eq!(groups[1].icon, Icon::Tag);
    }

    #[test]
    fn test_grouping_only_applies_to_active_filter() {
        let tasks = vec![task("a", Priority::Medium, None, false)];
        let view = ViewState::default()
            .with_filter(Filter::All)
            .with_active_sort(ActiveSort::Category);

        assert!(matches!(render(&tasks, &view), Rendered::Flat(_)));
    }

    #[test]
    fn test_empty_results() {
        let mut done = task("done", Priority::Medium, None, false);
        done.completed = true;
        let tasks = vec![done];

        assert!(render(&tasks, &ViewState::default()).is_empty());
        let grouped = ViewState::default().with_active_sort(ActiveSort::Category);
        assert_eq!(render(&tasks, &grouped), Rendered::Empty);
        assert_eq!(render(&[], &ViewState::default()), Rendered::Empty);
    }

    #[test]
    fn test_sort_key_parses_legacy_names() {
        assert_eq!("filter".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert_eq!("default".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert_eq!("Deadline".parse::<SortKey>().unwrap(), SortKey::Deadline);
        assert_eq!(SortKey::Newest.to_string(), "newest");
    }
}

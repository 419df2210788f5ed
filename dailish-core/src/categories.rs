use crate::models::{Icon, Task};

/// Sorted set of the distinct, trimmed, non-blank categories in a task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut categories: Vec<String> = tasks
            .iter()
            .filter_map(Task::category_label)
            .map(str::to_string)
            .collect();
        categories.sort();
        categories.dedup();
        Self(categories)
    }

    /// Adds a category in sorted position. Returns `true` if it was new.
    pub fn insert(&mut self, category: &str) -> bool {
        let category = category.trim();
        if category.is_empty() {
            return false;
        }
        match self.0.binary_search_by(|probe| probe.as_str().cmp(category)) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, category.to_string());
                true
            }
        }
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0
            .binary_search_by(|probe| probe.as_str().cmp(category.trim()))
            .is_ok()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Autocomplete candidates for `typed`: every category containing it
    /// (case-insensitive), or all of them when nothing is typed. Each comes
    /// with the icon of the first task filed under it.
    pub fn suggest(&self, typed: &str, tasks: &[Task]) -> Vec<(String, Icon)> {
        let needle = typed.trim().to_lowercase();
        self.0
            .iter()
            .filter(|category| needle.is_empty() || category.to_lowercase().contains(&needle))
            .map(|category| {
                let icon = tasks
                    .iter()
                    .find(|task| task.category_label() == Some(category.as_str()))
                    .map(|task| task.icon)
                    .unwrap_or_default();
                (category.clone(), icon)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDraft;
    use chrono::Utc;

    fn task(title: &str, category: Option<&str>, icon: Icon) -> Task {
        let mut task = TaskDraft::new(title).into_task(Utc::now()).unwrap();
        task.category = category.map(str::to_string);
        task.icon = icon;
        task
    }

    #[test]
    fn test_from_tasks_trims_dedups_and_sorts() {
        let tasks = vec![
            task("a", Some("Work "), Icon::Briefcase),
            task("b", Some("  "), Icon::Tag),
            task("c", Some("Home"), Icon::Home),
            task("d", Some("Work"), Icon::Briefcase),
            task("e", None, Icon::Tag),
        ];

        let set = CategorySet::from_tasks(&tasks);
        assert_eq!(set.as_slice(), &["Home".to_string(), "Work".to_string()]);
    }

    #[test]
    fn test_insert_matches_recompute() {
        let mut tasks = vec![
            task("a", Some("Work"), Icon::Tag),
            task("b", Some("Errands"), Icon::Tag),
        ];
        let mut set = CategorySet::from_tasks(&tasks);

        assert!(set.insert(" Health "));
        assert!(!set.insert("Work"));
        assert!(!set.insert(""));

        tasks.push(task("c", Some("Health"), Icon::Heartbeat));
        assert_eq!(set, CategorySet::from_tasks(&tasks));
        assert!(set.contains("Health"));
    }

    #[test]
    fn test_suggest_filters_and_pairs_icons() {
        let tasks = vec![
            task("a", Some("Work"), Icon::Briefcase),
            task("b", Some("Workout"), Icon::Heartbeat),
            task("c", Some("Home"), Icon::Home),
        ];
        let set = CategorySet::from_tasks(&tasks);

        let suggestions = set.suggest("WORK", &tasks);
        assert_eq!(
            suggestions,
            vec![
                ("Work".to_string(), Icon::Briefcase),
                ("Workout".to_string(), Icon::Heartbeat),
            ]
        );
        assert_eq!(set.suggest("", &tasks).len(), 3);
        assert!(set.suggest("garden", &tasks).is_empty());
    }
}

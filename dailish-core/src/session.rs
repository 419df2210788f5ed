use crate::categories::CategorySet;
use crate::errors::TaskError;
use crate::identity::UserKey;
use crate::models::Task;
use crate::view::{render, Rendered, ViewState};
use crate::TaskResult;

pub const MIN_ID_PREFIX: usize = 8;

/// Everything one signed-in user is looking at: identity, the current task
/// set and the view configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub username: String,
    pub user_key: UserKey,
    pub tasks: Vec<Task>,
    pub view: ViewState,
}

impl Session {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            user_key: UserKey::from_username(username),
            tasks: Vec::new(),
            view: ViewState::default(),
        }
    }

    pub fn from_user_key(user_key: UserKey) -> TaskResult<Self> {
        let username = user_key.username()?;
        Ok(Self {
            username,
            user_key,
            tasks: Vec::new(),
            view: ViewState::default(),
        })
    }

    /// Replaces the task set and recomputes the derived category set.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.view.categories = CategorySet::from_tasks(&tasks);
        self.tasks = tasks;
    }

    pub fn render(&self) -> Rendered<'_> {
        render(&self.tasks, &self.view)
    }

    /// Shortest id prefix length in characters, never below `MIN_ID_PREFIX`,
    /// that [`find_task`](Self::find_task) resolves to exactly one task.
    /// Hidden tasks count too, since lookups search the whole set.
    pub fn id_prefix_len(&self) -> usize {
        let longest = self
            .tasks
            .iter()
            .map(|task| task.id.as_str().chars().count())
            .max()
            .unwrap_or(0);
        (MIN_ID_PREFIX..longest)
            .find(|&len| {
                let mut prefixes: Vec<&str> =
                    self.tasks.iter().map(|task| task.id.prefix(len)).collect();
                prefixes.sort_unstable();
                prefixes.windows(2).all(|pair| pair[0] != pair[1])
            })
            .unwrap_or(longest.max(MIN_ID_PREFIX))
    }

    /// Looks a task up by its full id or by a unique id prefix.
    pub fn find_task(&self, id: &str) -> TaskResult<&Task> {
        let id = id.trim();
        if let Some(task) = self.tasks.iter().find(|task| task.id.as_str() == id) {
            return Ok(task);
        }
        if id.is_empty() {
            return Err(TaskError::TaskNotFound(id.to_string()));
        }

        let mut matches = self
            .tasks
            .iter()
            .filter(|task| task.id.as_str().starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task),
            (Some(_), Some(_)) => Err(TaskError::AmbiguousTaskId(id.to_string())),
            (None, _) => Err(TaskError::TaskNotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskDraft, TaskId};
    use chrono::Utc;

    fn task_with_id(id: &str, category: Option<&str>) -> Task {
        let mut task = TaskDraft::new(id).into_task(Utc::now()).unwrap();
        task.id = TaskId::from(id);
        task.category = category.map(str::to_string);
        task
    }

    #[test]
    fn test_session_from_key() {
        let session = Session::new("carol");
        let restored = Session::from_user_key(session.user_key.clone()).unwrap();
        assert_eq!(restored.username, "carol");
    }

    #[test]
    fn test_find_task_by_prefix() {
        let mut session = Session::new("dave");
        session.replace_tasks(vec![
            task_with_id("0190aa", None),
            task_with_id("0190ab", None),
            task_with_id("0200", None),
        ]);

        assert_eq!(session.find_task("0200").unwrap().id.as_str(), "0200");
        assert_eq!(session.find_task("0190aa").unwrap().id.as_str(), "0190aa");
        assert_eq!(session.find_task("02").unwrap().id.as_str(), "0200");
        assert_eq!(
            session.find_task("0190"),
            Err(TaskError::AmbiguousTaskId("0190".into()))
        );
        assert_eq!(
            session.find_task("9"),
            Err(TaskError::TaskNotFound("9".into()))
        );
    }

    #[test]
    fn test_id_prefix_len_counts_hidden_tasks() {
        let mut session = Session::new("fern");
        let mut done = task_with_id("0190aabb-2222-7000-8000-000000000002", None);
        done.completed = true;
        session.replace_tasks(vec![
            task_with_id("0190aabb-1111-7000-8000-000000000001", None),
            done,
        ]);

        let visible = session.render().tasks();
        assert_eq!(visible.len(), 1);

        let len = session.id_prefix_len();
        let shown = visible[0].id.prefix(len);
        assert_eq!(shown, "0190aabb-1");
        assert_eq!(
            session.find_task(shown).unwrap().id.as_str(),
            "0190aabb-1111-7000-8000-000000000001"
        );
    }

    #[test]
    fn test_id_prefix_respects_char_boundaries() {
        let mut session = Session::new("gail");
        session.replace_tasks(vec![
            task_with_id("abcdefgé-1", None),
            task_with_id("abcdefgé-2", None),
        ]);

        let len = session.id_prefix_len();
        assert_eq!(len, 10);
        let prefixes: Vec<&str> = session.tasks.iter().map(|t| t.id.prefix(len)).collect();
        assert_eq!(prefixes, vec!["abcdefgé-1", "abcdefgé-2"]);
        assert_eq!(session.tasks[0].id.prefix(8), "abcdefgé");
        assert_eq!(session.tasks[0].id.prefix(50), "abcdefgé-1");
    }

    #[test]
    fn test_replace_tasks_recomputes_categories() {
        let mut session = Session::new("erin");
        session.view.categories.insert("Stale");
        session.replace_tasks(vec![task_with_id("a", Some("Work"))]);
        assert_eq!(session.view.categories.as_slice(), &["Work".to_string()]);
    }
}

use chrono::{DateTime, Utc};
use strum::IntoStaticStr;

use crate::errors::TaskError;
use crate::models::{Task, TaskEdit, TaskId};
use crate::TaskResult;

/// A single change to a user's task list.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Mutation {
    Add(Task),
    Edit {
        id: TaskId,
        edit: TaskEdit,
        at: DateTime<Utc>,
    },
    ToggleComplete(TaskId),
    TogglePin(TaskId),
    Delete(TaskId),
}

/// Result of applying a [`Mutation`] to a task list.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub tasks: Vec<Task>,
    /// Set when a toggle just marked a task as completed.
    pub completed: Option<Task>,
    /// Category carried by an added or edited task, if any.
    pub category: Option<String>,
}

impl Mutation {
    pub fn operation(&self) -> &'static str {
        self.into()
    }

    pub fn apply(&self, tasks: &[Task]) -> TaskResult<Applied> {
        let mut tasks = tasks.to_vec();
        let mut completed = None;
        let mut category = None;

        match self {
            Mutation::Add(task) => {
                if tasks.iter().any(|existing| existing.id == task.id) {
                    return Err(TaskError::DuplicateTaskId(task.id.to_string()));
                }
                category = task.category_label().map(str::to_string);
                tasks.push(task.clone());
            }
            Mutation::Edit { id, edit, at } => {
                let task = find_mut(&mut tasks, id)?;
                edit.apply_to(task, *at)?;
                category = task.category_label().map(str::to_string);
            }
            Mutation::ToggleComplete(id) => {
                let task = find_mut(&mut tasks, id)?;
                task.completed = !task.completed;
                if task.completed {
                    completed = Some(task.clone());
                }
            }
            Mutation::TogglePin(id) => {
                let task = find_mut(&mut tasks, id)?;
                task.pinned = !task.pinned;
            }
            Mutation::Delete(id) => {
                let before = tasks.len();
                tasks.retain(|task| &task.id != id);
                if tasks.len() == before {
                    return Err(TaskError::TaskNotFound(id.to_string()));
                }
            }
        }

        Ok(Applied {
            tasks,
            completed,
            category,
        })
    }
}

fn find_mut<'a>(tasks: &'a mut [Task], id: &TaskId) -> TaskResult<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|task| &task.id == id)
        .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))
}

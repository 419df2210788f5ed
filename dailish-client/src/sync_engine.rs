use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use dailish_core::export::{export_text, ExportContext};
use dailish_core::{Applied, Mutation, Session, TaskDraft, TaskEdit, TaskError, TaskId, UserKey};

use crate::database::ClientDatabase;
use crate::errors::{ClientError, ClientResult, RemoteError};
use crate::events::{EventDispatcher, SyncEvent};
use crate::remote::RemoteTaskStore;

/// Where the task set of the last load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSource {
    Remote,
    Cache,
    Empty,
}

/// Asks the user to confirm a destructive operation.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Written to the remote store and reloaded. `celebrate` is set when a
    /// task was just completed.
    Applied { source: TaskSource, celebrate: bool },
    /// The user declined the confirmation; nothing was touched.
    Declined,
}

/// Keeps a session's task set in step with the remote store, falling back
/// to the local mirror for reads when the store cannot be reached.
///
/// Every mutation is written to the remote store first and then reloaded
/// from it. Nothing is queued while offline.
pub struct SyncEngine<R: RemoteTaskStore> {
    pub(crate) remote: Arc<R>,
    pub(crate) db: Arc<ClientDatabase>,
    is_online: Arc<AtomicBool>,
    event_dispatcher: Arc<EventDispatcher>,
}

impl<R: RemoteTaskStore> SyncEngine<R> {
    pub fn new(remote: Arc<R>, db: Arc<ClientDatabase>) -> Self {
        Self {
            remote,
            db,
            is_online: Arc::new(AtomicBool::new(true)),
            event_dispatcher: Arc::new(EventDispatcher::new()),
        }
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    pub fn database(&self) -> &Arc<ClientDatabase> {
        &self.db
    }

    /// Every load and mutation queues events here. Callers should run
    /// `process_events` or `drain` regularly; once `MAX_QUEUED_EVENTS` are
    /// pending, newer events are dropped.
    pub fn event_dispatcher(&self) -> Arc<EventDispatcher> {
        self.event_dispatcher.clone()
    }

    pub fn is_online(&self) -> bool {
        self.is_online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        let was_online = self.is_online.swap(online, Ordering::SeqCst);
        if was_online != online {
            tracing::info!("SYNC: connectivity changed, online = {}", online);
            self.event_dispatcher
                .emit(SyncEvent::ConnectionStateChanged { online });
        }
    }

    pub(crate) fn ensure_online(&self) -> ClientResult<()> {
        if self.is_online() {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("offline mode".into()).into())
        }
    }

    /// Replaces the session's task set with the remote document's list, or
    /// with the mirrored list when the remote store cannot be read.
    pub async fn load(&self, session: &mut Session) -> TaskSource {
        let user_key = session.user_key.clone();

        let fetched = if self.is_online() {
            Some(self.remote.get_document(&user_key).await)
        } else {
            None
        };

        let (tasks, source) = match fetched {
            Some(Ok(Some(document))) => {
                if let Err(e) = self.db.save_tasks(&user_key, &document.tasks).await {
                    tracing::warn!("SYNC: failed to mirror tasks for {}: {}", user_key, e);
                }
                (document.tasks, TaskSource::Remote)
            }
            Some(Ok(None)) => {
                tracing::debug!("SYNC: no document for {}", user_key);
                (Vec::new(), TaskSource::Remote)
            }
            Some(Err(e)) => {
                tracing::warn!("SYNC: remote read failed, falling back to mirror: {}", e);
                self.load_cached(&user_key).await
            }
            None => self.load_cached(&user_key).await,
        };

        tracing::info!("SYNC: loaded {} tasks from {:?}", tasks.len(), source);
        let count = tasks.len();
        session.replace_tasks(tasks);
        self.event_dispatcher
            .emit(SyncEvent::TasksLoaded { source, count });
        source
    }

    async fn load_cached(&self, user_key: &UserKey) -> (Vec<dailish_core::Task>, TaskSource) {
        let cached = match self.db.load_tasks(user_key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("SYNC: failed to read mirror for {}: {}", user_key, e);
                None
            }
        };

        match cached {
            Some(tasks) => {
                self.event_dispatcher.emit(SyncEvent::ServingCached {
                    count: tasks.len(),
                });
                (tasks, TaskSource::Cache)
            }
            None => {
                tracing::error!("SYNC: no cached tasks available for {}", user_key);
                self.event_dispatcher.emit(SyncEvent::NoCacheAvailable);
                (Vec::new(), TaskSource::Empty)
            }
        }
    }

    pub async fn add_task(
        &self,
        session: &mut Session,
        draft: TaskDraft,
    ) -> ClientResult<MutationOutcome> {
        let task = draft
            .into_task(Utc::now())
            .map_err(|e| self.fail("add", e.into()))?;
        self.commit(session, Mutation::Add(task)).await
    }

    /// Saves `edit` over the task currently held in `session.view.editing`
    /// and clears the editing target on success.
    pub async fn save_edit(
        &self,
        session: &mut Session,
        edit: TaskEdit,
    ) -> ClientResult<MutationOutcome> {
        let Some(target) = session.view.editing.as_ref() else {
            return Err(self.fail("edit", TaskError::NoTaskBeingEdited.into()));
        };
        edit.validate().map_err(|e| self.fail("edit", e.into()))?;

        let mutation = Mutation::Edit {
            id: target.id.clone(),
            edit,
            at: Utc::now(),
        };
        let outcome = self.commit(session, mutation).await?;
        session.view.cancel_edit();
        Ok(outcome)
    }

    pub async fn toggle_complete(
        &self,
        session: &mut Session,
        id: &TaskId,
    ) -> ClientResult<MutationOutcome> {
        self.commit(session, Mutation::ToggleComplete(id.clone()))
            .await
    }

    pub async fn toggle_pin(
        &self,
        session: &mut Session,
        id: &TaskId,
    ) -> ClientResult<MutationOutcome> {
        self.commit(session, Mutation::TogglePin(id.clone())).await
    }

    /// Deletes a task after `confirm` agrees. Declining touches nothing.
    pub async fn delete_task<C>(
        &self,
        session: &mut Session,
        id: &TaskId,
        confirm: &C,
    ) -> ClientResult<MutationOutcome>
    where
        C: Confirm + ?Sized,
    {
        let title = session
            .tasks
            .iter()
            .find(|task| &task.id == id)
            .map(|task| task.title.as_str())
            .unwrap_or(id.as_str());
        let prompt = format!("Are you sure you want to delete \"{title}\"?");

        if !confirm.confirm(&prompt) {
            tracing::debug!("SYNC: delete of {} declined", id);
            return Ok(MutationOutcome::Declined);
        }
        self.commit(session, Mutation::Delete(id.clone())).await
    }

    /// Formats the user's remote task list as a plain-text export.
    pub async fn export(
        &self,
        session: &Session,
        generated_at: DateTime<FixedOffset>,
    ) -> ClientResult<String> {
        self.ensure_online()?;
        let document = self
            .remote
            .get_document(&session.user_key)
            .await?
            .ok_or(RemoteError::NotFound)?;

        let ctx = ExportContext {
            username: &session.username,
            generated_at,
            today: generated_at.date_naive(),
        };
        Ok(export_text(&document.tasks, &ctx)?)
    }

    async fn commit(
        &self,
        session: &mut Session,
        mutation: Mutation,
    ) -> ClientResult<MutationOutcome> {
        let operation = mutation.operation();
        let applied = self
            .write_through(&session.user_key, &session.tasks, &mutation)
            .await
            .map_err(|e| self.fail(operation, e))?;

        tracing::info!("SYNC: {} written for {}", operation, session.user_key);

        let celebrate = applied.completed.is_some();
        if let Some(task) = &applied.completed {
            self.event_dispatcher.emit(SyncEvent::TaskCompleted {
                id: task.id.clone(),
                title: task.title.clone(),
            });
        }

        let Applied {
            tasks, category, ..
        } = applied;
        if let Err(e) = self.db.save_tasks(&session.user_key, &tasks).await {
            tracing::warn!("SYNC: failed to mirror tasks after {}: {}", operation, e);
        }
        session.tasks = tasks;
        if let Some(category) = category {
            if session.view.categories.insert(&category) {
                tracing::debug!("SYNC: new category {}", category);
            }
        }

        let source = self.load(session).await;
        Ok(MutationOutcome::Applied { source, celebrate })
    }

    /// Applies `mutation` to the remote store and returns the resulting
    /// list. Session and mirror are left alone.
    async fn write_through(
        &self,
        user_key: &UserKey,
        current: &[dailish_core::Task],
        mutation: &Mutation,
    ) -> ClientResult<Applied> {
        self.ensure_online()?;

        if let Mutation::Add(task) = mutation {
            match self.remote.append_task(user_key, task).await {
                Ok(()) => return Ok(mutation.apply(current)?),
                Err(RemoteError::Unsupported) => {
                    tracing::debug!("SYNC: append unsupported, replacing the whole list");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let document = self
            .remote
            .get_document(user_key)
            .await?
            .ok_or(RemoteError::NotFound)?;
        let applied = mutation.apply(&document.tasks)?;
        self.remote.replace_tasks(user_key, &applied.tasks).await?;
        Ok(applied)
    }

    pub(crate) fn fail(&self, operation: &'static str, err: ClientError) -> ClientError {
        tracing::error!("SYNC: {} failed: {}", operation, err);
        self.event_dispatcher.emit(SyncEvent::MutationFailed {
            operation,
            message: err.user_message(),
        });
        err
    }
}

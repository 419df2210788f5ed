#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use dailish_client::{ClientDatabase, MemoryRemoteStore, SyncEngine, SyncEvent};
use dailish_core::{Priority, Session, Task, TaskDraft, UserDocument};

pub async fn setup_mirror() -> Arc<ClientDatabase> {
    let db = ClientDatabase::new("sqlite::memory:")
        .await
        .expect("open in-memory mirror");
    db.run_migrations().await.expect("run mirror migrations");
    Arc::new(db)
}

pub struct TestContext {
    pub store: Arc<MemoryRemoteStore>,
    pub db: Arc<ClientDatabase>,
    pub engine: SyncEngine<MemoryRemoteStore>,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryRemoteStore::new());
        let db = setup_mirror().await;
        let engine = SyncEngine::new(store.clone(), db.clone());
        Self { store, db, engine }
    }

    /// Seeds a remote document for `username` and returns a loaded session.
    pub async fn session_with(&self, username: &str, tasks: Vec<Task>) -> Session {
        let mut session = Session::new(username);
        let mut document = UserDocument::new(None, Utc::now());
        document.tasks = tasks;
        self.store.insert_document(&session.user_key, document);
        self.engine.load(&mut session).await;
        self.drain_events();
        session
    }

    pub fn remote_tasks(&self, session: &Session) -> Vec<Task> {
        self.store
            .document(&session.user_key)
            .map(|document| document.tasks)
            .unwrap_or_default()
    }

    pub fn drain_events(&self) -> Vec<SyncEvent> {
        self.engine.event_dispatcher().drain().expect("drain events")
    }
}

pub fn task(title: &str) -> Task {
    TaskDraft::new(title)
        .into_task(Utc::now())
        .expect("valid title")
}

pub fn detailed_task(
    title: &str,
    priority: Priority,
    deadline: Option<(i32, u32, u32)>,
    pinned: bool,
) -> Task {
    let mut task = task(title);
    task.priority = priority;
    task.deadline = deadline.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
    task.pinned = pinned;
    task
}

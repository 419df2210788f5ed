//! Dailish - offline-first task list
//!
//! This crate provides a unified API over the Dailish client, server and
//! shared task model.
//!
//! # Example
//!
//! ```ignore
//! use dailish::{ClientDatabase, HttpRemoteStore, SyncEngine};
//!
//! let db = ClientDatabase::new("sqlite:mirror.db?mode=rwc").await?;
//! let engine = SyncEngine::new(Arc::new(HttpRemoteStore::new(url)), Arc::new(db));
//! let mut session = engine.create_account("alice", Some("1234")).await?;
//! engine.add_task(&mut session, TaskDraft::new("Buy milk")).await;
//! ```

// Re-export client types
pub use dailish_client::{
    ClientDatabase, ClientError, HttpRemoteStore, MutationOutcome, RemoteTaskStore, SyncEngine,
    SyncEvent, TaskSource,
};

// Re-export server types
pub use dailish_server::{router, AppState as Server};

// Re-export core types that applications build views from
pub use dailish_core::{
    render, Filter, Priority, Session, SortKey, Task, TaskDraft, TaskEdit, TaskError, ViewState,
};

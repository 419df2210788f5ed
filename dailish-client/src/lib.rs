//! Client side of Dailish: the sync engine, the local mirror and the remote
//! store implementations.

pub mod accounts;
pub mod config;
pub mod database;
pub mod errors;
pub mod events;
pub mod queries;
pub mod remote;
pub mod sync_engine;

pub use accounts::AccountDeletion;
pub use database::ClientDatabase;
pub use errors::{ClientError, ClientResult, RemoteError};
pub use events::{EventDispatcher, EventType, SyncEvent};
pub use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteTaskStore};
pub use sync_engine::{Confirm, MutationOutcome, SyncEngine, TaskSource};

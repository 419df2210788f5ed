//! Task model, view pipeline and shared wire types for Dailish.

pub mod categories;
pub mod errors;
pub mod export;
pub mod identity;
pub mod models;
pub mod mutation;
pub mod protocol;
pub mod session;
pub mod view;

pub use categories::CategorySet;
pub use errors::TaskError;
pub use identity::UserKey;
pub use models::{Icon, Priority, Revision, Task, TaskDraft, TaskEdit, TaskId, UserDocument};
pub use mutation::{Applied, Mutation};
pub use session::Session;
pub use view::{render, ActiveSort, Filter, Rendered, SortKey, TaskGroup, ViewState};

pub type TaskResult<T> = Result<T, TaskError>;

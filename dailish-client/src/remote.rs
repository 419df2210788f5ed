//! The authoritative per-user document store.
//!
//! [`RemoteTaskStore`] is the seam the sync engine talks to. Two
//! implementations ship with the crate: [`HttpRemoteStore`] against a running
//! `dailish-server`, and [`MemoryRemoteStore`], an in-process store with
//! availability and failure switches used by tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use dailish_core::models::validate_task_list;
use dailish_core::protocol::{
    document_path, tasks_path, AppendTaskRequest, CreateDocumentRequest, ErrorResponse,
    ReplaceTasksRequest,
};
use dailish_core::{Task, UserDocument, UserKey};
use reqwest::{Response, StatusCode};

use crate::errors::RemoteError;

pub type RemoteResult<T> = Result<T, RemoteError>;

pub trait RemoteTaskStore: Send + Sync {
    /// The user's document, or `None` when no document exists for the key.
    fn get_document(
        &self,
        user_key: &UserKey,
    ) -> impl Future<Output = RemoteResult<Option<UserDocument>>> + Send;

    /// Fails with [`RemoteError::AlreadyExists`] when the key is taken.
    fn create_document(
        &self,
        user_key: &UserKey,
        pin: Option<String>,
    ) -> impl Future<Output = RemoteResult<UserDocument>> + Send;

    /// Replaces the whole task list of an existing document.
    fn replace_tasks(
        &self,
        user_key: &UserKey,
        tasks: &[Task],
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Appends one task atomically. Stores without an append primitive
    /// return [`RemoteError::Unsupported`].
    fn append_task(
        &self,
        user_key: &UserKey,
        task: &Task,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Removes the document. Deleting a missing document succeeds.
    fn delete_document(&self, user_key: &UserKey)
        -> impl Future<Output = RemoteResult<()>> + Send;
}

/// Remote store backed by the `dailish-server` HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: Response) -> RemoteResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(match status {
            StatusCode::NOT_FOUND => RemoteError::NotFound,
            StatusCode::CONFLICT => RemoteError::AlreadyExists,
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                RemoteError::Unsupported
            }
            _ => {
                let message = response
                    .json::<ErrorResponse>()
                    .await
                    .map(|body| body.message)
                    .unwrap_or_else(|_| status.to_string());
                RemoteError::Rejected {
                    status: status.as_u16(),
                    message,
                }
            }
        })
    }
}

impl RemoteTaskStore for HttpRemoteStore {
    async fn get_document(&self, user_key: &UserKey) -> RemoteResult<Option<UserDocument>> {
        let response = self
            .client
            .get(self.url(&document_path(user_key.as_str())))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document = Self::check(response).await?.json().await?;
        Ok(Some(document))
    }

    async fn create_document(
        &self,
        user_key: &UserKey,
        pin: Option<String>,
    ) -> RemoteResult<UserDocument> {
        let response = self
            .client
            .post(self.url(&document_path(user_key.as_str())))
            .json(&CreateDocumentRequest { pin })
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn replace_tasks(&self, user_key: &UserKey, tasks: &[Task]) -> RemoteResult<()> {
        let body = ReplaceTasksRequest {
            tasks: tasks.to_vec(),
        };
        let response = self
            .client
            .put(self.url(&tasks_path(user_key.as_str())))
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn append_task(&self, user_key: &UserKey, task: &Task) -> RemoteResult<()> {
        let body = AppendTaskRequest { task: task.clone() };
        let response = self
            .client
            .post(self.url(&tasks_path(user_key.as_str())))
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete_document(&self, user_key: &UserKey) -> RemoteResult<()> {
        let response = self
            .client
            .delete(self.url(&document_path(user_key.as_str())))
            .send()
            .await?;

        match Self::check(response).await {
            Ok(_) | Err(RemoteError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-process remote store.
///
/// Every call is counted, including calls that fail because the store is
/// switched to unavailable.
pub struct MemoryRemoteStore {
    documents: Mutex<HashMap<UserKey, UserDocument>>,
    available: AtomicBool,
    append_supported: AtomicBool,
    fail_writes: AtomicBool,
    calls: AtomicUsize,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            append_supported: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// When unavailable, every call fails with [`RemoteError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_append_supported(&self, supported: bool) {
        self.append_supported.store(supported, Ordering::SeqCst);
    }

    /// Makes every write fail with a 500 rejection while reads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_call_count(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    /// Seeds or overwrites a document without counting a call.
    pub fn insert_document(&self, user_key: &UserKey, document: UserDocument) {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(user_key.clone(), document);
        }
    }

    /// Removes a document without counting a call.
    pub fn remove_document(&self, user_key: &UserKey) {
        if let Ok(mut documents) = self.documents.lock() {
            documents.remove(user_key);
        }
    }

    /// Reads a document without counting a call.
    pub fn document(&self, user_key: &UserKey) -> Option<UserDocument> {
        self.documents
            .lock()
            .ok()
            .and_then(|documents| documents.get(user_key).cloned())
    }

    fn begin(&self) -> RemoteResult<MutexGuard<'_, HashMap<UserKey, UserDocument>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("memory store offline".into()));
        }
        self.documents
            .lock()
            .map_err(|_| RemoteError::Unavailable("memory store lock poisoned".into()))
    }

    fn begin_write(&self) -> RemoteResult<MutexGuard<'_, HashMap<UserKey, UserDocument>>> {
        let documents = self.begin()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected {
                status: 500,
                message: "write failed".into(),
            });
        }
        Ok(documents)
    }
}

fn rejected(err: dailish_core::TaskError) -> RemoteError {
    RemoteError::Rejected {
        status: 400,
        message: err.to_string(),
    }
}

impl RemoteTaskStore for MemoryRemoteStore {
    async fn get_document(&self, user_key: &UserKey) -> RemoteResult<Option<UserDocument>> {
        let documents = self.begin()?;
        Ok(documents.get(user_key).cloned())
    }

    async fn create_document(
        &self,
        user_key: &UserKey,
        pin: Option<String>,
    ) -> RemoteResult<UserDocument> {
        let mut documents = self.begin_write()?;
        if documents.contains_key(user_key) {
            return Err(RemoteError::AlreadyExists);
        }
        let document = UserDocument::new(pin, Utc::now());
        documents.insert(user_key.clone(), document.clone());
        Ok(document)
    }

    async fn replace_tasks(&self, user_key: &UserKey, tasks: &[Task]) -> RemoteResult<()> {
        let mut documents = self.begin_write()?;
        validate_task_list(tasks).map_err(rejected)?;
        let document = documents.get_mut(user_key).ok_or(RemoteError::NotFound)?;
        document.tasks = tasks.to_vec();
        Ok(())
    }

    async fn append_task(&self, user_key: &UserKey, task: &Task) -> RemoteResult<()> {
        let mut documents = self.begin_write()?;
        if !self.append_supported.load(Ordering::SeqCst) {
            return Err(RemoteError::Unsupported);
        }
        let document = documents.get_mut(user_key).ok_or(RemoteError::NotFound)?;
        let mut tasks = document.tasks.clone();
        tasks.push(task.clone());
        validate_task_list(&tasks).map_err(rejected)?;
        document.tasks = tasks;
        Ok(())
    }

    async fn delete_document(&self, user_key: &UserKey) -> RemoteResult<()> {
        let mut documents = self.begin_write()?;
        documents.remove(user_key);
        Ok(())
    }
}

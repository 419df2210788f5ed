//! Signing up, signing in and removing a user's document.
//!
//! A PIN, when set, is compared in plain text against the value stored next
//! to the tasks. It keeps casual visitors out of a list and nothing more.

use dailish_core::identity::{validate_pin, validate_username};
use dailish_core::{Session, UserDocument, UserKey};

use crate::errors::{ClientError, ClientResult, RemoteError};
use crate::remote::RemoteTaskStore;
use crate::sync_engine::{Confirm, SyncEngine};

const PREVIEW_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountDeletion {
    Deleted,
    Declined,
}

impl<R: RemoteTaskStore> SyncEngine<R> {
    /// Creates an empty document for `username` and signs in.
    pub async fn create_account(
        &self,
        username: &str,
        pin: Option<&str>,
    ) -> ClientResult<Session> {
        let username = validate_username(username)?;
        let pin = validate_pin(pin)?;
        self.ensure_online()?;

        let mut session = Session::new(&username);
        match self.remote.create_document(&session.user_key, pin).await {
            Ok(_) => {}
            Err(RemoteError::AlreadyExists) => return Err(ClientError::UsernameTaken),
            Err(e) => return Err(e.into()),
        }
        tracing::info!("ACCOUNT: created document for {}", session.user_key);

        self.db.store_session(&session.user_key).await?;
        self.load(&mut session).await;
        Ok(session)
    }

    /// Whether signing in as `username` needs a PIN. Unknown users need none.
    pub async fn requires_pin(&self, username: &str) -> ClientResult<bool> {
        let username = validate_username(username)?;
        self.ensure_online()?;

        let document = self
            .remote
            .get_document(&UserKey::from_username(&username))
            .await?;
        Ok(document.is_some_and(|document| document.has_pin()))
    }

    pub async fn open_account(&self, username: &str, pin: Option<&str>) -> ClientResult<Session> {
        let username = validate_username(username)?;
        let (user_key, _) = self.verify(&username, pin).await?;

        self.db.store_session(&user_key).await?;
        let mut session = Session::new(&username);
        self.load(&mut session).await;
        tracing::info!("ACCOUNT: signed in as {}", user_key);
        Ok(session)
    }

    /// Deletes the user's document after showing up to five task titles and
    /// asking for confirmation. Also forgets the mirror entry, the stored
    /// session and the theme.
    pub async fn delete_account<C>(
        &self,
        username: &str,
        pin: Option<&str>,
        confirm: &C,
    ) -> ClientResult<AccountDeletion>
    where
        C: Confirm + ?Sized,
    {
        let username = validate_username(username)?;
        let (user_key, document) = self.verify(&username, pin).await?;

        if !confirm.confirm(&deletion_prompt(&username, &document)) {
            return Ok(AccountDeletion::Declined);
        }

        self.remote.delete_document(&user_key).await?;
        self.db.remove_tasks(&user_key).await?;
        self.db.clear_session().await?;
        self.db.clear_theme().await?;
        tracing::info!("ACCOUNT: deleted {}", user_key);
        Ok(AccountDeletion::Deleted)
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.db.clear_session().await
    }

    /// The stored session, with its task set loaded. A stored key that does
    /// not decode is discarded.
    pub async fn resume_session(&self) -> ClientResult<Option<Session>> {
        let Some(user_key) = self.db.session_key().await? else {
            return Ok(None);
        };

        match Session::from_user_key(user_key) {
            Ok(mut session) => {
                self.load(&mut session).await;
                Ok(Some(session))
            }
            Err(e) => {
                tracing::warn!("ACCOUNT: discarding stored session: {}", e);
                self.db.clear_session().await?;
                Ok(None)
            }
        }
    }

    async fn verify(
        &self,
        username: &str,
        pin: Option<&str>,
    ) -> ClientResult<(UserKey, UserDocument)> {
        self.ensure_online()?;
        let user_key = UserKey::from_username(username);

        let document = self
            .remote
            .get_document(&user_key)
            .await?
            .ok_or(ClientError::UserNotFound)?;
        if !document.pin_matches(pin.map(str::trim).unwrap_or_default()) {
            return Err(ClientError::IncorrectPin);
        }
        Ok((user_key, document))
    }
}

fn deletion_prompt(username: &str, document: &UserDocument) -> String {
    let mut prompt = format!("Delete the account \"{username}\" and all of its tasks?");
    if document.tasks.is_empty() {
        prompt.push_str("\nNo tasks found.");
        return prompt;
    }

    prompt.push_str("\nRecent tasks:");
    for task in document.tasks.iter().take(PREVIEW_LEN) {
        prompt.push_str("\n  - ");
        prompt.push_str(&task.title);
    }
    if document.tasks.len() > PREVIEW_LEN {
        prompt.push_str(&format!(
            "\n  ... and {} more",
            document.tasks.len() - PREVIEW_LEN
        ));
    }
    prompt
}

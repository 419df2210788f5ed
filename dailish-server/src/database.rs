use chrono::{DateTime, Utc};
use dailish_core::{Task, UserDocument, UserKey};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};

use crate::errors::ServerResult;
use crate::queries::Queries;

/// Outcome of an append that wrote nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    MissingDocument,
    DuplicateId,
}

pub struct ServerDatabase {
    pub pool: SqlitePool,
}

impl ServerDatabase {
    pub async fn new(database_url: &str) -> ServerResult<Self> {
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            10
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> ServerResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn get_document(&self, user_key: &UserKey) -> ServerResult<Option<UserDocument>> {
        let row = sqlx::query(Queries::GET_DOCUMENT)
            .bind(user_key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let tasks: String = row.try_get("tasks")?;
        let pin: Option<String> = row.try_get("pin")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        Ok(Some(UserDocument {
            tasks: serde_json::from_str(&tasks)?,
            created_at,
            pin,
        }))
    }

    pub async fn document_exists(&self, user_key: &UserKey) -> ServerResult<bool> {
        let count: i64 = sqlx::query_scalar(Queries::DOCUMENT_EXISTS)
            .bind(user_key.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Returns `None` when a document already exists for the key.
    pub async fn create_document(
        &self,
        user_key: &UserKey,
        pin: Option<String>,
    ) -> ServerResult<Option<UserDocument>> {
        let document = UserDocument::new(pin, Utc::now());

        let result = sqlx::query(Queries::CREATE_DOCUMENT)
            .bind(user_key.as_str())
            .bind(document.pin.as_deref())
            .bind(document.created_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        tracing::info!("DATABASE: created document for {}", user_key);
        Ok(Some(document))
    }

    /// Returns `false` when there is no document for the key.
    pub async fn replace_tasks(&self, user_key: &UserKey, tasks: &[Task]) -> ServerResult<bool> {
        let json = serde_json::to_string(tasks)?;

        let result = sqlx::query(Queries::REPLACE_TASKS)
            .bind(json)
            .bind(Utc::now())
            .bind(user_key.as_str())
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "DATABASE: replaced {} tasks for {}, rows affected: {}",
            tasks.len(),
            user_key,
            result.rows_affected()
        );
        Ok(result.rows_affected() > 0)
    }

    pub async fn append_task(&self, user_key: &UserKey, task: &Task) -> ServerResult<AppendOutcome> {
        let json = serde_json::to_string(task)?;

        let result = sqlx::query(Queries::APPEND_TASK)
            .bind(json)
            .bind(Utc::now())
            .bind(user_key.as_str())
            .bind(task.id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(AppendOutcome::Appended);
        }
        if self.document_exists(user_key).await? {
            Ok(AppendOutcome::DuplicateId)
        } else {
            Ok(AppendOutcome::MissingDocument)
        }
    }

    pub async fn delete_document(&self, user_key: &UserKey) -> ServerResult<()> {
        let result = sqlx::query(Queries::DELETE_DOCUMENT)
            .bind(user_key.as_str())
            .execute(&self.pool)
            .await?;

        tracing::info!(
            "DATABASE: deleted document {}, rows affected: {}",
            user_key,
            result.rows_affected()
        );
        Ok(())
    }
}

use crate::errors::ClientResult;
use crate::queries::{PreferenceKeys, Queries};
use chrono::Utc;
use dailish_core::{Task, UserKey};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};

pub const DEFAULT_THEME: &str = "light";

/// The on-device mirror of each user's last known task list, plus local
/// preferences.
pub struct ClientDatabase {
    pub pool: SqlitePool,
}

impl ClientDatabase {
    pub async fn new(database_url: &str) -> ClientResult<Self> {
        // Every connection to an in-memory database opens a separate one.
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> ClientResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Overwrites the mirror entry for `user_key`.
    pub async fn save_tasks(&self, user_key: &UserKey, tasks: &[Task]) -> ClientResult<()> {
        let json = serde_json::to_string(tasks)?;

        sqlx::query(Queries::UPSERT_MIRROR)
            .bind(user_key.as_str())
            .bind(json)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        tracing::debug!("MIRROR: saved {} tasks for {}", tasks.len(), user_key);
        Ok(())
    }

    /// The cached task list, or `None` when nothing was ever mirrored for
    /// this user.
    pub async fn load_tasks(&self, user_key: &UserKey) -> ClientResult<Option<Vec<Task>>> {
        let row = sqlx::query(Queries::GET_MIRROR)
            .bind(user_key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let json: String = row.try_get("tasks")?;
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    pub async fn remove_tasks(&self, user_key: &UserKey) -> ClientResult<()> {
        sqlx::query(Queries::DELETE_MIRROR)
            .bind(user_key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_preference(&self, key: &str) -> ClientResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(Queries::GET_PREFERENCE)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set_preference(&self, key: &str, value: &str) -> ClientResult<()> {
        sqlx::query(Queries::SET_PREFERENCE)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_preference(&self, key: &str) -> ClientResult<()> {
        sqlx::query(Queries::DELETE_PREFERENCE)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn theme(&self) -> ClientResult<String> {
        Ok(self
            .get_preference(PreferenceKeys::THEME)
            .await?
            .unwrap_or_else(|| DEFAULT_THEME.to_string()))
    }

    pub async fn set_theme(&self, theme: &str) -> ClientResult<()> {
        self.set_preference(PreferenceKeys::THEME, theme).await
    }

    pub async fn clear_theme(&self) -> ClientResult<()> {
        self.delete_preference(PreferenceKeys::THEME).await
    }

    pub async fn welcome_shown(&self) -> ClientResult<bool> {
        Ok(self
            .get_preference(PreferenceKeys::WELCOME_SHOWN)
            .await?
            .is_some_and(|value| value == "true"))
    }

    pub async fn mark_welcome_shown(&self) -> ClientResult<()> {
        self.set_preference(PreferenceKeys::WELCOME_SHOWN, "true")
            .await
    }

    pub async fn session_key(&self) -> ClientResult<Option<UserKey>> {
        Ok(self
            .get_preference(PreferenceKeys::SESSION)
            .await?
            .map(UserKey::from_raw))
    }

    pub async fn store_session(&self, user_key: &UserKey) -> ClientResult<()> {
        self.set_preference(PreferenceKeys::SESSION, user_key.as_str())
            .await
    }

    pub async fn clear_session(&self) -> ClientResult<()> {
        self.delete_preference(PreferenceKeys::SESSION).await
    }
}

/// SQL queries for the local mirror database
pub struct Queries;

impl Queries {
    pub const GET_MIRROR: &'static str = "SELECT tasks FROM task_mirror WHERE user_key = ?";

    pub const UPSERT_MIRROR: &'static str = r#"
        INSERT INTO task_mirror (user_key, tasks, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(user_key) DO UPDATE SET
            tasks = excluded.tasks,
            updated_at = excluded.updated_at
    "#;

    pub const DELETE_MIRROR: &'static str = "DELETE FROM task_mirror WHERE user_key = ?";

    pub const GET_PREFERENCE: &'static str = "SELECT value FROM preferences WHERE key = ?";

    pub const SET_PREFERENCE: &'static str = r#"
        INSERT INTO preferences (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
    "#;

    pub const DELETE_PREFERENCE: &'static str = "DELETE FROM preferences WHERE key = ?";
}

/// Keys of the `preferences` table.
pub struct PreferenceKeys;

impl PreferenceKeys {
    pub const THEME: &'static str = "theme";
    pub const WELCOME_SHOWN: &'static str = "welcome_shown";
    pub const SESSION: &'static str = "session_user_key";
}

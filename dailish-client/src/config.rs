use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dailish")
}

/// SQLite URL of the default mirror database, creating its directory.
pub fn default_database_url() -> std::io::Result<String> {
    let dir = default_data_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(sqlite_url(&dir.join("mirror.sqlite3")))
}

/// URL that opens (and creates if needed) the database file at `path`.
pub fn sqlite_url(path: &std::path::Path) -> String {
    format!("sqlite:{}?mode=rwc", path.display())
}

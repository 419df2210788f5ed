/// SQL queries for the document server
pub struct Queries;

impl Queries {
    pub const GET_DOCUMENT: &'static str = r#"
        SELECT tasks, pin, created_at
        FROM user_documents
        WHERE user_key = ?
    "#;

    pub const DOCUMENT_EXISTS: &'static str =
        "SELECT COUNT(*) FROM user_documents WHERE user_key = ?";

    /// Inserts a document unless the key is taken; zero rows affected means
    /// it already existed.
    pub const CREATE_DOCUMENT: &'static str = r#"
        INSERT INTO user_documents (user_key, tasks, pin, created_at, updated_at)
        VALUES (?1, '[]', ?2, ?3, ?3)
        ON CONFLICT(user_key) DO NOTHING
    "#;

    pub const REPLACE_TASKS: &'static str = r#"
        UPDATE user_documents
        SET tasks = json(?1), updated_at = ?2
        WHERE user_key = ?3
    "#;

    /// Appends a task in a single statement. Nothing is written when the
    /// document is missing or already holds a task with the same id.
    pub const APPEND_TASK: &'static str = r#"
        UPDATE user_documents
        SET tasks = json_insert(tasks, '$[#]', json(?1)), updated_at = ?2
        WHERE user_key = ?3
          AND NOT EXISTS (
              SELECT 1 FROM json_each(user_documents.tasks)
              WHERE json_extract(json_each.value, '$.id') = ?4
          )
    "#;

    pub const DELETE_DOCUMENT: &'static str = "DELETE FROM user_documents WHERE user_key = ?";
}

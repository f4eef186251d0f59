use std::path::Path;

use log::info;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde::Serialize;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Outcome of materializing one logical entity as a physical table.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTableResult {
    pub name: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Every logical entity the forum persists, in creation order.
/// Each entry is one table plus its indexes.
const TABLES: &[(&str, &str)] = &[
    (
        "options",
        "CREATE TABLE IF NOT EXISTS options (
            id TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            category TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_options_category ON options(category);",
    ),
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            display_name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);",
    ),
    (
        "articles",
        "CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            tags TEXT NOT NULL,
            content TEXT NOT NULL,
            editor_type INTEGER NOT NULL DEFAULT 0,
            author_id INTEGER NOT NULL,
            author_email TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (author_id) REFERENCES users(id)
        );
        CREATE INDEX IF NOT EXISTS idx_articles_author ON articles(author_id);",
    ),
    (
        "tags",
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY,
            title TEXT UNIQUE NOT NULL,
            reference_count INTEGER NOT NULL DEFAULT 0
        );",
    ),
    (
        "tag_articles",
        "CREATE TABLE IF NOT EXISTS tag_articles (
            tag_id INTEGER NOT NULL,
            article_id INTEGER NOT NULL,
            UNIQUE(tag_id, article_id),
            FOREIGN KEY (tag_id) REFERENCES tags(id),
            FOREIGN KEY (article_id) REFERENCES articles(id)
        );",
    ),
    (
        "comments",
        "CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY,
            article_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            content TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (article_id) REFERENCES articles(id),
            FOREIGN KEY (author_id) REFERENCES users(id)
        );
        CREATE INDEX IF NOT EXISTS idx_comments_article ON comments(article_id);",
    ),
];

pub fn init_pool_at(path: &str, max_size: u32) -> Result<DbPool, String> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| format!("{}: {}", parent.display(), e))?;
        }
    }

    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| e.to_string())?;

    // Enable WAL mode for better concurrent read performance
    let conn = pool.get().map_err(|e| e.to_string())?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .map_err(|e| e.to_string())?;

    info!("Database pool ready at {}", path);
    Ok(pool)
}

/// Names of every known table, in creation order.
pub fn table_names() -> Vec<&'static str> {
    TABLES.iter().map(|(name, _)| *name).collect()
}

/// Attempt to create every table. A failure on one table does not stop the
/// attempts on the rest; each outcome is reported in order.
pub fn create_all_tables(pool: &DbPool) -> Vec<CreateTableResult> {
    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            let msg = e.to_string();
            return TABLES
                .iter()
                .map(|(name, _)| CreateTableResult {
                    name: name.to_string(),
                    success: false,
                    error: Some(msg.clone()),
                })
                .collect();
        }
    };

    TABLES
        .iter()
        .map(|(name, ddl)| match conn.execute_batch(ddl) {
            Ok(()) => CreateTableResult {
                name: name.to_string(),
                success: true,
                error: None,
            },
            Err(e) => CreateTableResult {
                name: name.to_string(),
                success: false,
                error: Some(e.to_string()),
            },
        })
        .collect()
}

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Tag {
    pub id: i64,
    pub title: String,
    pub reference_count: i64,
}

/// Split a comma-separated tag string into trimmed, non-empty, de-duplicated titles.
pub fn split_tags(tags: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in tags.split(',') {
        let t = t.trim();
        if !t.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(t)) {
            out.push(t.to_string());
        }
    }
    out
}

impl Tag {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Tag {
            id: row.get("id")?,
            title: row.get("title")?,
            reference_count: row.get("reference_count")?,
        })
    }

    pub fn find_by_title(pool: &DbPool, title: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT id, title, reference_count FROM tags WHERE title = ?1 COLLATE NOCASE",
            params![title.trim()],
            Self::from_row,
        )
        .ok()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .unwrap_or(0)
    }

    /// Find a tag by title (case-insensitive) or create it, then link it to the
    /// article. Returns the tag id and whether it was newly created.
    pub fn attach(conn: &Connection, title: &str, article_id: i64) -> Result<(i64, bool), String> {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM tags WHERE title = ?1 COLLATE NOCASE",
                params![title],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| e.to_string())?;

        let (tag_id, created) = match existing {
            Some(id) => (id, false),
            None => {
                conn.execute(
                    "INSERT INTO tags (title, reference_count) VALUES (?1, 0)",
                    params![title],
                )
                .map_err(|e| e.to_string())?;
                (conn.last_insert_rowid(), true)
            }
        };

        conn.execute(
            "INSERT INTO tag_articles (tag_id, article_id) VALUES (?1, ?2)",
            params![tag_id, article_id],
        )
        .map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE tags SET reference_count = reference_count + 1 WHERE id = ?1",
            params![tag_id],
        )
        .map_err(|e| e.to_string())?;

        Ok((tag_id, created))
    }
}

use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::models::option::{StatOption, ID_STATISTIC_ARTICLE_COUNT, ID_STATISTIC_TAG_COUNT};
use crate::models::tag::{split_tags, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorType {
    Markdown = 0,
    Html = 1,
}

impl EditorType {
    pub fn from_i64(v: i64) -> Self {
        match v {
            1 => Self::Html,
            _ => Self::Markdown,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub tags: String,
    pub content: String,
    pub editor_type: EditorType,
    pub author_id: i64,
    pub author_email: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct ArticleForm {
    pub title: String,
    /// Comma-separated.
    pub tags: String,
    pub content: String,
    pub editor_type: EditorType,
    pub author_id: i64,
    pub author_email: String,
}

impl ArticleForm {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("article title is required".to_string());
        }
        if self.content.trim().is_empty() {
            return Err("article content is required".to_string());
        }
        if split_tags(&self.tags).is_empty() {
            return Err("article needs at least one tag".to_string());
        }
        Ok(())
    }
}

impl Article {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Article {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            tags: row.get("tags")?,
            content: row.get("content")?,
            editor_type: EditorType::from_i64(row.get("editor_type")?),
            author_id: row.get("author_id")?,
            author_email: row.get("author_email")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM articles WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM articles WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    /// Oldest first.
    pub fn list(pool: &DbPool, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM articles ORDER BY id ASC LIMIT ?1 OFFSET ?2") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))
            .unwrap_or(0)
    }

    /// Insert an article with its tags and bump the article and tag counters,
    /// all in one transaction. The author must exist and own `author_email`.
    pub fn create(pool: &DbPool, form: &ArticleForm) -> Result<i64, String> {
        form.validate()?;

        let slug = slug::slugify(form.title.trim());
        if slug.is_empty() {
            return Err(format!("title {:?} yields an empty slug", form.title));
        }

        let mut conn = pool.get().map_err(|e| e.to_string())?;
        let tx = conn.transaction().map_err(|e| e.to_string())?;

        let author_email: Option<String> = tx
            .query_row(
                "SELECT email FROM users WHERE id = ?1",
                params![form.author_id],
                |row| row.get(0),
            )
            .ok();
        match author_email {
            Some(ref e) if e == form.author_email.trim() => {}
            Some(e) => {
                return Err(format!(
                    "author {} has email {}, not {}",
                    form.author_id, e, form.author_email
                ))
            }
            None => return Err(format!("author {} does not exist", form.author_id)),
        }

        tx.execute(
            "INSERT INTO articles (title, slug, tags, content, editor_type, author_id, author_email)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.title.trim(),
                slug,
                form.tags,
                form.content,
                form.editor_type as i64,
                form.author_id,
                form.author_email.trim(),
            ],
        )
        .map_err(|e| format!("article {:?}: {}", slug, e))?;
        let id = tx.last_insert_rowid();

        let mut new_tags = 0i64;
        for title in split_tags(&form.tags) {
            let (_, created) = Tag::attach(&tx, &title, id)?;
            if created {
                new_tags += 1;
            }
        }

        StatOption::increment(&tx, ID_STATISTIC_ARTICLE_COUNT, 1)?;
        if new_tags > 0 {
            StatOption::increment(&tx, ID_STATISTIC_TAG_COUNT, new_tags)?;
        }

        tx.commit().map_err(|e| e.to_string())?;
        Ok(id)
    }
}

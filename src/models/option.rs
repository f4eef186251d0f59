use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

pub const ID_STATISTIC_MEMBER_COUNT: &str = "statisticMemberCount";
pub const ID_STATISTIC_CMT_COUNT: &str = "statisticCmtCount";
pub const ID_STATISTIC_ARTICLE_COUNT: &str = "statisticArticleCount";
pub const ID_STATISTIC_TAG_COUNT: &str = "statisticTagCount";
pub const ID_STATISTIC_MAX_ONLINE_VISITOR_COUNT: &str = "statisticMaxOnlineVisitorCount";

/// The statistic counters every fresh store starts with, in insertion order.
pub const STATISTIC_IDS: &[&str] = &[
    ID_STATISTIC_MEMBER_COUNT,
    ID_STATISTIC_CMT_COUNT,
    ID_STATISTIC_ARTICLE_COUNT,
    ID_STATISTIC_TAG_COUNT,
    ID_STATISTIC_MAX_ONLINE_VISITOR_COUNT,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionCategory {
    Statistic,
    Preference,
}

impl OptionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statistic => "statistic",
            Self::Preference => "preference",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "statistic" => Some(Self::Statistic),
            "preference" => Some(Self::Preference),
            _ => None,
        }
    }
}

/// A named configuration or statistics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatOption {
    pub id: String,
    pub value: String,
    pub category: OptionCategory,
}

impl StatOption {
    pub fn zero_counter(id: &str) -> Self {
        StatOption {
            id: id.to_string(),
            value: "0".to_string(),
            category: OptionCategory::Statistic,
        }
    }

    /// Value read as a non-negative count. Anything unparsable reads as 0.
    pub fn value_u64(&self) -> u64 {
        self.value.trim().parse().unwrap_or(0)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let category: String = row.get("category")?;
        Ok(StatOption {
            id: row.get("id")?,
            value: row.get("value")?,
            category: OptionCategory::parse(&category).unwrap_or(OptionCategory::Preference),
        })
    }

    pub fn get(pool: &DbPool, id: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT id, value, category FROM options WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list_by_category(pool: &DbPool, category: OptionCategory) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn
            .prepare("SELECT id, value, category FROM options WHERE category = ?1 ORDER BY id")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![category.as_str()], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM options", [], |row| row.get(0))
            .unwrap_or(0)
    }

    /// Insert every option inside a single transaction.
    ///
    /// Strict mode (`skip_existing == false`) fails on the first duplicate id and
    /// rolls back, so none of `options` persist. Otherwise ids that already exist
    /// are left untouched. Returns the number of rows actually inserted.
    pub fn insert_all(pool: &DbPool, options: &[StatOption], skip_existing: bool) -> Result<usize, String> {
        let mut conn = pool.get().map_err(|e| e.to_string())?;
        let tx = conn.transaction().map_err(|e| e.to_string())?;

        let sql = if skip_existing {
            "INSERT OR IGNORE INTO options (id, value, category) VALUES (?1, ?2, ?3)"
        } else {
            "INSERT INTO options (id, value, category) VALUES (?1, ?2, ?3)"
        };

        let mut inserted = 0;
        for opt in options {
            // Dropping `tx` on the error path rolls everything back.
            inserted += tx
                .execute(sql, params![opt.id, opt.value, opt.category.as_str()])
                .map_err(|e| format!("option {}: {}", opt.id, e))?;
        }

        tx.commit().map_err(|e| e.to_string())?;
        Ok(inserted)
    }

    /// Add `by` to a counter on an open connection or transaction.
    /// A missing counter is left missing; returns whether a row was updated.
    pub fn increment(conn: &Connection, id: &str, by: i64) -> Result<bool, String> {
        let updated = conn
            .execute(
                "UPDATE options SET value = CAST(CAST(value AS INTEGER) + ?1 AS TEXT) WHERE id = ?2",
                params![by, id],
            )
            .map_err(|e| e.to_string())?;
        Ok(updated > 0)
    }
}

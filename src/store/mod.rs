use crate::db::CreateTableResult;
use crate::models::article::{Article, ArticleForm};
use crate::models::option::{OptionCategory, StatOption};
use crate::models::tag::Tag;
use crate::models::user::{Role, User, UserForm};

pub mod sqlite;

/// Unified data-access trait. Every database operation goes through here.
/// Implementation: `SqliteStore` (wraps rusqlite/r2d2). Shared as
/// `Arc<dyn Store>` so callers and tests can swap the backing store.
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn create_all_tables(&self) -> Vec<CreateTableResult>;
    fn db_backend(&self) -> &str;

    // ── Options ─────────────────────────────────────────────────────
    fn option_get(&self, id: &str) -> Option<StatOption>;
    fn option_list_by_category(&self, category: OptionCategory) -> Vec<StatOption>;
    fn option_count(&self) -> i64;
    /// All-or-nothing insert; see `StatOption::insert_all`.
    fn option_insert_all(&self, options: &[StatOption], skip_existing: bool) -> Result<usize, String>;

    // ── Users ───────────────────────────────────────────────────────
    fn user_create(&self, form: &UserForm) -> Result<i64, String>;
    fn user_get_by_id(&self, id: i64) -> Option<User>;
    fn user_get_by_email(&self, email: &str) -> Option<User>;
    fn user_get_admin(&self) -> Option<User>;
    fn user_count(&self) -> i64;
    fn user_count_by_role(&self, role: Role) -> i64;

    // ── Articles ────────────────────────────────────────────────────
    fn article_create(&self, form: &ArticleForm) -> Result<i64, String>;
    fn article_find_by_id(&self, id: i64) -> Option<Article>;
    fn article_find_by_slug(&self, slug: &str) -> Option<Article>;
    fn article_list(&self, limit: i64, offset: i64) -> Vec<Article>;
    fn article_count(&self) -> i64;

    // ── Tags ────────────────────────────────────────────────────────
    fn tag_find_by_title(&self, title: &str) -> Option<Tag>;
    fn tag_count(&self) -> i64;
}

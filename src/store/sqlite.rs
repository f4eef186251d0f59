use crate::db::{CreateTableResult, DbPool};
use crate::models::article::{Article, ArticleForm};
use crate::models::option::{OptionCategory, StatOption};
use crate::models::tag::Tag;
use crate::models::user::{Role, User, UserForm};

use super::Store;

/// SQLite-backed implementation of the Store trait.
/// Wraps the r2d2 connection pool and delegates to model methods.
pub struct SqliteStore {
    pub pool: DbPool,
    bcrypt_cost: u32,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn new_at(path: &str, pool_size: u32) -> Result<Self, String> {
        let pool = crate::db::init_pool_at(path, pool_size)?;
        Ok(Self::new(pool))
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn create_all_tables(&self) -> Vec<CreateTableResult> {
        crate::db::create_all_tables(&self.pool)
    }

    fn db_backend(&self) -> &str {
        "sqlite"
    }

    // ── Options ─────────────────────────────────────────────────────

    fn option_get(&self, id: &str) -> Option<StatOption> {
        StatOption::get(&self.pool, id)
    }

    fn option_list_by_category(&self, category: OptionCategory) -> Vec<StatOption> {
        StatOption::list_by_category(&self.pool, category)
    }

    fn option_count(&self) -> i64 {
        StatOption::count(&self.pool)
    }

    fn option_insert_all(&self, options: &[StatOption], skip_existing: bool) -> Result<usize, String> {
        StatOption::insert_all(&self.pool, options, skip_existing)
    }

    // ── Users ───────────────────────────────────────────────────────

    fn user_create(&self, form: &UserForm) -> Result<i64, String> {
        User::create(&self.pool, form, self.bcrypt_cost)
    }

    fn user_get_by_id(&self, id: i64) -> Option<User> {
        User::get_by_id(&self.pool, id)
    }

    fn user_get_by_email(&self, email: &str) -> Option<User> {
        User::get_by_email(&self.pool, email)
    }

    fn user_get_admin(&self) -> Option<User> {
        User::get_admin(&self.pool)
    }

    fn user_count(&self) -> i64 {
        User::count(&self.pool)
    }

    fn user_count_by_role(&self, role: Role) -> i64 {
        User::count_by_role(&self.pool, role)
    }

    // ── Articles ────────────────────────────────────────────────────

    fn article_create(&self, form: &ArticleForm) -> Result<i64, String> {
        Article::create(&self.pool, form)
    }

    fn article_find_by_id(&self, id: i64) -> Option<Article> {
        Article::find_by_id(&self.pool, id)
    }

    fn article_find_by_slug(&self, slug: &str) -> Option<Article> {
        Article::find_by_slug(&self.pool, slug)
    }

    fn article_list(&self, limit: i64, offset: i64) -> Vec<Article> {
        Article::list(&self.pool, limit, offset)
    }

    fn article_count(&self) -> i64 {
        Article::count(&self.pool)
    }

    // ── Tags ────────────────────────────────────────────────────────

    fn tag_find_by_title(&self, title: &str) -> Option<Tag> {
        Tag::find_by_title(&self.pool, title)
    }

    fn tag_count(&self) -> i64 {
        Tag::count(&self.pool)
    }
}

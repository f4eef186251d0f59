#![cfg(test)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rocket::http::Status;
use rocket::local::blocking::Client;

use crate::bootstrap::{mock_range, Bootstrapper, SeedError, MOCK_TITLE_PREFIX, WELCOME_TITLE};
use crate::config::AppConfig;
use crate::db::{self, DbPool};
use crate::models::article::{ArticleForm, EditorType};
use crate::models::option::{
    OptionCategory, StatOption, ID_STATISTIC_ARTICLE_COUNT, ID_STATISTIC_CMT_COUNT,
    ID_STATISTIC_MEMBER_COUNT, ID_STATISTIC_TAG_COUNT, STATISTIC_IDS,
};
use crate::models::tag::split_tags;
use crate::models::user::{Role, UserStatus};
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fresh, empty in-memory SQLite pool. Named shared-cache so every pooled
/// connection sees the same data. No tables are created here.
fn test_pool() -> DbPool {
    let id = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let uri = format!("file:forumseed_test_{}?mode=memory&cache=shared", id);
    let manager = SqliteConnectionManager::file(uri);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    }
    pool
}

/// Defaults with a fast bcrypt cost (4 instead of DEFAULT_COST=12).
fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.bootstrap.bcrypt_cost = 4;
    config
}

fn test_store(pool: &DbPool) -> Arc<dyn Store> {
    Arc::new(SqliteStore::new(pool.clone()).with_bcrypt_cost(4))
}

fn counter(store: &Arc<dyn Store>, id: &str) -> u64 {
    store.option_get(id).map(|o| o.value_u64()).unwrap_or(0)
}

/// Tables, counters and accounts, but no welcome article.
fn seeded_without_welcome(config: &AppConfig) -> (Arc<dyn Store>, Bootstrapper) {
    let pool = test_pool();
    let store = test_store(&pool);
    let seeder = Bootstrapper::new(store.clone(), config);
    seeder.init_tables().unwrap();
    seeder.seed_counters().unwrap();
    seeder.provision_accounts().unwrap();
    (store, seeder)
}

// ═══════════════════════════════════════════════════════════
// Schema
// ═══════════════════════════════════════════════════════════

#[test]
fn create_all_tables_reports_every_table_in_order() {
    let pool = test_pool();
    let results = db::create_all_tables(&pool);
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, db::table_names());
    assert!(results.iter().all(|r| r.success && r.error.is_none()));
}

#[test]
fn create_all_tables_is_repeatable() {
    let pool = test_pool();
    db::create_all_tables(&pool);
    assert!(db::create_all_tables(&pool).iter().all(|r| r.success));
}

/// An `articles` table without `author_id` makes the index statement fail.
fn break_articles_table(pool: &DbPool) {
    let conn = pool.get().unwrap();
    conn.execute_batch("CREATE TABLE articles (id INTEGER PRIMARY KEY, title TEXT);")
        .unwrap();
}

#[test]
fn schema_failure_aborts_by_default() {
    let pool = test_pool();
    break_articles_table(&pool);
    let store = test_store(&pool);
    let seeder = Bootstrapper::new(store.clone(), &test_config());

    match seeder.run() {
        Err(SeedError::Schema { failed }) => assert_eq!(failed, vec!["articles".to_string()]),
        other => panic!("expected schema failure, got {:?}", other),
    }
    assert_eq!(store.option_count(), 0);
    assert_eq!(store.user_count(), 0);
}

#[test]
fn schema_failure_best_effort_continues() {
    let pool = test_pool();
    break_articles_table(&pool);
    let store = test_store(&pool);
    let mut config = test_config();
    config.schema.best_effort = true;
    let seeder = Bootstrapper::new(store.clone(), &config);

    let results = seeder.init_tables().unwrap();
    let articles = results.iter().find(|r| r.name == "articles").unwrap();
    assert!(!articles.success);
    assert!(articles.error.is_some());
    assert!(results.iter().filter(|r| r.name != "articles").all(|r| r.success));

    assert_eq!(seeder.seed_counters().unwrap(), 5);
}

// ═══════════════════════════════════════════════════════════
// Counters
// ═══════════════════════════════════════════════════════════

#[test]
fn seed_counters_inserts_five_zero_statistics() {
    let pool = test_pool();
    let store = test_store(&pool);
    let seeder = Bootstrapper::new(store.clone(), &test_config());
    seeder.init_tables().unwrap();

    assert_eq!(seeder.seed_counters().unwrap(), 5);
    assert_eq!(store.option_count(), 5);
    for id in STATISTIC_IDS {
        let opt = store.option_get(id).unwrap();
        assert_eq!(opt.value, "0");
        assert_eq!(opt.category, OptionCategory::Statistic);
    }
    assert_eq!(store.option_list_by_category(OptionCategory::Statistic).len(), 5);
}

#[test]
fn seed_counters_twice_fails_without_duplicates() {
    let pool = test_pool();
    let store = test_store(&pool);
    let seeder = Bootstrapper::new(store.clone(), &test_config());
    seeder.init_tables().unwrap();
    seeder.seed_counters().unwrap();

    assert!(matches!(seeder.seed_counters(), Err(SeedError::Transaction(_))));
    assert_eq!(store.option_count(), 5);
}

#[test]
fn seed_counters_rolls_back_when_third_insert_fails() {
    let pool = test_pool();
    let store = test_store(&pool);
    let seeder = Bootstrapper::new(store.clone(), &test_config());
    seeder.init_tables().unwrap();
    assert_eq!(STATISTIC_IDS[2], ID_STATISTIC_ARTICLE_COUNT);
    {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO options (id, value, category) VALUES (?1, '7', 'statistic')",
            rusqlite::params![ID_STATISTIC_ARTICLE_COUNT],
        )
        .unwrap();
    }

    let err = seeder.seed_counters().unwrap_err();
    assert!(err.to_string().contains(ID_STATISTIC_ARTICLE_COUNT));

    // Only the pre-existing row; the two inserted before the failure are gone.
    assert_eq!(store.option_count(), 1);
    assert!(store.option_get(ID_STATISTIC_MEMBER_COUNT).is_none());
    assert!(store.option_get(ID_STATISTIC_CMT_COUNT).is_none());
    assert_eq!(store.option_get(ID_STATISTIC_ARTICLE_COUNT).unwrap().value, "7");
}

#[test]
fn seed_counters_skip_existing_is_noop_on_repeat() {
    let pool = test_pool();
    let store = test_store(&pool);
    let mut config = test_config();
    config.bootstrap.skip_existing = true;
    let seeder = Bootstrapper::new(store.clone(), &config);
    seeder.init_tables().unwrap();

    assert_eq!(seeder.seed_counters().unwrap(), 5);
    assert_eq!(seeder.seed_counters().unwrap(), 0);
    assert_eq!(store.option_count(), 5);
}

// ═══════════════════════════════════════════════════════════
// Accounts
// ═══════════════════════════════════════════════════════════

#[test]
fn provision_accounts_creates_admin_and_default_commenter() {
    let config = test_config();
    let (store, _) = seeded_without_welcome(&config);

    let admin = store.user_get_admin().unwrap();
    assert_eq!(admin.email, config.bootstrap.admin_email);
    assert_eq!(admin.display_name, config.bootstrap.admin_name);
    assert_eq!(admin.role, Role::Admin);
    assert!(admin.can_login());
    assert_ne!(admin.password_hash, config.bootstrap.admin_password);
    assert!(bcrypt::verify(&config.bootstrap.admin_password, &admin.password_hash).unwrap());

    let commenter = store.user_get_by_email(&config.bootstrap.commenter_email).unwrap();
    assert_eq!(commenter.role, Role::DefaultCommenter);
    assert_eq!(commenter.status, UserStatus::NoLogin);
    assert!(!commenter.can_login());
    assert_ne!(commenter.email, admin.email);

    assert_eq!(store.user_get_by_id(commenter.id).unwrap().email, commenter.email);
    assert_eq!(store.user_count_by_role(Role::Admin), 1);
    assert_eq!(store.user_count_by_role(Role::DefaultCommenter), 1);
    assert_eq!(counter(&store, ID_STATISTIC_MEMBER_COUNT), 2);
}

#[test]
fn provision_accounts_twice_fails() {
    let config = test_config();
    let (store, seeder) = seeded_without_welcome(&config);

    match seeder.provision_accounts() {
        Err(SeedError::Provisioning { email, .. }) => assert_eq!(email, config.bootstrap.admin_email),
        other => panic!("expected provisioning failure, got {:?}", other),
    }
    assert_eq!(store.user_count(), 2);
    assert_eq!(counter(&store, ID_STATISTIC_MEMBER_COUNT), 2);
}

#[test]
fn provision_accounts_rejects_invalid_email() {
    let pool = test_pool();
    let store = test_store(&pool);
    let mut config = test_config();
    config.bootstrap.admin_email = "not-an-email".to_string();
    let seeder = Bootstrapper::new(store.clone(), &config);
    seeder.init_tables().unwrap();
    seeder.seed_counters().unwrap();

    assert!(matches!(seeder.provision_accounts(), Err(SeedError::Provisioning { .. })));
    assert_eq!(store.user_count(), 0);
    assert_eq!(counter(&store, ID_STATISTIC_MEMBER_COUNT), 0);
}

#[test]
fn provision_accounts_skip_existing_reuses_accounts() {
    let mut config = test_config();
    config.bootstrap.skip_existing = true;
    let (store, seeder) = seeded_without_welcome(&config);
    let admin_id = store.user_get_admin().unwrap().id;

    let again = seeder.provision_accounts().unwrap();
    assert_eq!(again.admin_id, admin_id);
    assert_eq!(store.user_count(), 2);
}

// ═══════════════════════════════════════════════════════════
// Welcome article
// ═══════════════════════════════════════════════════════════

#[test]
fn welcome_article_is_attributed_to_admin() {
    let config = test_config();
    let (store, seeder) = seeded_without_welcome(&config);

    let id = seeder.create_welcome_article().unwrap();
    let article = store.article_find_by_id(id).unwrap();
    let admin = store.user_get_admin().unwrap();
    assert_eq!(article.title, WELCOME_TITLE);
    assert_eq!(article.author_id, admin.id);
    assert_eq!(article.author_email, admin.email);
    assert_eq!(article.editor_type, EditorType::Markdown);

    assert_eq!(counter(&store, ID_STATISTIC_ARTICLE_COUNT), 1);
    let tags = split_tags(&article.tags);
    assert_eq!(tags.len(), 4);
    assert_eq!(store.tag_count(), 4);
    assert_eq!(counter(&store, ID_STATISTIC_TAG_COUNT), 4);
    assert_eq!(store.tag_find_by_title("q&a").unwrap().reference_count, 1);
}

#[test]
fn welcome_article_requires_admin() {
    let pool = test_pool();
    let store = test_store(&pool);
    let seeder = Bootstrapper::new(store.clone(), &test_config());
    seeder.init_tables().unwrap();
    seeder.seed_counters().unwrap();

    assert!(matches!(seeder.create_welcome_article(), Err(SeedError::MissingAdmin)));
    assert_eq!(store.article_count(), 0);
}

#[test]
fn article_create_rejects_mismatched_author_email() {
    let config = test_config();
    let (store, _) = seeded_without_welcome(&config);
    let admin = store.user_get_admin().unwrap();

    let form = ArticleForm {
        title: "Spoofed".to_string(),
        tags: "Forum".to_string(),
        content: "body".to_string(),
        editor_type: EditorType::Markdown,
        author_id: admin.id,
        author_email: config.bootstrap.commenter_email.clone(),
    };
    assert!(store.article_create(&form).is_err());
    assert_eq!(store.article_count(), 0);
    assert_eq!(counter(&store, ID_STATISTIC_ARTICLE_COUNT), 0);
}

// ═══════════════════════════════════════════════════════════
// Full bootstrap
// ═══════════════════════════════════════════════════════════

#[test]
fn bootstrap_run_seeds_everything() {
    let pool = test_pool();
    let store = test_store(&pool);
    let seeder = Bootstrapper::new(store.clone(), &test_config());

    let report = seeder.run().unwrap();
    assert_eq!(report.tables.len(), db::table_names().len());
    assert_eq!(report.counters_inserted, 5);
    assert_ne!(report.accounts.admin_id, report.accounts.commenter_id);

    assert_eq!(store.option_count(), 5);
    assert_eq!(store.user_count(), 2);
    assert_eq!(store.article_count(), 1);
    let welcome = store.article_find_by_id(report.welcome_article_id).unwrap();
    assert_eq!(welcome.author_id, report.accounts.admin_id);
}

#[test]
fn bootstrap_rerun_fails_cleanly() {
    let pool = test_pool();
    let store = test_store(&pool);
    let seeder = Bootstrapper::new(store.clone(), &test_config());
    seeder.run().unwrap();

    assert!(matches!(seeder.run(), Err(SeedError::Transaction(_))));
    assert_eq!(store.option_count(), 5);
    assert_eq!(store.user_count(), 2);
    assert_eq!(store.article_count(), 1);
}

#[test]
fn bootstrap_rerun_with_skip_existing_is_noop() {
    let pool = test_pool();
    let store = test_store(&pool);
    let mut config = test_config();
    config.bootstrap.skip_existing = true;
    let seeder = Bootstrapper::new(store.clone(), &config);

    let first = seeder.run().unwrap();
    let second = seeder.run().unwrap();
    assert_eq!(second.counters_inserted, 0);
    assert_eq!(second.welcome_article_id, first.welcome_article_id);
    assert_eq!(store.option_count(), 5);
    assert_eq!(store.user_count(), 2);
    assert_eq!(store.article_count(), 1);
    assert_eq!(counter(&store, ID_STATISTIC_ARTICLE_COUNT), 1);
}

// ═══════════════════════════════════════════════════════════
// Mock articles
// ═══════════════════════════════════════════════════════════

#[test]
fn mock_range_is_inclusive() {
    assert_eq!(mock_range(0, 49), (1, 50));
    assert_eq!(mock_range(7, 0), (8, 8));
}

#[test]
fn mock_generation_from_zero_creates_fifty_articles() {
    let config = test_config();
    let (store, seeder) = seeded_without_welcome(&config);
    let admin = store.user_get_admin().unwrap();

    let batch = seeder.generate_mock_articles().unwrap();
    assert_eq!((batch.first_index, batch.last_index), (1, 50));
    assert_eq!(batch.inserted(), 50);
    assert!(batch.failed_index.is_none());

    let articles = store.article_list(100, 0);
    assert_eq!(articles.len(), 50);
    for (n, article) in articles.iter().enumerate() {
        assert_eq!(article.title, format!("{} ({})", MOCK_TITLE_PREFIX, n + 1));
        assert!(article.tags.ends_with(&format!(", {}", n + 1)));
        assert_eq!(article.author_id, admin.id);
        assert_eq!(article.author_email, admin.email);
    }
    assert_eq!(counter(&store, ID_STATISTIC_ARTICLE_COUNT), 50);
}

#[test]
fn mock_generation_continues_numbering() {
    let pool = test_pool();
    let store = test_store(&pool);
    let mut config = test_config();
    config.mock.batch_span = 4;
    let seeder = Bootstrapper::new(store.clone(), &config);
    seeder.run().unwrap();

    let first = seeder.generate_mock_articles().unwrap();
    assert_eq!((first.first_index, first.last_index), (2, 6));
    let second = seeder.generate_mock_articles().unwrap();
    assert_eq!((second.first_index, second.last_index), (7, 11));

    assert_eq!(store.article_count(), 11);
    assert_eq!(counter(&store, ID_STATISTIC_ARTICLE_COUNT), 11);
    let last = store.article_list(1, 10).pop().unwrap();
    assert_eq!(last.title, format!("{} (11)", MOCK_TITLE_PREFIX));
    assert_eq!(counter(&store, ID_STATISTIC_TAG_COUNT) as i64, store.tag_count());
}

#[test]
fn mock_generation_stops_at_first_failure_and_reports_progress() {
    let mut config = test_config();
    config.mock.batch_span = 4;
    let (store, seeder) = seeded_without_welcome(&config);
    let admin = store.user_get_admin().unwrap();

    // Occupies the slug of index 4; the counter moves to 1 so the run covers 2..=6.
    store
        .article_create(&ArticleForm {
            title: format!("{} (4)", MOCK_TITLE_PREFIX),
            tags: "Forum".to_string(),
            content: "already here".to_string(),
            editor_type: EditorType::Markdown,
            author_id: admin.id,
            author_email: admin.email.clone(),
        })
        .unwrap();

    match seeder.generate_mock_articles() {
        Err(SeedError::PartialBatch { batch, .. }) => {
            assert_eq!((batch.first_index, batch.last_index), (2, 6));
            assert_eq!(batch.inserted(), 2);
            assert_eq!(batch.failed_index, Some(4));
        }
        other => panic!("expected partial batch, got {:?}", other),
    }
    assert_eq!(store.article_count(), 3);
    assert_eq!(counter(&store, ID_STATISTIC_ARTICLE_COUNT), 3);
}

#[test]
fn mock_generation_requires_article_counter() {
    let pool = test_pool();
    let store = test_store(&pool);
    let seeder = Bootstrapper::new(store.clone(), &test_config());
    seeder.init_tables().unwrap();
    seeder.provision_accounts().unwrap();

    assert!(matches!(
        seeder.generate_mock_articles(),
        Err(SeedError::MissingCounter(ID_STATISTIC_ARTICLE_COUNT))
    ));
    assert_eq!(store.article_count(), 0);
}

// ═══════════════════════════════════════════════════════════
// Config
// ═══════════════════════════════════════════════════════════

#[test]
fn config_parse_fills_defaults() {
    let config = AppConfig::parse("[mock]\nbatch_span = 9\n\n[schema]\nbest_effort = true\n").unwrap();
    assert_eq!(config.mock.batch_span, 9);
    assert!(config.schema.best_effort);
    assert!(config.dev.enabled);
    assert!(!config.bootstrap.skip_existing);
    assert_eq!(config.database.pool_size, 10);
    assert_eq!(config.bootstrap.admin_email, "admin@forum.local");

    let empty = AppConfig::parse("").unwrap();
    assert_eq!(empty.mock.batch_span, 49);
    assert_eq!(empty.bootstrap.bcrypt_cost, bcrypt::DEFAULT_COST);
}

#[test]
fn config_parse_rejects_bad_types() {
    assert!(AppConfig::parse("[mock]\nbatch_span = \"many\"\n").is_err());
}

#[test]
fn stat_option_value_reads_as_count() {
    let mut opt = StatOption::zero_counter(ID_STATISTIC_TAG_COUNT);
    assert_eq!(opt.value_u64(), 0);
    opt.value = "42".to_string();
    assert_eq!(opt.value_u64(), 42);
    opt.value = "garbage".to_string();
    assert_eq!(opt.value_u64(), 0);
}

// ═══════════════════════════════════════════════════════════
// HTTP entry points
// ═══════════════════════════════════════════════════════════

fn test_client(config: AppConfig) -> (Client, Arc<dyn Store>) {
    let pool = test_pool();
    let store = test_store(&pool);
    let client = Client::tracked(crate::build_rocket(config, store.clone()))
        .expect("valid rocket instance");
    (client, store)
}

#[test]
fn gen_tables_redirects_home_then_fails_on_repeat() {
    let (client, store) = test_client(test_config());

    let response = client.get("/dev/db/table/gen").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(response.headers().get_one("Location"), Some("/"));
    assert_eq!(store.option_count(), 5);
    assert_eq!(store.user_count(), 2);
    assert_eq!(store.article_count(), 1);

    let response = client.get("/dev/db/table/gen").dispatch();
    assert_eq!(response.status(), Status::InternalServerError);
    assert_eq!(store.option_count(), 5);
}

#[test]
fn gen_articles_appends_batch() {
    let (client, store) = test_client(test_config());
    client.get("/dev/db/table/gen").dispatch();

    let response = client.get("/dev/article/gen").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(response.headers().get_one("Location"), Some("/"));
    assert_eq!(store.article_count(), 51);

    let home = client.get("/").dispatch();
    assert_eq!(home.status(), Status::Ok);
    let body = home.into_string().unwrap();
    assert!(body.contains(&format!("{} (51)", MOCK_TITLE_PREFIX)));
}

#[test]
fn gen_articles_before_bootstrap_is_opaque_failure() {
    let (client, _) = test_client(test_config());
    let response = client.get("/dev/article/gen").dispatch();
    assert_eq!(response.status(), Status::InternalServerError);
}

#[test]
fn dev_routes_only_accept_get() {
    let (client, store) = test_client(test_config());
    let response = client.post("/dev/db/table/gen").dispatch();
    assert_ne!(response.status(), Status::SeeOther);
    assert!(response.status().code >= 400);
    assert_eq!(store.option_count(), 0);
}

#[test]
fn dev_routes_unmounted_when_disabled() {
    let mut config = test_config();
    config.dev.enabled = false;
    let (client, _) = test_client(config);
    let response = client.get("/dev/db/table/gen").dispatch();
    assert_eq!(response.status(), Status::NotFound);
}

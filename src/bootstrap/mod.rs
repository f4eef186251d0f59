//! One-shot initialization of a fresh forum store and repeatable mock content.
//!
//! `Bootstrapper::run` is the full pipeline: tables, statistic counters,
//! administrator and default-commenter accounts, welcome article. Every step is
//! a plain sequential call against the injected `Store`; the first failure ends
//! the run. `Bootstrapper::generate_mock_articles` appends a numbered batch.

use std::fmt;
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::config::{AppConfig, BootstrapConfig, MockConfig, SchemaConfig};
use crate::db::CreateTableResult;
use crate::store::Store;

mod accounts;
mod content;
mod counters;
mod schema;

pub use accounts::ProvisionedAccounts;
pub use content::{mock_range, MockBatch, MOCK_TITLE_PREFIX, WELCOME_TITLE};

#[derive(Debug)]
pub enum SeedError {
    /// One or more tables could not be created.
    Schema { failed: Vec<String> },
    /// The counter transaction failed and was rolled back.
    Transaction(String),
    Provisioning { email: String, reason: String },
    Content(String),
    MissingAdmin,
    MissingCounter(&'static str),
    /// A mock batch stopped early; `batch` records what was inserted.
    PartialBatch { batch: MockBatch, reason: String },
}

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema { failed } => write!(f, "failed to create tables: {}", failed.join(", ")),
            Self::Transaction(e) => write!(f, "counter seeding rolled back: {}", e),
            Self::Provisioning { email, reason } => {
                write!(f, "failed to provision account {}: {}", email, reason)
            }
            Self::Content(e) => write!(f, "failed to create article: {}", e),
            Self::MissingAdmin => write!(f, "no administrator account exists"),
            Self::MissingCounter(id) => write!(f, "statistic counter {} does not exist", id),
            Self::PartialBatch { batch, reason } => write!(
                f,
                "mock batch {}..={} stopped at {} after {} article(s): {}",
                batch.first_index,
                batch.last_index,
                batch
                    .failed_index
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                batch.inserted(),
                reason
            ),
        }
    }
}

impl std::error::Error for SeedError {}

#[derive(Debug, Serialize)]
pub struct BootstrapReport {
    pub tables: Vec<CreateTableResult>,
    pub counters_inserted: usize,
    pub accounts: ProvisionedAccounts,
    pub welcome_article_id: i64,
}

pub struct Bootstrapper {
    store: Arc<dyn Store>,
    schema: SchemaConfig,
    settings: BootstrapConfig,
    mock: MockConfig,
}

impl Bootstrapper {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        Bootstrapper {
            store,
            schema: config.schema.clone(),
            settings: config.bootstrap.clone(),
            mock: config.mock.clone(),
        }
    }

    /// Tables, counters, accounts, welcome article, in that order.
    pub fn run(&self) -> Result<BootstrapReport, SeedError> {
        let tables = self.init_tables()?;
        let counters_inserted = self.seed_counters()?;
        let accounts = self.provision_accounts()?;
        let welcome_article_id = self.create_welcome_article()?;

        info!(
            "Bootstrap complete: {} table(s), {} counter(s), admin #{}, commenter #{}, welcome article #{}",
            tables.len(),
            counters_inserted,
            accounts.admin_id,
            accounts.commenter_id,
            welcome_article_id
        );

        Ok(BootstrapReport {
            tables,
            counters_inserted,
            accounts,
            welcome_article_id,
        })
    }
}

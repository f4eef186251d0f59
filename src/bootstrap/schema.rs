use log::{info, warn};

use super::{Bootstrapper, SeedError};
use crate::db::CreateTableResult;

impl Bootstrapper {
    /// Materialize every table and log each outcome. Unless `schema.best_effort`
    /// is set, any failed table aborts before seeding starts.
    pub fn init_tables(&self) -> Result<Vec<CreateTableResult>, SeedError> {
        info!("Database [{}], creating all tables", self.store.db_backend());

        let results = self.store.create_all_tables();
        for r in &results {
            info!("Create table result [tableName={}, isSuccess={}]", r.name, r.success);
            if let Some(ref e) = r.error {
                warn!("  table {}: {}", r.name, e);
            }
        }

        let failed: Vec<String> = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.name.clone())
            .collect();

        if !failed.is_empty() {
            if !self.schema.best_effort {
                return Err(SeedError::Schema { failed });
            }
            warn!(
                "{} table(s) failed ({}); continuing because schema.best_effort is set",
                failed.len(),
                failed.join(", ")
            );
        }

        Ok(results)
    }
}

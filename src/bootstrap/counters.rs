use log::info;

use super::{Bootstrapper, SeedError};
use crate::models::option::{StatOption, STATISTIC_IDS};

impl Bootstrapper {
    /// Insert the five statistic counters at `"0"` in one transaction.
    /// Returns how many were inserted (fewer than five only with `skip_existing`).
    pub fn seed_counters(&self) -> Result<usize, SeedError> {
        let counters: Vec<StatOption> = STATISTIC_IDS
            .iter()
            .map(|id| StatOption::zero_counter(id))
            .collect();

        let inserted = self
            .store
            .option_insert_all(&counters, self.settings.skip_existing)
            .map_err(SeedError::Transaction)?;

        info!(
            "Seeded {} of {} statistic counter(s)",
            inserted,
            counters.len()
        );
        Ok(inserted)
    }
}

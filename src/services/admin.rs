//! Admin counters.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::store::{RecordStore, Table};

/// Row counts for the admin overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCounts {
    pub total_sections: u64,
    pub total_rules: u64,
}

#[derive(Clone)]
pub struct AdminApi {
    store: Arc<dyn RecordStore>,
}

impl AdminApi {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Count sections and rules with two count-only queries.
    pub async fn get_stats(&self) -> Result<StoreCounts, AppError> {
        let (total_sections, total_rules) = futures::try_join!(
            self.store.count(Table::RuleSections),
            self.store.count(Table::Rules),
        )?;

        Ok(StoreCounts {
            total_sections,
            total_rules,
        })
    }
}

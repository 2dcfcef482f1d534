//! Rule operations.

use std::sync::Arc;

use chrono::Utc;

use crate::errors::AppError;
use crate::mapper;
use crate::models::{NewRule, Rule, RuleChanges};
use crate::store::{Filter, Order, RecordStore, Select, StoreError, Table};

/// Rules of one section, ordered by `order_index`.
pub(crate) async fn fetch_section_rules(
    store: &dyn RecordStore,
    section_id: &str,
) -> Result<Vec<Rule>, StoreError> {
    let rows = store
        .select(
            &Select::all(Table::Rules)
                .filter(Filter::eq("section_id", section_id))
                .order(Order::asc("order_index")),
        )
        .await?;
    rows.into_iter().map(mapper::rule_from_row).collect()
}

#[derive(Clone)]
pub struct RulesApi {
    store: Arc<dyn RecordStore>,
}

impl RulesApi {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// All rules across every section, ordered by `order_index`.
    pub async fn get_rules(&self) -> Result<Vec<Rule>, AppError> {
        let rows = self
            .store
            .select(&Select::all(Table::Rules).order(Order::asc("order_index")))
            .await?;
        let rules = rows
            .into_iter()
            .map(mapper::rule_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    pub async fn create_rule(&self, rule: &NewRule) -> Result<Rule, AppError> {
        let row = self
            .store
            .insert(Table::Rules, mapper::new_rule_row(rule))
            .await?;
        let created = mapper::rule_from_row(row)?;
        tracing::info!(rule_id = %created.id, section_id = %rule.section_id, "Created rule");
        Ok(created)
    }

    /// Apply the set fields of `changes`. `updated_at` is refreshed even when
    /// nothing else changes.
    pub async fn update_rule(&self, id: &str, changes: &RuleChanges) -> Result<Rule, AppError> {
        let row = self
            .store
            .update(Table::Rules, id, mapper::rule_changes_row(changes, Utc::now()))
            .await?;
        let updated = mapper::rule_from_row(row)?;
        tracing::info!(rule_id = %id, "Updated rule");
        Ok(updated)
    }

    pub async fn delete_rule(&self, id: &str) -> Result<(), AppError> {
        self.store
            .delete(Table::Rules, &Filter::eq("id", id))
            .await?;
        tracing::info!(rule_id = %id, "Deleted rule");
        Ok(())
    }
}

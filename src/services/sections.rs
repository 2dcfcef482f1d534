//! Section operations.

use std::sync::Arc;

use futures::future::try_join_all;

use super::rules::fetch_section_rules;
use crate::errors::AppError;
use crate::mapper;
use crate::models::{NewSection, RuleSection, SectionChanges};
use crate::store::{Filter, Order, RecordStore, Select, Table};

#[derive(Clone)]
pub struct SectionsApi {
    store: Arc<dyn RecordStore>,
}

impl SectionsApi {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// All sections ordered by `order_index`, each with its rules attached.
    ///
    /// Rules are fetched per section concurrently. Any failed fetch fails
    /// the whole call; partial results are never returned.
    pub async fn get_sections(&self) -> Result<Vec<RuleSection>, AppError> {
        let rows = self
            .store
            .select(&Select::all(Table::RuleSections).order(Order::asc("order_index")))
            .await?;
        let mut sections = rows
            .into_iter()
            .map(mapper::section_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let store = self.store.as_ref();
        let rules = try_join_all(
            sections
                .iter()
                .map(|section| fetch_section_rules(store, &section.id)),
        )
        .await?;

        for (section, rules) in sections.iter_mut().zip(rules) {
            section.rules = rules;
        }

        tracing::debug!(sections = sections.len(), "Loaded sections");
        Ok(sections)
    }

    /// Insert a section under a freshly generated id.
    pub async fn create_section(&self, section: &NewSection) -> Result<RuleSection, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let row = self
            .store
            .insert(Table::RuleSections, mapper::new_section_row(&id, section))
            .await?;
        let created = mapper::section_from_row(row)?;
        tracing::info!(section_id = %created.id, "Created section");
        Ok(created)
    }

    /// Apply a partial update.
    ///
    /// The returned section always has an empty `rules` list; callers reload
    /// sections to see rules again.
    pub async fn update_section(
        &self,
        id: &str,
        changes: &SectionChanges,
    ) -> Result<RuleSection, AppError> {
        if changes.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }

        let row = self
            .store
            .update(Table::RuleSections, id, mapper::section_changes_row(changes))
            .await?;
        let updated = mapper::section_from_row(row)?;
        tracing::info!(section_id = %id, "Updated section");
        Ok(updated)
    }

    /// Delete the section row. Rules pointing at it are left in place.
    pub async fn delete_section(&self, id: &str) -> Result<(), AppError> {
        self.store
            .delete(Table::RuleSections, &Filter::eq("id", id))
            .await?;
        tracing::info!(section_id = %id, "Deleted section");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRule, Patch};
    use crate::services::test_support::{sqlite_services, sqlite_store, FlakyStore};
    use crate::services::Services;
    use crate::store::StoreError;

    fn new_section(title: &str, order_index: Option<i32>) -> NewSection {
        NewSection {
            title: title.to_string(),
            description: None,
            icon: None,
            order_index,
        }
    }

    async fn add_rule(services: &Services, section_id: &str, title: &str, order_index: i32) {
        services
            .rules
            .create_rule(&NewRule {
                section_id: section_id.to_string(),
                title: title.to_string(),
                content: String::new(),
                order_index: Some(order_index),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_section_round_trip() {
        let (services, _dir) = sqlite_services().await;

        let created = services
            .sections
            .create_section(&NewSection {
                title: "Generale".to_string(),
                description: Some("Regole base".to_string()),
                icon: Some("Shield".to_string()),
                order_index: Some(2),
            })
            .await
            .unwrap();

        assert!(uuid::Uuid::parse_str(&created.id).is_ok());
        assert_eq!(created.title, "Generale");
        assert_eq!(created.description.as_deref(), Some("Regole base"));
        assert_eq!(created.icon.as_deref(), Some("Shield"));
        assert_eq!(created.order_index, 2);
        assert!(created.rules.is_empty());

        let defaulted = services
            .sections
            .create_section(&new_section("Vuota", None))
            .await
            .unwrap();
        assert_eq!(defaulted.order_index, 0);
        assert_eq!(defaulted.description, None);
        assert_eq!(defaulted.icon, None);
    }

    #[tokio::test]
    async fn test_get_sections_orders_sections_and_rules() {
        let (services, _dir) = sqlite_services().await;

        let late = services
            .sections
            .create_section(&new_section("Late", Some(5)))
            .await
            .unwrap();
        let early = services
            .sections
            .create_section(&new_section("Early", Some(1)))
            .await
            .unwrap();

        add_rule(&services, &early.id, "tie-a", 2).await;
        add_rule(&services, &early.id, "first", 0).await;
        add_rule(&services, &early.id, "tie-b", 2).await;

        let sections = services.sections.get_sections().await.unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].id, early.id);
        assert_eq!(sections[1].id, late.id);

        let titles: Vec<_> = sections[0].rules.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "tie-a", "tie-b"]);
        assert!(sections[1].rules.is_empty());
    }

    #[tokio::test]
    async fn test_get_sections_fails_when_any_rule_fetch_fails() {
        let (inner, _dir) = sqlite_store().await;
        let seed = Services::new(inner.clone());
        let section = seed
            .sections
            .create_section(&new_section("Generale", None))
            .await
            .unwrap();
        add_rule(&seed, &section.id, "rule", 0).await;

        let mut flaky = FlakyStore::new(inner);
        flaky.fail_filtered_select_on = Some(Table::Rules);
        let services = Services::new(Arc::new(flaky));

        let err = services.sections.get_sections().await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Service { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_update_section_empty_changes_rejected_without_write() {
        let (inner, _dir) = sqlite_store().await;
        let flaky = Arc::new(FlakyStore::new(inner));
        let services = Services::new(flaky.clone());

        let err = services
            .sections
            .update_section("any", &SectionChanges::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(flaky.writes(), 0);
    }

    #[tokio::test]
    async fn test_update_section_partial_and_rules_reset() {
        let (services, _dir) = sqlite_services().await;
        let section = services
            .sections
            .create_section(&NewSection {
                title: "Generale".to_string(),
                description: Some("desc".to_string()),
                icon: Some("Users".to_string()),
                order_index: Some(3),
            })
            .await
            .unwrap();
        add_rule(&services, &section.id, "rule", 0).await;

        let changes = SectionChanges {
            title: Patch::Set("Regole Generali".to_string()),
            icon: Patch::Set(None),
            ..Default::default()
        };
        let updated = services
            .sections
            .update_section(&section.id, &changes)
            .await
            .unwrap();

        assert_eq!(updated.title, "Regole Generali");
        assert_eq!(updated.description.as_deref(), Some("desc"));
        assert_eq!(updated.icon, None);
        assert_eq!(updated.order_index, 3);
        assert!(updated.rules.is_empty());

        let reloaded = services.sections.get_sections().await.unwrap();
        assert_eq!(reloaded[0].rules.len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_section_fails() {
        let (services, _dir) = sqlite_services().await;
        let changes = SectionChanges {
            title: Patch::Set("x".to_string()),
            ..Default::default()
        };

        let err = services
            .sections
            .update_section("missing", &changes)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_section_leaves_orphaned_rules() {
        let (services, _dir) = sqlite_services().await;
        let section = services
            .sections
            .create_section(&new_section("Temporanea", None))
            .await
            .unwrap();
        add_rule(&services, &section.id, "orphan", 0).await;

        services.sections.delete_section(&section.id).await.unwrap();

        assert!(services.sections.get_sections().await.unwrap().is_empty());
        let rules = services.rules.get_rules().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].title, "orphan");
    }
}

//! Section management flow for the admin area.
//!
//! The list is always reloaded from the store after a successful mutation;
//! nothing is patched locally.

use crate::models::{NewSection, Patch, RuleSection, SectionChanges};
use crate::services::SectionsApi;

/// Loading state of the section list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Idle,
    Loading,
    Loaded(Vec<RuleSection>),
    Error(String),
}

/// What the create/edit modal is working on.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorTarget {
    Create,
    Edit(RuleSection),
}

/// Fields submitted from the section modal.
#[derive(Debug, Clone, Default)]
pub struct SectionForm {
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

pub struct SectionsManager {
    api: SectionsApi,
    state: ListState,
    editor: Option<EditorTarget>,
    pending_delete: Option<RuleSection>,
    notice: Option<String>,
}

impl SectionsManager {
    pub fn new(api: SectionsApi) -> Self {
        Self {
            api,
            state: ListState::Idle,
            editor: None,
            pending_delete: None,
            notice: None,
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// Loaded sections, empty unless the list is in the `Loaded` state.
    pub fn sections(&self) -> &[RuleSection] {
        match &self.state {
            ListState::Loaded(sections) => sections,
            _ => &[],
        }
    }

    pub fn editor(&self) -> Option<&EditorTarget> {
        self.editor.as_ref()
    }

    pub fn pending_delete(&self) -> Option<&RuleSection> {
        self.pending_delete.as_ref()
    }

    /// Last failure message from a save or delete.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub async fn mount(&mut self) {
        self.refresh().await;
    }

    pub async fn refresh(&mut self) {
        self.state = ListState::Loading;
        self.state = match self.api.get_sections().await {
            Ok(sections) => ListState::Loaded(sections),
            Err(err) => {
                tracing::error!("Failed to load sections: {}", err);
                ListState::Error("Failed to load sections".to_string())
            }
        };
    }

    pub fn open_create(&mut self) {
        self.editor = Some(EditorTarget::Create);
    }

    pub fn open_edit(&mut self, section: RuleSection) {
        self.editor = Some(EditorTarget::Edit(section));
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    pub fn open_delete(&mut self, section: RuleSection) {
        self.pending_delete = Some(section);
    }

    pub fn close_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Submit the editor. Returns whether the section was stored.
    ///
    /// On failure the editor stays open and a notice is recorded.
    pub async fn save(&mut self, form: SectionForm) -> bool {
        let Some(target) = self.editor.as_ref() else {
            return false;
        };

        let result = match target {
            EditorTarget::Edit(section) => {
                let changes = SectionChanges {
                    title: form.title.into(),
                    description: form.description.into(),
                    icon: form.icon.into(),
                    order_index: Patch::Keep,
                };
                self.api.update_section(&section.id, &changes).await
            }
            EditorTarget::Create => {
                let section = NewSection {
                    title: form.title,
                    description: form.description,
                    icon: form.icon,
                    order_index: None,
                };
                self.api.create_section(&section).await
            }
        };

        match result {
            Ok(_) => {
                self.notice = None;
                self.editor = None;
                self.refresh().await;
                true
            }
            Err(err) => {
                tracing::error!("Failed to save section: {}", err);
                self.notice = Some("Failed to save section".to_string());
                false
            }
        }
    }

    /// Delete the section awaiting confirmation. Returns whether it was removed.
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(section) = self.pending_delete.as_ref() else {
            return false;
        };

        let result = self.api.delete_section(&section.id).await;
        match result {
            Ok(()) => {
                self.notice = None;
                self.pending_delete = None;
                self.refresh().await;
                true
            }
            Err(err) => {
                tracing::error!("Failed to delete section: {}", err);
                self.notice = Some("Failed to delete section".to_string());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{sqlite_services, sqlite_store, FlakyStore};
    use crate::services::Services;
    use crate::store::Table;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mount_loads_sections() {
        let (services, _dir) = sqlite_services().await;
        let mut manager = SectionsManager::new(services.sections.clone());
        assert_eq!(manager.state(), &ListState::Idle);

        manager.mount().await;
        assert_eq!(manager.state(), &ListState::Loaded(vec![]));
    }

    #[tokio::test]
    async fn test_mount_failure_sets_error() {
        let (inner, _dir) = sqlite_store().await;
        Services::new(inner.clone())
            .sections
            .create_section(&NewSection {
                title: "Generale".to_string(),
                description: None,
                icon: None,
                order_index: None,
            })
            .await
            .unwrap();

        let mut flaky = FlakyStore::new(inner);
        flaky.fail_filtered_select_on = Some(Table::Rules);
        let services = Services::new(Arc::new(flaky));
        let mut manager = SectionsManager::new(services.sections);

        manager.mount().await;
        assert!(matches!(manager.state(), ListState::Error(_)));
        assert!(manager.sections().is_empty());
    }

    #[tokio::test]
    async fn test_create_then_edit_then_delete() {
        let (services, _dir) = sqlite_services().await;
        let mut manager = SectionsManager::new(services.sections.clone());
        manager.mount().await;

        manager.open_create();
        let saved = manager
            .save(SectionForm {
                title: "Generale".to_string(),
                description: Some("Regole base".to_string()),
                icon: Some("Shield".to_string()),
            })
            .await;
        assert!(saved);
        assert!(manager.editor().is_none());
        assert_eq!(manager.sections().len(), 1);

        let section = manager.sections()[0].clone();
        manager.open_edit(section.clone());
        assert!(
            manager
                .save(SectionForm {
                    title: "Regole Generali".to_string(),
                    description: None,
                    icon: Some("Users".to_string()),
                })
                .await
        );
        let edited = &manager.sections()[0];
        assert_eq!(edited.id, section.id);
        assert_eq!(edited.title, "Regole Generali");
        assert_eq!(edited.description, None);

        manager.open_delete(edited.clone());
        assert!(manager.confirm_delete().await);
        assert!(manager.pending_delete().is_none());
        assert_eq!(manager.state(), &ListState::Loaded(vec![]));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_editor_open() {
        let (services, _dir) = sqlite_services().await;
        let mut manager = SectionsManager::new(services.sections.clone());
        manager.mount().await;

        let ghost = RuleSection {
            id: "ghost".to_string(),
            title: "Ghost".to_string(),
            description: None,
            icon: None,
            order_index: 0,
            rules: vec![],
        };
        manager.open_edit(ghost);

        let saved = manager
            .save(SectionForm {
                title: "Still ghost".to_string(),
                ..Default::default()
            })
            .await;
        assert!(!saved);
        assert!(manager.editor().is_some());
        assert_eq!(manager.notice(), Some("Failed to save section"));
    }

    #[tokio::test]
    async fn test_save_without_editor_is_noop() {
        let (services, _dir) = sqlite_services().await;
        let mut manager = SectionsManager::new(services.sections.clone());

        assert!(!manager.save(SectionForm::default()).await);
        assert!(!manager.confirm_delete().await);
        assert_eq!(manager.state(), &ListState::Idle);
    }
}

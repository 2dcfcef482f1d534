//! Rule section model.

use serde::{Deserialize, Serialize};

use super::{Patch, Rule};

/// Presentational glyph a section icon resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Glyph {
    Palmtree,
    Users,
    AlertTriangle,
}

impl Glyph {
    /// Resolve a symbolic icon name. Unknown or missing names fall back to
    /// [`Glyph::Palmtree`].
    pub fn resolve(icon: Option<&str>) -> Self {
        match icon {
            Some("Users") => Glyph::Users,
            Some("AlertTriangle") => Glyph::AlertTriangle,
            Some("Shield") | Some("Heart") => Glyph::Palmtree,
            _ => Glyph::Palmtree,
        }
    }
}

/// A named group of rules with its own display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSection {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub order_index: i32,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleSection {
    pub fn glyph(&self) -> Glyph {
        Glyph::resolve(self.icon.as_deref())
    }
}

/// Request body for creating a section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSection {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub order_index: Option<i32>,
}

/// Request body for a partial section update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionChanges {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<Option<String>>,
    #[serde(default)]
    pub icon: Patch<Option<String>>,
    #[serde(default)]
    pub order_index: Patch<i32>,
}

impl SectionChanges {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_keep()
            && self.description.is_keep()
            && self.icon.is_keep()
            && self.order_index.is_keep()
    }
}

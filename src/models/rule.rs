//! Rule model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Patch;

/// A single titled rule inside a section.
///
/// The owning section is tracked by the store row, not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub title: String,
    pub content: String,
    pub order_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request body for creating a rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    pub section_id: String,
    pub title: String,
    pub content: String,
    /// Defaults to 0 when omitted.
    #[serde(default)]
    pub order_index: Option<i32>,
}

/// Request body for a partial rule update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleChanges {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub content: Patch<String>,
    #[serde(default)]
    pub order_index: Patch<i32>,
    /// Moves the rule to another section.
    #[serde(default)]
    pub section_id: Patch<String>,
}

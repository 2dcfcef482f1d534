//! Dashboard figures derived from the loaded sections.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Glyph, RuleSection};

/// Share of all rules held by one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionShare {
    pub id: String,
    pub title: String,
    pub glyph: Glyph,
    pub rule_count: usize,
    /// Percentage of all rules, 0.0 when there are no rules at all.
    pub percentage: f64,
}

/// Admin dashboard summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_rules: usize,
    pub total_sections: usize,
    pub average_rules_per_section: u64,
    pub last_updated: Option<DateTime<Utc>>,
    pub sections: Vec<SectionShare>,
}

impl DashboardStats {
    pub fn from_sections(sections: &[RuleSection]) -> Self {
        let total_rules: usize = sections.iter().map(|s| s.rules.len()).sum();
        let total_sections = sections.len();

        let average_rules_per_section = if total_sections == 0 {
            0
        } else {
            (total_rules as f64 / total_sections as f64).round() as u64
        };

        let shares = sections
            .iter()
            .map(|section| SectionShare {
                id: section.id.clone(),
                title: section.title.clone(),
                glyph: section.glyph(),
                rule_count: section.rules.len(),
                percentage: percentage(section.rules.len(), total_rules),
            })
            .collect();

        let last_updated = sections
            .iter()
            .flat_map(|s| s.rules.iter())
            .filter_map(|r| r.updated_at)
            .max();

        Self {
            total_rules,
            total_sections,
            average_rules_per_section,
            last_updated,
            sections: shares,
        }
    }

    /// The last update as RFC 3339, or `"never"`.
    pub fn last_updated_label(&self) -> String {
        match self.last_updated {
            Some(ts) => ts.to_rfc3339(),
            None => "never".to_string(),
        }
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

//! Translation between store rows and domain models.
//!
//! Rows use the store's snake_case column names (`order_index`, `section_id`,
//! `created_at`, ...). Missing optional columns become `None`; nothing is
//! replaced with a placeholder. Ids are opaque: hosted tables may hand them
//! back as integers, so both strings and numbers are accepted.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::models::{
    BackupKind, BackupMeta, BackupStatus, NewRule, NewSection, Patch, Rule, RuleChanges,
    RuleSection, SectionChanges,
};
use crate::store::{Row, StoreError, Table};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// Accepts RFC 3339 timestamps, and naive ones which are taken as UTC.
fn opt_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(text) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&text) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| de::Error::custom(format!("invalid timestamp: {}", text)))
}

/// Wire shape of a `rules` row.
#[derive(Debug, Deserialize)]
pub struct RuleRow {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_opaque_id")]
    pub section_id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub order_index: Option<i32>,
    #[serde(default, deserialize_with = "opt_opaque_id")]
    pub created_by: Option<String>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Wire shape of a `rule_sections` row.
#[derive(Debug, Deserialize)]
pub struct SectionRow {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub order_index: Option<i32>,
}

/// Wire shape of a `backup_meta` row.
#[derive(Debug, Deserialize)]
pub struct BackupMetaRow {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BackupKind,
    pub status: BackupStatus,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Wire shape of a `backup_data` row.
#[derive(Debug, Deserialize)]
pub struct BackupDataRow {
    #[serde(deserialize_with = "opaque_id")]
    pub backup_id: String,
    pub data: Vec<RuleSection>,
}

impl From<RuleRow> for Rule {
    fn from(row: RuleRow) -> Self {
        Rule {
            id: row.id,
            title: row.title,
            content: row.content,
            order_index: row.order_index.unwrap_or(0),
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<SectionRow> for RuleSection {
    fn from(row: SectionRow) -> Self {
        RuleSection {
            id: row.id,
            title: row.title,
            description: row.description,
            icon: row.icon,
            order_index: row.order_index.unwrap_or(0),
            rules: Vec::new(),
        }
    }
}

impl From<BackupMetaRow> for BackupMeta {
    fn from(row: BackupMetaRow) -> Self {
        BackupMeta {
            id: row.id,
            name: row.name,
            kind: row.kind,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(table: Table, row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Decode {
        table,
        message: e.to_string(),
    })
}

pub fn rule_from_row(row: Row) -> Result<Rule, StoreError> {
    decode::<RuleRow>(Table::Rules, row).map(Rule::from)
}

/// Decode a section row. The returned section has no rules attached.
pub fn section_from_row(row: Row) -> Result<RuleSection, StoreError> {
    decode::<SectionRow>(Table::RuleSections, row).map(RuleSection::from)
}

pub fn backup_meta_from_row(row: Row) -> Result<BackupMeta, StoreError> {
    decode::<BackupMetaRow>(Table::BackupMeta, row).map(BackupMeta::from)
}

pub fn backup_data_from_row(row: Row) -> Result<BackupDataRow, StoreError> {
    decode(Table::BackupData, row)
}

fn object(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

fn put<T: Into<Value>>(row: &mut Row, column: &str, patch: Patch<T>) {
    if let Patch::Set(value) = patch {
        row.insert(column.to_string(), value.into());
    }
}

pub fn new_rule_row(rule: &NewRule) -> Row {
    object(json!({
        "section_id": rule.section_id,
        "title": rule.title,
        "content": rule.content,
        "order_index": rule.order_index.unwrap_or(0),
    }))
}

/// Row for a rule update. `updated_at` is always stamped with `now`.
pub fn rule_changes_row(changes: &RuleChanges, now: DateTime<Utc>) -> Row {
    let mut row = Row::new();
    put(&mut row, "title", changes.title.clone());
    put(&mut row, "content", changes.content.clone());
    put(&mut row, "order_index", changes.order_index.clone());
    put(&mut row, "section_id", changes.section_id.clone());
    row.insert("updated_at".to_string(), Value::String(now.to_rfc3339()));
    row
}

pub fn new_section_row(id: &str, section: &NewSection) -> Row {
    object(json!({
        "id": id,
        "title": section.title,
        "description": section.description,
        "icon": section.icon,
        "order_index": section.order_index.unwrap_or(0),
    }))
}

pub fn section_changes_row(changes: &SectionChanges) -> Row {
    let mut row = Row::new();
    put(&mut row, "title", changes.title.clone());
    put(&mut row, "description", changes.description.clone());
    put(&mut row, "icon", changes.icon.clone());
    put(&mut row, "order_index", changes.order_index.clone());
    row
}

pub fn backup_meta_row(id: &str, name: &str, kind: BackupKind, status: BackupStatus) -> Row {
    object(json!({
        "id": id,
        "name": name,
        "type": kind.as_str(),
        "status": status.as_str(),
    }))
}

pub fn backup_status_row(status: BackupStatus) -> Row {
    object(json!({ "status": status.as_str() }))
}

pub fn backup_data_row(backup_id: &str, sections: &[RuleSection]) -> Result<Row, StoreError> {
    let data = serde_json::to_value(sections).map_err(|e| StoreError::Decode {
        table: Table::BackupData,
        message: e.to_string(),
    })?;
    let mut row = Row::new();
    row.insert("backup_id".to_string(), Value::String(backup_id.to_string()));
    row.insert("data".to_string(), data);
    Ok(row)
}

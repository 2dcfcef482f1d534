//! Explicit field updates for partial edits.

use serde::{Deserialize, Deserializer};

/// A single field in a partial update: either left alone or set to a value.
///
/// For nullable columns use `Patch<Option<T>>`, so that clearing a value
/// (`Set(None)`) stays distinct from not touching it (`Keep`). In JSON
/// request bodies an absent field is `Keep` and `null` is `Set(None)`; pair
/// the field with `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Keep,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Set(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Patch::Set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Changes {
        #[serde(default)]
        title: Patch<String>,
        #[serde(default)]
        icon: Patch<Option<String>>,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let absent: Changes = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.title, Patch::Keep);
        assert_eq!(absent.icon, Patch::Keep);

        let cleared: Changes = serde_json::from_str(r#"{"icon": null}"#).unwrap();
        assert_eq!(cleared.icon, Patch::Set(None));

        let set: Changes = serde_json::from_str(r#"{"title": "Generale", "icon": "Shield"}"#).unwrap();
        assert_eq!(set.title, Patch::Set("Generale".to_string()));
        assert_eq!(set.icon, Patch::Set(Some("Shield".to_string())));
    }

    #[test]
    fn test_null_for_required_field_is_rejected() {
        let result: Result<Changes, _> = serde_json::from_str(r#"{"title": null}"#);
        assert!(result.is_err());
    }
}

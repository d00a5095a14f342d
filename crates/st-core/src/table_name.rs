//! Destination table name.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Unqualified, non-empty name of a destination table
/// (e.g. `INVENTORY_PRODUCT_LEVEL_SNAP`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    /// Wrap a known-good name. Panics on an empty string.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "TableName must not be empty");
        Self(name)
    }

    /// `None` for an empty name
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        (!name.is_empty()).then_some(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualify the name with an optional schema (`schema.table`).
    pub fn qualified(&self, schema: Option<&str>) -> String {
        match schema {
            Some(s) if !s.is_empty() => format!("{}.{}", s, self.0),
            _ => self.0.clone(),
        }
    }
}

impl<'de> Deserialize<'de> for TableName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::try_new(name).ok_or_else(|| serde::de::Error::custom("TableName must not be empty"))
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_qualified() {
        let name = TableName::new("INVENTORY_PRODUCT_LEVEL_SNAP");
        assert_eq!(name.qualified(None), "INVENTORY_PRODUCT_LEVEL_SNAP");
        assert_eq!(
            name.qualified(Some("raw")),
            "raw.INVENTORY_PRODUCT_LEVEL_SNAP"
        );
        assert_eq!(name.qualified(Some("")), "INVENTORY_PRODUCT_LEVEL_SNAP");
    }

    #[test]
    fn test_table_name_rejects_empty() {
        assert!(TableName::try_new("").is_none());
        let err = serde_yaml::from_str::<TableName>("''").unwrap_err();
        assert!(err.to_string().contains("TableName must not be empty"));
    }

    #[test]
    fn test_table_name_yaml_form() {
        let name: TableName = serde_yaml::from_str("SNAP").unwrap();
        assert_eq!(name.as_str(), "SNAP");
        assert_eq!(serde_yaml::to_string(&name).unwrap().trim(), "SNAP");
    }
}

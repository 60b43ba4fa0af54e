#![deny(unsafe_code)]

use std::fmt;

use crate::ModelError;

/// Name under which a table and its audit trail are stored.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct TableKey(String);

impl TableKey {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.contains('/') {
            return Err(ModelError::InvalidTableKey(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the acting user, as handed over by the login collaborator.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidUserId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Row identifier, unique within one table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct RowId(u64);

impl RowId {
    pub const FIRST: RowId = RowId(1);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Next identifier after the largest one in use, or [`RowId::FIRST`].
    pub fn next_after<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = RowId>,
    {
        ids.into_iter()
            .max()
            .map_or(Self::FIRST, |max| Self(max.0 + 1))
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_key_is_trimmed() {
        let key = TableKey::new("  dashboard-a ").unwrap();
        assert_eq!(key.as_str(), "dashboard-a");
    }

    #[test]
    fn table_key_rejects_blank_and_slashes() {
        assert!(TableKey::new("   ").is_err());
        assert!(TableKey::new("a/b").is_err());
    }

    #[test]
    fn next_row_id() {
        assert_eq!(RowId::next_after([]), RowId::FIRST);
        assert_eq!(
            RowId::next_after([RowId::new(3), RowId::new(7), RowId::new(2)]),
            RowId::new(8)
        );
    }
}

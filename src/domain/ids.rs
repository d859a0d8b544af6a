//! Index identifier type with validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index name newtype wrapper
///
/// Names are used verbatim as a directory name and as a URL path segment,
/// so path separators and relative components are rejected.
///
/// # Examples
///
/// ```
/// use esdump::domain::ids::IndexName;
/// use std::str::FromStr;
///
/// let index = IndexName::from_str("logs-2024-01").unwrap();
/// assert_eq!(index.as_str(), "logs-2024-01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexName(String);

impl IndexName {
    /// Creates a new IndexName from a string
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Index name cannot be empty".to_string());
        }
        if name == "." || name == ".." {
            return Err(format!("Invalid index name: {name}"));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(format!("Index name cannot contain path separators: {name}"));
        }
        Ok(Self(name))
    }

    /// Returns the index name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IndexName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for IndexName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_name_valid() {
        let index = IndexName::new("prod-orders").unwrap();
        assert_eq!(index.as_str(), "prod-orders");
        assert_eq!(index.to_string(), "prod-orders");
        assert_eq!(index.into_inner(), "prod-orders");
    }

    #[test]
    fn test_index_name_rejects_empty() {
        assert!(IndexName::new("").is_err());
        assert!(IndexName::new("   ").is_err());
    }

    #[test]
    fn test_index_name_rejects_path_components() {
        assert!(IndexName::new("..").is_err());
        assert!(IndexName::new("a/b").is_err());
        assert!(IndexName::new("a\\b").is_err());
    }

    #[test]
    fn test_index_names_sort_lexicographically() {
        let mut names = vec![
            IndexName::new("logs-b").unwrap(),
            IndexName::new("logs-a").unwrap(),
        ];
        names.sort();
        assert_eq!(names[0].as_str(), "logs-a");
    }
}

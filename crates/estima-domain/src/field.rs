//! Extraction fields

use std::fmt;

/// A datum to extract, described in plain language (e.g. "mean age")
///
/// The description doubles as the retrieval query and as the column prefix
/// in the normalized tables, so its text is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Field(String);

impl Field {
    /// Create a field from its description
    ///
    /// # Errors
    /// Returns error if the description is blank
    pub fn new(description: impl Into<String>) -> Result<Self, String> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err("Field description cannot be empty".to_string());
        }
        Ok(Self(description))
    }

    /// Get the description
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_creation() {
        let field = Field::new("Age (mean or median)").unwrap();
        assert_eq!(field.as_str(), "Age (mean or median)");
        assert_eq!(field.to_string(), "Age (mean or median)");
    }

    #[test]
    fn test_blank_field_rejected() {
        assert!(Field::new("").is_err());
        assert!(Field::new("   ").is_err());
    }
}

//! Validated identifier types shared across the workspace.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Validation errors for domain identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("sheet name cannot be empty")]
    Empty,
}

/// The name of a tracking sheet.
///
/// Names are case-sensitive and kept exactly as supplied; the only
/// rejected input is an empty or all-whitespace string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SheetName(String);

impl SheetName {
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(NameError::Empty);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SheetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SheetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SheetName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SheetName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SheetName> for String {
    fn from(name: SheetName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_name_accepts_regular_names() {
        let name = SheetName::new("client-work").unwrap();
        assert_eq!(name.as_str(), "client-work");
        assert_eq!(name.to_string(), "client-work");
    }

    #[test]
    fn test_sheet_name_is_kept_verbatim() {
        let name = SheetName::new("Client Work").unwrap();
        assert_eq!(name.as_str(), "Client Work");
    }

    #[test]
    fn test_sheet_name_rejects_empty() {
        assert_eq!(SheetName::new(""), Err(NameError::Empty));
        assert_eq!(SheetName::new("   "), Err(NameError::Empty));
        assert_eq!(SheetName::new("\t\n"), Err(NameError::Empty));
    }

    #[test]
    fn test_sheet_name_parses_from_str() {
        let name: SheetName = "personal".parse().unwrap();
        assert_eq!(name.as_str(), "personal");
        assert!("".parse::<SheetName>().is_err());
    }
}

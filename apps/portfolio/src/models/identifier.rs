use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a stored record.
///
/// `New` marks a draft the backend has not seen yet; it is never sent as an
/// id value, so the backend always assigns ids for inserts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Identifier {
    #[default]
    New,
    Existing(String),
}

impl Identifier {
    pub fn existing(id: impl Into<String>) -> Self {
        Identifier::from(Some(id.into()))
    }

    pub fn as_existing(&self) -> Option<&str> {
        match self {
            Identifier::New => None,
            Identifier::Existing(id) => Some(id),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Identifier::New)
    }
}

impl From<Option<String>> for Identifier {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(id) if !id.trim().is_empty() => Identifier::Existing(id.trim().to_string()),
            _ => Identifier::New,
        }
    }
}

impl From<Identifier> for Option<String> {
    fn from(value: Identifier) -> Self {
        match value {
            Identifier::New => None,
            Identifier::Existing(id) => Some(id),
        }
    }
}

/// Renders the id as used in URLs and hidden form fields; `New` is empty.
impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_existing().unwrap_or(""))
    }
}

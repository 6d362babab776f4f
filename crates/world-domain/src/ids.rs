use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier as issued by the backend.
///
/// Some endpoints hand out integer ids and others strings. The wire form is
/// kept as received; equality and hashing go through the canonical string so
/// a saved `"1"` matches a fetched `1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Number(i64),
    Text(String),
}

impl IdValue {
    /// Parse a stored identifier; integers come back as `Number`.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("identifier cannot be empty"));
        }
        Ok(match trimmed.parse::<i64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(trimmed.to_string()),
        })
    }

    fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for IdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl PartialEq for IdValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => self.canonical() == other.canonical(),
        }
    }
}

impl Eq for IdValue {}

impl Hash for IdValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(IdValue);

        impl $name {
            pub fn from_value(value: IdValue) -> Self {
                Self(value)
            }

            pub fn parse(raw: &str) -> Result<Self, DomainError> {
                IdValue::parse(raw).map(Self)
            }

            pub fn as_value(&self) -> &IdValue {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(IdValue::Number(value))
            }
        }

        impl From<IdValue> for $name {
            fn from(value: IdValue) -> Self {
                Self(value)
            }
        }
    };
}

// Root scoping entity
define_id!(WorldId);

// Any world-scoped entity (character, location, power level, ...)
define_id!(EntityId);

// Optional novel project scope
define_id!(ProjectId);

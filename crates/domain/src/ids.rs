use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Opaque string identifiers.
///
/// Identifiers are assigned by the world store and never interpreted by the
/// engine. The only invariant is that they are non-blank.
macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier, rejecting blank values.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::invalid_id(concat!($label, " must not be empty")));
                }
                Ok(Self(value))
            }

            /// Mint a fresh identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_id!(WorldCellId, "world cell id");
define_id!(UserId, "user id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_rejected() {
        assert!(WorldCellId::new("").is_err());
        assert!(WorldCellId::new("   ").is_err());
        assert!(UserId::new("").is_err());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = WorldCellId::new("cell-42").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"cell-42\"");

        let parsed: WorldCellId = serde_json::from_str("\"cell-42\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn deserializing_blank_id_fails() {
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(UserId::generate(), UserId::generate());
    }
}

//! Identifier newtypes for notebooks, sections and pages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new unique ID using UUID v7
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Wrap an existing identifier after checking it is usable as a file name
            pub fn parse(value: &str) -> Result<Self, Error> {
                let value = value.trim();
                if is_safe_identifier(value) {
                    Ok(Self(value.to_string()))
                } else {
                    Err(Error::InvalidInput(format!(
                        concat!("Invalid ", $label, " id: {:?}"),
                        value
                    )))
                }
            }

            /// Get the string representation of this ID
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether this ID can be used as a file name stem
            #[must_use]
            pub fn is_safe(&self) -> bool {
                is_safe_identifier(&self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

string_id!(
    /// Stable notebook identifier; also the local file stem and remote blob stem
    NotebookId,
    "notebook"
);
string_id!(
    /// Section identifier, unique within its notebook
    SectionId,
    "section"
);
string_id!(
    /// Page identifier, unique within its section
    PageId,
    "page"
);

fn is_safe_identifier(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '\0') || c.is_control())
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies entities that expose a stable unique identifier.
pub trait Identifiable {
    type Id: Copy + Ord;

    fn id(&self) -> Self::Id;
}

/// Provides access to a human-friendly entity name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Supplies a presentation-ready label for UI or logs.
pub trait Displayable {
    fn display_label(&self) -> String;
}

macro_rules! sequential_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Returns the identifier that follows this one.
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

sequential_id!(CategoryId, "Identifier of a category within a ledger.");
sequential_id!(LogId, "Identifier of a finance log within a ledger.");

// Re-export common dependencies so consumers can rely on this module as a façade.
pub use chrono;
pub use serde;

//! Domain types representing transaction categories.

use serde::{Deserialize, Serialize};

use crate::common::*;
use crate::direction::Direction;

/// Named grouping of finance logs with a default direction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub default_direction: Direction,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>, default_direction: Direction) -> Self {
        Self {
            id,
            name: name.into(),
            default_direction,
        }
    }

    /// Compares names the way uniqueness is enforced: trimmed and case-insensitive.
    pub fn has_name(&self, candidate: &str) -> bool {
        normalize_name(&self.name) == normalize_name(candidate)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Identifiable for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }
}

impl NamedEntity for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Category {
    fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.default_direction)
    }
}

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Closed set of directory listings a subscription can attach to. The
/// directories themselves live in other modules; this core only carries the
/// tag plus an opaque identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Lodging,
    Restaurant,
    Guide,
    Activity,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Lodging => "lodging",
            EntityType::Restaurant => "restaurant",
            EntityType::Guide => "guide",
            EntityType::Activity => "activity",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "lodging" => Some(EntityType::Lodging),
            "restaurant" => Some(EntityType::Restaurant),
            "guide" => Some(EntityType::Guide),
            "activity" => Some(EntityType::Activity),
            _ => None,
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Numeric account identifier (users.id)
pub type UserId = i64;

/// Numeric listing identifier (trips.id)
pub type TripId = i64;

/// Operations a caller can attempt against an existing trip.
/// Creating a trip has no owner to check yet, so it is not one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Update,
    Delete,
    Select,
}

impl Operation {
    pub fn is_mutation(self) -> bool {
        !matches!(self, Operation::Select)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Select => "select",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

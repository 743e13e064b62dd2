//! Ownership check applied to every mutating trip operation.

use crate::database::models::trip::Ownership;
use crate::types::{Operation, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// May `caller` modify a resource with the given owner?
///
/// No caller is always denied. Unowned (legacy) resources are open to any
/// signed-in caller; owned ones only to their owner. Pure: no I/O.
pub fn authorize_mutation(caller: Option<UserId>, owner: Ownership) -> Decision {
    let Some(caller) = caller else {
        return Decision::Deny;
    };

    match owner {
        Ownership::Unowned => Decision::Allow,
        Ownership::Owned(owner) if owner == caller => Decision::Allow,
        Ownership::Owned(_) => Decision::Deny,
    }
}

/// Reads are public; updates and deletes go through `authorize_mutation`.
/// Creating a trip is never gated here: it only requires a signed-in caller.
pub fn authorize(operation: Operation, caller: Option<UserId>, owner: Ownership) -> Decision {
    if operation.is_mutation() {
        authorize_mutation(caller, owner)
    } else {
        Decision::Allow
    }
}

pub mod account_service;
pub mod trip_service;

use thiserror::Error;

use crate::auth::{PasswordError, SessionError};
use crate::database::DatabaseError;
use crate::storage::StorageError;

pub use account_service::{AccountService, LoginRequest, Profile, RegisterRequest, Session};
pub use trip_service::{
    AuthorProfile, Coordinate, ListQuery, TripInput, TripListing, TripPatch, TripService, TripView,
    Upload,
};

/// Failures a service call can end in. Each maps to one HTTP status.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No token, or a token that carries no identity
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Valid identity, wrong owner
    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0}")]
    Conflict(String),

    /// A collaborator (database, object store, hasher) failed
    #[error("{0}")]
    StoreFailure(String),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn trip_not_found(id: i64) -> Self {
        ServiceError::NotFound(format!("Trip {} not found", id))
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        ServiceError::StoreFailure(err.to_string())
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::StoreFailure(err.to_string())
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        ServiceError::StoreFailure(err.to_string())
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::StoreFailure(err.to_string())
    }
}

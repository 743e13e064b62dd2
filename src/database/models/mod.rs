pub mod trip;
pub mod user;

pub use trip::{NewTripRecord, Ownership, Trip, TripRecord};
pub use user::{NewUser, User};

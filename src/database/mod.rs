pub mod list_codec;
pub mod manager;
pub mod memory;
pub mod models;
pub mod trip_store;
pub mod user_store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{MemoryTripStore, MemoryUserStore};
pub use trip_store::{PageRequest, PgTripStore, TripStore};
pub use user_store::{PgUserStore, UserStore};

pub mod gate;
pub mod password;
pub mod session;

pub use gate::{authorize, authorize_mutation, Decision};
pub use password::{hash_password, verify_password, PasswordError};
pub use session::{SessionError, SessionTokens, DEMO_USER_ID};

pub mod auth;
pub mod response;

pub use auth::{session_middleware, Caller};
pub use response::{ApiResponse, ApiResult};

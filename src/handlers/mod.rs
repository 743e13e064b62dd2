// handlers/mod.rs - HTTP handlers in two tiers
//
// Public:    no identity needed (/, /health, trip reads, register, login)
// Protected: a bearer token is required; anonymous calls get 401
//
// Every route runs behind `session_middleware`, which resolves the bearer
// token into a `Caller` before the handler sees the request.

pub mod protected;
pub mod public;
pub mod router;

pub use router::router;

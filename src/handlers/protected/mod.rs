// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Handlers pass the resolved `Caller` to the services, which answer 401 for
// anonymous callers and apply the ownership gate to mutations.

pub mod auth;
pub mod trips;
pub mod uploads;

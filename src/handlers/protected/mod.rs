// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here receives the `AuthUser` injected by `jwt_auth_middleware`
// and works through that user's `OwnerScope`.
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod students;
pub mod subjects;

// handlers/public/mod.rs - Handlers reachable without a bearer token
pub mod auth;

// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth, owner-scoped)
pub mod public;    // /api/auth/register, /api/auth/login
pub mod protected; // Everything else under /api/*

// handlers/public/auth/mod.rs - Token acquisition endpoints
pub mod login;    // POST /api/auth/login - authenticate and get JWT
pub mod register; // POST /api/auth/register - create new account

pub use login::login_post;
pub use register::register_post;

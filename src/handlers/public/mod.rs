// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None. Logout tries to authenticate but never requires it.
// Route Prefix: /api (plus /health)

pub mod contact;
pub mod health;
pub mod index;
pub mod login;
pub mod logout;
pub mod signup;

pub use contact::contact;
pub use health::health;
pub use index::api_index;
pub use login::{login, login_forgot, login_reset};
pub use logout::logout;
pub use signup::signup;

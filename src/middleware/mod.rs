pub mod auth;
pub mod client;
pub mod response;

pub use auth::{authenticate, basic_auth_middleware, AuthCredentials};
pub use client::ClientInfo;
pub use response::{ApiResponse, ApiResult};

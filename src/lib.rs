pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod mailer;
pub mod middleware;
pub mod server;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testing;

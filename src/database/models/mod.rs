pub mod account;
pub mod admin;
pub mod admin_group;
pub mod auth_attempt;
pub mod embedded;
pub mod session;
pub mod status;
pub mod user;

pub use account::Account;
pub use admin::Admin;
pub use admin_group::AdminGroup;
pub use auth_attempt::AuthAttempt;
pub use embedded::{Link, Name, NoteEntry, Roles, StatusEntry};
pub use session::Session;
pub use status::Status;
pub use user::{HydratedRoles, Role, User};

use uuid::Uuid;

/// Fresh document id: 32 lowercase hex characters
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Lowercase, keep ASCII alphanumerics, collapse everything else into single dashes.
/// `"Account Happy!"` becomes `"account-happy"`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    slug
}

pub mod basic;
pub mod password;

pub use basic::{decode_basic, encode_basic, BasicAuthError};
pub use password::{generate_key_hash, hash_password, verify_password, KeyHash, PasswordError};

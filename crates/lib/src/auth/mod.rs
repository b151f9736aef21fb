//! Account authentication helpers.
//!
//! Password hashing for stored accounts and random tokens for browser
//! sessions and anti-forgery checks. Session bookkeeping itself lives in the
//! web server.

pub mod crypto;
pub mod errors;

pub use crypto::{constant_time_eq, generate_token, hash_password, verify_password};
pub use errors::AuthError;

//! Credential hashing for owner records.
//!
//! Passwords are stored as salted Argon2id hashes in PHC string format and
//! are only ever compared through [`verify_password`].

mod password;

pub use password::{PasswordError, hash_password, verify_password};

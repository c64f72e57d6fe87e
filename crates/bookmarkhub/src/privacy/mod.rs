//! The privacy space.
//!
//! A second bookmark partition kept encrypted in storage and opened with a
//! password:
//!
//! - [`cipher`]: the password-keyed XOR cipher with hex output.
//! - [`vault`]: password verification, loading, saving and re-keying.
//!
//! # Example
//!
//! ```
//! use bookmarkhub::privacy::{decrypt, encrypt};
//!
//! let sealed = encrypt("private notes", "hunter2").unwrap();
//! assert_eq!(decrypt(&sealed, "hunter2").unwrap(), "private notes");
//! ```

pub mod cipher;
pub mod vault;

pub use cipher::{decrypt, encrypt};
pub use vault::{seal, unseal, PrivacyPayload, Vault};

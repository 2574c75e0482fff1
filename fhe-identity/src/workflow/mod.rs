//! Identity workflows.
//!
//! - [`submit_identity`]: validate, encrypt and store the three attributes
//! - [`verify_access`]: run a scenario's homomorphic check and decrypt it
//! - [`reveal_attribute`]: decrypt one stored attribute for its owner
//!
//! Every outcome is recorded in the session's activity log.

mod access;
mod decryption;
mod reveal;
mod submission;

pub use access::verify_access;
pub use decryption::{authorize_decryption, decrypt_handle, DecryptionAuthorization};
pub use reveal::reveal_attribute;
pub use submission::{submit_identity, validate_inputs};

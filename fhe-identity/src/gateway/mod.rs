//! FHE gateway abstraction.
//!
//! Encryption (ciphertext + input proof) and user decryption are brokered by
//! an external relayer. This module defines the narrow interface the
//! workflows need; [`crate::simulation::SimulatedGateway`] implements it in
//! process.

pub mod traits;

pub use traits::{
    DecryptionGateway, EncryptedInput, EncryptedPayload, EncryptedScalar, EncryptionGateway,
    FheGateway, GatewayError, HandleContractPair, Keypair, PrivateKey, UserDecryptRequest,
};

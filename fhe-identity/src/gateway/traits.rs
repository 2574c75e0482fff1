//! Core traits for FHE gateways.

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::types::{CiphertextHandle, ClearValue, Eip712Payload, InputProof};

/// Error types for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Gateway was used before `initialize`
    #[error("Gateway not initialized")]
    NotInitialized,

    /// Gateway or relayer is unreachable
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    /// Relayer refused the request
    #[error("Relayer rejected request: {0}")]
    Rejected(String),

    /// Decryption authorization was not accepted
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// Anything else reported by the gateway
    #[error("Gateway error: {0}")]
    Internal(String),
}

/// A fixed-width scalar queued for encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptedScalar {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl EncryptedScalar {
    /// Plaintext as the value the gateway will eventually decrypt to.
    pub fn clear_value(&self) -> ClearValue {
        match self {
            Self::Bool(b) => ClearValue::Bool(*b),
            Self::U8(n) => ClearValue::Uint(u128::from(*n)),
            Self::U16(n) => ClearValue::Uint(u128::from(*n)),
            Self::U32(n) => ClearValue::Uint(u128::from(*n)),
            Self::U64(n) => ClearValue::Uint(u128::from(*n)),
        }
    }
}

/// Builder for one encrypted input bound to a (contract, user) pair.
///
/// Proofs are only valid for the pair they were built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    contract: Address,
    user: Address,
    values: Vec<EncryptedScalar>,
}

impl EncryptedInput {
    pub fn new(contract: Address, user: Address) -> Self {
        Self {
            contract,
            user,
            values: Vec::new(),
        }
    }

    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.values.push(EncryptedScalar::Bool(value));
        self
    }

    pub fn add8(&mut self, value: u8) -> &mut Self {
        self.values.push(EncryptedScalar::U8(value));
        self
    }

    pub fn add16(&mut self, value: u16) -> &mut Self {
        self.values.push(EncryptedScalar::U16(value));
        self
    }

    pub fn add32(&mut self, value: u32) -> &mut Self {
        self.values.push(EncryptedScalar::U32(value));
        self
    }

    pub fn add64(&mut self, value: u64) -> &mut Self {
        self.values.push(EncryptedScalar::U64(value));
        self
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn user(&self) -> Address {
        self.user
    }

    pub fn values(&self) -> &[EncryptedScalar] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of encrypting an input: one handle per queued value, one proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    pub handles: Vec<CiphertextHandle>,
    pub input_proof: InputProof,
}

/// Ephemeral private key for one decryption authorization.
///
/// Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Ephemeral keypair the gateway re-encrypts results to.
#[derive(Debug, Clone)]
pub struct Keypair {
    pub public_key: String,
    pub private_key: PrivateKey,
}

/// A handle and the contract that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleContractPair {
    pub handle: CiphertextHandle,
    pub contract_address: Address,
}

/// Everything the relayer needs to perform a user decryption.
#[derive(Debug, Clone)]
pub struct UserDecryptRequest {
    pub handles: Vec<HandleContractPair>,
    pub private_key: PrivateKey,
    pub public_key: String,
    /// Wallet signature over the EIP-712 payload, hex without `0x`
    pub signature: String,
    pub contract_addresses: Vec<Address>,
    pub requester: Address,
    /// Unix seconds
    pub start_timestamp: u64,
    pub duration_days: u32,
}

/// Produces ciphertext handles and input proofs.
#[async_trait]
pub trait EncryptionGateway: Send + Sync {
    /// Start an encrypted input bound to `contract` and `user`.
    fn create_encrypted_input(&self, contract: Address, user: Address) -> EncryptedInput {
        EncryptedInput::new(contract, user)
    }

    /// Encrypt every queued value and prove the input well formed.
    async fn encrypt(&self, input: EncryptedInput) -> Result<EncryptedPayload, GatewayError>;
}

/// Decrypts handles for a requester holding a signed authorization.
#[async_trait]
pub trait DecryptionGateway: Send + Sync {
    /// Fresh ephemeral keypair.
    fn generate_keypair(&self) -> Keypair;

    /// Typed data the requester's wallet must sign.
    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u32,
    ) -> Eip712Payload;

    /// Decrypt the requested handles.
    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<HashMap<CiphertextHandle, ClearValue>, GatewayError>;
}

/// A full gateway: both directions plus one-time initialization.
#[async_trait]
pub trait FheGateway: EncryptionGateway + DecryptionGateway {
    /// Gateway identifier, for logs.
    fn id(&self) -> &str;

    /// Load keys and connect to the relayer. Called once per session.
    async fn initialize(&self) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypted_input_builder() {
        let contract = Address::repeat_byte(0x01);
        let user = Address::repeat_byte(0x02);
        let mut input = EncryptedInput::new(contract, user);
        assert!(input.is_empty());

        input.add32(25).add_bool(true);
        assert_eq!(input.values(), &[EncryptedScalar::U32(25), EncryptedScalar::Bool(true)]);
        assert_eq!(input.contract(), contract);
        assert_eq!(input.user(), user);
    }

    #[test]
    fn test_scalar_clear_value() {
        assert_eq!(EncryptedScalar::U32(750).clear_value(), ClearValue::Uint(750));
        assert_eq!(EncryptedScalar::Bool(false).clear_value(), ClearValue::Bool(false));
    }

    #[test]
    fn test_private_key_redacted() {
        let key = PrivateKey::new("deadbeef");
        assert_eq!(format!("{:?}", key), "PrivateKey(<redacted>)");
        assert_eq!(key.expose(), "deadbeef");
    }
}

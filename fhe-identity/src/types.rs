//! Shared identity types.

use alloy_primitives::{Address, Bytes, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::ContractCall;
use crate::config::AttributeBounds;

/// Opaque reference to an encrypted value held by the contract.
///
/// A handle cannot be decrypted without the decryption gateway and a
/// signed authorization from an account the contract has allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle(pub B256);

impl CiphertextHandle {
    /// Handle returned by the contract for values that were never set.
    pub const EMPTY: Self = Self(B256::ZERO);

    /// Whether this is the zero handle.
    pub fn is_empty(&self) -> bool {
        self.0 == B256::ZERO
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Abbreviated form for log lines (`0x12345678...`).
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...", &full[..10])
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<B256> for CiphertextHandle {
    fn from(word: B256) -> Self {
        Self(word)
    }
}

/// Zero-knowledge proof that a ciphertext was well formed for a
/// (contract, user) pair. The contract rejects handles without one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputProof(pub Bytes);

impl InputProof {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A ciphertext handle together with the proof the contract needs to accept it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    pub handle: CiphertextHandle,
    pub proof: InputProof,
}

/// Identity attributes known to the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeKey {
    Age,
    CreditScore,
    MembershipTier,
}

impl AttributeKey {
    /// All keys in contract parameter order.
    pub const ALL: [AttributeKey; 3] = [Self::Age, Self::CreditScore, Self::MembershipTier];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::CreditScore => "Credit Score",
            Self::MembershipTier => "Membership Tier",
        }
    }

    /// Field name used by front-ends.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::CreditScore => "creditScore",
            Self::MembershipTier => "membershipTier",
        }
    }

    /// View call returning the stored ciphertext handle.
    pub fn getter(&self) -> ContractCall {
        match self {
            Self::Age => ContractCall::GetAge,
            Self::CreditScore => ContractCall::GetCreditScore,
            Self::MembershipTier => ContractCall::GetTier,
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attribute stored on chain, mirrored locally for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityAttribute {
    pub key: AttributeKey,
    pub bounds: AttributeBounds,
    /// Plaintext the user submitted. Display only; the chain is authoritative.
    pub plaintext: u32,
    pub handle: CiphertextHandle,
    pub created_at: DateTime<Utc>,
}

impl IdentityAttribute {
    pub fn new(
        key: AttributeKey,
        bounds: AttributeBounds,
        plaintext: u32,
        handle: CiphertextHandle,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            bounds,
            plaintext,
            handle,
            created_at,
        }
    }

    pub fn label(&self) -> &'static str {
        self.key.label()
    }
}

/// The three attributes written by one `setIdentity` transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySet {
    pub age: IdentityAttribute,
    pub credit_score: IdentityAttribute,
    pub membership_tier: IdentityAttribute,
    /// Transaction that stored the ciphertexts
    pub tx_hash: B256,
}

impl IdentitySet {
    /// Attributes in contract parameter order: age, credit score, tier.
    pub fn attributes(&self) -> [&IdentityAttribute; 3] {
        [&self.age, &self.credit_score, &self.membership_tier]
    }

    pub fn get(&self, key: AttributeKey) -> &IdentityAttribute {
        match key {
            AttributeKey::Age => &self.age,
            AttributeKey::CreditScore => &self.credit_score,
            AttributeKey::MembershipTier => &self.membership_tier,
        }
    }
}

/// Validated plaintext inputs, ready for encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaintextIdentity {
    pub age: u32,
    pub credit_score: u32,
    pub membership_tier: u32,
}

impl PlaintextIdentity {
    pub fn get(&self, key: AttributeKey) -> u32 {
        match key {
            AttributeKey::Age => self.age,
            AttributeKey::CreditScore => self.credit_score,
            AttributeKey::MembershipTier => self.membership_tier,
        }
    }
}

/// A decrypted scalar returned by the decryption gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClearValue {
    Bool(bool),
    Uint(u128),
}

impl ClearValue {
    /// `true` for `true` and any nonzero integer.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Uint(n) => *n != 0,
        }
    }

    pub fn as_u128(&self) -> u128 {
        match self {
            Self::Bool(b) => u128::from(*b),
            Self::Uint(n) => *n,
        }
    }
}

impl fmt::Display for ClearValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Uint(n) => write!(f, "{}", n),
        }
    }
}

/// EIP-712 typed data the wallet signs to authorize a user decryption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Payload {
    pub domain: serde_json::Value,
    pub types: serde_json::Value,
    pub primary_type: String,
    pub message: serde_json::Value,
}

/// Format an address as `0x1234...` for log lines.
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...", &full[..6])
}

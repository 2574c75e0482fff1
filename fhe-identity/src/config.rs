//! Configuration for identity sessions.
//!
//! Defaults point at the public Sepolia deployment of the identity
//! contract.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::AttributeKey;

/// Sepolia deployment of the identity contract.
pub const DEFAULT_CONTRACT_ADDRESS: Address = Address::new([
    0x4a, 0xbb, 0xbc, 0x78, 0xd1, 0x7c, 0xeb, 0xce, 0x85, 0x80, 0xc5, 0x49, 0xe9, 0x65, 0x0f, 0x34,
    0xe6, 0x61, 0x54, 0x24,
]);

/// Sepolia chain id.
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// Inclusive numeric domain for one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeBounds {
    pub min: u32,
    pub max: u32,
}

impl AttributeBounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= i64::from(self.min) && value <= i64::from(self.max)
    }

    /// Constraint text used in validation errors.
    pub fn constraint(&self) -> String {
        format!("must be between {} and {}", self.min, self.max)
    }
}

/// Bounds for every attribute key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityBounds {
    pub age: AttributeBounds,
    pub credit_score: AttributeBounds,
    pub membership_tier: AttributeBounds,
}

impl Default for IdentityBounds {
    fn default() -> Self {
        Self {
            age: AttributeBounds::new(1, 120),
            credit_score: AttributeBounds::new(300, 850),
            membership_tier: AttributeBounds::new(1, 5),
        }
    }
}

impl IdentityBounds {
    pub fn for_key(&self, key: AttributeKey) -> AttributeBounds {
        match key {
            AttributeKey::Age => self.age,
            AttributeKey::CreditScore => self.credit_score,
            AttributeKey::MembershipTier => self.membership_tier,
        }
    }
}

/// Configuration for a [`Session`](crate::Session) and its backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityConfig {
    /// Identity contract the session is bound to
    pub contract_address: Address,
    /// Chain the contract lives on
    pub chain_id: u64,
    /// JSON-RPC endpoint for transactions, calls and wallet signing
    pub rpc_url: String,
    /// How long a decryption authorization stays valid
    pub decryption_validity_days: u32,
    /// Receipt polling interval while waiting for inclusion (ms)
    pub receipt_poll_interval_ms: u64,
    /// Plaintext validation bounds
    pub bounds: IdentityBounds,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            chain_id: DEFAULT_CHAIN_ID,
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            decryption_validity_days: 10,
            receipt_poll_interval_ms: 1_000,
            bounds: IdentityBounds::default(),
        }
    }
}

impl IdentityConfig {
    /// Configuration for a local development node (e.g. Hardhat on 8545).
    pub fn local(contract_address: Address) -> Self {
        Self {
            contract_address,
            chain_id: 31_337,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            receipt_poll_interval_ms: 250,
            ..Default::default()
        }
    }

    pub fn with_contract(mut self, contract_address: Address) -> Self {
        self.contract_address = contract_address;
        self
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_bounds(mut self, bounds: IdentityBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_decryption_validity_days(mut self, days: u32) -> Self {
        self.decryption_validity_days = days;
        self
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let bounds = IdentityBounds::default();
        assert!(bounds.age.contains(1));
        assert!(bounds.age.contains(120));
        assert!(!bounds.age.contains(0));
        assert!(!bounds.age.contains(150));
        assert!(!bounds.credit_score.contains(299));
        assert!(bounds.credit_score.contains(850));
        assert!(bounds.membership_tier.contains(5));
        assert!(!bounds.membership_tier.contains(6));
    }

    #[test]
    fn test_default_config() {
        let config = IdentityConfig::default();
        assert_eq!(config.chain_id, DEFAULT_CHAIN_ID);
        assert_eq!(config.decryption_validity_days, 10);
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("relayerUrl").is_none());
        assert_eq!(json["receiptPollIntervalMs"], 1_000);
        assert_eq!(
            config.contract_address.to_string().to_lowercase(),
            "0x4abbbc78d17cebce8580c549e9650f34e6615424"
        );
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: IdentityConfig = serde_json::from_value(serde_json::json!({
            "rpcUrl": "http://localhost:8545",
            "bounds": { "membershipTier": { "min": 1, "max": 3 } }
        }))
        .unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.bounds.membership_tier, AttributeBounds::new(1, 3));
        assert_eq!(config.bounds.age, AttributeBounds::new(1, 120));
        assert_eq!(config.chain_id, DEFAULT_CHAIN_ID);
    }

    #[test]
    fn test_constraint_text() {
        assert_eq!(
            AttributeBounds::new(1, 120).constraint(),
            "must be between 1 and 120"
        );
    }
}

//! Simulated wallet.

use alloy_primitives::Address;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::gateway::simulated_signature;
use crate::types::Eip712Payload;
use crate::wallet::{WalletError, WalletSigner};

/// Wallet holding a fixed set of accounts.
pub struct SimulatedWallet {
    accounts: Vec<Address>,
    reject_signing: AtomicBool,
    sign_count: AtomicU32,
}

impl SimulatedWallet {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            reject_signing: AtomicBool::new(false),
            sign_count: AtomicU32::new(0),
        }
    }

    /// Wallet with one random account.
    pub fn random() -> Self {
        Self::new(vec![Address::from(rand::random::<[u8; 20]>())])
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    /// Refuse signature requests until cleared.
    pub fn reject_signing(&self, reject: bool) {
        self.reject_signing.store(reject, Ordering::SeqCst);
    }

    /// Number of signature requests, including refused ones.
    pub fn sign_count(&self) -> u32 {
        self.sign_count.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedWallet {
    fn default() -> Self {
        Self::random()
    }
}

#[async_trait]
impl WalletSigner for SimulatedWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.accounts.clone())
    }

    async fn sign_typed_data(
        &self,
        account: Address,
        payload: &Eip712Payload,
    ) -> Result<String, WalletError> {
        self.sign_count.fetch_add(1, Ordering::SeqCst);

        if self.reject_signing.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected(
                "User denied message signature".to_string(),
            ));
        }
        if !self.accounts.contains(&account) {
            return Err(WalletError::UnknownAccount(account));
        }

        Ok(format!("0x{}", simulated_signature(account, payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Eip712Payload {
        Eip712Payload {
            domain: json!({ "name": "Decryption" }),
            types: json!({}),
            primary_type: "UserDecryptRequestVerification".to_string(),
            message: json!({ "durationDays": "10" }),
        }
    }

    #[tokio::test]
    async fn test_signature_depends_on_account() {
        let a = Address::repeat_byte(0x0a);
        let b = Address::repeat_byte(0x0b);
        let wallet = SimulatedWallet::new(vec![a, b]);

        let sig_a = wallet.sign_typed_data(a, &payload()).await.unwrap();
        let sig_b = wallet.sign_typed_data(b, &payload()).await.unwrap();
        assert!(sig_a.starts_with("0x"));
        assert_ne!(sig_a, sig_b);
        assert_eq!(wallet.sign_count(), 2);
    }

    #[tokio::test]
    async fn test_rejections() {
        let wallet = SimulatedWallet::random();
        let stranger = Address::repeat_byte(0xee);
        assert!(matches!(
            wallet.sign_typed_data(stranger, &payload()).await,
            Err(WalletError::UnknownAccount(a)) if a == stranger
        ));

        wallet.reject_signing(true);
        let account = wallet.accounts()[0];
        assert!(matches!(
            wallet.sign_typed_data(account, &payload()).await,
            Err(WalletError::Rejected(_))
        ));
    }
}

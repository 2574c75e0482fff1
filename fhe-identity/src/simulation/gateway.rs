//! Simulated FHE gateway.
//!
//! Encryption stores plaintexts in the [`SimulatedLedger`] and returns a
//! proof bound to the (contract, user) pair. User decryption enforces the
//! same preconditions a relayer would: a valid keypair, a wallet signature
//! over the exact EIP-712 payload, a live validity window and ACL access.

use alloy_primitives::Address;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::ledger::{proof_for, SimulatedLedger};
use crate::gateway::{
    DecryptionGateway, EncryptedInput, EncryptedPayload, EncryptedScalar, EncryptionGateway,
    FheGateway, GatewayError, Keypair, PrivateKey, UserDecryptRequest,
};
use crate::types::{CiphertextHandle, ClearValue, Eip712Payload};

const SECONDS_PER_DAY: u64 = 86_400;

/// Public key the simulated relayer expects for a private key.
pub fn derive_public_key(private_key: &PrivateKey) -> String {
    hex::encode(Sha256::digest(private_key.expose().as_bytes()))
}

/// Signature the simulated wallet produces, hex without `0x`.
pub fn simulated_signature(account: Address, payload: &Eip712Payload) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account.as_slice());
    hasher.update(serde_json::to_vec(payload).unwrap_or_default());
    hex::encode(hasher.finalize())
}

/// In-process FHE gateway.
pub struct SimulatedGateway {
    ledger: Arc<SimulatedLedger>,
    chain_id: u64,
    initialized: AtomicBool,
    fail_init: AtomicBool,
    fail_decrypt: AtomicBool,
    /// 1-based encrypt call that fails, 0 for none
    fail_encrypt_at: AtomicU32,
    init_count: AtomicU32,
    encrypt_count: AtomicU32,
    decrypt_count: AtomicU32,
    encrypted: Mutex<Vec<EncryptedScalar>>,
}

impl SimulatedGateway {
    pub fn new(ledger: Arc<SimulatedLedger>, chain_id: u64) -> Self {
        Self {
            ledger,
            chain_id,
            initialized: AtomicBool::new(false),
            fail_init: AtomicBool::new(false),
            fail_decrypt: AtomicBool::new(false),
            fail_encrypt_at: AtomicU32::new(0),
            init_count: AtomicU32::new(0),
            encrypt_count: AtomicU32::new(0),
            decrypt_count: AtomicU32::new(0),
            encrypted: Mutex::new(Vec::new()),
        }
    }

    /// Make `initialize` fail until cleared.
    pub fn fail_initialization(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    /// Make the `call`-th encryption (1-based, counted over the gateway's
    /// lifetime) fail. 0 disables.
    pub fn fail_encryption_at(&self, call: u32) {
        self.fail_encrypt_at.store(call, Ordering::SeqCst);
    }

    /// Make every decryption fail until cleared.
    pub fn fail_decryption(&self, fail: bool) {
        self.fail_decrypt.store(fail, Ordering::SeqCst);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Number of `initialize` attempts.
    pub fn init_count(&self) -> u32 {
        self.init_count.load(Ordering::SeqCst)
    }

    pub fn encrypt_count(&self) -> u32 {
        self.encrypt_count.load(Ordering::SeqCst)
    }

    pub fn decrypt_count(&self) -> u32 {
        self.decrypt_count.load(Ordering::SeqCst)
    }

    /// Every scalar successfully encrypted, in call order.
    pub async fn encrypted_values(&self) -> Vec<EncryptedScalar> {
        self.encrypted.lock().await.clone()
    }

    fn check_initialized(&self) -> Result<(), GatewayError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(GatewayError::NotInitialized)
        }
    }

    fn check_window(&self, request: &UserDecryptRequest) -> Result<(), GatewayError> {
        if request.duration_days == 0 {
            return Err(GatewayError::Unauthorized(
                "authorization has zero duration".to_string(),
            ));
        }

        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        let end = request
            .start_timestamp
            .saturating_add(u64::from(request.duration_days) * SECONDS_PER_DAY);

        if now < request.start_timestamp {
            return Err(GatewayError::Unauthorized(
                "authorization not yet valid".to_string(),
            ));
        }
        if now > end {
            return Err(GatewayError::Unauthorized("authorization expired".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EncryptionGateway for SimulatedGateway {
    async fn encrypt(&self, input: EncryptedInput) -> Result<EncryptedPayload, GatewayError> {
        self.check_initialized()?;

        let call = self.encrypt_count.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_encrypt_at.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(
                "relayer did not answer".to_string(),
            ));
        }
        if input.is_empty() {
            return Err(GatewayError::Rejected("no values to encrypt".to_string()));
        }

        let mut handles = Vec::with_capacity(input.values().len());
        for scalar in input.values() {
            // not decryptable until the contract accepts the input
            handles.push(self.ledger.mint(scalar.clear_value(), &[]).await);
        }
        self.encrypted
            .lock()
            .await
            .extend_from_slice(input.values());

        debug!(count = handles.len(), user = %input.user(), "Encrypted input");
        Ok(EncryptedPayload {
            input_proof: proof_for(input.contract(), input.user(), &handles),
            handles,
        })
    }
}

#[async_trait]
impl DecryptionGateway for SimulatedGateway {
    fn generate_keypair(&self) -> Keypair {
        let private_key = PrivateKey::new(hex::encode(rand::random::<[u8; 32]>()));
        Keypair {
            public_key: derive_public_key(&private_key),
            private_key,
        }
    }

    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u32,
    ) -> Eip712Payload {
        let contracts: Vec<String> = contract_addresses.iter().map(|a| a.to_string()).collect();

        Eip712Payload {
            domain: json!({
                "name": "Decryption",
                "version": "1",
                "chainId": self.chain_id,
            }),
            types: json!({
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                ],
                "UserDecryptRequestVerification": [
                    { "name": "publicKey", "type": "bytes" },
                    { "name": "contractAddresses", "type": "address[]" },
                    { "name": "startTimestamp", "type": "uint256" },
                    { "name": "durationDays", "type": "uint256" },
                    { "name": "extraData", "type": "bytes" },
                ],
            }),
            primary_type: "UserDecryptRequestVerification".to_string(),
            message: json!({
                "publicKey": format!("0x{}", public_key),
                "contractAddresses": contracts,
                "startTimestamp": start_timestamp.to_string(),
                "durationDays": duration_days.to_string(),
                "extraData": "0x00",
            }),
        }
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<HashMap<CiphertextHandle, ClearValue>, GatewayError> {
        self.check_initialized()?;
        self.decrypt_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_decrypt.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(
                "relayer did not answer".to_string(),
            ));
        }

        if derive_public_key(&request.private_key) != request.public_key {
            return Err(GatewayError::Unauthorized("keypair mismatch".to_string()));
        }

        self.check_window(&request)?;

        let payload = self.create_eip712(
            &request.public_key,
            &request.contract_addresses,
            request.start_timestamp,
            request.duration_days,
        );
        if simulated_signature(request.requester, &payload) != request.signature {
            return Err(GatewayError::Unauthorized("invalid signature".to_string()));
        }

        let mut values = HashMap::with_capacity(request.handles.len());
        for pair in &request.handles {
            if !request.contract_addresses.contains(&pair.contract_address) {
                return Err(GatewayError::Unauthorized(format!(
                    "contract {} not covered by the signature",
                    pair.contract_address
                )));
            }
            if !self.ledger.is_allowed(pair.handle, request.requester).await {
                return Err(GatewayError::Unauthorized(format!(
                    "{} may not decrypt {}",
                    request.requester,
                    pair.handle.short()
                )));
            }
            let value = self.ledger.value(pair.handle).await.ok_or_else(|| {
                GatewayError::Internal(format!("unknown handle {}", pair.handle.short()))
            })?;
            values.insert(pair.handle, value);
        }

        Ok(values)
    }
}

#[async_trait]
impl FheGateway for SimulatedGateway {
    fn id(&self) -> &str {
        "simulated"
    }

    async fn initialize(&self) -> Result<(), GatewayError> {
        self.init_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_init.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(
                "could not load public key".to_string(),
            ));
        }

        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }
}

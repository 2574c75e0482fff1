//! Shared ciphertext store for the simulated gateway and contract.
//!
//! Holds the plaintext behind every handle plus the access-control list
//! deciding who may decrypt it.

use alloy_primitives::{Address, Bytes, B256};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

use crate::scenario::AccessPredicate;
use crate::types::{CiphertextHandle, ClearValue, InputProof};

#[derive(Debug, Default)]
struct LedgerState {
    values: HashMap<CiphertextHandle, ClearValue>,
    acl: HashMap<CiphertextHandle, HashSet<Address>>,
    /// user → [age, credit score, tier]
    identities: HashMap<Address, [CiphertextHandle; 3]>,
    /// Latest check result per user and predicate
    results: HashMap<(Address, AccessPredicate), CiphertextHandle>,
}

/// In-memory ciphertext ledger.
#[derive(Debug, Default)]
pub struct SimulatedLedger {
    state: Mutex<LedgerState>,
}

impl SimulatedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a fresh handle, readable by `allowed`.
    pub async fn mint(&self, value: ClearValue, allowed: &[Address]) -> CiphertextHandle {
        let mut state = self.state.lock().await;
        let handle = loop {
            let candidate = CiphertextHandle(B256::from(rand::random::<[u8; 32]>()));
            if !candidate.is_empty() && !state.values.contains_key(&candidate) {
                break candidate;
            }
        };

        state.values.insert(handle, value);
        state
            .acl
            .insert(handle, allowed.iter().copied().collect());
        handle
    }

    /// Grant `account` decryption rights on `handle`.
    pub async fn allow(&self, handle: CiphertextHandle, account: Address) {
        let mut state = self.state.lock().await;
        state.acl.entry(handle).or_default().insert(account);
    }

    pub async fn is_allowed(&self, handle: CiphertextHandle, account: Address) -> bool {
        let state = self.state.lock().await;
        state
            .acl
            .get(&handle)
            .is_some_and(|allowed| allowed.contains(&account))
    }

    pub async fn value(&self, handle: CiphertextHandle) -> Option<ClearValue> {
        self.state.lock().await.values.get(&handle).copied()
    }

    pub async fn set_identity(&self, user: Address, handles: [CiphertextHandle; 3]) {
        self.state.lock().await.identities.insert(user, handles);
    }

    pub async fn identity(&self, user: Address) -> Option<[CiphertextHandle; 3]> {
        self.state.lock().await.identities.get(&user).copied()
    }

    pub async fn set_result(
        &self,
        user: Address,
        predicate: AccessPredicate,
        handle: CiphertextHandle,
    ) {
        self.state
            .lock()
            .await
            .results
            .insert((user, predicate), handle);
    }

    pub async fn result(&self, user: Address, predicate: AccessPredicate) -> Option<CiphertextHandle> {
        self.state
            .lock()
            .await
            .results
            .get(&(user, predicate))
            .copied()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.values.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.values.is_empty()
    }
}

/// Proof binding `handles` to one (contract, user) pair.
pub fn proof_for(contract: Address, user: Address, handles: &[CiphertextHandle]) -> InputProof {
    let mut hasher = Sha256::new();
    hasher.update(contract.as_slice());
    hasher.update(user.as_slice());
    for handle in handles {
        hasher.update(handle.as_bytes());
    }
    InputProof(Bytes::from(hasher.finalize().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mint_and_acl() {
        let ledger = SimulatedLedger::new();
        let alice = Address::repeat_byte(0x0a);
        let bob = Address::repeat_byte(0x0b);

        let handle = ledger.mint(ClearValue::Uint(42), &[alice]).await;
        assert!(!handle.is_empty());
        assert_eq!(ledger.value(handle).await, Some(ClearValue::Uint(42)));
        assert!(ledger.is_allowed(handle, alice).await);
        assert!(!ledger.is_allowed(handle, bob).await);

        ledger.allow(handle, bob).await;
        assert!(ledger.is_allowed(handle, bob).await);
        assert_eq!(ledger.len().await, 1);
    }

    #[test]
    fn test_proof_bound_to_pair() {
        let contract = Address::repeat_byte(0x01);
        let alice = Address::repeat_byte(0x0a);
        let bob = Address::repeat_byte(0x0b);
        let handle = CiphertextHandle(B256::repeat_byte(0x33));

        let proof = proof_for(contract, alice, &[handle]);
        assert_eq!(proof, proof_for(contract, alice, &[handle]));
        assert_ne!(proof, proof_for(contract, bob, &[handle]));
        assert_eq!(proof.as_bytes().len(), 32);
    }
}

//! Simulated identity contract.
//!
//! Mirrors the deployed contract's observable behavior:
//! - `setIdentity` verifies each input proof, stores the handles and grants
//!   the sender and the contract access
//! - `checkIsAdult` computes `age >= 18`
//! - `checkIsVIP` computes `credit > 700 || tier == 1`
//! - a check stores its encrypted result and allows the sender to decrypt it;
//!   a static call of the same check returns that stored handle
//!
//! Unset attributes behave like encryptions of zero.

use alloy::sol_types::SolValue;
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, Semaphore};
use tracing::debug;

use super::ledger::{proof_for, SimulatedLedger};
use crate::chain::{ChainClient, ChainError, ContractCall, TxReceipt};
use crate::scenario::AccessPredicate;
use crate::types::{CiphertextHandle, ClearValue, EncryptedField};

const ADULT_AGE: u128 = 18;
const VIP_CREDIT_FLOOR: u128 = 700;
const VIP_TIER: u128 = 1;

/// In-process identity contract.
pub struct SimulatedChain {
    contract: Address,
    ledger: Arc<SimulatedLedger>,
    block_number: AtomicU64,
    sent: Mutex<Vec<(Address, ContractCall)>>,
    static_calls: Mutex<Vec<(Address, ContractCall)>>,
    paused: AtomicBool,
    resumed: Notify,
    released: Semaphore,
    reject_sends: Mutex<Option<String>>,
    fail_static_calls: AtomicBool,
}

impl SimulatedChain {
    pub fn new(contract: Address, ledger: Arc<SimulatedLedger>) -> Self {
        Self {
            contract,
            ledger,
            block_number: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
            static_calls: Mutex::new(Vec::new()),
            paused: AtomicBool::new(false),
            resumed: Notify::new(),
            released: Semaphore::new(0),
            reject_sends: Mutex::new(None),
            fail_static_calls: AtomicBool::new(false),
        }
    }

    /// Hold every `send` before inclusion until [`resume`](Self::resume).
    ///
    /// The call is recorded before it blocks.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.resumed.notify_waiters();
    }

    /// Let the longest-held `send` through while staying paused.
    pub fn release_one(&self) {
        self.released.add_permits(1);
    }

    /// Reject every `send` with `reason` until cleared with `None`.
    pub async fn reject_sends(&self, reason: Option<&str>) {
        *self.reject_sends.lock().await = reason.map(str::to_string);
    }

    /// Make every `static_call` fail until cleared.
    pub fn fail_static_calls(&self, fail: bool) {
        self.fail_static_calls.store(fail, Ordering::SeqCst);
    }

    /// Transactions submitted so far, in order, including rejected ones.
    pub async fn sent(&self) -> Vec<(Address, ContractCall)> {
        self.sent.lock().await.clone()
    }

    pub async fn static_calls(&self) -> Vec<(Address, ContractCall)> {
        self.static_calls.lock().await.clone()
    }

    pub async fn send_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    async fn wait_while_paused(&self) {
        loop {
            let resumed = self.resumed.notified();
            if !self.paused.load(Ordering::SeqCst) {
                return;
            }
            tokio::select! {
                _ = resumed => {}
                permit = self.released.acquire() => {
                    if let Ok(permit) = permit {
                        permit.forget();
                        return;
                    }
                }
            }
        }
    }

    async fn verify_input(&self, from: Address, field: &EncryptedField) -> Result<(), ChainError> {
        let expected = proof_for(self.contract, from, &[field.handle]);
        if field.proof != expected || self.ledger.value(field.handle).await.is_none() {
            return Err(revert("invalid input proof"));
        }
        Ok(())
    }

    async fn attribute(&self, handle: Option<CiphertextHandle>) -> u128 {
        match handle {
            Some(handle) => self
                .ledger
                .value(handle)
                .await
                .map(|v| v.as_u128())
                .unwrap_or(0),
            None => 0,
        }
    }

    async fn evaluate(&self, from: Address, predicate: AccessPredicate) -> bool {
        let identity = self.ledger.identity(from).await;
        let [age, credit, tier] = match identity {
            Some([age, credit, tier]) => [Some(age), Some(credit), Some(tier)],
            None => [None, None, None],
        };

        match predicate {
            AccessPredicate::IsAdult => self.attribute(age).await >= ADULT_AGE,
            AccessPredicate::IsVip => {
                self.attribute(credit).await > VIP_CREDIT_FLOOR
                    || self.attribute(tier).await == VIP_TIER
            }
        }
    }

    async fn execute(&self, from: Address, call: &ContractCall) -> Result<(), ChainError> {
        if let ContractCall::SetIdentity {
            age,
            credit_score,
            membership_tier,
        } = call
        {
            for field in [age, credit_score, membership_tier] {
                self.verify_input(from, field).await?;
            }
            let handles = [age.handle, credit_score.handle, membership_tier.handle];
            for handle in handles {
                self.ledger.allow(handle, from).await;
                self.ledger.allow(handle, self.contract).await;
            }
            self.ledger.set_identity(from, handles).await;
        } else if let Some(predicate) = check_predicate(call) {
            let verdict = self.evaluate(from, predicate).await;
            let handle = self
                .ledger
                .mint(ClearValue::Bool(verdict), &[from, self.contract])
                .await;
            self.ledger.set_result(from, predicate, handle).await;
        }
        // getters change nothing
        Ok(())
    }
}

fn check_predicate(call: &ContractCall) -> Option<AccessPredicate> {
    match call {
        ContractCall::CheckIsAdult => Some(AccessPredicate::IsAdult),
        ContractCall::CheckIsVip => Some(AccessPredicate::IsVip),
        _ => None,
    }
}

fn revert(reason: &str) -> ChainError {
    ChainError::Rpc {
        code: 3,
        message: format!("execution reverted: {}", reason),
    }
}

#[async_trait]
impl ChainClient for SimulatedChain {
    fn contract_address(&self) -> Address {
        self.contract
    }

    async fn send(&self, from: Address, call: ContractCall) -> Result<TxReceipt, ChainError> {
        self.sent.lock().await.push((from, call.clone()));
        self.wait_while_paused().await;

        if let Some(reason) = self.reject_sends.lock().await.clone() {
            return Err(ChainError::Rejected(reason));
        }

        self.execute(from, &call).await?;

        let block_number = self.block_number.fetch_add(1, Ordering::SeqCst) + 1;
        let tx_hash = B256::from(rand::random::<[u8; 32]>());
        debug!(method = call.method_name(), block_number, "Simulated transaction mined");

        Ok(TxReceipt {
            tx_hash,
            block_number,
        })
    }

    async fn static_call(&self, from: Address, call: ContractCall) -> Result<Bytes, ChainError> {
        self.static_calls.lock().await.push((from, call.clone()));

        if self.fail_static_calls.load(Ordering::SeqCst) {
            return Err(ChainError::Transport("node unreachable".to_string()));
        }

        let handle = match (&call, check_predicate(&call)) {
            (_, Some(predicate)) => match self.ledger.result(from, predicate).await {
                Some(handle) => handle,
                // a fresh evaluation nobody was allowed to decrypt
                None => {
                    let verdict = self.evaluate(from, predicate).await;
                    self.ledger
                        .mint(ClearValue::Bool(verdict), &[self.contract])
                        .await
                }
            },
            (ContractCall::SetIdentity { .. }, None) => {
                return Err(revert("setIdentity returns nothing"))
            }
            (getter, None) => {
                let index = match getter {
                    ContractCall::GetAge => 0,
                    ContractCall::GetCreditScore => 1,
                    _ => 2,
                };
                self.ledger
                    .identity(from)
                    .await
                    .map(|handles| handles[index])
                    .unwrap_or(CiphertextHandle::EMPTY)
            }
        };

        Ok(Bytes::from(handle.0.abi_encode()))
    }
}

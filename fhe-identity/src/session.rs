//! Session context for identity workflows.
//!
//! A [`Session`] owns everything the workflows share: the wallet binding,
//! gateway readiness, the submitted identity, per-scenario verification
//! state and the activity log. Workflow functions take `&Session`.

use alloy_primitives::Address;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};

use crate::activity::{ActivityCategory, ActivityLog, ActivityStatus};
use crate::chain::ChainClient;
use crate::config::IdentityConfig;
use crate::error::{SessionError, VerificationError};
use crate::gateway::{FheGateway, GatewayError};
use crate::scenario::ScenarioId;
use crate::types::{short_address, IdentitySet};
use crate::verification::{CheckTicket, VerificationBoard, VerificationStatus};
use crate::wallet::WalletSigner;

#[derive(Debug, Default)]
struct SessionState {
    wallet: Option<Address>,
    identity: Option<IdentitySet>,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub wallet: Option<Address>,
    pub gateway_ready: bool,
    pub contract: Address,
    pub identity: Option<IdentitySet>,
    pub verifications: VerificationBoard,
}

/// Shared context for one user's interaction with the identity contract.
pub struct Session {
    config: IdentityConfig,
    gateway: Arc<dyn FheGateway>,
    chain: Arc<dyn ChainClient>,
    signer: Arc<dyn WalletSigner>,
    gateway_ready: OnceCell<()>,
    state: RwLock<SessionState>,
    verifications: RwLock<VerificationBoard>,
    activity: ActivityLog,
}

impl Session {
    pub fn new(
        config: IdentityConfig,
        gateway: Arc<dyn FheGateway>,
        chain: Arc<dyn ChainClient>,
        signer: Arc<dyn WalletSigner>,
    ) -> Self {
        if chain.contract_address() != config.contract_address {
            warn!(
                configured = %config.contract_address,
                bound = %chain.contract_address(),
                "Chain client bound to a different contract than configured"
            );
        }

        Self {
            config,
            gateway,
            chain,
            signer,
            gateway_ready: OnceCell::new(),
            state: RwLock::new(SessionState::default()),
            verifications: RwLock::new(VerificationBoard::new()),
            activity: ActivityLog::new(),
        }
    }

    /// Request wallet access, bind the first account and ready the gateway.
    ///
    /// Switching to a different account drops the previous account's
    /// identity and verification state.
    pub async fn connect(&self) -> Result<Address, SessionError> {
        self.activity
            .append(ActivityCategory::Wallet, "Connecting...", ActivityStatus::Pending)
            .await;

        match self.try_connect().await {
            Ok(account) => Ok(account),
            Err(e) => {
                warn!(error = %e, "Connect failed");
                self.log_error(e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn try_connect(&self) -> Result<Address, SessionError> {
        let accounts = self.signer.request_accounts().await?;
        let account = *accounts.first().ok_or(SessionError::NoAccounts)?;

        {
            let mut state = self.state.write().await;
            if state.wallet.is_some_and(|previous| previous != account) {
                state.identity = None;
                *self.verifications.write().await = VerificationBoard::new();
            }
            state.wallet = Some(account);
        }

        info!(account = %account, "Wallet connected");
        self.activity
            .append(
                ActivityCategory::Wallet,
                format!("Connected: {}", short_address(&account)),
                ActivityStatus::Success,
            )
            .await;

        self.ensure_gateway_ready().await?;
        self.activity
            .append(
                ActivityCategory::Gateway,
                "FHEVM & Contract Ready",
                ActivityStatus::Success,
            )
            .await;

        Ok(account)
    }

    /// Unbind the wallet and clear identity and verification state.
    ///
    /// Gateway readiness and the activity log survive.
    pub async fn disconnect(&self) {
        {
            let mut state = self.state.write().await;
            state.wallet = None;
            state.identity = None;
            *self.verifications.write().await = VerificationBoard::new();
        }

        info!("Wallet disconnected");
        self.activity
            .append(ActivityCategory::Wallet, "Disconnected", ActivityStatus::Pending)
            .await;
    }

    /// Initialize the gateway once per session.
    ///
    /// Concurrent callers share one initialization. A failed attempt leaves
    /// the gateway uninitialized so the next call retries.
    pub async fn ensure_gateway_ready(&self) -> Result<(), GatewayError> {
        self.gateway_ready
            .get_or_try_init(|| async {
                info!(gateway = self.gateway.id(), "Initializing FHE gateway");
                self.gateway.initialize().await
            })
            .await?;
        Ok(())
    }

    pub fn is_gateway_ready(&self) -> bool {
        self.gateway_ready.initialized()
    }

    pub async fn wallet(&self) -> Option<Address> {
        self.state.read().await.wallet
    }

    pub async fn identity(&self) -> Option<IdentitySet> {
        self.state.read().await.identity.clone()
    }

    pub async fn verification_status(&self, scenario: &ScenarioId) -> VerificationStatus {
        self.verifications.read().await.status(scenario)
    }

    /// Current verification board.
    pub async fn verifications(&self) -> VerificationBoard {
        self.verifications.read().await.clone()
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Contract the chain client is bound to.
    pub fn contract_address(&self) -> Address {
        self.chain.contract_address()
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            wallet: state.wallet,
            gateway_ready: self.is_gateway_ready(),
            contract: self.contract_address(),
            identity: state.identity.clone(),
            verifications: self.verifications.read().await.clone(),
        }
    }

    pub(crate) fn gateway(&self) -> &dyn FheGateway {
        self.gateway.as_ref()
    }

    pub(crate) fn chain(&self) -> &dyn ChainClient {
        self.chain.as_ref()
    }

    pub(crate) fn signer(&self) -> &dyn WalletSigner {
        self.signer.as_ref()
    }

    /// Store a submitted identity if `owner` is still the bound wallet.
    pub(crate) async fn store_identity(&self, owner: Address, identity: IdentitySet) -> bool {
        let mut state = self.state.write().await;
        if state.wallet != Some(owner) {
            return false;
        }
        state.identity = Some(identity);
        true
    }

    pub(crate) async fn begin_verification(
        &self,
        scenario: &ScenarioId,
        owner: Address,
    ) -> Result<CheckTicket, VerificationError> {
        let mut board = self.verifications.write().await;
        let (next, ticket) = board.begin(scenario, owner)?;
        *board = next;
        Ok(ticket)
    }

    /// Settle the check `ticket` started. Returns false if it was superseded.
    pub(crate) async fn resolve_verification(&self, ticket: &CheckTicket, granted: bool) -> bool {
        let mut board = self.verifications.write().await;
        match board.resolve(ticket, granted) {
            Some(next) => {
                *board = next;
                true
            }
            None => false,
        }
    }

    pub(crate) async fn reset_verification(&self, ticket: &CheckTicket) {
        let mut board = self.verifications.write().await;
        if let Some(next) = board.reset(ticket) {
            *board = next;
        }
    }

    pub(crate) async fn log_error(&self, detail: impl std::fmt::Display) {
        self.activity
            .append(
                ActivityCategory::Error,
                format!("Error: {}", detail),
                ActivityStatus::Error,
            )
            .await;
    }
}

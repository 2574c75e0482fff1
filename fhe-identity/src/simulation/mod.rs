//! In-process simulation of the gateway, contract and wallet.
//!
//! All three share one [`SimulatedLedger`], so ciphertexts produced by the
//! gateway are understood by the contract and vice versa. Useful for
//! development without a relayer and for tests.

pub mod chain;
pub mod gateway;
pub mod ledger;
pub mod wallet;

pub use chain::SimulatedChain;
pub use gateway::SimulatedGateway;
pub use ledger::SimulatedLedger;
pub use wallet::SimulatedWallet;

use alloy_primitives::Address;
use std::sync::Arc;

use crate::config::IdentityConfig;
use crate::session::Session;

/// A wired set of simulated collaborators.
///
/// Fields stay accessible after [`session`](Self::session) so tests can
/// inject failures and inspect calls.
pub struct Simulation {
    pub config: IdentityConfig,
    pub ledger: Arc<SimulatedLedger>,
    pub gateway: Arc<SimulatedGateway>,
    pub chain: Arc<SimulatedChain>,
    pub wallet: Arc<SimulatedWallet>,
}

impl Simulation {
    /// Simulation with one random wallet account.
    pub fn new(config: IdentityConfig) -> Self {
        Self::with_wallet(config, SimulatedWallet::random())
    }

    pub fn with_accounts(config: IdentityConfig, accounts: Vec<Address>) -> Self {
        Self::with_wallet(config, SimulatedWallet::new(accounts))
    }

    fn with_wallet(config: IdentityConfig, wallet: SimulatedWallet) -> Self {
        let ledger = Arc::new(SimulatedLedger::new());
        let gateway = Arc::new(SimulatedGateway::new(ledger.clone(), config.chain_id));
        let chain = Arc::new(SimulatedChain::new(config.contract_address, ledger.clone()));

        Self {
            config,
            ledger,
            gateway,
            chain,
            wallet: Arc::new(wallet),
        }
    }

    /// New session over these collaborators.
    pub fn session(&self) -> Session {
        Session::new(
            self.config.clone(),
            self.gateway.clone(),
            self.chain.clone(),
            self.wallet.clone(),
        )
    }
}

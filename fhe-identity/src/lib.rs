//! FHE Identity - Confidential Identity Workflows
//!
//! Client-side orchestration for an identity contract that stores attributes
//! as fully-homomorphic ciphertexts:
//! - Encrypt age, credit score and membership tier through an FHE gateway
//! - Submit all three ciphertexts and their input proofs in one transaction
//! - Run homomorphic access checks ("is adult", "is VIP") on chain
//! - Decrypt the boolean result through a wallet-signed, time-boxed request
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Session                     │
//! │  wallet binding · identity · verifications   │
//! │  activity log · gateway readiness            │
//! └───────────────────┬──────────────────────────┘
//!                     │  submit_identity / verify_access / reveal_attribute
//!      ┌──────────────┼──────────────────┐
//!      ▼              ▼                  ▼
//! ┌───────────┐ ┌─────────────┐  ┌──────────────┐
//! │ FheGateway│ │ ChainClient │  │ WalletSigner │
//! │ (relayer) │ │ (JSON-RPC)  │  │ (EIP-712)    │
//! └───────────┘ └─────────────┘  └──────────────┘
//! ```
//!
//! Every collaborator is a trait object, so the workflows run unchanged
//! against a real relayer and node or against the in-process
//! [`simulation`] backends.
//!
//! # Example
//!
//! ```ignore
//! use fhe_identity::{simulation::Simulation, IdentityConfig, ScenarioId};
//! use fhe_identity::workflow::{submit_identity, verify_access};
//!
//! let sim = Simulation::new(IdentityConfig::default());
//! let session = sim.session();
//!
//! session.connect().await?;
//! submit_identity(&session, "25", "750", "1").await?;
//!
//! let granted = verify_access(&session, &ScenarioId::new("club-access")).await?;
//! ```

pub mod activity;
pub mod chain;
pub mod config;
pub mod error;
pub mod gateway;
pub mod scenario;
pub mod session;
pub mod simulation;
pub mod types;
pub mod verification;
pub mod wallet;
pub mod workflow;

// Re-export main types for convenience
pub use activity::{ActivityCategory, ActivityEntry, ActivityLog, ActivityStatus};
pub use chain::{ChainClient, ChainError, ContractCall, JsonRpcChainClient, TxReceipt};
pub use config::{AttributeBounds, IdentityBounds, IdentityConfig};
pub use error::{DecryptionError, SessionError, SubmissionError, VerificationError};
pub use gateway::{DecryptionGateway, EncryptionGateway, FheGateway, GatewayError};
pub use scenario::{AccessPredicate, Comparison, Scenario, ScenarioId, SCENARIOS};
pub use session::{Session, SessionSnapshot};
pub use types::*;
pub use verification::{CheckTicket, VerificationBoard, VerificationRequest, VerificationStatus};
pub use wallet::{JsonRpcWallet, WalletError, WalletSigner};
pub use workflow::{reveal_attribute, submit_identity, verify_access};

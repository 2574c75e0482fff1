//! Chain client abstraction.
//!
//! The identity contract is reached through the `ChainClient` trait:
//! - `JsonRpcChainClient` talks to an Ethereum node over JSON-RPC
//! - `SimulatedChain` (in [`crate::simulation`]) runs the contract in memory

pub mod json_rpc;
pub mod traits;

pub use json_rpc::JsonRpcChainClient;
pub use traits::{ChainClient, ChainError, ContractCall, IPrivateIdentity, TxReceipt};

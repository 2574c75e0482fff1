//! Wallet signer abstraction.
//!
//! The wallet grants account access and signs the EIP-712 payload that
//! authorizes a user decryption.

pub mod json_rpc;
pub mod traits;

pub use json_rpc::JsonRpcWallet;
pub use traits::{WalletError, WalletSigner};

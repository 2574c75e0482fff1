//! Core trait for reaching the identity contract.

use alloy::sol;
use alloy::sol_types::SolCall;
use alloy::transports::TransportError;
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{CiphertextHandle, EncryptedField};

// Contract bindings
sol! {
    interface IPrivateIdentity {
        function setIdentity(
            bytes32 inputAge,
            bytes ageProof,
            bytes32 inputCredit,
            bytes creditProof,
            bytes32 inputTier,
            bytes tierProof
        ) external;

        function checkIsAdult() external returns (bytes32);
        function checkIsVIP() external returns (bytes32);

        function getAge() external view returns (bytes32);
        function getCreditScore() external view returns (bytes32);
        function getTier() external view returns (bytes32);
    }
}

/// Errors from the contract endpoint. Propagated to callers unmodified.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Endpoint could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// Endpoint returned a JSON-RPC error (includes execution reverts)
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Transaction was refused before inclusion
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Transaction was included but reverted
    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },

    /// Endpoint URL could not be parsed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Endpoint answered with something unexpected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<TransportError> for ChainError {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => ChainError::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            },
            None if err.is_transport_error() => ChainError::Transport(err.to_string()),
            None => ChainError::InvalidResponse(err.to_string()),
        }
    }
}

/// A call against the identity contract's fixed ABI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractCall {
    /// `setIdentity(h1, p1, h2, p2, h3, p3)`, positional order age, credit, tier
    SetIdentity {
        age: EncryptedField,
        credit_score: EncryptedField,
        membership_tier: EncryptedField,
    },
    /// `checkIsAdult()`, returns an encrypted boolean handle
    CheckIsAdult,
    /// `checkIsVIP()`, returns an encrypted boolean handle
    CheckIsVip,
    /// `getAge()`
    GetAge,
    /// `getCreditScore()`
    GetCreditScore,
    /// `getTier()`
    GetTier,
}

impl ContractCall {
    /// ABI method name.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::SetIdentity { .. } => "setIdentity",
            Self::CheckIsAdult => "checkIsAdult",
            Self::CheckIsVip => "checkIsVIP",
            Self::GetAge => "getAge",
            Self::GetCreditScore => "getCreditScore",
            Self::GetTier => "getTier",
        }
    }

    /// ABI-encoded calldata.
    pub fn encode(&self) -> Bytes {
        use IPrivateIdentity::*;

        let data = match self {
            Self::SetIdentity {
                age,
                credit_score,
                membership_tier,
            } => setIdentityCall {
                inputAge: age.handle.0,
                ageProof: age.proof.0.clone(),
                inputCredit: credit_score.handle.0,
                creditProof: credit_score.proof.0.clone(),
                inputTier: membership_tier.handle.0,
                tierProof: membership_tier.proof.0.clone(),
            }
            .abi_encode(),
            Self::CheckIsAdult => checkIsAdultCall {}.abi_encode(),
            Self::CheckIsVip => checkIsVIPCall {}.abi_encode(),
            Self::GetAge => getAgeCall {}.abi_encode(),
            Self::GetCreditScore => getCreditScoreCall {}.abi_encode(),
            Self::GetTier => getTierCall {}.abi_encode(),
        };
        Bytes::from(data)
    }

    /// Decode the `bytes32` handle this call returns.
    pub fn decode_handle(&self, output: &[u8]) -> Result<CiphertextHandle, ChainError> {
        use IPrivateIdentity::*;

        let word = match self {
            Self::SetIdentity { .. } => {
                return Err(ChainError::InvalidResponse(
                    "setIdentity returns no value".to_string(),
                ))
            }
            Self::CheckIsAdult => checkIsAdultCall::abi_decode_returns(output),
            Self::CheckIsVip => checkIsVIPCall::abi_decode_returns(output),
            Self::GetAge => getAgeCall::abi_decode_returns(output),
            Self::GetCreditScore => getCreditScoreCall::abi_decode_returns(output),
            Self::GetTier => getTierCall::abi_decode_returns(output),
        }
        .map_err(|e| {
            ChainError::InvalidResponse(format!("{} return data: {}", self.method_name(), e))
        })?;

        Ok(CiphertextHandle(word))
    }
}

/// Receipt of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
}

impl TxReceipt {
    /// Abbreviated hash for log lines (`0x12345678...`).
    pub fn short_hash(&self) -> String {
        format!("0x{}...", &hex::encode(self.tx_hash)[..8])
    }
}

/// Remote endpoint for the identity contract.
///
/// Implementations are bound to one contract address.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the bound contract.
    fn contract_address(&self) -> Address;

    /// Submit a state-changing transaction from `from` and wait for inclusion.
    ///
    /// No timeout is applied; callers wanting one wrap the future. A
    /// reverted transaction is reported as [`ChainError::Reverted`].
    async fn send(&self, from: Address, call: ContractCall) -> Result<TxReceipt, ChainError>;

    /// Execute `call` read-only and return the raw ABI return data.
    async fn static_call(&self, from: Address, call: ContractCall) -> Result<Bytes, ChainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolValue;
    use crate::types::InputProof;

    fn field(byte: u8, proof: &[u8]) -> EncryptedField {
        EncryptedField {
            handle: CiphertextHandle(B256::repeat_byte(byte)),
            proof: InputProof(Bytes::copy_from_slice(proof)),
        }
    }

    #[test]
    fn test_set_identity_encodes_positional_order() {
        let call = ContractCall::SetIdentity {
            age: field(0x01, &[0xa1]),
            credit_score: field(0x02, &[0xb1, 0xb2]),
            membership_tier: field(0x03, &[0xc1]),
        };
        let data = call.encode();
        assert_eq!(&data[..4], &IPrivateIdentity::setIdentityCall::SELECTOR);

        let decoded = IPrivateIdentity::setIdentityCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.inputAge, B256::repeat_byte(0x01));
        assert_eq!(decoded.inputCredit, B256::repeat_byte(0x02));
        assert_eq!(decoded.inputTier, B256::repeat_byte(0x03));
        assert_eq!(&decoded.ageProof[..], &[0xa1]);
        assert_eq!(&decoded.creditProof[..], &[0xb1, 0xb2]);
        assert_eq!(&decoded.tierProof[..], &[0xc1]);
    }

    #[test]
    fn test_argumentless_calls_are_bare_selectors() {
        for call in [
            ContractCall::CheckIsAdult,
            ContractCall::CheckIsVip,
            ContractCall::GetAge,
            ContractCall::GetCreditScore,
            ContractCall::GetTier,
        ] {
            assert_eq!(call.encode().len(), 4, "{}", call.method_name());
        }
        assert_eq!(
            &ContractCall::CheckIsVip.encode()[..],
            &IPrivateIdentity::checkIsVIPCall::SELECTOR
        );
    }

    #[test]
    fn test_decode_handle() {
        let word = B256::repeat_byte(0x42);
        let output = word.abi_encode();

        let handle = ContractCall::CheckIsAdult.decode_handle(&output).unwrap();
        assert_eq!(handle, CiphertextHandle(word));

        let err = ContractCall::GetTier.decode_handle(&output[..31]).unwrap_err();
        assert!(matches!(err, ChainError::InvalidResponse(_)));

        let zero = B256::ZERO.abi_encode();
        assert!(ContractCall::GetAge.decode_handle(&zero).unwrap().is_empty());
        assert!(ContractCall::SetIdentity {
            age: field(1, &[]),
            credit_score: field(2, &[]),
            membership_tier: field(3, &[]),
        }
        .decode_handle(&output)
        .is_err());
    }

    #[test]
    fn test_receipt_short_hash() {
        let receipt = TxReceipt {
            tx_hash: B256::repeat_byte(0xcd),
            block_number: 1,
        };
        assert_eq!(receipt.short_hash(), "0xcdcdcdcd...");
    }
}

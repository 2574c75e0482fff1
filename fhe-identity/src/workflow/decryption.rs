//! User decryption: ephemeral keypair, signed EIP-712 authorization, relayer call.

use alloy_primitives::Address;
use chrono::Utc;
use tracing::debug;

use crate::error::DecryptionError;
use crate::gateway::{HandleContractPair, Keypair, UserDecryptRequest};
use crate::session::Session;
use crate::types::{CiphertextHandle, ClearValue, Eip712Payload};

/// A signed, time-boxed permission to decrypt handles of listed contracts.
#[derive(Debug, Clone)]
pub struct DecryptionAuthorization {
    pub keypair: Keypair,
    pub payload: Eip712Payload,
    /// Wallet signature, `0x`-prefixed
    pub signature: String,
    pub contract_addresses: Vec<Address>,
    /// Unix seconds
    pub start_timestamp: u64,
    pub duration_days: u32,
}

impl DecryptionAuthorization {
    /// Build the relayer request for `handles` on behalf of `requester`.
    pub fn into_request(
        self,
        handles: Vec<HandleContractPair>,
        requester: Address,
    ) -> UserDecryptRequest {
        let signature = self
            .signature
            .strip_prefix("0x")
            .unwrap_or(&self.signature)
            .to_string();

        UserDecryptRequest {
            handles,
            private_key: self.keypair.private_key,
            public_key: self.keypair.public_key,
            signature,
            contract_addresses: self.contract_addresses,
            requester,
            start_timestamp: self.start_timestamp,
            duration_days: self.duration_days,
        }
    }
}

/// Have `user` sign a fresh decryption authorization for the session's contract.
///
/// Valid from now for the configured number of days.
pub async fn authorize_decryption(
    session: &Session,
    user: Address,
) -> Result<DecryptionAuthorization, DecryptionError> {
    let gateway = session.gateway();
    let keypair = gateway.generate_keypair();
    let contract_addresses = vec![session.contract_address()];
    let start_timestamp = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    let duration_days = session.config().decryption_validity_days;

    let payload = gateway.create_eip712(
        &keypair.public_key,
        &contract_addresses,
        start_timestamp,
        duration_days,
    );
    let signature = session.signer().sign_typed_data(user, &payload).await?;

    debug!(user = %user, start_timestamp, duration_days, "Decryption authorized");
    Ok(DecryptionAuthorization {
        keypair,
        payload,
        signature,
        contract_addresses,
        start_timestamp,
        duration_days,
    })
}

/// Decrypt one handle held by the session's contract.
pub async fn decrypt_handle(
    session: &Session,
    user: Address,
    handle: CiphertextHandle,
) -> Result<ClearValue, DecryptionError> {
    if handle.is_empty() {
        return Err(DecryptionError::EmptyHandle);
    }

    let authorization = authorize_decryption(session, user).await?;
    let handles = vec![HandleContractPair {
        handle,
        contract_address: session.contract_address(),
    }];
    let request = authorization.into_request(handles, user);

    let mut values = session.gateway().user_decrypt(request).await?;
    values
        .remove(&handle)
        .ok_or(DecryptionError::MissingResult(handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentityConfig;
    use crate::gateway::PrivateKey;
    use crate::simulation::Simulation;

    #[test]
    fn test_request_strips_signature_prefix() {
        let authorization = DecryptionAuthorization {
            keypair: Keypair {
                public_key: "pub".to_string(),
                private_key: PrivateKey::new("priv"),
            },
            payload: Eip712Payload {
                domain: serde_json::Value::Null,
                types: serde_json::Value::Null,
                primary_type: "UserDecryptRequestVerification".to_string(),
                message: serde_json::Value::Null,
            },
            signature: "0xabcdef".to_string(),
            contract_addresses: vec![Address::repeat_byte(0x01)],
            start_timestamp: 1_700_000_000,
            duration_days: 10,
        };

        let request = authorization.into_request(Vec::new(), Address::repeat_byte(0x02));
        assert_eq!(request.signature, "abcdef");
        assert_eq!(request.public_key, "pub");
        assert_eq!(request.private_key.expose(), "priv");
        assert_eq!(request.duration_days, 10);
    }

    #[tokio::test]
    async fn test_authorization_uses_config_window() {
        let config = IdentityConfig::default().with_decryption_validity_days(3);
        let sim = Simulation::new(config);
        let session = sim.session();
        let user = session.connect().await.unwrap();

        let authorization = authorize_decryption(&session, user).await.unwrap();
        assert_eq!(authorization.duration_days, 3);
        assert_eq!(authorization.contract_addresses, vec![session.contract_address()]);
        assert!(authorization.signature.starts_with("0x"));
        assert!(authorization.start_timestamp > 0);
        assert_eq!(sim.wallet.sign_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_handle_rejected_without_signing() {
        let sim = Simulation::new(IdentityConfig::default());
        let session = sim.session();
        let user = session.connect().await.unwrap();

        let err = decrypt_handle(&session, user, CiphertextHandle::EMPTY)
            .await
            .unwrap_err();
        assert!(matches!(err, DecryptionError::EmptyHandle));
        assert_eq!(sim.wallet.sign_count(), 0);
    }
}

//! Decrypt a stored attribute for its owner.

use alloy_primitives::Address;
use tracing::warn;

use super::decryption::decrypt_handle;
use crate::activity::{ActivityCategory, ActivityStatus};
use crate::error::VerificationError;
use crate::session::Session;
use crate::types::{AttributeKey, ClearValue};

/// Read the stored handle for `key` and decrypt it with the wallet's authorization.
///
/// Session state is not modified apart from the activity log.
pub async fn reveal_attribute(
    session: &Session,
    key: AttributeKey,
) -> Result<ClearValue, VerificationError> {
    let Some(user) = session.wallet().await else {
        session.log_error(VerificationError::NoWallet).await;
        return Err(VerificationError::NoWallet);
    };

    match try_reveal(session, user, key).await {
        Ok(value) => {
            session
                .activity()
                .append(
                    ActivityCategory::Decryption,
                    format!("Revealed {}", key.label()),
                    ActivityStatus::Success,
                )
                .await;
            Ok(value)
        }
        Err(e) => {
            warn!(attribute = key.as_str(), error = %e, "Reveal failed");
            session.log_error(&e).await;
            Err(e)
        }
    }
}

async fn try_reveal(
    session: &Session,
    user: Address,
    key: AttributeKey,
) -> Result<ClearValue, VerificationError> {
    session
        .ensure_gateway_ready()
        .await
        .map_err(VerificationError::Gateway)?;

    let call = key.getter();
    let output = session.chain().static_call(user, call.clone()).await?;
    let handle = call.decode_handle(&output)?;

    Ok(decrypt_handle(session, user, handle).await?)
}

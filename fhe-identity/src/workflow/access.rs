//! Access verification: run the scenario's predicate on chain, decrypt the verdict.

use alloy_primitives::Address;
use tracing::{debug, info, warn};

use super::decryption::decrypt_handle;
use crate::activity::{ActivityCategory, ActivityStatus};
use crate::error::VerificationError;
use crate::scenario::{AccessPredicate, ScenarioId};
use crate::session::Session;

/// Check whether the connected wallet's identity satisfies `scenario`.
///
/// Returns `Ok(true)` for granted and `Ok(false)` for denied. Any failure
/// after the check starts returns the scenario to idle. At most one check
/// per scenario runs at a time. A result that arrives after the scenario was
/// cleared or restarted is returned to the caller but not recorded.
pub async fn verify_access(
    session: &Session,
    scenario: &ScenarioId,
) -> Result<bool, VerificationError> {
    let Some(user) = session.wallet().await else {
        session.log_error(VerificationError::NoWallet).await;
        return Err(VerificationError::NoWallet);
    };

    let predicate = AccessPredicate::for_scenario(scenario);

    let ticket = match session.begin_verification(scenario, user).await {
        Ok(ticket) => ticket,
        Err(e) => {
            debug!(scenario = %scenario, "Verification already running");
            session.log_error(&e).await;
            return Err(e);
        }
    };

    session
        .activity()
        .append(
            ActivityCategory::AccessCheck,
            format!("Starting check: {}", predicate.method_name()),
            ActivityStatus::Pending,
        )
        .await;

    match run_check(session, user, predicate).await {
        Ok(granted) => {
            if !session.resolve_verification(&ticket, granted).await {
                debug!(scenario = %scenario, check_id = %ticket.check_id, "Discarding superseded result");
                return Ok(granted);
            }

            info!(scenario = %scenario, user = %user, granted, "Access check complete");
            let (detail, status) = if granted {
                ("Result: GRANTED", ActivityStatus::Success)
            } else {
                ("Result: DENIED", ActivityStatus::Error)
            };
            session
                .activity()
                .append(ActivityCategory::Decryption, detail, status)
                .await;

            Ok(granted)
        }
        Err(e) => {
            session.reset_verification(&ticket).await;
            warn!(scenario = %scenario, error = %e, "Access check failed");
            session.log_error(&e).await;
            Err(e)
        }
    }
}

async fn run_check(
    session: &Session,
    user: Address,
    predicate: AccessPredicate,
) -> Result<bool, VerificationError> {
    session
        .ensure_gateway_ready()
        .await
        .map_err(VerificationError::Gateway)?;

    let call = predicate.contract_call();
    let receipt = session.chain().send(user, call.clone()).await?;
    debug!(method = predicate.method_name(), tx_hash = %receipt.tx_hash, "Check transaction mined");

    let output = session.chain().static_call(user, call.clone()).await?;
    let handle = call.decode_handle(&output)?;

    let verdict = decrypt_handle(session, user, handle).await?;
    Ok(verdict.is_truthy())
}

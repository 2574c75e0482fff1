//! Identity submission: validate, encrypt each attribute, store in one transaction.

use alloy_primitives::Address;
use chrono::Utc;
use std::num::{IntErrorKind, ParseIntError};
use tracing::{debug, info, warn};

use crate::activity::{ActivityCategory, ActivityStatus};
use crate::chain::ContractCall;
use crate::config::{AttributeBounds, IdentityBounds};
use crate::error::SubmissionError;
use crate::gateway::{FheGateway, GatewayError};
use crate::session::Session;
use crate::types::{
    AttributeKey, EncryptedField, IdentityAttribute, IdentitySet, PlaintextIdentity,
};

/// Parse and range-check raw inputs, in the order age, credit score, tier.
///
/// Stops at the first invalid field.
pub fn validate_inputs(
    bounds: &IdentityBounds,
    raw_age: &str,
    raw_credit_score: &str,
    raw_membership_tier: &str,
) -> Result<PlaintextIdentity, SubmissionError> {
    Ok(PlaintextIdentity {
        age: parse_field(AttributeKey::Age, bounds.age, raw_age)?,
        credit_score: parse_field(AttributeKey::CreditScore, bounds.credit_score, raw_credit_score)?,
        membership_tier: parse_field(
            AttributeKey::MembershipTier,
            bounds.membership_tier,
            raw_membership_tier,
        )?,
    })
}

fn parse_field(key: AttributeKey, bounds: AttributeBounds, raw: &str) -> Result<u32, SubmissionError> {
    let invalid = |constraint: String| SubmissionError::Validation {
        field: key,
        constraint,
    };

    let value: i64 = raw.trim().parse().map_err(|e: ParseIntError| match e.kind() {
        // well-formed but too large for any bound
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => invalid(bounds.constraint()),
        _ => invalid("must be an integer".to_string()),
    })?;

    if !bounds.contains(value) {
        return Err(invalid(bounds.constraint()));
    }

    u32::try_from(value).map_err(|_| invalid(bounds.constraint()))
}

/// Encrypt and store the three identity attributes for the connected wallet.
///
/// Nothing is stored in the session unless the transaction is mined.
pub async fn submit_identity(
    session: &Session,
    raw_age: &str,
    raw_credit_score: &str,
    raw_membership_tier: &str,
) -> Result<IdentitySet, SubmissionError> {
    let Some(user) = session.wallet().await else {
        session.log_error(SubmissionError::NoWallet).await;
        return Err(SubmissionError::NoWallet);
    };

    let plaintext = match validate_inputs(
        &session.config().bounds,
        raw_age,
        raw_credit_score,
        raw_membership_tier,
    ) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            session
                .activity()
                .append(ActivityCategory::Validation, e.to_string(), ActivityStatus::Error)
                .await;
            return Err(e);
        }
    };

    match submit_validated(session, user, plaintext).await {
        Ok(identity) => Ok(identity),
        Err(e) => {
            warn!(user = %user, error = %e, "Identity submission failed");
            session.log_error(&e).await;
            Err(e)
        }
    }
}

async fn submit_validated(
    session: &Session,
    user: Address,
    plaintext: PlaintextIdentity,
) -> Result<IdentitySet, SubmissionError> {
    session
        .ensure_gateway_ready()
        .await
        .map_err(SubmissionError::Encryption)?;

    session
        .activity()
        .append(ActivityCategory::Encryption, "Encrypting inputs...", ActivityStatus::Pending)
        .await;

    let contract = session.contract_address();
    let gateway = session.gateway();
    let age = encrypt_attribute(gateway, contract, user, AttributeKey::Age, plaintext.age).await?;
    let credit_score = encrypt_attribute(
        gateway,
        contract,
        user,
        AttributeKey::CreditScore,
        plaintext.credit_score,
    )
    .await?;
    let membership_tier = encrypt_attribute(
        gateway,
        contract,
        user,
        AttributeKey::MembershipTier,
        plaintext.membership_tier,
    )
    .await?;

    let handles = [age.handle, credit_score.handle, membership_tier.handle];

    session
        .activity()
        .append(ActivityCategory::Transaction, "Sending transaction...", ActivityStatus::Pending)
        .await;

    let receipt = session
        .chain()
        .send(
            user,
            ContractCall::SetIdentity {
                age,
                credit_score,
                membership_tier,
            },
        )
        .await?;

    session
        .activity()
        .append(
            ActivityCategory::Transaction,
            format!("Mined: {}", receipt.short_hash()),
            ActivityStatus::Success,
        )
        .await;

    let created_at = Utc::now();
    let bounds = session.config().bounds;
    let attribute = |key: AttributeKey, index: usize| {
        IdentityAttribute::new(key, bounds.for_key(key), plaintext.get(key), handles[index], created_at)
    };
    let identity = IdentitySet {
        age: attribute(AttributeKey::Age, 0),
        credit_score: attribute(AttributeKey::CreditScore, 1),
        membership_tier: attribute(AttributeKey::MembershipTier, 2),
        tx_hash: receipt.tx_hash,
    };

    if !session.store_identity(user, identity.clone()).await {
        warn!(user = %user, "Wallet changed during submission, identity not stored");
    }

    info!(user = %user, tx_hash = %receipt.tx_hash, block = receipt.block_number, "Identity minted");
    session
        .activity()
        .append(ActivityCategory::Success, "Identity Minted", ActivityStatus::Success)
        .await;

    Ok(identity)
}

async fn encrypt_attribute(
    gateway: &dyn FheGateway,
    contract: Address,
    user: Address,
    key: AttributeKey,
    value: u32,
) -> Result<EncryptedField, SubmissionError> {
    let mut input = gateway.create_encrypted_input(contract, user);
    input.add32(value);

    let payload = gateway
        .encrypt(input)
        .await
        .map_err(SubmissionError::Encryption)?;

    let handle = payload.handles.first().copied().ok_or_else(|| {
        SubmissionError::Encryption(GatewayError::Internal(
            "encryption returned no handles".to_string(),
        ))
    })?;

    debug!(attribute = key.as_str(), handle = %handle.short(), "Attribute encrypted");
    Ok(EncryptedField {
        handle,
        proof: payload.input_proof,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: SubmissionError) -> AttributeKey {
        match err {
            SubmissionError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_inputs() {
        let bounds = IdentityBounds::default();
        let identity = validate_inputs(&bounds, "25", " 750 ", "1").unwrap();
        assert_eq!(
            identity,
            PlaintextIdentity {
                age: 25,
                credit_score: 750,
                membership_tier: 1,
            }
        );
    }

    #[test]
    fn test_first_invalid_field_reported() {
        let bounds = IdentityBounds::default();

        let err = validate_inputs(&bounds, "150", "200", "9").unwrap_err();
        assert_eq!(err.to_string(), "Age must be between 1 and 120");

        let err = validate_inputs(&bounds, "30", "200", "9").unwrap_err();
        assert_eq!(field_of(err), AttributeKey::CreditScore);

        let err = validate_inputs(&bounds, "30", "700", "9").unwrap_err();
        assert_eq!(field_of(err), AttributeKey::MembershipTier);
    }

    #[test]
    fn test_non_numeric_and_negative() {
        let bounds = IdentityBounds::default();

        let err = validate_inputs(&bounds, "abc", "700", "1").unwrap_err();
        assert_eq!(err.to_string(), "Age must be an integer");

        let err = validate_inputs(&bounds, "", "700", "1").unwrap_err();
        assert_eq!(field_of(err), AttributeKey::Age);

        let err = validate_inputs(&bounds, "-5", "700", "1").unwrap_err();
        assert_eq!(err.to_string(), "Age must be between 1 and 120");

        let err = validate_inputs(&bounds, "30", "700", "1.5").unwrap_err();
        assert_eq!(err.to_string(), "Membership Tier must be an integer");
    }

    #[test]
    fn test_overflow_is_out_of_range() {
        let bounds = IdentityBounds::default();

        let err = validate_inputs(&bounds, "30", "99999999999999999999", "1").unwrap_err();
        assert_eq!(err.to_string(), "Credit Score must be between 300 and 850");

        let err = validate_inputs(&bounds, "-99999999999999999999", "700", "1").unwrap_err();
        assert_eq!(err.to_string(), "Age must be between 1 and 120");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = IdentityBounds::default();
        assert!(validate_inputs(&bounds, "1", "300", "1").is_ok());
        assert!(validate_inputs(&bounds, "120", "850", "5").is_ok());
        assert!(validate_inputs(&bounds, "0", "300", "1").is_err());
        assert!(validate_inputs(&bounds, "121", "300", "1").is_err());
    }

    #[test]
    fn test_custom_tier_bounds() {
        let bounds = IdentityBounds {
            membership_tier: AttributeBounds::new(1, 3),
            ..Default::default()
        };
        let err = validate_inputs(&bounds, "30", "700", "4").unwrap_err();
        assert_eq!(err.to_string(), "Membership Tier must be between 1 and 3");
    }
}

//! Per-scenario verification state.
//!
//! [`VerificationBoard`] is an immutable snapshot; every transition returns
//! a new board. The session swaps boards under its write lock, which is what
//! makes `begin` an atomic check-and-set.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::VerificationError;
use crate::scenario::{AccessPredicate, ScenarioId};

/// Status of one scenario's access check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Idle,
    Verifying,
    Granted,
    Denied,
}

impl VerificationStatus {
    /// Whether a result has been decided.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Granted | Self::Denied)
    }
}

/// Latest state of one scenario's check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub scenario: ScenarioId,
    pub predicate: AccessPredicate,
    pub status: VerificationStatus,
    /// Wallet that started the check
    pub owner: Address,
    /// Identifies the run that owns this request
    pub check_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

/// Handle to one started check, needed to settle it.
///
/// A ticket only settles the run that issued it. Once the scenario is
/// cleared or restarted, the old ticket no longer matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    pub scenario: ScenarioId,
    pub owner: Address,
    pub check_id: Uuid,
}

/// Immutable map of scenario id to request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationBoard {
    requests: BTreeMap<ScenarioId, VerificationRequest>,
}

impl VerificationBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status for a scenario. Unknown scenarios are idle.
    pub fn status(&self, scenario: &ScenarioId) -> VerificationStatus {
        self.requests
            .get(scenario)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    pub fn get(&self, scenario: &ScenarioId) -> Option<&VerificationRequest> {
        self.requests.get(scenario)
    }

    pub fn is_verifying(&self, scenario: &ScenarioId) -> bool {
        self.status(scenario) == VerificationStatus::Verifying
    }

    /// Move a scenario to `verifying` and issue the ticket that settles it.
    ///
    /// Fails with [`VerificationError::InFlight`] if it already is.
    pub fn begin(
        &self,
        scenario: &ScenarioId,
        owner: Address,
    ) -> Result<(Self, CheckTicket), VerificationError> {
        if self.is_verifying(scenario) {
            return Err(VerificationError::InFlight(scenario.clone()));
        }
        let ticket = CheckTicket {
            scenario: scenario.clone(),
            owner,
            check_id: Uuid::new_v4(),
        };
        Ok((self.with_status(&ticket, VerificationStatus::Verifying), ticket))
    }

    /// Settle a running check.
    ///
    /// Returns `None` unless `ticket` still owns a verifying request, so a
    /// result arriving after a disconnect, account switch or restart is
    /// dropped.
    pub fn resolve(&self, ticket: &CheckTicket, granted: bool) -> Option<Self> {
        if !self.is_current(ticket) {
            return None;
        }
        let status = if granted {
            VerificationStatus::Granted
        } else {
            VerificationStatus::Denied
        };
        Some(self.with_status(ticket, status))
    }

    /// Return a failed check to `idle`. Same ticket rule as `resolve`.
    pub fn reset(&self, ticket: &CheckTicket) -> Option<Self> {
        if !self.is_current(ticket) {
            return None;
        }
        Some(self.with_status(ticket, VerificationStatus::Idle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &VerificationRequest> {
        self.requests.values()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    fn is_current(&self, ticket: &CheckTicket) -> bool {
        self.requests
            .get(&ticket.scenario)
            .map(|r| r.status == VerificationStatus::Verifying && r.check_id == ticket.check_id)
            .unwrap_or(false)
    }

    fn with_status(&self, ticket: &CheckTicket, status: VerificationStatus) -> Self {
        let mut requests = self.requests.clone();
        requests.insert(
            ticket.scenario.clone(),
            VerificationRequest {
                scenario: ticket.scenario.clone(),
                predicate: AccessPredicate::for_scenario(&ticket.scenario),
                status,
                owner: ticket.owner,
                check_id: ticket.check_id,
                updated_at: Utc::now(),
            },
        );
        Self { requests }
    }
}

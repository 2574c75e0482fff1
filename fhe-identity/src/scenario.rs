//! Access scenarios and the remote predicates they run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::ContractCall;
use crate::types::AttributeKey;

/// Identifier of an access scenario, e.g. `club-access`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(String);

impl ScenarioId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScenarioId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Homomorphic check the contract evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessPredicate {
    IsAdult,
    IsVip,
}

impl AccessPredicate {
    /// Predicate for a scenario.
    ///
    /// Only `club-access` runs the adult check. Every other id, known or not,
    /// runs the VIP check.
    pub fn for_scenario(id: &ScenarioId) -> Self {
        if id.as_str() == "club-access" {
            Self::IsAdult
        } else {
            Self::IsVip
        }
    }

    pub fn contract_call(&self) -> ContractCall {
        match self {
            Self::IsAdult => ContractCall::CheckIsAdult,
            Self::IsVip => ContractCall::CheckIsVip,
        }
    }

    pub fn method_name(&self) -> &'static str {
        self.contract_call().method_name()
    }
}

/// Comparison shown for a scenario's requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    AtLeast,
    AtMost,
    Above,
    Below,
    Equal,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::AtLeast => ">=",
            Self::AtMost => "<=",
            Self::Above => ">",
            Self::Below => "<",
            Self::Equal => "==",
        }
    }

    pub fn evaluate(&self, value: u32, threshold: u32) -> bool {
        match self {
            Self::AtLeast => value >= threshold,
            Self::AtMost => value <= threshold,
            Self::Above => value > threshold,
            Self::Below => value < threshold,
            Self::Equal => value == threshold,
        }
    }
}

/// A catalog entry describing one access scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub required_condition: &'static str,
    pub attribute: AttributeKey,
    pub threshold: u32,
    pub comparison: Comparison,
}

impl Scenario {
    pub fn scenario_id(&self) -> ScenarioId {
        ScenarioId::new(self.id)
    }

    /// Remote predicate this scenario runs.
    pub fn predicate(&self) -> AccessPredicate {
        AccessPredicate::for_scenario(&self.scenario_id())
    }

    /// The displayed requirement applied to a plaintext.
    ///
    /// This is what the scenario advertises, not what the contract computes:
    /// `loan-application` is decided by the VIP check.
    pub fn evaluate_locally(&self, value: u32) -> bool {
        self.comparison.evaluate(value, self.threshold)
    }
}

/// Known scenarios.
pub static SCENARIOS: [Scenario; 3] = [
    Scenario {
        id: "club-access",
        title: "Night Club Entry",
        description: "Prove you are over 18 without revealing your birth date.",
        required_condition: "Age >= 18",
        attribute: AttributeKey::Age,
        threshold: 18,
        comparison: Comparison::AtLeast,
    },
    Scenario {
        id: "loan-application",
        title: "DeFi Loan Approval",
        description: "Prove creditworthiness without revealing your exact score.",
        required_condition: "Credit Score >= 700",
        attribute: AttributeKey::CreditScore,
        threshold: 700,
        comparison: Comparison::AtLeast,
    },
    Scenario {
        id: "vip-lounge",
        title: "VIP Lounge",
        description: "Access exclusive areas based on your membership tier.",
        required_condition: "Tier == 1 (Gold)",
        attribute: AttributeKey::MembershipTier,
        threshold: 1,
        comparison: Comparison::Equal,
    },
];

/// Look up a catalog scenario by id.
pub fn scenario(id: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.id == id)
}

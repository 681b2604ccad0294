//! Replay scenarios.
//!
//! A scenario is a TOML file with the payment rails to open and an ordered
//! list of ledger calls:
//!
//! ```toml
//! [[rails]]
//! entity = 1
//! category = "primary"
//! lockup = 50000
//!
//! [[steps]]
//! action = "report"
//! entity = 1
//! epoch = 1
//! primary = 1000
//!
//! [[steps]]
//! action = "settle"
//! category = "primary"
//! entities = [1]
//! ```

use std::path::Path;

use eyre::{Result, WrapErr};
use serde::Deserialize;
use tally_ledger::Roles;
use tally_primitives::{Address, BillingCategory, EntityId, Epoch, Units};

/// A payment rail opened before the first step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RailSpec {
    pub entity: EntityId,
    pub category: BillingCategory,
    pub lockup: u64,
}

/// A named role holder, resolved against the roles current at that step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedCaller {
    Admin,
    Reporter,
}

/// Who makes a call: a role holder or an explicit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Caller {
    Named(NamedCaller),
    Address(Address),
}

impl Caller {
    /// The calling address given the current role holders.
    pub fn resolve(self, roles: &Roles) -> Address {
        match self {
            Self::Named(NamedCaller::Admin) => roles.admin(),
            Self::Named(NamedCaller::Reporter) => roles.reporter(),
            Self::Address(address) => address,
        }
    }
}

/// One ledger call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Report {
        entity: EntityId,
        epoch: Epoch,
        #[serde(default)]
        primary: Units,
        #[serde(default)]
        secondary: Units,
        #[serde(default)]
        caller: Option<Caller>,
    },
    ReportBatch {
        entities: Vec<EntityId>,
        epochs: Vec<Epoch>,
        primary: Vec<Units>,
        secondary: Vec<Units>,
        #[serde(default)]
        caller: Option<Caller>,
    },
    Settle {
        category: BillingCategory,
        entities: Vec<EntityId>,
    },
    TopUp {
        entity: EntityId,
        category: BillingCategory,
        amount: u64,
    },
    Terminate {
        entity: EntityId,
        #[serde(default)]
        caller: Option<Caller>,
    },
    SetRate {
        category: BillingCategory,
        rate: u64,
        #[serde(default)]
        caller: Option<Caller>,
    },
    SetReporter {
        reporter: Address,
        #[serde(default)]
        caller: Option<Caller>,
    },
    TransferAdmin {
        admin: Address,
        #[serde(default)]
        caller: Option<Caller>,
    },
}

impl Step {
    /// Short name for logs.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Report { .. } => "report",
            Self::ReportBatch { .. } => "report_batch",
            Self::Settle { .. } => "settle",
            Self::TopUp { .. } => "top_up",
            Self::Terminate { .. } => "terminate",
            Self::SetRate { .. } => "set_rate",
            Self::SetReporter { .. } => "set_reporter",
            Self::TransferAdmin { .. } => "transfer_admin",
        }
    }
}

/// A parsed scenario file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub rails: Vec<RailSpec>,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read scenario {}", path.display()))?;
        Self::parse(&contents).wrap_err_with(|| format!("Invalid scenario {}", path.display()))
    }

    /// Parse scenario TOML.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::parse(
            r#"
[[rails]]
entity = 1
category = "secondary"
lockup = 500

[[steps]]
action = "report"
entity = 1
epoch = 3
secondary = 10

[[steps]]
action = "set_rate"
category = "primary"
rate = 5
caller = "0x00000000000000000000000000000000000000ff"

[[steps]]
action = "terminate"
entity = 1
caller = "admin"
"#,
        )
        .unwrap();

        assert_eq!(scenario.rails, vec![RailSpec {
            entity: EntityId::new(1),
            category: BillingCategory::Secondary,
            lockup: 500,
        }]);
        assert_eq!(scenario.steps.len(), 3);
        assert_matches!(
            scenario.steps.first(),
            Some(Step::Report { primary: 0, secondary: 10, caller: None, .. })
        );
        assert_matches!(
            scenario.steps.get(1),
            Some(Step::SetRate { caller: Some(Caller::Address(_)), .. })
        );
        assert_matches!(
            scenario.steps.get(2),
            Some(Step::Terminate { caller: Some(Caller::Named(NamedCaller::Admin)), .. })
        );
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(Scenario::parse("[[steps]]\naction = \"refund\"\n").is_err());
    }

    #[test]
    fn test_resolve_caller() {
        let roles =
            Roles::new(Address::with_last_byte(1), Address::with_last_byte(2)).unwrap();
        assert_eq!(Caller::Named(NamedCaller::Reporter).resolve(&roles), roles.reporter());
        assert_eq!(Caller::Address(Address::with_last_byte(9)).resolve(&roles), Address::with_last_byte(9));
    }
}

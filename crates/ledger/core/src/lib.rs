//! Usage ledger with lockup-bounded settlement.
//!
//! Per-entity, epoch-ordered usage accounting in two billing categories.
//! Reported units are converted to amounts at the rate current at report time
//! and accumulated; settlement later draws what the entity's payment rail
//! allows and leaves the rest for a later call.
//!
//! # Components
//!
//! - [`UsageLedger`] - Reporting, settlement, termination and administration
//! - [`RateTable`] - Unit-to-amount conversion per category
//! - [`Roles`] - Administrator and reporter allow-lists
//! - [`UsageRecord`] - Per-entity accumulated amounts and epoch watermarks
//! - [`SettlementReport`] - Per-entity outcome of a settlement call
//! - [`LedgerService`] / [`LedgerHandle`] - Actor wrapper for concurrent callers
//!
//! The payment collaborator and the fact sink are traits in `tally-api`.

mod access;
pub mod args;
mod config;
mod constants;
pub mod epoch;
mod error;
mod handle;
mod ledger;
mod metrics;
mod rates;
mod record;
mod service;
mod settlement;

pub use access::{Role, Roles};
pub use args::{LedgerArgs, SettlementPolicyArg};
pub use config::DefaultLedgerConfig;
pub use error::{LedgerError, ServiceError};
pub use handle::{LedgerHandle, create_ledger_actor};
pub use ledger::UsageLedger;
pub use rates::RateTable;
pub use record::{CategoryBalance, UsageRecord};
pub use service::{LedgerCommand, LedgerService};
pub use settlement::{SettlementOutcome, SettlementReport, SkipReason};

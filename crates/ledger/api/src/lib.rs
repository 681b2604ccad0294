//! Tally API - seams between the usage ledger and its host.
//!
//! This crate defines what the ledger consumes and what it publishes, without
//! saying how any of it is done:
//!
//! - [`PaymentRails`] - the external payment collaborator (rail lookup,
//!   lockup ceiling, settlement apply, termination)
//! - [`LedgerConfig`] - rates and settlement policy
//! - [`EventSink`] - where observable [`LedgerEvent`] facts go
//!
//! [`MemoryRails`] is an in-process [`PaymentRails`] used for replays and tests.
//!
//! # Design Principles
//!
//! - Traits define *what*, implementations define *how*
//! - The ledger never moves funds; it computes amounts and delegates
//! - Collaborator failures are typed ([`RailError`]) and propagate unmodified

#![warn(missing_docs)]

mod config;
mod events;
mod memory;
mod rails;

pub use config::*;
pub use events::*;
pub use memory::{AppliedPayment, MemoryRails};
pub use rails::*;

pub use tally_primitives::{
    Address, Amount, BillingCategory, EntityId, Epoch, RailId, SettlementPolicy, U256, Units,
};

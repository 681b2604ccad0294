//! Core primitive types for the tally usage ledger.
//!
//! This crate provides the value types shared by the ledger, its collaborator
//! traits and the CLI, kept separate to avoid circular dependencies.
//!
//! - Billable amounts are [`Amount`]s (256-bit, never wrapping).
//! - Usage is reported in [`Units`] per [`Epoch`] per [`BillingCategory`].
//! - Caller identities are plain [`Address`]es.

use core::fmt;
use core::num::NonZeroU64;

pub use alloy_primitives::{Address, U256};

/// A billable amount, in the payment collaborator's smallest denomination.
pub type Amount = U256;

/// A discrete, strictly increasing reporting period. `0` means "never reported".
pub type Epoch = u64;

/// Raw usage counted in a reporting period (e.g. bytes served).
pub type Units = u64;

/// Identifier of a billed entity (a tracked workload or dataset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityId(u64);

impl EntityId {
    /// Create an entity identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// The payment collaborator's identifier for a funding channel.
///
/// Zero is reserved by collaborators to mean "no rail", so a `RailId` can only
/// be constructed from a non-zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RailId(NonZeroU64);

impl RailId {
    /// The smallest valid identifier.
    pub const MIN: Self = Self(NonZeroU64::MIN);

    /// Returns `None` for the zero ("unconfigured") identifier.
    pub const fn new(id: u64) -> Option<Self> {
        match NonZeroU64::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// The raw identifier.
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for RailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rail#{}", self.0)
    }
}

/// One of the two independent billing dimensions.
///
/// Each category has its own rate, accumulator, settlement epoch and rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[strum(serialize_all = "lowercase")]
pub enum BillingCategory {
    /// Category A usage rail.
    Primary,
    /// Category B usage rail.
    Secondary,
}

impl BillingCategory {
    /// Both categories, primary first.
    pub const ALL: [Self; 2] = [Self::Primary, Self::Secondary];

    /// The other category.
    pub const fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}

/// What settlement does with an entity that has nothing to settle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[strum(serialize_all = "lowercase")]
pub enum SettlementPolicy {
    /// Uninitialized or fully-settled entities are silently skipped (default).
    ///
    /// Lets a caller pass a heterogeneous batch and get best-effort progress.
    #[default]
    Skip,

    /// Uninitialized or fully-settled entities fail the whole call before any
    /// payment is requested.
    Strict,
}

impl SettlementPolicy {
    /// Whether missing preconditions are errors rather than no-ops.
    pub fn is_strict(self) -> bool {
        matches!(self, SettlementPolicy::Strict)
    }
}

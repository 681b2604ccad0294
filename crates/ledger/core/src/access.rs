//! Caller roles.
//!
//! Two single-identity allow-lists: an administrator, who may reassign roles
//! and change rates, and a reporter, who may record usage and terminate
//! entities. Settlement is open to anyone.

use tally_primitives::Address;

use crate::LedgerError;

/// A role an operation may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// The administrator.
    Admin,
    /// The designated usage reporter.
    Reporter,
    /// Either the reporter or the administrator.
    Operator,
}

/// The current role holders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roles {
    admin: Address,
    reporter: Address,
}

impl Roles {
    /// Create a role assignment. Neither identity may be the zero address.
    pub fn new(admin: Address, reporter: Address) -> Result<Self, LedgerError> {
        if admin.is_zero() || reporter.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        Ok(Self { admin, reporter })
    }

    /// The administrator.
    pub fn admin(&self) -> Address {
        self.admin
    }

    /// The reporter.
    pub fn reporter(&self) -> Address {
        self.reporter
    }

    pub(crate) fn ensure_admin(&self, caller: Address) -> Result<(), LedgerError> {
        if caller == self.admin {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized { caller, role: Role::Admin })
        }
    }

    pub(crate) fn ensure_reporter(&self, caller: Address) -> Result<(), LedgerError> {
        if caller == self.reporter {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized { caller, role: Role::Reporter })
        }
    }

    pub(crate) fn ensure_operator(&self, caller: Address) -> Result<(), LedgerError> {
        if caller == self.reporter || caller == self.admin {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized { caller, role: Role::Operator })
        }
    }

    /// Replace the reporter, returning the previous one.
    pub(crate) fn replace_reporter(&mut self, new: Address) -> Result<Address, LedgerError> {
        if new.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        Ok(core::mem::replace(&mut self.reporter, new))
    }

    /// Replace the administrator, returning the previous one.
    pub(crate) fn replace_admin(&mut self, new: Address) -> Result<Address, LedgerError> {
        if new.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        Ok(core::mem::replace(&mut self.admin, new))
    }
}

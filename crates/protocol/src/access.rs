use alloy::primitives::Address;

use crate::abi::IERC173;
use crate::chain::CallContext;
use crate::error::{Error, Result};

/// ERC-173 single-owner access control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Set the first owner. Only called from an initializer.
    pub fn init(&mut self, ctx: &mut CallContext<'_>, owner: Address) {
        self.set(ctx, owner);
    }

    pub fn only_owner(&self, ctx: &CallContext<'_>) -> Result<()> {
        if ctx.sender() == self.owner && !self.owner.is_zero() {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }

    pub fn transfer(&mut self, ctx: &mut CallContext<'_>, new_owner: Address) -> Result<()> {
        self.only_owner(ctx)?;
        self.set(ctx, new_owner);
        Ok(())
    }

    pub fn resign(&mut self, ctx: &mut CallContext<'_>) -> Result<()> {
        self.transfer(ctx, Address::ZERO)
    }

    fn set(&mut self, ctx: &mut CallContext<'_>, owner: Address) {
        let previous = std::mem::replace(&mut self.owner, owner);
        ctx.emit(&IERC173::OwnershipTransferred {
            previousOwner: previous,
            newOwner: owner,
        });
    }
}

/// Flip a one-shot initialization flag, failing if it was already set.
pub fn initializer(initialized: &mut bool) -> Result<()> {
    if std::mem::replace(initialized, true) {
        Err(Error::AlreadyInitialized)
    } else {
        Ok(())
    }
}

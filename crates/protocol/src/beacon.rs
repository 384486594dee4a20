use alloy::primitives::{Address, Bytes};
use alloy::sol_types::{SolInterface, SolValue};

use crate::abi::IBeacon::{self, IBeaconCalls};
use crate::access::{Ownable, initializer};
use crate::chain::{CallContext, Contract};
use crate::error::{Error, Result};

/// Holds the implementation every beacon proxy pointed at it delegates to.
#[derive(Debug, Clone, Default)]
pub struct UpgradeableBeacon {
    initialized: bool,
    ownable: Ownable,
    implementation: Address,
}

impl UpgradeableBeacon {
    fn set_implementation(
        &mut self,
        ctx: &mut CallContext<'_>,
        implementation: Address,
    ) -> Result<()> {
        if !ctx.has_code(implementation) {
            return Err(Error::NoCode(implementation));
        }
        self.implementation = implementation;
        ctx.emit(&IBeacon::Upgraded { implementation });
        Ok(())
    }
}

impl Contract for UpgradeableBeacon {
    const LABEL: &'static str = "UpgradeableBeacon";

    fn dispatch(&mut self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Bytes> {
        ctx.ensure_non_payable()?;
        let output = match IBeaconCalls::abi_decode(input)? {
            IBeaconCalls::initialize(call) => {
                initializer(&mut self.initialized)?;
                let owner = ctx.sender();
                self.ownable.init(ctx, owner);
                self.set_implementation(ctx, call.implementation)?;
                Vec::new()
            }
            IBeaconCalls::implementation(_) => self.implementation.abi_encode(),
            IBeaconCalls::upgradeTo(call) => {
                self.ownable.only_owner(ctx)?;
                self.set_implementation(ctx, call.newImplementation)?;
                Vec::new()
            }
            IBeaconCalls::owner(_) => self.ownable.owner().abi_encode(),
            IBeaconCalls::transferOwnership(call) => {
                self.ownable.transfer(ctx, call.newOwner)?;
                Vec::new()
            }
        };
        Ok(output.into())
    }
}

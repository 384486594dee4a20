use std::collections::HashSet;

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::{SolInterface, SolValue};

use crate::abi::IAllowlist::{self, IAllowlistCalls};
use crate::access::{Ownable, initializer};
use crate::chain::{CallContext, Contract};
use crate::error::Result;

/// Accounts that may deploy through the factory without paying.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    initialized: bool,
    ownable: Ownable,
    allowed: HashSet<Address>,
}

impl Contract for Allowlist {
    const LABEL: &'static str = "Allowlist";

    fn dispatch(&mut self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Bytes> {
        ctx.ensure_non_payable()?;
        let output = match IAllowlistCalls::abi_decode(input)? {
            IAllowlistCalls::initialize(_) => {
                initializer(&mut self.initialized)?;
                let owner = ctx.sender();
                self.ownable.init(ctx, owner);
                Vec::new()
            }
            IAllowlistCalls::authorise(call) => {
                self.ownable.only_owner(ctx)?;
                if self.allowed.insert(call.account) {
                    ctx.emit(&IAllowlist::Allowed {
                        account: call.account,
                    });
                }
                Vec::new()
            }
            IAllowlistCalls::revoke(call) => {
                self.ownable.only_owner(ctx)?;
                if self.allowed.remove(&call.account) {
                    ctx.emit(&IAllowlist::Revoked {
                        account: call.account,
                    });
                }
                Vec::new()
            }
            IAllowlistCalls::allowance(call) => self.allowed.contains(&call.account).abi_encode(),
            IAllowlistCalls::owner(_) => self.ownable.owner().abi_encode(),
            IAllowlistCalls::transferOwnership(call) => {
                self.ownable.transfer(ctx, call.newOwner)?;
                Vec::new()
            }
        };
        Ok(output.into())
    }
}

//! Bridged ERC-20 template for Optimism-style L2s. Supply is minted and burned
//! only by the standard bridge predeploy.

use alloy::primitives::{Address, Bytes, FixedBytes, U256, address};
use alloy::sol_types::{SolInterface, SolValue};

use crate::abi::IL2StandardERC20::{self, IL2StandardERC20Calls};
use crate::access::initializer;
use crate::chain::{CallContext, Contract};
use crate::erc20::{Erc20, PermitArgs};
use crate::error::{Error, Result};
use crate::introspection;

/// `L2StandardBridge` predeploy.
pub const L2_BRIDGE: Address = address!("4200000000000000000000000000000000000010");

#[derive(Debug, Clone, Default)]
pub struct L2StandardToken {
    initialized: bool,
    l1_token: Address,
    erc20: Erc20,
}

impl L2StandardToken {
    pub fn l1_token(&self) -> Address {
        self.l1_token
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.erc20.balance_of(account)
    }

    pub fn supports_interface(interface_id: FixedBytes<4>) -> bool {
        [
            introspection::erc165(),
            introspection::erc20(),
            introspection::erc2612(),
            introspection::multicall(),
            introspection::l2_standard_erc20(),
        ]
        .contains(&interface_id)
    }

    fn only_bridge(ctx: &CallContext<'_>) -> Result<()> {
        if ctx.sender() == L2_BRIDGE { Ok(()) } else { Err(Error::OnlyBridge) }
    }
}

impl Contract for L2StandardToken {
    const LABEL: &'static str = "L2StandardERC20";

    fn dispatch(&mut self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Bytes> {
        ctx.ensure_non_payable()?;
        let sender = ctx.sender();
        let output = match IL2StandardERC20Calls::abi_decode(input)? {
            IL2StandardERC20Calls::initialize(call) => {
                initializer(&mut self.initialized)?;
                self.erc20 = Erc20::new(call.name, call.symbol, call.decimals);
                self.l1_token = call.l1Token;
                Vec::new()
            }
            IL2StandardERC20Calls::name(_) => self.erc20.name.abi_encode(),
            IL2StandardERC20Calls::symbol(_) => self.erc20.symbol.abi_encode(),
            IL2StandardERC20Calls::decimals(_) => U256::from(self.erc20.decimals).abi_encode(),
            IL2StandardERC20Calls::totalSupply(_) => self.erc20.total_supply().abi_encode(),
            IL2StandardERC20Calls::balanceOf(call) => self.balance_of(call.account).abi_encode(),
            IL2StandardERC20Calls::allowance(call) => {
                self.erc20.allowance(call.owner, call.spender).abi_encode()
            }
            IL2StandardERC20Calls::transfer(call) => {
                self.erc20.transfer(ctx, sender, call.to, call.value)?;
                true.abi_encode()
            }
            IL2StandardERC20Calls::transferFrom(call) => {
                self.erc20.spend_allowance(call.from, sender, call.value)?;
                self.erc20.transfer(ctx, call.from, call.to, call.value)?;
                true.abi_encode()
            }
            IL2StandardERC20Calls::approve(call) => {
                self.erc20.approve(ctx, sender, call.spender, call.value)?;
                true.abi_encode()
            }
            IL2StandardERC20Calls::l1Token(_) => self.l1_token.abi_encode(),
            IL2StandardERC20Calls::l2Bridge(_) => L2_BRIDGE.abi_encode(),
            IL2StandardERC20Calls::mint(call) => {
                Self::only_bridge(ctx)?;
                self.erc20.mint(ctx, call.to, call.amount)?;
                ctx.emit(&IL2StandardERC20::Mint {
                    account: call.to,
                    amount: call.amount,
                });
                Vec::new()
            }
            IL2StandardERC20Calls::burn(call) => {
                Self::only_bridge(ctx)?;
                self.erc20.burn(ctx, call.from, call.amount)?;
                ctx.emit(&IL2StandardERC20::Burn {
                    account: call.from,
                    amount: call.amount,
                });
                Vec::new()
            }
            IL2StandardERC20Calls::permit(call) => {
                self.erc20.permit(
                    ctx,
                    PermitArgs {
                        owner: call.owner,
                        spender: call.spender,
                        value: call.value,
                        deadline: call.deadline,
                        v: call.v,
                        r: call.r,
                        s: call.s,
                    },
                )?;
                Vec::new()
            }
            IL2StandardERC20Calls::nonces(call) => self.erc20.nonce(call.owner).abi_encode(),
            IL2StandardERC20Calls::DOMAIN_SEPARATOR(_) => {
                self.erc20.domain_separator(ctx).abi_encode()
            }
            IL2StandardERC20Calls::multicall(call) => {
                let mut results = Vec::with_capacity(call.data.len());
                for inner in &call.data {
                    results.push(self.dispatch(ctx, inner)?);
                }
                results.abi_encode()
            }
            IL2StandardERC20Calls::supportsInterface(call) => {
                Self::supports_interface(call.interfaceId).abi_encode()
            }
        };
        Ok(output.into())
    }
}

//! Balances, allowances and EIP-2612 permits shared by the token templates.

use std::borrow::Cow;
use std::collections::HashMap;

use alloy::primitives::{Address, B256, Signature, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};

use crate::abi::{IStandardToken, Permit};
use crate::chain::CallContext;
use crate::error::{Error, Result};

pub const PERMIT_VERSION: &str = "1";

/// EIP-712 domain of the token named `name` deployed at `token`.
pub fn permit_domain(name: &str, chain_id: u64, token: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Owned(name.to_owned())),
        Some(Cow::Borrowed(PERMIT_VERSION)),
        Some(U256::from(chain_id)),
        Some(token),
        None,
    )
}

/// Digest an owner signs to authorise `permit`.
pub fn permit_digest(name: &str, chain_id: u64, token: Address, permit: &Permit) -> B256 {
    permit.eip712_signing_hash(&permit_domain(name, chain_id, token))
}

/// Arguments of an EIP-2612 `permit` call.
#[derive(Debug, Clone, Copy)]
pub struct PermitArgs {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub deadline: U256,
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

/// ERC-20 storage. Transfers and mints into the token's own address are
/// rejected, as are approvals of it as a spender.
#[derive(Debug, Clone, Default)]
pub struct Erc20 {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    nonces: HashMap<Address, U256>,
}

impl Erc20 {
    pub fn new(name: String, symbol: String, decimals: u8) -> Self {
        Self {
            name,
            symbol,
            decimals,
            ..Self::default()
        }
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn nonce(&self, owner: Address) -> U256 {
        self.nonces.get(&owner).copied().unwrap_or_default()
    }

    pub fn domain_separator(&self, ctx: &CallContext<'_>) -> B256 {
        permit_domain(&self.name, ctx.chain_id(), ctx.this()).separator()
    }

    fn check_recipient(ctx: &CallContext<'_>, to: Address) -> Result<()> {
        if to.is_zero() {
            Err(Error::ZeroAddress)
        } else if to == ctx.this() {
            Err(Error::TransferToSelf)
        } else {
            Ok(())
        }
    }

    pub fn transfer(
        &mut self,
        ctx: &mut CallContext<'_>,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<()> {
        Self::check_recipient(ctx, to)?;
        let from_balance = self.balance_of(from);
        if from_balance < value {
            return Err(Error::InsufficientBalance);
        }
        self.balances.insert(from, from_balance - value);
        let to_balance = self.balance_of(to);
        self.balances
            .insert(to, to_balance.checked_add(value).ok_or(Error::Overflow)?);
        ctx.emit(&IStandardToken::Transfer { from, to, value });
        Ok(())
    }

    pub fn mint(&mut self, ctx: &mut CallContext<'_>, to: Address, value: U256) -> Result<()> {
        Self::check_recipient(ctx, to)?;
        self.total_supply = self
            .total_supply
            .checked_add(value)
            .ok_or(Error::Overflow)?;
        *self.balances.entry(to).or_default() += value;
        ctx.emit(&IStandardToken::Transfer {
            from: Address::ZERO,
            to,
            value,
        });
        Ok(())
    }

    pub fn burn(&mut self, ctx: &mut CallContext<'_>, from: Address, value: U256) -> Result<()> {
        let balance = self.balance_of(from);
        if balance < value {
            return Err(Error::InsufficientBalance);
        }
        self.balances.insert(from, balance - value);
        self.total_supply -= value;
        ctx.emit(&IStandardToken::Transfer {
            from,
            to: Address::ZERO,
            value,
        });
        Ok(())
    }

    pub fn approve(
        &mut self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        spender: Address,
        value: U256,
    ) -> Result<()> {
        if spender == ctx.this() {
            return Err(Error::ApproveToSelf);
        }
        self.allowances.insert((owner, spender), value);
        ctx.emit(&IStandardToken::Approval {
            owner,
            spender,
            value,
        });
        Ok(())
    }

    /// Consume `value` of `spender`'s allowance over `owner`; `U256::MAX` never decreases.
    pub fn spend_allowance(&mut self, owner: Address, spender: Address, value: U256) -> Result<()> {
        let current = self.allowance(owner, spender);
        if current == U256::MAX {
            return Ok(());
        }
        if current < value {
            return Err(Error::InsufficientAllowance);
        }
        self.allowances.insert((owner, spender), current - value);
        Ok(())
    }

    pub fn permit(&mut self, ctx: &mut CallContext<'_>, args: PermitArgs) -> Result<()> {
        if args.owner.is_zero() {
            return Err(Error::PermitZeroOwner);
        }
        if U256::from(ctx.timestamp()) > args.deadline {
            return Err(Error::PermitExpired);
        }
        let nonce = self.nonce(args.owner);
        let digest = permit_digest(
            &self.name,
            ctx.chain_id(),
            ctx.this(),
            &Permit {
                owner: args.owner,
                spender: args.spender,
                value: args.value,
                nonce,
                deadline: args.deadline,
            },
        );

        let parity = match args.v {
            0 | 27 => false,
            1 | 28 => true,
            _ => return Err(Error::InvalidSignature),
        };
        let signature = Signature::new(
            U256::from_be_bytes(args.r.0),
            U256::from_be_bytes(args.s.0),
            parity,
        );
        let signer = signature
            .recover_address_from_prehash(&digest)
            .map_err(|_| Error::InvalidSignature)?;
        if signer != args.owner {
            return Err(Error::InvalidSignature);
        }

        self.nonces.insert(args.owner, nonce + U256::from(1));
        self.approve(ctx, args.owner, args.spender, args.value)
    }
}

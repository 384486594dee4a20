//! Linear vesting escrow.

use std::collections::HashMap;

use alloy::primitives::{Address, Bytes, FixedBytes, U256};
use alloy::sol_types::{SolInterface, SolValue};

use crate::abi::IStandardToken;
use crate::abi::IVestingEscrow::{self, IVestingEscrowCalls};
use crate::access::{Ownable, initializer};
use crate::chain::{CallContext, Contract};
use crate::error::{Error, Result};
use crate::{introspection, token};

/// One recipient's lock: `total_locked` releases linearly over `[start_at, end_at)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VestingSchedule {
    pub start_at: u64,
    pub end_at: u64,
    pub total_locked: U256,
    pub claimed: U256,
}

impl VestingSchedule {
    /// Amount vested at `now`, ignoring what was already claimed.
    pub fn vested_at(&self, now: u64) -> Result<U256> {
        if now < self.start_at {
            return Ok(U256::ZERO);
        }
        if now >= self.end_at {
            return Ok(self.total_locked);
        }
        let elapsed = U256::from(now - self.start_at);
        let duration = U256::from(self.end_at - self.start_at);
        Ok(self
            .total_locked
            .checked_mul(elapsed)
            .ok_or(Error::Overflow)?
            / duration)
    }

    pub fn claimable_at(&self, now: u64) -> Result<U256> {
        Ok(self.vested_at(now)?.saturating_sub(self.claimed))
    }

    /// A schedule stays active until everything locked has been claimed.
    pub fn is_active(&self) -> bool {
        self.claimed < self.total_locked
    }
}

/// Pool accounting behind the escrow.
///
/// `funded` is the escrow's token balance as the ledger sees it and
/// `allocated` the part of it still owed to recipients.
#[derive(Debug, Clone, Default)]
pub struct VestingLedger {
    funded: U256,
    allocated: U256,
    vests: HashMap<Address, VestingSchedule>,
}

impl VestingLedger {
    pub fn allocated(&self) -> U256 {
        self.allocated
    }

    pub fn unallocated(&self) -> U256 {
        self.funded.saturating_sub(self.allocated)
    }

    pub fn schedule(&self, recipient: Address) -> Option<&VestingSchedule> {
        self.vests.get(&recipient)
    }

    pub fn claimable(&self, recipient: Address, now: u64) -> Result<U256> {
        self.vests
            .get(&recipient)
            .map_or(Ok(U256::ZERO), |vest| vest.claimable_at(now))
    }

    pub fn fund(&mut self, amount: U256) -> Result<()> {
        self.funded = self.funded.checked_add(amount).ok_or(Error::Overflow)?;
        Ok(())
    }

    /// Register a schedule. With `check_balance` unset the lock may exceed the funded pool.
    pub fn lock(
        &mut self,
        recipient: Address,
        amount: U256,
        start_at: u64,
        end_at: u64,
        now: u64,
        check_balance: bool,
    ) -> Result<()> {
        if recipient.is_zero() {
            return Err(Error::ZeroRecipient);
        }
        if check_balance && amount > self.unallocated() {
            return Err(Error::NotEnoughBalance);
        }
        if self.vests.get(&recipient).is_some_and(VestingSchedule::is_active) {
            return Err(Error::AlreadyRegistered);
        }
        if start_at < now {
            return Err(Error::StartInPast);
        }
        if start_at >= end_at {
            return Err(Error::StartAfterEnd);
        }

        self.allocated = self.allocated.checked_add(amount).ok_or(Error::Overflow)?;
        self.vests.insert(
            recipient,
            VestingSchedule {
                start_at,
                end_at,
                total_locked: amount,
                claimed: U256::ZERO,
            },
        );
        Ok(())
    }

    /// Mark everything claimable at `now` as paid. Returns the amount to transfer.
    pub fn settle(&mut self, recipient: Address, now: u64) -> Result<U256> {
        let Some(vest) = self.vests.get_mut(&recipient) else {
            return Ok(U256::ZERO);
        };
        let amount = vest.claimable_at(now)?;
        vest.claimed += amount;
        self.allocated = self.allocated.saturating_sub(amount);
        self.funded = self.funded.saturating_sub(amount);
        Ok(amount)
    }

    /// Settle, then release `amount` of the remaining lock back to the pool.
    /// Returns the settled amount.
    pub fn decrease(&mut self, recipient: Address, amount: U256, now: u64) -> Result<U256> {
        let settled = self.settle(recipient, now)?;
        let vest = self
            .vests
            .get_mut(&recipient)
            .ok_or(Error::NotEnoughLocked)?;
        if amount > vest.total_locked - vest.claimed {
            return Err(Error::NotEnoughLocked);
        }
        vest.total_locked -= amount;
        self.allocated = self.allocated.saturating_sub(amount);
        Ok(settled)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VestingEscrow {
    initialized: bool,
    ownable: Ownable,
    token: Address,
    ledger: VestingLedger,
}

impl VestingEscrow {
    pub fn supports_interface(interface_id: FixedBytes<4>) -> bool {
        [
            introspection::erc165(),
            introspection::erc173(),
            introspection::multicall(),
        ]
        .contains(&interface_id)
    }

    fn lock(
        &mut self,
        ctx: &mut CallContext<'_>,
        params: &IVestingEscrow::LockParams,
        check_balance: bool,
    ) -> Result<()> {
        self.ledger.lock(
            params.recipient,
            params.amount,
            params.startAt,
            params.endAt,
            ctx.timestamp(),
            check_balance,
        )?;
        ctx.emit(&IVestingEscrow::Locked {
            recipient: params.recipient,
            amount: params.amount,
            startAt: params.startAt,
        });
        tracing::info!(recipient = %params.recipient, amount = %params.amount, "Locked");
        Ok(())
    }

    fn fund(&mut self, ctx: &mut CallContext<'_>, amount: U256) -> Result<()> {
        self.ledger.fund(amount)?;
        let from = ctx.sender();
        token::safe_transfer_from(ctx, self.token, from, amount)?;
        ctx.emit(&IVestingEscrow::Funded { amount });
        Ok(())
    }

    fn pay(&mut self, ctx: &mut CallContext<'_>, recipient: Address, amount: U256) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        token::safe_transfer(ctx, self.token, recipient, amount)?;
        ctx.emit(&IVestingEscrow::Claimed { recipient, amount });
        tracing::info!(%recipient, %amount, "Vested tokens claimed");
        Ok(())
    }
}

impl Contract for VestingEscrow {
    const LABEL: &'static str = "VestingEscrow";

    fn dispatch(&mut self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Bytes> {
        ctx.ensure_non_payable()?;
        let output = match IVestingEscrowCalls::abi_decode(input)? {
            IVestingEscrowCalls::initialize(call) => {
                initializer(&mut self.initialized)?;
                let owner = ctx.sender();
                self.ownable.init(ctx, owner);
                self.token = call.token;
                for params in &call.locks {
                    self.lock(ctx, params, false)?;
                }
                Vec::new()
            }
            IVestingEscrowCalls::token(_) => self.token.abi_encode(),
            IVestingEscrowCalls::fund(call) => {
                self.fund(ctx, call.amount)?;
                Vec::new()
            }
            IVestingEscrowCalls::fundWithPermit(call) => {
                let permit = IStandardToken::permitCall {
                    owner: ctx.sender(),
                    spender: ctx.this(),
                    value: call.amount,
                    deadline: U256::MAX,
                    v: call.v,
                    r: call.r,
                    s: call.s,
                };
                ctx.call_typed(self.token, &permit)?;
                self.fund(ctx, call.amount)?;
                Vec::new()
            }
            IVestingEscrowCalls::lock(call) => {
                self.ownable.only_owner(ctx)?;
                let params = IVestingEscrow::LockParams {
                    recipient: call.recipient,
                    amount: call.amount,
                    startAt: call.startAt,
                    endAt: call.endAt,
                };
                self.lock(ctx, &params, true)?;
                Vec::new()
            }
            IVestingEscrowCalls::claim(call) => {
                let amount = self.ledger.settle(call.recipient, ctx.timestamp())?;
                self.pay(ctx, call.recipient, amount)?;
                Vec::new()
            }
            IVestingEscrowCalls::claimable(call) => self
                .ledger
                .claimable(call.recipient, ctx.timestamp())?
                .abi_encode(),
            IVestingEscrowCalls::decreaseLockedOf(call) => {
                self.ownable.only_owner(ctx)?;
                let settled = self
                    .ledger
                    .decrease(call.recipient, call.amount, ctx.timestamp())?;
                self.pay(ctx, call.recipient, settled)?;
                tracing::info!(recipient = %call.recipient, amount = %call.amount, "Decreased lock");
                Vec::new()
            }
            IVestingEscrowCalls::vestOf(call) => {
                let vest = self
                    .ledger
                    .schedule(call.recipient)
                    .copied()
                    .unwrap_or_default();
                (vest.start_at, vest.end_at, vest.total_locked, vest.claimed).abi_encode()
            }
            IVestingEscrowCalls::allocatedSupply(_) => self.ledger.allocated().abi_encode(),
            IVestingEscrowCalls::unallocatedSupply(_) => self.ledger.unallocated().abi_encode(),
            IVestingEscrowCalls::owner(_) => self.ownable.owner().abi_encode(),
            IVestingEscrowCalls::transferOwnership(call) => {
                self.ownable.transfer(ctx, call.newOwner)?;
                Vec::new()
            }
            IVestingEscrowCalls::resignOwnership(_) => {
                self.ownable.resign(ctx)?;
                Vec::new()
            }
            IVestingEscrowCalls::multicall(call) => {
                let mut results = Vec::with_capacity(call.data.len());
                for inner in &call.data {
                    results.push(self.dispatch(ctx, inner)?);
                }
                results.abi_encode()
            }
            IVestingEscrowCalls::supportsInterface(call) => {
                Self::supports_interface(call.interfaceId).abi_encode()
            }
        };
        Ok(output.into())
    }
}

//! A single-writer simulated chain that hosts the factory and its templates.
//!
//! Every top-level [`Chain::transact`] is atomic: accounts and logs are
//! snapshotted first and restored when the call fails. A contract's storage is
//! checked out of its account while one of its calls executes, so re-entering
//! the same contract fails.

mod logic;

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, B256, Bytes, Log, U256};
use alloy::sol_types::{SolCall, SolEvent, SolValue};

pub use logic::{CallContext, Contract, InstanceState, Logic, deployable, downcast};

use crate::abi::IBeacon;
use crate::address::{Proxy, derive_from_nonce};
use crate::error::{Error, Result};

const MAX_CALL_DEPTH: usize = 64;

/// Hardhat's default chain id.
pub const DEFAULT_CHAIN_ID: u64 = 31337;

const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

#[derive(Debug, Clone)]
pub enum Code {
    Logic(Arc<dyn Logic>),
    Proxy(Proxy),
}

#[derive(Debug, Clone, Default)]
struct Account {
    nonce: u64,
    balance: U256,
    code: Option<Code>,
    state: Option<Box<dyn InstanceState>>,
}

/// Output and logs of a successful transaction.
#[derive(Debug, Clone, Default)]
pub struct Receipt {
    pub output: Bytes,
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Decode the call output as the return value of `C`.
    pub fn returns<C: SolCall>(&self) -> Result<C::Return> {
        Ok(C::abi_decode_returns(&self.output)?)
    }

    /// All logs of event type `E`, in emission order.
    pub fn events<E: SolEvent>(&self) -> Vec<E> {
        decode_logs(&self.logs)
    }
}

fn decode_logs<E: SolEvent>(logs: &[Log]) -> Vec<E> {
    logs.iter()
        .filter(|log| log.data.topics().first() == Some(&E::SIGNATURE_HASH))
        .filter_map(|log| E::decode_log_data(&log.data).ok())
        .collect()
}

#[derive(Debug, Clone)]
pub struct Chain {
    chain_id: u64,
    timestamp: u64,
    accounts: HashMap<Address, Account>,
    logs: Vec<Log>,
    depth: usize,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID)
    }
}

impl Chain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            timestamp: GENESIS_TIMESTAMP,
            accounts: HashMap::new(),
            logs: Vec::new(),
            depth: 0,
        }
    }

    // ─── Environment ────────────────────────────────────────────────────────

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    pub fn advance(&mut self, seconds: u64) {
        self.timestamp += seconds;
    }

    // ─── Accounts ───────────────────────────────────────────────────────────

    pub fn nonce(&self, account: Address) -> u64 {
        self.accounts.get(&account).map_or(0, |a| a.nonce)
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.accounts.get(&account).map_or(U256::ZERO, |a| a.balance)
    }

    /// Set the native balance of `account`.
    pub fn deal(&mut self, account: Address, balance: U256) {
        self.accounts.entry(account).or_default().balance = balance;
    }

    pub fn has_code(&self, account: Address) -> bool {
        self.accounts
            .get(&account)
            .is_some_and(|a| a.code.is_some())
    }

    pub fn code(&self, account: Address) -> Option<&Code> {
        self.accounts.get(&account).and_then(|a| a.code.as_ref())
    }

    /// Every log emitted by committed transactions.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    // ─── Creation ───────────────────────────────────────────────────────────

    /// Deploy `logic` at the `CREATE` address of `creator`'s current nonce.
    pub fn create(&mut self, creator: Address, logic: Arc<dyn Logic>) -> Result<Address> {
        let address = derive_from_nonce(creator, self.bump_nonce(creator));
        let state = logic.create_state();
        tracing::debug!(%creator, %address, label = logic.label(), "create");
        self.install(address, Code::Logic(logic), state)?;
        Ok(address)
    }

    /// Deploy a proxy stub at its `CREATE2` address.
    pub fn create2(&mut self, creator: Address, salt: B256, proxy: Proxy) -> Result<Address> {
        let address = proxy.derive(creator, salt);
        if self.has_code(address) {
            return Err(Error::AlreadyDeployed(address));
        }
        let logic = self.resolve(address, &Code::Proxy(proxy))?;
        self.bump_nonce(creator);
        tracing::debug!(%creator, %address, ?proxy, label = logic.label(), "create2");
        self.install(address, Code::Proxy(proxy), logic.create_state())?;
        Ok(address)
    }

    fn bump_nonce(&mut self, account: Address) -> u64 {
        let entry = self.accounts.entry(account).or_default();
        let nonce = entry.nonce;
        entry.nonce += 1;
        nonce
    }

    fn install(
        &mut self,
        address: Address,
        code: Code,
        state: Box<dyn InstanceState>,
    ) -> Result<()> {
        let account = self.accounts.entry(address).or_default();
        if account.code.is_some() {
            return Err(Error::AlreadyDeployed(address));
        }
        account.nonce = 1;
        account.code = Some(code);
        account.state = Some(state);
        Ok(())
    }

    // ─── Execution ──────────────────────────────────────────────────────────

    /// Execute one atomic transaction from `from` to `to`.
    pub fn transact(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        input: impl Into<Bytes>,
    ) -> Result<Receipt> {
        let input = input.into();
        let accounts = self.accounts.clone();
        let log_count = self.logs.len();

        let result = self.call(from, to, value, &input);
        self.depth = 0;

        match result {
            Ok(output) => {
                self.bump_nonce(from);
                Ok(Receipt {
                    output,
                    logs: self.logs[log_count..].to_vec(),
                })
            }
            Err(e) => {
                tracing::debug!(%from, %to, error = %e, "transaction reverted");
                self.accounts = accounts;
                self.logs.truncate(log_count);
                self.bump_nonce(from);
                Err(e)
            }
        }
    }

    pub fn send<C: SolCall>(&mut self, from: Address, to: Address, call: &C) -> Result<Receipt> {
        self.transact(from, to, U256::ZERO, call.abi_encode())
    }

    pub fn send_value<C: SolCall>(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        call: &C,
    ) -> Result<Receipt> {
        self.transact(from, to, value, call.abi_encode())
    }

    /// Run `call` against a throwaway copy of the chain and decode its return value.
    pub fn view<C: SolCall>(&self, to: Address, call: &C) -> Result<C::Return> {
        let mut scratch = self.clone();
        let output = scratch.call(Address::ZERO, to, U256::ZERO, &call.abi_encode())?;
        Ok(C::abi_decode_returns(&output)?)
    }

    pub(crate) fn call(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        input: &[u8],
    ) -> Result<Bytes> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Error::CallDepth);
        }
        self.move_value(from, to, value)?;

        let Some(code) = self.code(to).cloned() else {
            return Ok(Bytes::new());
        };
        let logic = self.resolve(to, &code)?;

        let mut state = self
            .accounts
            .get_mut(&to)
            .and_then(|a| a.state.take())
            .ok_or(Error::Reentrancy(to))?;

        self.depth += 1;
        let result = {
            let mut ctx = CallContext {
                chain: self,
                this: to,
                sender: from,
                value,
            };
            logic.execute(&mut ctx, &mut *state, input)
        };
        self.depth -= 1;

        if let Some(account) = self.accounts.get_mut(&to) {
            account.state = Some(state);
        }
        result
    }

    /// The logic a call to an account with `code` runs.
    fn resolve(&mut self, at: Address, code: &Code) -> Result<Arc<dyn Logic>> {
        match code {
            Code::Logic(logic) => Ok(logic.clone()),
            Code::Proxy(Proxy::Minimal { implementation }) => self.logic_at(*implementation),
            Code::Proxy(Proxy::Beacon { beacon }) => {
                let output = self.call(
                    at,
                    *beacon,
                    U256::ZERO,
                    &IBeacon::implementationCall {}.abi_encode(),
                )?;
                let implementation = Address::abi_decode(&output)?;
                self.logic_at(implementation)
            }
        }
    }

    fn logic_at(&self, address: Address) -> Result<Arc<dyn Logic>> {
        match self.code(address) {
            Some(Code::Logic(logic)) => Ok(logic.clone()),
            _ => Err(Error::NoCode(address)),
        }
    }

    fn move_value(&mut self, from: Address, to: Address, value: U256) -> Result<()> {
        if value.is_zero() {
            return Ok(());
        }
        let have = self.balance(from);
        if have < value {
            return Err(Error::InsufficientFunds { need: value, have });
        }
        self.accounts.entry(from).or_default().balance = have - value;
        let recipient = self.accounts.entry(to).or_default();
        recipient.balance = recipient
            .balance
            .checked_add(value)
            .ok_or(Error::Overflow)?;
        Ok(())
    }

    pub(crate) fn emit<E: SolEvent>(&mut self, address: Address, event: &E) {
        self.logs.push(Log {
            address,
            data: event.encode_log_data(),
        });
    }

    /// Logs of event type `E` across all committed transactions.
    pub fn events<E: SolEvent>(&self) -> Vec<E> {
        decode_logs(&self.logs)
    }
}

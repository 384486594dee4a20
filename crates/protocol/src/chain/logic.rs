use std::any::Any;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::sol_types::{SolCall, SolEvent};

use super::Chain;
use crate::address::Proxy;
use crate::error::{Error, Result};

/// Storage of one deployed contract instance.
pub trait InstanceState: Any + Send + Sync + Debug {
    fn clone_box(&self) -> Box<dyn InstanceState>;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Clone + Send + Sync + Debug> InstanceState for T {
    fn clone_box(&self) -> Box<dyn InstanceState> {
        Box::new(self.clone())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn InstanceState> {
    fn clone(&self) -> Self {
        // Dispatch through the vtable; `self.clone_box()` would pick the blanket impl for the box.
        (**self).clone_box()
    }
}

/// Executable code: decodes calldata and runs it against an instance's storage.
pub trait Logic: Send + Sync + Debug {
    fn label(&self) -> &'static str;

    /// Fresh storage for a new instance (or a proxy pointing at this logic).
    fn create_state(&self) -> Box<dyn InstanceState>;

    fn execute(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut dyn InstanceState,
        input: &[u8],
    ) -> Result<Bytes>;
}

/// A contract whose storage is the implementing type itself.
pub trait Contract: Default + Clone + Debug + Send + Sync + 'static {
    const LABEL: &'static str;

    fn dispatch(&mut self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Bytes>;
}

#[derive(Debug)]
struct Deployable<C>(PhantomData<fn() -> C>);

impl<C: Contract> Logic for Deployable<C> {
    fn label(&self) -> &'static str {
        C::LABEL
    }

    fn create_state(&self) -> Box<dyn InstanceState> {
        Box::new(C::default())
    }

    fn execute(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut dyn InstanceState,
        input: &[u8],
    ) -> Result<Bytes> {
        let this = ctx.this();
        downcast::<C>(state, this)?.dispatch(ctx, input)
    }
}

/// Wrap a [`Contract`] type as deployable code.
pub fn deployable<C: Contract>() -> Arc<dyn Logic> {
    Arc::new(Deployable::<C>(PhantomData))
}

/// Borrow an instance's storage as its concrete type.
pub fn downcast<T: 'static>(state: &mut dyn InstanceState, at: Address) -> Result<&mut T> {
    state
        .as_any_mut()
        .downcast_mut::<T>()
        .ok_or(Error::StorageLayout(at))
}

/// Execution environment handed to a contract for the duration of one call.
pub struct CallContext<'a> {
    pub(super) chain: &'a mut Chain,
    pub(super) this: Address,
    pub(super) sender: Address,
    pub(super) value: U256,
}

impl CallContext<'_> {
    pub fn this(&self) -> Address {
        self.this
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn timestamp(&self) -> u64 {
        self.chain.timestamp()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain.chain_id()
    }

    /// Creation nonce of the executing contract.
    pub fn nonce(&self) -> u64 {
        self.chain.nonce(self.this)
    }

    /// Native balance of the executing contract.
    pub fn balance(&self) -> U256 {
        self.chain.balance(self.this)
    }

    pub fn has_code(&self, at: Address) -> bool {
        self.chain.has_code(at)
    }

    pub fn ensure_non_payable(&self) -> Result<()> {
        if self.value.is_zero() {
            Ok(())
        } else {
            Err(Error::NotPayable)
        }
    }

    /// Raw call from this contract to `to`.
    pub fn call(&mut self, to: Address, value: U256, input: &[u8]) -> Result<Bytes> {
        self.chain.call(self.this, to, value, input)
    }

    pub fn call_typed<C: SolCall>(&mut self, to: Address, call: &C) -> Result<C::Return> {
        let output = self.call(to, U256::ZERO, &call.abi_encode())?;
        Ok(C::abi_decode_returns(&output)?)
    }

    pub fn transfer_native(&mut self, to: Address, amount: U256) -> Result<()> {
        self.call(to, amount, &[]).map(drop)
    }

    pub fn emit<E: SolEvent>(&mut self, event: &E) {
        self.chain.emit(self.this, event);
    }

    pub fn create(&mut self, logic: Arc<dyn Logic>) -> Result<Address> {
        self.chain.create(self.this, logic)
    }

    pub fn create2(&mut self, salt: B256, proxy: Proxy) -> Result<Address> {
        self.chain.create2(self.this, salt, proxy)
    }
}

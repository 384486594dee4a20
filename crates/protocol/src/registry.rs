//! Template bookkeeping behind the factory.
//!
//! Pure state: the factory performs the beacon creation and upgrade calls and
//! records their outcome here.

use std::collections::HashMap;

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolValue;

use crate::address::template_key;
use crate::error::{Error, Result};

/// Price increase applied after every deploy, in basis points.
pub const PRICE_RAMP_BPS: u64 = 30;
const BPS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateMode {
    /// Deployed as EIP-1167 clones of a fixed implementation.
    Minimal,
    /// Deployed as beacon proxies; the implementation can be upgraded.
    Beacon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    pub key: B256,
    pub mode: TemplateMode,
    /// Implementation for minimal entries, beacon address for beacon entries.
    pub target: Address,
    /// Last implementation recorded for the entry.
    pub implementation: Address,
    /// Zero means administrator only.
    pub owner: Address,
    pub price: U256,
}

/// Decoded `updateTemplate` payload: `abi.encode(address, address, uint256)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateUpdate {
    pub implementation: Address,
    pub owner: Address,
    pub price: U256,
}

impl TemplateUpdate {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let (implementation, owner, price) = <(Address, Address, U256)>::abi_decode(data)?;
        Ok(Self {
            implementation,
            owner,
            price,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        (self.implementation, self.owner, self.price).abi_encode()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    nonce: U256,
    entries: HashMap<B256, TemplateEntry>,
    registered: HashMap<(TemplateMode, Address), B256>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrations performed so far; the nonce of the next key.
    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn get(&self, key: &B256) -> Result<&TemplateEntry> {
        self.entries.get(key).ok_or(Error::NonExist)
    }

    pub fn is_registered(&self, mode: TemplateMode, implementation: Address) -> bool {
        self.registered.contains_key(&(mode, implementation))
    }

    /// The key `register` would assign to `target` right now.
    pub fn next_key(&self, target: Address) -> B256 {
        template_key(target, self.nonce)
    }

    pub fn register(
        &mut self,
        mode: TemplateMode,
        target: Address,
        implementation: Address,
        owner: Address,
        price: U256,
    ) -> Result<B256> {
        if implementation.is_zero() || self.is_registered(mode, implementation) {
            return Err(Error::NonValid);
        }
        let key = self.next_key(target);
        if self.entries.contains_key(&key) {
            return Err(Error::NonValid);
        }

        self.entries.insert(
            key,
            TemplateEntry {
                key,
                mode,
                target,
                implementation,
                owner,
                price,
            },
        );
        self.registered.insert((mode, implementation), key);
        self.nonce += U256::from(1);
        Ok(key)
    }

    /// Apply an update by `caller`. Returns the updated entry.
    pub fn update(
        &mut self,
        key: &B256,
        caller: Address,
        admin: Address,
        update: &TemplateUpdate,
    ) -> Result<TemplateEntry> {
        let entry = self.get(key)?;
        let is_owner = !entry.owner.is_zero() && entry.owner == caller;
        if !is_owner && caller != admin {
            return Err(Error::Unauthorized);
        }

        let previous = entry.implementation;
        let mode = entry.mode;
        match mode {
            TemplateMode::Minimal if !update.implementation.is_zero() => {
                return Err(Error::NonValid);
            }
            TemplateMode::Minimal => {}
            TemplateMode::Beacon => {
                if update.implementation.is_zero() {
                    return Err(Error::NonValid);
                }
                if update.implementation != previous {
                    if self.is_registered(mode, update.implementation) {
                        return Err(Error::NonValid);
                    }
                    self.registered.remove(&(mode, previous));
                    self.registered.insert((mode, update.implementation), *key);
                }
            }
        }

        let entry = self.entries.get_mut(key).ok_or(Error::NonExist)?;
        if mode == TemplateMode::Beacon {
            entry.implementation = update.implementation;
        }
        entry.owner = update.owner;
        entry.price = update.price;
        Ok(entry.clone())
    }

    pub fn remove(&mut self, key: &B256) -> Result<TemplateEntry> {
        let entry = self.entries.remove(key).ok_or(Error::NonExist)?;
        self.registered.remove(&(entry.mode, entry.implementation));
        Ok(entry)
    }

    /// Charge price for `key` and ramp it up by [`PRICE_RAMP_BPS`].
    pub fn accrue(&mut self, key: &B256) -> Result<U256> {
        let entry = self.entries.get_mut(key).ok_or(Error::NonExist)?;
        let charged = entry.price;
        entry.price = ramp(charged)?;
        Ok(charged)
    }
}

/// `price + price * 30 / 10000`, failing on overflow.
pub fn ramp(price: U256) -> Result<U256> {
    let increase = price
        .checked_mul(U256::from(PRICE_RAMP_BPS))
        .ok_or(Error::Overflow)?
        / U256::from(BPS);
    price.checked_add(increase).ok_or(Error::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const ADMIN: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const OWNER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const IMPL: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
    const IMPL2: Address = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");
    const BEACON: Address = address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0");

    fn update(implementation: Address, owner: Address, price: u64) -> TemplateUpdate {
        TemplateUpdate {
            implementation,
            owner,
            price: U256::from(price),
        }
    }

    #[test]
    fn keys_follow_registration_nonce() {
        let mut registry = TemplateRegistry::new();
        let first = registry
            .register(TemplateMode::Minimal, IMPL, IMPL, Address::ZERO, U256::ZERO)
            .unwrap();
        assert_eq!(first, template_key(IMPL, U256::ZERO));

        let second = registry
            .register(TemplateMode::Beacon, BEACON, IMPL, Address::ZERO, U256::ZERO)
            .unwrap();
        assert_eq!(second, template_key(BEACON, U256::from(1)));
        assert_eq!(registry.nonce(), U256::from(2));
    }

    #[test]
    fn implementation_registers_once_per_mode() {
        let mut registry = TemplateRegistry::new();
        registry
            .register(TemplateMode::Minimal, IMPL, IMPL, Address::ZERO, U256::ZERO)
            .unwrap();
        let err = registry
            .register(TemplateMode::Minimal, IMPL, IMPL, Address::ZERO, U256::ZERO)
            .unwrap_err();
        assert!(matches!(err, Error::NonValid));
        // a failed registration does not consume a nonce
        assert_eq!(registry.nonce(), U256::from(1));
    }

    #[test]
    fn minimal_update_keeps_implementation() {
        let mut registry = TemplateRegistry::new();
        let key = registry
            .register(TemplateMode::Minimal, IMPL, IMPL, Address::ZERO, U256::from(5))
            .unwrap();

        let err = registry
            .update(&key, ADMIN, ADMIN, &update(IMPL2, OWNER, 7))
            .unwrap_err();
        assert!(matches!(err, Error::NonValid));

        let entry = registry
            .update(&key, ADMIN, ADMIN, &update(Address::ZERO, OWNER, 7))
            .unwrap();
        assert_eq!(entry.implementation, IMPL);
        assert_eq!(entry.owner, OWNER);
        assert_eq!(entry.price, U256::from(7));

        // the new owner may update its own entry, others may not
        registry
            .update(&key, OWNER, ADMIN, &update(Address::ZERO, OWNER, 9))
            .unwrap();
        let err = registry
            .update(&key, IMPL2, ADMIN, &update(Address::ZERO, IMPL2, 0))
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
    }

    #[test]
    fn beacon_update_requires_implementation() {
        let mut registry = TemplateRegistry::new();
        let key = registry
            .register(TemplateMode::Beacon, BEACON, IMPL, Address::ZERO, U256::ZERO)
            .unwrap();

        let err = registry
            .update(&key, ADMIN, ADMIN, &update(Address::ZERO, Address::ZERO, 0))
            .unwrap_err();
        assert!(matches!(err, Error::NonValid));

        let entry = registry
            .update(&key, ADMIN, ADMIN, &update(IMPL2, Address::ZERO, 0))
            .unwrap();
        assert_eq!(entry.implementation, IMPL2);
        assert_eq!(entry.target, BEACON);
        assert!(registry.is_registered(TemplateMode::Beacon, IMPL2));
        assert!(!registry.is_registered(TemplateMode::Beacon, IMPL));
    }

    #[test]
    fn removed_keys_are_gone() {
        let mut registry = TemplateRegistry::new();
        let key = registry
            .register(TemplateMode::Minimal, IMPL, IMPL, Address::ZERO, U256::ZERO)
            .unwrap();
        registry.remove(&key).unwrap();

        assert!(matches!(registry.get(&key), Err(Error::NonExist)));
        assert!(matches!(registry.remove(&key), Err(Error::NonExist)));
        assert!(matches!(registry.accrue(&key), Err(Error::NonExist)));
        assert!(!registry.is_registered(TemplateMode::Minimal, IMPL));
    }

    #[test]
    fn price_ramps_by_thirty_bps() {
        let mut registry = TemplateRegistry::new();
        let key = registry
            .register(TemplateMode::Minimal, IMPL, IMPL, Address::ZERO, U256::from(10_000))
            .unwrap();
        assert_eq!(registry.accrue(&key).unwrap(), U256::from(10_000));
        assert_eq!(registry.get(&key).unwrap().price, U256::from(10_030));
        assert_eq!(ramp(U256::ZERO).unwrap(), U256::ZERO);
        assert!(matches!(ramp(U256::MAX), Err(Error::Overflow)));
    }

    #[test]
    fn update_payload_decodes() {
        let payload = update(IMPL2, OWNER, 42);
        assert_eq!(payload.encode().len(), 96);
        assert_eq!(TemplateUpdate::decode(&payload.encode()).unwrap(), payload);
    }
}

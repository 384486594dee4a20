//! Deterministic contract address derivation.
//!
//! Covers nonce-based creation (`CREATE`), salted creation (`CREATE2`) and the
//! two proxy stubs the factory deploys: the EIP-1167 minimal proxy and a
//! beacon proxy that asks its beacon for the implementation on every call.

use alloy::primitives::{Address, B256, Bytes, U256, hex, keccak256};
use alloy::sol_types::SolValue;

/// Init code preceding the implementation address in an EIP-1167 clone.
pub const MINIMAL_PROXY_PREFIX: [u8; 20] = hex!("3d602d80600a3d3981f3363d3d373d3d3d363d73");

/// Init code following the implementation address in an EIP-1167 clone.
pub const MINIMAL_PROXY_SUFFIX: [u8; 15] = hex!("5af43d82803e903d91602b57fd5bf3");

/// Init code preceding the beacon address in a beacon proxy.
///
/// The runtime staticcalls `implementation()` (`0x5c60da1b`) on the beacon and
/// delegatecalls the returned address with the original calldata.
pub const BEACON_PROXY_PREFIX: [u8; 25] =
    hex!("3d604a80600a3d3981f3635c60da1b3d5260203d6004601c73");

/// Init code following the beacon address in a beacon proxy.
pub const BEACON_PROXY_SUFFIX: [u8; 39] =
    hex!("5afa5060005136600060003760006000366000845af43d6000803e6045573d6000fd5b3d6000f3");

/// Address produced by `CREATE` from `creator` at account nonce `nonce`.
pub fn derive_from_nonce(creator: Address, nonce: u64) -> Address {
    creator.create(nonce)
}

/// Address produced by `CREATE2` from `creator` with `salt` and the keccak of the init code.
pub fn derive_from_salt(creator: Address, salt: B256, init_code_hash: B256) -> Address {
    creator.create2(salt.0, init_code_hash.0)
}

/// The 55-byte EIP-1167 init code delegating to `implementation`.
pub fn minimal_proxy_init_code(implementation: Address) -> Bytes {
    [
        &MINIMAL_PROXY_PREFIX[..],
        implementation.as_slice(),
        &MINIMAL_PROXY_SUFFIX[..],
    ]
    .concat()
    .into()
}

/// The beacon proxy init code pointing at `beacon`.
pub fn beacon_proxy_init_code(beacon: Address) -> Bytes {
    [
        &BEACON_PROXY_PREFIX[..],
        beacon.as_slice(),
        &BEACON_PROXY_SUFFIX[..],
    ]
    .concat()
    .into()
}

pub fn derive_minimal_proxy(creator: Address, salt: B256, implementation: Address) -> Address {
    derive_from_salt(
        creator,
        salt,
        keccak256(minimal_proxy_init_code(implementation)),
    )
}

pub fn derive_beacon_proxy(creator: Address, salt: B256, beacon: Address) -> Address {
    derive_from_salt(creator, salt, keccak256(beacon_proxy_init_code(beacon)))
}

/// Registry key for `target` registered at registration nonce `nonce`.
pub fn template_key(target: Address, nonce: U256) -> B256 {
    keccak256((target, nonce).abi_encode())
}

/// Salt for a factory deployment: `keccak(initData)` or, with a seed,
/// `keccak(seed ‖ initData)`.
pub fn deploy_salt(seed: Option<&str>, init_data: &[u8]) -> B256 {
    match seed {
        Some(seed) => keccak256([seed.as_bytes(), init_data].concat()),
        None => keccak256(init_data),
    }
}

/// A proxy stub that forwards every call to another contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Proxy {
    /// EIP-1167 clone of a fixed implementation.
    Minimal { implementation: Address },
    /// Reads the implementation from `beacon` on each call.
    Beacon { beacon: Address },
}

impl Proxy {
    pub fn init_code(&self) -> Bytes {
        match self {
            Self::Minimal { implementation } => minimal_proxy_init_code(*implementation),
            Self::Beacon { beacon } => beacon_proxy_init_code(*beacon),
        }
    }

    /// Address this proxy lands at when created by `creator` with `salt`.
    pub fn derive(&self, creator: Address, salt: B256) -> Address {
        match self {
            Self::Minimal { implementation } => derive_minimal_proxy(creator, salt, *implementation),
            Self::Beacon { beacon } => derive_beacon_proxy(creator, salt, *beacon),
        }
    }

    /// The address stored in the stub.
    pub fn target(&self) -> Address {
        match self {
            Self::Minimal { implementation } => *implementation,
            Self::Beacon { beacon } => *beacon,
        }
    }
}

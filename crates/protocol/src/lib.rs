//! Token factory protocol: deterministic proxy deployment against a template
//! registry, plus the token, bridged L2 token, Merkle distributor and vesting
//! escrow templates, all hosted on an in-process simulated chain.

pub mod abi;
pub mod access;
pub mod address;
pub mod allowlist;
pub mod beacon;
pub mod chain;
pub mod erc20;
pub mod error;
pub mod factory;
pub mod introspection;
pub mod l2_token;
pub mod merkle;
pub mod registry;
pub mod token;
pub mod vesting;

pub use address::Proxy;
pub use chain::{Chain, Receipt, deployable};
pub use error::{Error, Result};
pub use factory::Factory;
pub use registry::{TemplateEntry, TemplateMode, TemplateRegistry};

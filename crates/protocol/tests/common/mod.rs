#![allow(dead_code)]

use alloy::primitives::{Address, B256, Bytes, U256, address};
use alloy::sol_types::SolCall;

use factori_protocol::Chain;
use factori_protocol::abi::{IAllowlist, IFactory, IStandardToken};
use factori_protocol::allowlist::Allowlist;
use factori_protocol::chain::deployable;
use factori_protocol::factory::Factory;
use factori_protocol::token::StandardToken;

pub const ADMIN: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const DUMMY: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const FEE_TO: Address = address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");
pub const OTHER: Address = address!("90F79bf6EB2c4f870365E785982E1f101E93b906");

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10).pow(U256::from(18))
}

/// `n` thousandths of an ether.
pub fn milli_ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10).pow(U256::from(15))
}

pub struct Fixture {
    pub chain: Chain,
    pub factory: Address,
    pub allowlist: Address,
    pub token_impl: Address,
}

impl Fixture {
    /// Allowlist, factory (fee 0.001 ether to `FEE_TO`) and a token implementation.
    pub fn new() -> Self {
        let mut chain = Chain::default();
        chain.deal(ADMIN, ether(100));
        chain.deal(DUMMY, ether(100));

        let allowlist = chain.create(ADMIN, deployable::<Allowlist>()).unwrap();
        chain
            .send(ADMIN, allowlist, &IAllowlist::initializeCall {})
            .unwrap();

        let factory = chain.create(ADMIN, deployable::<Factory>()).unwrap();
        chain
            .send(
                ADMIN,
                factory,
                &IFactory::initializeCall {
                    fee: milli_ether(1),
                    feeTo: FEE_TO,
                    allowlist,
                },
            )
            .unwrap();

        let token_impl = chain.create(ADMIN, deployable::<StandardToken>()).unwrap();

        Self {
            chain,
            factory,
            allowlist,
            token_impl,
        }
    }

    pub fn add_template(&mut self, implementation: Address, price: U256) -> B256 {
        self.chain
            .send(
                ADMIN,
                self.factory,
                &IFactory::addTemplateCall {
                    implementation,
                    owner: Address::ZERO,
                    price,
                },
            )
            .unwrap()
            .returns::<IFactory::addTemplateCall>()
            .unwrap()
    }

    pub fn add_beacon(&mut self, implementation: Address, price: U256) -> B256 {
        self.chain
            .send(
                ADMIN,
                self.factory,
                &IFactory::addBeaconCall {
                    implementation,
                    owner: Address::ZERO,
                    price,
                },
            )
            .unwrap()
            .returns::<IFactory::addBeaconCall>()
            .unwrap()
    }

    pub fn token_view<C: SolCall>(&self, token: Address, call: &C) -> C::Return {
        self.chain.view(token, call).unwrap()
    }
}

pub fn token_init(name: &str, symbol: &str, decimals: u8) -> Bytes {
    IStandardToken::initializeCall {
        name: name.into(),
        symbol: symbol.into(),
        decimals,
    }
    .abi_encode()
    .into()
}

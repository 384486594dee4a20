mod common;

use alloy::primitives::{Address, B256, Bytes, U256, fixed_bytes};
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;

use common::{ADMIN, DUMMY, Fixture, ether, token_init};
use factori_protocol::{Chain, Error};
use factori_protocol::abi::{IFactory, IStandardToken, IVestingEscrow, Permit};
use factori_protocol::chain::deployable;
use factori_protocol::introspection;
use factori_protocol::token::permit_digest;
use factori_protocol::vesting::VestingEscrow;

struct Escrow {
    fx: Fixture,
    token: Address,
    escrow: Address,
}

fn deploy_token(fx: &mut Fixture, holder: Address, amount: U256) -> Address {
    let key = fx.add_template(fx.token_impl, U256::ZERO);
    fx.chain
        .send(
            ADMIN,
            fx.factory,
            &IFactory::deployCall {
                useBeaconProxy: false,
                key,
                initData: token_init("SAMPLE", "SAM", 18),
                calls: vec![
                    IStandardToken::mintToCall {
                        to: holder,
                        value: amount,
                    }
                    .abi_encode()
                    .into(),
                ],
            },
        )
        .unwrap()
        .returns::<IFactory::deployCall>()
        .unwrap()
}

/// Escrow owned by `ADMIN`, created through the factory with `locks` registered up front.
fn escrow(locks: Vec<IVestingEscrow::LockParams>) -> Escrow {
    let mut fx = Fixture::new();
    let token = deploy_token(&mut fx, ADMIN, ether(1000));
    let escrow_impl = fx
        .chain
        .create(ADMIN, deployable::<VestingEscrow>())
        .unwrap();
    let key = fx.add_template(escrow_impl, U256::ZERO);

    let escrow = fx
        .chain
        .send(
            ADMIN,
            fx.factory,
            &IFactory::deployCall {
                useBeaconProxy: false,
                key,
                initData: IVestingEscrow::initializeCall { token, locks }
                    .abi_encode()
                    .into(),
                calls: vec![
                    IVestingEscrow::transferOwnershipCall { newOwner: ADMIN }
                        .abi_encode()
                        .into(),
                ],
            },
        )
        .unwrap()
        .returns::<IFactory::deployCall>()
        .unwrap();

    Escrow { fx, token, escrow }
}

impl Escrow {
    fn fund(&mut self, amount: U256) {
        self.fx
            .chain
            .send(
                ADMIN,
                self.token,
                &IStandardToken::approveCall {
                    spender: self.escrow,
                    value: amount,
                },
            )
            .unwrap();
        self.fx
            .chain
            .send(ADMIN, self.escrow, &IVestingEscrow::fundCall { amount })
            .unwrap();
    }

    fn balance(&self, account: Address) -> U256 {
        self.fx
            .chain
            .view(self.token, &IStandardToken::balanceOfCall { account })
            .unwrap()
    }

    /// Claim for `recipient` and return the amount paid.
    fn claim(&mut self, recipient: Address) -> U256 {
        let receipt = self
            .fx
            .chain
            .send(DUMMY, self.escrow, &IVestingEscrow::claimCall { recipient })
            .unwrap();
        receipt
            .events::<IVestingEscrow::Claimed>()
            .into_iter()
            .map(|e| e.amount)
            .sum()
    }

    fn now(&self) -> u64 {
        self.fx.chain.timestamp()
    }
}

#[test]
fn initialized_locks_pay_out_once_funded() {
    let recipient = Address::repeat_byte(0x11);
    let start = Chain::default().timestamp() + 1;
    let mut e = escrow(vec![IVestingEscrow::LockParams {
        recipient,
        amount: ether(1),
        startAt: start,
        endAt: start + 100_000,
    }]);
    assert_eq!(
        e.fx.chain
            .view(e.escrow, &IVestingEscrow::allocatedSupplyCall {})
            .unwrap(),
        ether(1)
    );

    // allocated but unfunded: the token transfer fails
    e.fx.chain.advance(200_000);
    let unfunded = e
        .fx
        .chain
        .send(DUMMY, e.escrow, &IVestingEscrow::claimCall { recipient });
    assert!(matches!(unfunded, Err(Error::InsufficientBalance)));
    assert_eq!(e.balance(recipient), U256::ZERO);

    e.fund(ether(1));
    assert_eq!(e.balance(e.escrow), ether(1));
    assert_eq!(e.claim(recipient), ether(1));
    assert_eq!(e.balance(recipient), ether(1));
    assert_eq!(e.balance(e.escrow), U256::ZERO);

    // a completed schedule can be replaced
    e.fund(ether(2));
    let start = e.now() + 1;
    e.fx.chain
        .send(
            ADMIN,
            e.escrow,
            &IVestingEscrow::lockCall {
                recipient,
                amount: ether(2),
                startAt: start,
                endAt: start + 100,
            },
        )
        .unwrap();
    e.fx.chain.advance(1_000);
    assert_eq!(e.claim(recipient), ether(2));
    assert_eq!(e.balance(recipient), ether(3));
}

#[test]
fn lock_rejects_bad_parameters() {
    let mut e = escrow(Vec::new());
    e.fund(ether(100));
    let now = e.now();
    let recipient = Address::repeat_byte(0x22);

    let mut lock = |recipient, amount, start_at, end_at| {
        e.fx.chain.send(
            ADMIN,
            e.escrow,
            &IVestingEscrow::lockCall {
                recipient,
                amount,
                startAt: start_at,
                endAt: end_at,
            },
        )
    };

    let zero = lock(Address::ZERO, ether(1), now + 1, now + 10);
    assert_eq!(zero.unwrap_err().to_string(), "VestingEscrow/Not-Allowed-For-Zero");
    let over = lock(recipient, ether(101), now + 1, now + 10);
    assert_eq!(over.unwrap_err().to_string(), "VestingEscrow/Not-Enough-balance");
    let past = lock(recipient, ether(1), now - 1, now + 10);
    assert_eq!(past.unwrap_err().to_string(), "VestingEscrow/Forwarded-start");
    let inverted = lock(recipient, ether(1), now + 10, now + 10);
    assert_eq!(inverted.unwrap_err().to_string(), "VestingEscrow/Bigger-than-end");

    let receipt = lock(recipient, ether(100), now + 1, now + 100_001).unwrap();
    assert_eq!(
        receipt.events::<IVestingEscrow::Locked>(),
        vec![IVestingEscrow::Locked {
            recipient,
            amount: ether(100),
            startAt: now + 1,
        }]
    );
    let duplicate = lock(recipient, U256::ZERO, now + 1, now + 10);
    assert_eq!(duplicate.unwrap_err().to_string(), "VestingEscrow/Already-Registred");

    let vest = e
        .fx
        .chain
        .view(e.escrow, &IVestingEscrow::vestOfCall { recipient })
        .unwrap();
    assert_eq!(vest.startAt, now + 1);
    assert_eq!(vest.endAt, now + 100_001);
    assert_eq!(vest.initialLocked, ether(100));
    assert_eq!(vest.totalClaimed, U256::ZERO);
    assert_eq!(
        e.fx.chain
            .view(e.escrow, &IVestingEscrow::unallocatedSupplyCall {})
            .unwrap(),
        U256::ZERO
    );

    let stranger = e.fx.chain.send(
        DUMMY,
        e.escrow,
        &IVestingEscrow::lockCall {
            recipient: DUMMY,
            amount: U256::ZERO,
            startAt: now + 1,
            endAt: now + 2,
        },
    );
    assert!(matches!(stranger, Err(Error::Unauthorized)));
}

#[test]
fn linear_claims_and_decrease() {
    let mut e = escrow(Vec::new());
    e.fund(ether(100));
    let start = e.now() + 1;
    let recipient = Address::repeat_byte(0x33);
    e.fx.chain
        .send(
            ADMIN,
            e.escrow,
            &IVestingEscrow::lockCall {
                recipient,
                amount: ether(100),
                startAt: start,
                endAt: start + 100_000,
            },
        )
        .unwrap();

    e.fx.chain.set_timestamp(start + 1_000);
    assert_eq!(
        e.fx.chain
            .view(e.escrow, &IVestingEscrow::claimableCall { recipient })
            .unwrap(),
        ether(1)
    );

    // decrease settles the vested token first
    e.fx.chain
        .send(
            ADMIN,
            e.escrow,
            &IVestingEscrow::decreaseLockedOfCall {
                recipient,
                amount: ether(50),
            },
        )
        .unwrap();
    assert_eq!(e.balance(recipient), ether(1));
    assert_eq!(
        e.fx.chain
            .view(e.escrow, &IVestingEscrow::unallocatedSupplyCall {})
            .unwrap(),
        ether(50)
    );

    e.fx.chain.set_timestamp(start + 3_000);
    assert_eq!(e.claim(recipient), ether(1) / U256::from(2));

    let too_much = e.fx.chain.send(
        ADMIN,
        e.escrow,
        &IVestingEscrow::decreaseLockedOfCall {
            recipient,
            amount: ether(50),
        },
    );
    assert_eq!(too_much.unwrap_err().to_string(), "VestingEscrow/Not Enough");

    // nothing new vested within the same second
    assert_eq!(e.claim(recipient), U256::ZERO);
}

#[test]
fn fund_with_permit_pulls_from_signer() {
    let signer = PrivateKeySigner::random();
    let holder = signer.address();

    let mut fx = Fixture::new();
    let token = deploy_token(&mut fx, holder, ether(10));
    let escrow_impl = fx
        .chain
        .create(ADMIN, deployable::<VestingEscrow>())
        .unwrap();
    let key = fx.add_template(escrow_impl, U256::ZERO);
    let escrow = fx
        .chain
        .send(
            ADMIN,
            fx.factory,
            &IFactory::deployCall {
                useBeaconProxy: false,
                key,
                initData: IVestingEscrow::initializeCall {
                    token,
                    locks: Vec::new(),
                }
                .abi_encode()
                .into(),
                calls: Vec::new(),
            },
        )
        .unwrap()
        .returns::<IFactory::deployCall>()
        .unwrap();

    let chain_id = fx.chain.chain_id();
    let sign = |amount: U256, nonce: u64| {
        let digest = permit_digest(
            "SAMPLE",
            chain_id,
            token,
            &Permit {
                owner: holder,
                spender: escrow,
                value: amount,
                nonce: U256::from(nonce),
                deadline: U256::MAX,
            },
        );
        let sig = signer.sign_hash_sync(&digest).unwrap();
        IVestingEscrow::fundWithPermitCall {
            amount,
            v: 27 + sig.v() as u8,
            r: B256::from(sig.r().to_be_bytes::<32>()),
            s: B256::from(sig.s().to_be_bytes::<32>()),
        }
    };

    let call = sign(ether(4), 0);
    let receipt = fx.chain.send(holder, escrow, &call).unwrap();
    assert_eq!(
        receipt.events::<IVestingEscrow::Funded>(),
        vec![IVestingEscrow::Funded { amount: ether(4) }]
    );
    assert_eq!(
        fx.chain
            .view(token, &IStandardToken::balanceOfCall { account: escrow })
            .unwrap(),
        ether(4)
    );

    // signed for more than the holder owns
    let call = sign(ether(20), 1);
    assert!(matches!(
        fx.chain.send(holder, escrow, &call),
        Err(Error::InsufficientBalance)
    ));

    let unapproved = fx
        .chain
        .send(ADMIN, escrow, &IVestingEscrow::fundCall { amount: ether(1) });
    assert!(matches!(unapproved, Err(Error::InsufficientAllowance)));
}

#[test]
fn claims_accrue_linearly_over_the_lock() {
    let mut e = escrow(Vec::new());
    e.fund(ether(100));
    let start = e.now() + 1;
    let recipient = Address::repeat_byte(0x44);
    e.fx.chain
        .send(
            ADMIN,
            e.escrow,
            &IVestingEscrow::lockCall {
                recipient,
                amount: ether(100),
                startAt: start,
                endAt: start + 100_000,
            },
        )
        .unwrap();

    e.fx.chain.set_timestamp(start + 1_000);
    assert_eq!(e.claim(recipient), ether(1));
    assert_eq!(e.balance(recipient), ether(1));

    e.fx.chain.set_timestamp(start + 3_000);
    assert_eq!(e.claim(recipient), ether(2));
    assert_eq!(e.balance(recipient), ether(3));
    assert_eq!(e.balance(e.escrow), ether(97));

    let vest = e
        .fx
        .chain
        .view(e.escrow, &IVestingEscrow::vestOfCall { recipient })
        .unwrap();
    assert_eq!(vest.initialLocked, ether(100));
    assert_eq!(vest.totalClaimed, ether(3));
}

#[test]
fn multicall_locks_atomically() {
    let mut e = escrow(Vec::new());
    e.fund(ether(10));
    let start = e.now() + 1;
    let lock = |recipient, amount| -> Bytes {
        IVestingEscrow::lockCall {
            recipient,
            amount,
            startAt: start,
            endAt: start + 100,
        }
        .abi_encode()
        .into()
    };
    let first = Address::repeat_byte(0x55);
    let second = Address::repeat_byte(0x66);

    // the second lock exceeds what is left, so neither is registered
    let over = e.fx.chain.send(
        ADMIN,
        e.escrow,
        &IVestingEscrow::multicallCall {
            data: vec![lock(first, ether(6)), lock(second, ether(6))],
        },
    );
    assert!(matches!(over, Err(Error::NotEnoughBalance)));
    assert_eq!(
        e.fx.chain
            .view(e.escrow, &IVestingEscrow::allocatedSupplyCall {})
            .unwrap(),
        U256::ZERO
    );

    let receipt = e
        .fx
        .chain
        .send(
            ADMIN,
            e.escrow,
            &IVestingEscrow::multicallCall {
                data: vec![lock(first, ether(6)), lock(second, ether(4))],
            },
        )
        .unwrap();
    assert_eq!(receipt.events::<IVestingEscrow::Locked>().len(), 2);
    assert_eq!(
        e.fx.chain
            .view(e.escrow, &IVestingEscrow::unallocatedSupplyCall {})
            .unwrap(),
        U256::ZERO
    );
}

#[test]
fn owner_can_resign() {
    let mut e = escrow(Vec::new());
    let now = e.now();
    e.fx.chain
        .send(ADMIN, e.escrow, &IVestingEscrow::resignOwnershipCall {})
        .unwrap();
    assert_eq!(
        e.fx.chain
            .view(e.escrow, &IVestingEscrow::ownerCall {})
            .unwrap(),
        Address::ZERO
    );
    let lock = e.fx.chain.send(
        ADMIN,
        e.escrow,
        &IVestingEscrow::lockCall {
            recipient: DUMMY,
            amount: U256::ZERO,
            startAt: now + 1,
            endAt: now + 2,
        },
    );
    assert_eq!(lock.unwrap_err().to_string(), "Ownership/Not-Authorized");
}

#[test]
fn escrow_reports_supported_interfaces() {
    let e = escrow(Vec::new());
    let supports = |id| {
        e.fx.chain
            .view(
                e.escrow,
                &IVestingEscrow::supportsInterfaceCall { interfaceId: id },
            )
            .unwrap()
    };

    assert!(!supports(fixed_bytes!("00000001")));
    assert!(supports(introspection::erc165()));
    assert!(supports(introspection::erc173()));
    assert!(supports(introspection::multicall()));
    assert!(!supports(introspection::erc20()));
}

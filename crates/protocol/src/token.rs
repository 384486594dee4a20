//! ERC-20 token template with EIP-2612 permits, ERC-173 ownership and multicall.

use alloy::primitives::{Address, Bytes, FixedBytes, U256};
use alloy::sol_types::{SolInterface, SolValue};

use crate::abi::IStandardToken::{self, IStandardTokenCalls};
use crate::access::{Ownable, initializer};
use crate::chain::{CallContext, Contract};
use crate::erc20::{Erc20, PermitArgs};
use crate::error::{Error, Result};
use crate::introspection;

pub use crate::erc20::{PERMIT_VERSION, permit_digest, permit_domain};

/// Owner-mintable ERC-20. Only the owner may mint or burn; `burnFrom` also
/// spends the holder's allowance to the owner.
#[derive(Debug, Clone, Default)]
pub struct StandardToken {
    initialized: bool,
    ownable: Ownable,
    erc20: Erc20,
}

impl StandardToken {
    pub fn balance_of(&self, account: Address) -> U256 {
        self.erc20.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.erc20.allowance(owner, spender)
    }

    pub fn supports_interface(interface_id: FixedBytes<4>) -> bool {
        [
            introspection::erc165(),
            introspection::erc20(),
            introspection::erc2612(),
            introspection::erc173(),
            introspection::multicall(),
        ]
        .contains(&interface_id)
    }
}

impl Contract for StandardToken {
    const LABEL: &'static str = "StandardToken";

    fn dispatch(&mut self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Bytes> {
        ctx.ensure_non_payable()?;
        let sender = ctx.sender();
        let output = match IStandardTokenCalls::abi_decode(input)? {
            IStandardTokenCalls::initialize(call) => {
                initializer(&mut self.initialized)?;
                self.erc20 = Erc20::new(call.name, call.symbol, call.decimals);
                self.ownable.init(ctx, sender);
                Vec::new()
            }
            IStandardTokenCalls::name(_) => self.erc20.name.abi_encode(),
            IStandardTokenCalls::symbol(_) => self.erc20.symbol.abi_encode(),
            IStandardTokenCalls::decimals(_) => U256::from(self.erc20.decimals).abi_encode(),
            IStandardTokenCalls::totalSupply(_) => self.erc20.total_supply().abi_encode(),
            IStandardTokenCalls::balanceOf(call) => self.balance_of(call.account).abi_encode(),
            IStandardTokenCalls::allowance(call) => {
                self.allowance(call.owner, call.spender).abi_encode()
            }
            IStandardTokenCalls::transfer(call) => {
                self.erc20.transfer(ctx, sender, call.to, call.value)?;
                true.abi_encode()
            }
            IStandardTokenCalls::transferFrom(call) => {
                self.erc20.spend_allowance(call.from, sender, call.value)?;
                self.erc20.transfer(ctx, call.from, call.to, call.value)?;
                true.abi_encode()
            }
            IStandardTokenCalls::approve(call) => {
                self.erc20.approve(ctx, sender, call.spender, call.value)?;
                true.abi_encode()
            }
            IStandardTokenCalls::mint(call) => {
                self.ownable.only_owner(ctx)?;
                self.erc20.mint(ctx, sender, call.value)?;
                Vec::new()
            }
            IStandardTokenCalls::mintTo(call) => {
                self.ownable.only_owner(ctx)?;
                self.erc20.mint(ctx, call.to, call.value)?;
                Vec::new()
            }
            IStandardTokenCalls::burn(call) => {
                self.ownable.only_owner(ctx)?;
                self.erc20.burn(ctx, sender, call.value)?;
                Vec::new()
            }
            IStandardTokenCalls::burnFrom(call) => {
                self.ownable.only_owner(ctx)?;
                self.erc20.spend_allowance(call.from, sender, call.value)?;
                self.erc20.burn(ctx, call.from, call.value)?;
                Vec::new()
            }
            IStandardTokenCalls::permit(call) => {
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
            IStandardTokenCalls::nonces(call) => self.erc20.nonce(call.owner).abi_encode(),
            IStandardTokenCalls::DOMAIN_SEPARATOR(_) => {
                self.erc20.domain_separator(ctx).abi_encode()
            }
            IStandardTokenCalls::owner(_) => self.ownable.owner().abi_encode(),
            IStandardTokenCalls::transferOwnership(call) => {
                self.ownable.transfer(ctx, call.newOwner)?;
                Vec::new()
            }
            IStandardTokenCalls::resignOwnership(_) => {
                self.ownable.resign(ctx)?;
                Vec::new()
            }
            IStandardTokenCalls::multicall(call) => {
                let mut results = Vec::with_capacity(call.data.len());
                for inner in &call.data {
                    results.push(self.dispatch(ctx, inner)?);
                }
                results.abi_encode()
            }
            IStandardTokenCalls::supportsInterface(call) => {
                Self::supports_interface(call.interfaceId).abi_encode()
            }
        };
        Ok(output.into())
    }
}

// ─── Calls into token instances ─────────────────────────────────────────────

/// `token.transfer(to, amount)`, requiring a `true` return.
pub fn safe_transfer(
    ctx: &mut CallContext<'_>,
    token: Address,
    to: Address,
    amount: U256,
) -> Result<()> {
    let ok = ctx.call_typed(token, &IStandardToken::transferCall { to, value: amount })?;
    if ok { Ok(()) } else { Err(Error::TransferFailed(token)) }
}

/// `token.transferFrom(from, this, amount)`, requiring a `true` return.
pub fn safe_transfer_from(
    ctx: &mut CallContext<'_>,
    token: Address,
    from: Address,
    amount: U256,
) -> Result<()> {
    let to = ctx.this();
    let ok = ctx.call_typed(
        token,
        &IStandardToken::transferFromCall {
            from,
            to,
            value: amount,
        },
    )?;
    if ok { Ok(()) } else { Err(Error::TransferFailed(token)) }
}

pub fn balance_of(ctx: &mut CallContext<'_>, token: Address, account: Address) -> Result<U256> {
    ctx.call_typed(token, &IStandardToken::balanceOfCall { account })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::Permit;
    use crate::chain::{Chain, deployable};
    use alloy::primitives::{B256, address, fixed_bytes};
    use alloy::signers::SignerSync;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::sol_types::SolCall;

    const ADMIN: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const BOB: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn token(chain: &mut Chain) -> Address {
        let token = chain.create(ADMIN, deployable::<StandardToken>()).unwrap();
        chain
            .send(
                ADMIN,
                token,
                &IStandardToken::initializeCall {
                    name: "SAMPLE".into(),
                    symbol: "SAM".into(),
                    decimals: 18,
                },
            )
            .unwrap();
        token
    }

    fn balance(chain: &Chain, token: Address, account: Address) -> U256 {
        chain
            .view(token, &IStandardToken::balanceOfCall { account })
            .unwrap()
    }

    #[test]
    fn initializes_once_and_owner_mints() {
        let mut chain = Chain::default();
        let token = token(&mut chain);

        assert_eq!(chain.view(token, &IStandardToken::ownerCall {}).unwrap(), ADMIN);
        assert_eq!(chain.view(token, &IStandardToken::decimalsCall {}).unwrap(), 18);
        assert_eq!(
            chain.view(token, &IStandardToken::symbolCall {}).unwrap(),
            "SAM"
        );

        let again = IStandardToken::initializeCall {
            name: "X".into(),
            symbol: "X".into(),
            decimals: 6,
        };
        assert!(matches!(
            chain.send(ADMIN, token, &again),
            Err(Error::AlreadyInitialized)
        ));

        let mint = IStandardToken::mintToCall {
            to: BOB,
            value: U256::from(100),
        };
        assert!(matches!(
            chain.send(BOB, token, &mint),
            Err(Error::Unauthorized)
        ));
        chain.send(ADMIN, token, &mint).unwrap();
        assert_eq!(balance(&chain, token, BOB), U256::from(100));
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let mut chain = Chain::default();
        let token = token(&mut chain);
        chain
            .send(ADMIN, token, &IStandardToken::mintCall { value: U256::from(50) })
            .unwrap();

        let pull = IStandardToken::transferFromCall {
            from: ADMIN,
            to: BOB,
            value: U256::from(20),
        };
        assert!(matches!(
            chain.send(BOB, token, &pull),
            Err(Error::InsufficientAllowance)
        ));

        chain
            .send(
                ADMIN,
                token,
                &IStandardToken::approveCall {
                    spender: BOB,
                    value: U256::from(30),
                },
            )
            .unwrap();
        let receipt = chain.send(BOB, token, &pull).unwrap();
        assert_eq!(receipt.events::<IStandardToken::Transfer>().len(), 1);
        assert_eq!(
            chain
                .view(token, &IStandardToken::allowanceCall { owner: ADMIN, spender: BOB })
                .unwrap(),
            U256::from(10)
        );
        assert_eq!(balance(&chain, token, BOB), U256::from(20));

        let to_zero = IStandardToken::transferCall {
            to: Address::ZERO,
            value: U256::from(1),
        };
        assert!(matches!(
            chain.send(ADMIN, token, &to_zero),
            Err(Error::ZeroAddress)
        ));
    }

    #[test]
    fn approving_zero_spender_is_allowed() {
        let mut chain = Chain::default();
        let token = token(&mut chain);
        chain
            .send(
                ADMIN,
                token,
                &IStandardToken::approveCall {
                    spender: Address::ZERO,
                    value: U256::from(1),
                },
            )
            .unwrap();
    }

    #[test]
    fn permit_sets_allowance_from_signature() {
        let mut chain = Chain::default();
        let token = token(&mut chain);
        let signer = PrivateKeySigner::random();
        let owner = signer.address();

        let deadline = U256::from(chain.timestamp() + 3600);
        let digest = permit_digest(
            "SAMPLE",
            chain.chain_id(),
            token,
            &Permit {
                owner,
                spender: BOB,
                value: U256::from(7),
                nonce: U256::ZERO,
                deadline,
            },
        );
        let sig = signer.sign_hash_sync(&digest).unwrap();
        let permit = IStandardToken::permitCall {
            owner,
            spender: BOB,
            value: U256::from(7),
            deadline,
            v: 27 + sig.v() as u8,
            r: B256::from(sig.r().to_be_bytes::<32>()),
            s: B256::from(sig.s().to_be_bytes::<32>()),
        };

        chain.send(BOB, token, &permit).unwrap();
        assert_eq!(
            chain
                .view(token, &IStandardToken::allowanceCall { owner, spender: BOB })
                .unwrap(),
            U256::from(7)
        );
        assert_eq!(
            chain.view(token, &IStandardToken::noncesCall { owner }).unwrap(),
            U256::from(1)
        );

        // replaying the same signature fails against the bumped nonce
        assert!(matches!(
            chain.send(BOB, token, &permit),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn expired_permit_is_rejected() {
        let mut chain = Chain::default();
        let token = token(&mut chain);
        let permit = IStandardToken::permitCall {
            owner: ADMIN,
            spender: BOB,
            value: U256::from(1),
            deadline: U256::from(chain.timestamp() - 1),
            v: 27,
            r: B256::ZERO,
            s: B256::ZERO,
        };
        assert!(matches!(
            chain.send(BOB, token, &permit),
            Err(Error::PermitExpired)
        ));
    }

    #[test]
    fn multicall_is_all_or_nothing() {
        let mut chain = Chain::default();
        let token = token(&mut chain);

        let calls = vec![
            IStandardToken::mintCall { value: U256::from(10) }.abi_encode().into(),
            IStandardToken::transferCall {
                to: BOB,
                value: U256::from(4),
            }
            .abi_encode()
            .into(),
        ];
        let receipt = chain
            .send(ADMIN, token, &IStandardToken::multicallCall { data: calls })
            .unwrap();
        let results = receipt.returns::<IStandardToken::multicallCall>().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(balance(&chain, token, BOB), U256::from(4));

        let bad = vec![
            IStandardToken::mintCall { value: U256::from(10) }.abi_encode().into(),
            Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        ];
        assert!(
            chain
                .send(ADMIN, token, &IStandardToken::multicallCall { data: bad })
                .is_err()
        );
        assert_eq!(
            chain.view(token, &IStandardToken::totalSupplyCall {}).unwrap(),
            U256::from(10)
        );
    }

    #[test]
    fn domain_separator_matches_helper() {
        let mut chain = Chain::default();
        let token = token(&mut chain);
        let separator = chain
            .view(token, &IStandardToken::DOMAIN_SEPARATORCall {})
            .unwrap();
        assert_eq!(
            separator,
            permit_domain("SAMPLE", chain.chain_id(), token).separator()
        );
    }

    #[test]
    fn only_owner_burns() {
        let mut chain = Chain::default();
        let token = token(&mut chain);
        chain
            .send(
                ADMIN,
                token,
                &IStandardToken::mintToCall {
                    to: BOB,
                    value: U256::from(100),
                },
            )
            .unwrap();

        let burn = IStandardToken::burnCall {
            value: U256::from(10),
        };
        let denied = chain.send(BOB, token, &burn);
        assert_eq!(denied.unwrap_err().to_string(), "Ownership/Not-Authorized");

        chain
            .send(ADMIN, token, &IStandardToken::mintCall { value: U256::from(10) })
            .unwrap();
        let receipt = chain.send(ADMIN, token, &burn).unwrap();
        let transfers = receipt.events::<IStandardToken::Transfer>();
        assert_eq!(transfers[0].to, Address::ZERO);
        assert_eq!(balance(&chain, token, ADMIN), U256::ZERO);
        assert_eq!(
            chain.view(token, &IStandardToken::totalSupplyCall {}).unwrap(),
            U256::from(100)
        );
    }

    #[test]
    fn burn_from_spends_holder_allowance() {
        let mut chain = Chain::default();
        let token = token(&mut chain);
        chain
            .send(
                ADMIN,
                token,
                &IStandardToken::mintToCall {
                    to: BOB,
                    value: U256::from(100),
                },
            )
            .unwrap();

        let burn_from = IStandardToken::burnFromCall {
            from: BOB,
            value: U256::from(100),
        };
        assert!(matches!(
            chain.send(ADMIN, token, &burn_from),
            Err(Error::InsufficientAllowance)
        ));
        assert!(matches!(
            chain.send(BOB, token, &burn_from),
            Err(Error::Unauthorized)
        ));

        chain
            .send(
                BOB,
                token,
                &IStandardToken::approveCall {
                    spender: ADMIN,
                    value: U256::MAX,
                },
            )
            .unwrap();
        chain.send(ADMIN, token, &burn_from).unwrap();
        assert_eq!(balance(&chain, token, BOB), U256::ZERO);
        assert_eq!(
            chain.view(token, &IStandardToken::totalSupplyCall {}).unwrap(),
            U256::ZERO
        );

        // nothing left to burn
        assert!(matches!(
            chain.send(ADMIN, token, &burn_from),
            Err(Error::InsufficientBalance)
        ));
    }

    #[test]
    fn token_address_cannot_receive_or_spend() {
        let mut chain = Chain::default();
        let token = token(&mut chain);
        chain
            .send(ADMIN, token, &IStandardToken::mintCall { value: U256::from(10) })
            .unwrap();

        let approve = chain.send(
            ADMIN,
            token,
            &IStandardToken::approveCall {
                spender: token,
                value: U256::MAX,
            },
        );
        assert_eq!(approve.unwrap_err().to_string(), "ERC20/Impossible-Approve-to-Self");

        assert!(matches!(
            chain.send(
                ADMIN,
                token,
                &IStandardToken::transferCall {
                    to: token,
                    value: U256::from(1),
                },
            ),
            Err(Error::TransferToSelf)
        ));
        assert!(matches!(
            chain.send(
                ADMIN,
                token,
                &IStandardToken::mintToCall {
                    to: token,
                    value: U256::from(1),
                },
            ),
            Err(Error::TransferToSelf)
        ));

        chain
            .send(
                ADMIN,
                token,
                &IStandardToken::approveCall {
                    spender: BOB,
                    value: U256::from(5),
                },
            )
            .unwrap();
        assert!(matches!(
            chain.send(
                BOB,
                token,
                &IStandardToken::transferFromCall {
                    from: ADMIN,
                    to: token,
                    value: U256::from(1),
                },
            ),
            Err(Error::TransferToSelf)
        ));
    }

    #[test]
    fn zero_owner_permit_is_rejected() {
        let mut chain = Chain::default();
        let token = token(&mut chain);
        let permit = IStandardToken::permitCall {
            owner: Address::ZERO,
            spender: BOB,
            value: U256::from(1),
            deadline: U256::MAX,
            v: 27,
            r: B256::ZERO,
            s: B256::ZERO,
        };
        let result = chain.send(BOB, token, &permit);
        assert_eq!(result.unwrap_err().to_string(), "ERC2612/Invalid-address-0");
    }

    #[test]
    fn reports_supported_interfaces() {
        let mut chain = Chain::default();
        let token = token(&mut chain);
        let supports = |chain: &Chain, id| {
            chain
                .view(
                    token,
                    &IStandardToken::supportsInterfaceCall { interfaceId: id },
                )
                .unwrap()
        };

        assert!(!supports(&chain, fixed_bytes!("00000001")));
        assert!(supports(&chain, introspection::erc165()));
        assert!(supports(&chain, introspection::erc20()));
        assert!(supports(&chain, introspection::erc2612()));
        assert!(supports(&chain, introspection::erc173()));
        assert!(supports(&chain, introspection::multicall()));
        assert!(!supports(&chain, introspection::l2_standard_erc20()));
    }
}

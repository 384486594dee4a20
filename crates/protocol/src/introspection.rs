//! ERC-165 interface ids.
//!
//! An interface id is the XOR of the selectors of every function in it.

use alloy::primitives::FixedBytes;
use alloy::sol_types::SolCall;

use crate::abi::{IERC165, IERC173, IL2StandardERC20, IMulticall, IStandardToken};

pub fn interface_id(selectors: &[[u8; 4]]) -> FixedBytes<4> {
    let mut id = [0u8; 4];
    for selector in selectors {
        for (byte, s) in id.iter_mut().zip(selector) {
            *byte ^= s;
        }
    }
    FixedBytes(id)
}

pub fn erc165() -> FixedBytes<4> {
    interface_id(&[IERC165::supportsInterfaceCall::SELECTOR])
}

pub fn erc173() -> FixedBytes<4> {
    interface_id(&[
        IERC173::ownerCall::SELECTOR,
        IERC173::transferOwnershipCall::SELECTOR,
    ])
}

/// ERC-20 including the `name`/`symbol`/`decimals` metadata getters.
pub fn erc20() -> FixedBytes<4> {
    use IStandardToken as T;
    interface_id(&[
        T::nameCall::SELECTOR,
        T::symbolCall::SELECTOR,
        T::decimalsCall::SELECTOR,
        T::totalSupplyCall::SELECTOR,
        T::transferCall::SELECTOR,
        T::transferFromCall::SELECTOR,
        T::approveCall::SELECTOR,
        T::balanceOfCall::SELECTOR,
        T::allowanceCall::SELECTOR,
    ])
}

pub fn erc2612() -> FixedBytes<4> {
    interface_id(&[IStandardToken::permitCall::SELECTOR])
}

pub fn multicall() -> FixedBytes<4> {
    interface_id(&[IMulticall::multicallCall::SELECTOR])
}

/// Optimism's `IL2StandardERC20`: `l1Token`, `mint(address,uint256)`, `burn(address,uint256)`.
pub fn l2_standard_erc20() -> FixedBytes<4> {
    interface_id(&[
        IL2StandardERC20::l1TokenCall::SELECTOR,
        IL2StandardERC20::mintCall::SELECTOR,
        IL2StandardERC20::burnCall::SELECTOR,
    ])
}

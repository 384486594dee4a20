use alloy::primitives::{Address, U256};
use thiserror::Error;

/// Revert reasons raised by the factory and its templates.
///
/// The `Display` output of each variant is the reason string a caller would
/// see when the transaction reverts.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Factory ────────────────────────────────────────────────────────────
    #[error("Factory/Non-Valid")]
    NonValid,

    #[error("Factory/Non-Exist")]
    NonExist,

    #[error("Factory/Incorrect-amounts")]
    IncorrectAmounts,

    #[error("Factory/Already-Deployed: {0}")]
    AlreadyDeployed(Address),

    // ─── Access ─────────────────────────────────────────────────────────────
    #[error("Ownership/Not-Authorized")]
    Unauthorized,

    #[error("Initializable/Already-Initialized")]
    AlreadyInitialized,

    // ─── Token ──────────────────────────────────────────────────────────────
    #[error("ERC20/Insufficient-balance")]
    InsufficientBalance,

    #[error("ERC20/Insufficient-allowance")]
    InsufficientAllowance,

    #[error("ERC2612/Expired-time")]
    PermitExpired,

    #[error("ERC2612/Invalid-Signature")]
    InvalidSignature,

    #[error("ERC2612/Invalid-address-0")]
    PermitZeroOwner,

    #[error("ERC20/Zero-address")]
    ZeroAddress,

    #[error("ERC20/Impossible-Approve-to-Self")]
    ApproveToSelf,

    #[error("ERC20/Impossible-Transfer-to-Self")]
    TransferToSelf,

    #[error("Only L2 Bridge can mint and burn")]
    OnlyBridge,

    #[error("SafeTransfer/Failed: {0}")]
    TransferFailed(Address),

    // ─── Merkle distributor ─────────────────────────────────────────────────
    #[error("MerkleDistributor/Invalid-proof")]
    InvalidProof,

    #[error("MerkleDistributor/Already-claimed")]
    AlreadyClaimed,

    #[error("MerkleDistributor/Finalized")]
    Finalized,

    // ─── Vesting escrow ─────────────────────────────────────────────────────
    #[error("VestingEscrow/Not-Allowed-For-Zero")]
    ZeroRecipient,

    #[error("VestingEscrow/Not-Enough-balance")]
    NotEnoughBalance,

    #[error("VestingEscrow/Already-Registred")]
    AlreadyRegistered,

    #[error("VestingEscrow/Forwarded-start")]
    StartInPast,

    #[error("VestingEscrow/Bigger-than-end")]
    StartAfterEnd,

    #[error("VestingEscrow/Not Enough")]
    NotEnoughLocked,

    // ─── Execution ──────────────────────────────────────────────────────────
    #[error("arithmetic overflow")]
    Overflow,

    #[error("re-entrant call into {0}")]
    Reentrancy(Address),

    #[error("no contract code at {0}")]
    NoCode(Address),

    #[error("unexpected storage layout at {0}")]
    StorageLayout(Address),

    #[error("insufficient funds: need {need}, have {have}")]
    InsufficientFunds { need: U256, have: U256 },

    #[error("call depth exceeded")]
    CallDepth,

    #[error("non-payable function received value")]
    NotPayable,

    #[error("ABI error: {0}")]
    Abi(#[from] alloy::sol_types::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

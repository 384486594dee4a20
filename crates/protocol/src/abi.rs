use alloy::sol;

// ─── ERC-173 Ownership ──────────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IERC173 {
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
    }
}

// ─── ERC-165 / Multicall ────────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IERC165 {
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }
}

sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IMulticall {
        function multicall(bytes[] data) external returns (bytes[] results);
    }
}

// ─── Factory ────────────────────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IFactory {
        event NewTemplate(bytes32 indexed key, address indexed template, uint256 price);
        event UpdatedTemplate(
            bytes32 indexed key,
            address indexed template,
            address indexed owner,
            uint256 price
        );
        event DeletedTemplate(bytes32 indexed key);
        event Deployed(address indexed deployed, address indexed deployer);
        event FeeChanged(uint256 previous, uint256 current);
        event FeeToChanged(address indexed previous, address indexed current);

        function initialize(uint256 fee, address feeTo, address allowlist) external;
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;

        function nonce() external view returns (uint256);
        function fee() external view returns (uint256);
        function feeTo() external view returns (address);
        function allowlist() external view returns (address);
        function templates(bytes32 key)
            external
            view
            returns (address template, address owner, uint256 price, bool beacon);
        function resolve(bytes32 key) external view returns (address);
        function getPrice(bytes32 key) external view returns (uint256);

        function addTemplate(address implementation, address owner, uint256 price)
            external
            returns (bytes32);
        function addBeacon(address implementation, address owner, uint256 price)
            external
            returns (bytes32);
        function updateTemplate(bytes32 key, bytes data) external;
        function removeTemplate(bytes32 key) external;

        function compute(bool useBeaconProxy, bytes32 key, bytes initData)
            external
            view
            returns (address);
        function computeWithSeed(string seed, bool useBeaconProxy, bytes32 key, bytes initData)
            external
            view
            returns (address);
        function deploy(bool useBeaconProxy, bytes32 key, bytes initData, bytes[] calls)
            external
            payable
            returns (address);
        function deployWithSeed(
            string seed,
            bool useBeaconProxy,
            bytes32 key,
            bytes initData,
            bytes[] calls
        ) external payable returns (address);
        function clone(address implementation, bytes initData, bytes[] calls)
            external
            payable
            returns (address);

        function collect(address token) external;
        function changeFee(uint256 newFee) external;
        function changeFeeTo(address newFeeTo) external;
        function recoverOwnership(address deployed, address newOwner) external;
    }
}

// ─── Standard token template ────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IStandardToken {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function initialize(string name, string symbol, uint8 decimals) external;

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);

        function transfer(address to, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
        function approve(address spender, uint256 value) external returns (bool);

        function mint(uint256 value) external;
        function mintTo(address to, uint256 value) external;
        function burn(uint256 value) external;
        function burnFrom(address from, uint256 value) external;

        function permit(
            address owner,
            address spender,
            uint256 value,
            uint256 deadline,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
        function nonces(address owner) external view returns (uint256);
        function DOMAIN_SEPARATOR() external view returns (bytes32);

        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function resignOwnership() external;

        function multicall(bytes[] data) external returns (bytes[] results);
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }
}

// ─── L2 bridged token template ──────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IL2StandardERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
        event Mint(address indexed account, uint256 amount);
        event Burn(address indexed account, uint256 amount);

        function initialize(string name, string symbol, uint8 decimals, address l1Token) external;

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);

        function transfer(address to, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
        function approve(address spender, uint256 value) external returns (bool);

        function l1Token() external view returns (address);
        function l2Bridge() external view returns (address);
        function mint(address to, uint256 amount) external;
        function burn(address from, uint256 amount) external;

        function permit(
            address owner,
            address spender,
            uint256 value,
            uint256 deadline,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
        function nonces(address owner) external view returns (uint256);
        function DOMAIN_SEPARATOR() external view returns (bytes32);

        function multicall(bytes[] data) external returns (bytes[] results);
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }
}

// ─── Upgradeable beacon ─────────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IBeacon {
        event Upgraded(address indexed implementation);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function initialize(address implementation) external;
        function implementation() external view returns (address);
        function upgradeTo(address newImplementation) external;
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
    }
}

// ─── Allowlist ──────────────────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IAllowlist {
        event Allowed(address indexed account);
        event Revoked(address indexed account);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function initialize() external;
        function authorise(address account) external;
        function revoke(address account) external;
        function allowance(address account) external view returns (bool);
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
    }
}

// ─── Merkle distributor ─────────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IMerkleDistributor {
        event Claimed(uint256 index, address indexed account, uint256 amount);
        event Finalized(address indexed token, bytes32 root);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function initialize(address token, bytes32 root) external;
        function token() external view returns (address);
        function root() external view returns (bytes32);
        function isClaimed(uint256 index) external view returns (bool);
        function claim(uint256 index, address account, uint256 amount, bytes32[] proof) external;
        function finalize() external;
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
    }
}

// ─── Vesting escrow ─────────────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IVestingEscrow {
        struct LockParams {
            address recipient;
            uint256 amount;
            uint64 startAt;
            uint64 endAt;
        }

        event Funded(uint256 amount);
        event Locked(address indexed recipient, uint256 amount, uint64 startAt);
        event Claimed(address indexed recipient, uint256 amount);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function initialize(address token, LockParams[] locks) external;
        function token() external view returns (address);
        function fund(uint256 amount) external;
        function fundWithPermit(uint256 amount, uint8 v, bytes32 r, bytes32 s) external;
        function lock(address recipient, uint256 amount, uint64 startAt, uint64 endAt) external;
        function claim(address recipient) external;
        function claimable(address recipient) external view returns (uint256);
        function decreaseLockedOf(address recipient, uint256 amount) external;
        function vestOf(address recipient)
            external
            view
            returns (uint64 startAt, uint64 endAt, uint256 initialLocked, uint256 totalClaimed);
        function allocatedSupply() external view returns (uint256);
        function unallocatedSupply() external view returns (uint256);
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function resignOwnership() external;

        function multicall(bytes[] data) external returns (bytes[] results);
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }
}

// ─── EIP-712 ────────────────────────────────────────────────────────────────
sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }
}


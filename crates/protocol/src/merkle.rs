//! Merkle claim ledger.
//!
//! Leaves are `keccak256(abi.encodePacked(uint256 index, address account, uint256 amount))`
//! and inner nodes hash the sorted pair of their children, so proofs carry no
//! left/right flags. When a level has an odd node count the last node moves up
//! unchanged.

use std::collections::HashMap;

use alloy::primitives::{Address, B256, Bytes, U256, keccak256};
use alloy::sol_types::{SolInterface, SolValue};

use crate::abi::IMerkleDistributor::{self, IMerkleDistributorCalls};
use crate::access::{Ownable, initializer};
use crate::chain::{CallContext, Contract};
use crate::error::{Error, Result};
use crate::token;

pub fn leaf_hash(index: U256, account: Address, amount: U256) -> B256 {
    keccak256((index, account, amount).abi_encode_packed())
}

pub fn hash_pair(a: B256, b: B256) -> B256 {
    if a <= b {
        keccak256([a.as_slice(), b.as_slice()].concat())
    } else {
        keccak256([b.as_slice(), a.as_slice()].concat())
    }
}

pub fn verify(proof: &[B256], root: B256, leaf: B256) -> bool {
    proof.iter().fold(leaf, |node, sibling| hash_pair(node, *sibling)) == root
}

/// Off-chain tree builder producing roots and proofs for a distribution.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    pub fn new(leaves: Vec<B256>) -> Self {
        let mut layers = vec![leaves];
        while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
            let next = layer
                .chunks(2)
                .map(|pair| pair.iter().copied().reduce(hash_pair).unwrap_or_default())
                .collect();
            layers.push(next);
        }
        Self { layers }
    }

    /// Tree over `(account, amount)` claims indexed by position.
    pub fn from_claims(claims: &[(Address, U256)]) -> Self {
        Self::new(
            claims
                .iter()
                .enumerate()
                .map(|(index, (account, amount))| leaf_hash(U256::from(index), *account, *amount))
                .collect(),
        )
    }

    /// Root of the tree; zero for an empty tree.
    pub fn root(&self) -> B256 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default()
    }

    /// Sibling path for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<Vec<B256>> {
        if index >= self.layers.first()?.len() {
            return None;
        }
        let mut proof = Vec::new();
        let mut position = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            if let Some(sibling) = layer.get(position ^ 1) {
                proof.push(*sibling);
            }
            position /= 2;
        }
        Some(proof)
    }
}

/// Packed claimed flags, 256 per word.
#[derive(Debug, Clone, Default)]
pub struct ClaimBitmap {
    words: HashMap<U256, U256>,
}

impl ClaimBitmap {
    fn locate(index: U256) -> (U256, U256) {
        let word = index >> 8;
        let bit = U256::from(1) << (index & U256::from(255)).to::<usize>();
        (word, bit)
    }

    pub fn is_set(&self, index: U256) -> bool {
        let (word, bit) = Self::locate(index);
        self.words
            .get(&word)
            .is_some_and(|flags| !(*flags & bit).is_zero())
    }

    pub fn set(&mut self, index: U256) {
        let (word, bit) = Self::locate(index);
        *self.words.entry(word).or_default() |= bit;
    }
}

#[derive(Debug, Clone, Default)]
pub struct MerkleDistributor {
    initialized: bool,
    ownable: Ownable,
    token: Address,
    root: B256,
    claimed: ClaimBitmap,
    finalized: bool,
}

impl MerkleDistributor {
    fn claim(
        &mut self,
        ctx: &mut CallContext<'_>,
        call: IMerkleDistributor::claimCall,
    ) -> Result<()> {
        if self.finalized {
            return Err(Error::Finalized);
        }
        if self.claimed.is_set(call.index) {
            return Err(Error::AlreadyClaimed);
        }
        let leaf = leaf_hash(call.index, call.account, call.amount);
        if !verify(&call.proof, self.root, leaf) {
            return Err(Error::InvalidProof);
        }

        self.claimed.set(call.index);
        token::safe_transfer(ctx, self.token, call.account, call.amount)?;

        ctx.emit(&IMerkleDistributor::Claimed {
            index: call.index,
            account: call.account,
            amount: call.amount,
        });
        tracing::info!(
            index = %call.index,
            account = %call.account,
            amount = %call.amount,
            "Claimed"
        );
        Ok(())
    }

    fn finalize(&mut self, ctx: &mut CallContext<'_>) -> Result<()> {
        self.ownable.only_owner(ctx)?;
        if self.finalized {
            return Err(Error::Finalized);
        }
        self.finalized = true;
        self.root = B256::ZERO;

        let this = ctx.this();
        let remaining = token::balance_of(ctx, self.token, this)?;
        if !remaining.is_zero() {
            token::safe_transfer(ctx, self.token, self.ownable.owner(), remaining)?;
        }

        ctx.emit(&IMerkleDistributor::Finalized {
            token: self.token,
            root: self.root,
        });
        tracing::info!(token = %self.token, %remaining, "Finalized distribution");
        Ok(())
    }
}

impl Contract for MerkleDistributor {
    const LABEL: &'static str = "MerkleDistributor";

    fn dispatch(&mut self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Bytes> {
        ctx.ensure_non_payable()?;
        let output = match IMerkleDistributorCalls::abi_decode(input)? {
            IMerkleDistributorCalls::initialize(call) => {
                initializer(&mut self.initialized)?;
                let owner = ctx.sender();
                self.ownable.init(ctx, owner);
                self.token = call.token;
                self.root = call.root;
                Vec::new()
            }
            IMerkleDistributorCalls::token(_) => self.token.abi_encode(),
            IMerkleDistributorCalls::root(_) => self.root.abi_encode(),
            IMerkleDistributorCalls::isClaimed(call) => {
                self.claimed.is_set(call.index).abi_encode()
            }
            IMerkleDistributorCalls::claim(call) => {
                self.claim(ctx, call)?;
                Vec::new()
            }
            IMerkleDistributorCalls::finalize(_) => {
                self.finalize(ctx)?;
                Vec::new()
            }
            IMerkleDistributorCalls::owner(_) => self.ownable.owner().abi_encode(),
            IMerkleDistributorCalls::transferOwnership(call) => {
                self.ownable.transfer(ctx, call.newOwner)?;
                Vec::new()
            }
        };
        Ok(output.into())
    }
}

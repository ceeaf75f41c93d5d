// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`ChainId`] of chain-constrained outputs.

use std::fmt;

use crate::{
    address::{Address, AliasAddress, NftAddress},
    output::{AliasId, FoundryId, NftId},
};

/// The persistent identity of a chain-constrained output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub enum ChainId {
    /// The id of an alias chain.
    Alias(AliasId),
    /// The id of a foundry chain.
    Foundry(FoundryId),
    /// The id of an NFT chain.
    Nft(NftId),
}

impl ChainId {
    /// The address form of this chain id, if the chain is addressable.
    pub fn to_address(self) -> Option<Address> {
        match self {
            Self::Alias(id) => Some(Address::Alias(AliasAddress::new(id))),
            Self::Nft(id) => Some(Address::Nft(NftAddress::new(id))),
            Self::Foundry(_) => None,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alias(id) => write!(f, "{}", prefix_hex::encode(id.as_bytes().as_slice())),
            Self::Foundry(id) => write!(f, "{}", prefix_hex::encode(id.as_bytes().as_slice())),
            Self::Nft(id) => write!(f, "{}", prefix_hex::encode(id.as_bytes().as_slice())),
        }
    }
}

/// The kind of transition a chain undergoes within a transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChainTransitionKind {
    /// The chain is created.
    Genesis,
    /// The chain continues with a next state.
    StateChange,
    /// The chain is destroyed.
    Destroy,
}

impl fmt::Display for ChainTransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Genesis => write!(f, "genesis"),
            Self::StateChange => write!(f, "state change"),
            Self::Destroy => write!(f, "destroy"),
        }
    }
}

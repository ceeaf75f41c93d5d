// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`ExtendedOutput`].

use crate::{
    address::Address,
    codec::{pack_array, unpack_array, CodecMode, Packable, Packer, Unpacker},
    error::Error,
    output::{
        feature_block::{FeatureBlock, FEATURE_BLOCKS_ARRAY_RULES},
        native_token::{NativeToken, NATIVE_TOKENS_ARRAY_RULES},
    },
};

/// A value transfer that may additionally carry native tokens and feature blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedOutput {
    /// The owning address.
    pub address: Address,
    /// The deposited amount.
    pub amount: u64,
    /// The native tokens held by the output.
    pub native_tokens: Vec<NativeToken>,
    /// The feature blocks of the output.
    pub feature_blocks: Vec<FeatureBlock>,
}

impl ExtendedOutput {
    /// The type tag of an [`ExtendedOutput`].
    pub const KIND: u8 = 3;

    /// Creates a new [`ExtendedOutput`] without native tokens or feature blocks.
    pub fn new(address: Address, amount: u64) -> Self {
        Self {
            address,
            amount,
            native_tokens: Vec::new(),
            feature_blocks: Vec::new(),
        }
    }
}

impl Packable for ExtendedOutput {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        self.address.pack(packer, mode)?;
        packer.pack_u64(self.amount);
        pack_array(packer, &self.native_tokens, &NATIVE_TOKENS_ARRAY_RULES, mode)?;
        pack_array(packer, &self.feature_blocks, &FEATURE_BLOCKS_ARRAY_RULES, mode)?;
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        let address = Address::unpack(unpacker, mode)?;
        let amount = unpacker.unpack_u64()?;
        let native_tokens = unpack_array(unpacker, &NATIVE_TOKENS_ARRAY_RULES, mode)?;
        let feature_blocks = unpack_array(unpacker, &FEATURE_BLOCKS_ARRAY_RULES, mode)?;
        Ok(Self {
            address,
            amount,
            native_tokens,
            feature_blocks,
        })
    }
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;

    impl ExtendedOutput {
        /// Generates a random [`ExtendedOutput`] without native tokens or feature blocks.
        pub fn rand() -> Self {
            Self::new(Address::rand_ed25519(), crate::rand::rand_number_range(1_000..10_000_000))
        }
    }
}

// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`SimpleOutput`].

use crate::{
    address::Address,
    codec::{CodecMode, Packable, Packer, Unpacker},
    error::Error,
};

/// A plain value transfer to a single address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleOutput {
    /// The owning address.
    pub address: Address,
    /// The deposited amount.
    pub amount: u64,
}

impl SimpleOutput {
    /// The type tag of a [`SimpleOutput`].
    pub const KIND: u8 = 0;

    /// Creates a new [`SimpleOutput`].
    pub fn new(address: Address, amount: u64) -> Self {
        Self { address, amount }
    }
}

impl Packable for SimpleOutput {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        self.address.pack(packer, mode)?;
        packer.pack_u64(self.amount);
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        let address = Address::unpack(unpacker, mode)?;
        let amount = unpacker.unpack_u64()?;
        Ok(Self::new(address, amount))
    }
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;

    impl SimpleOutput {
        /// Generates a random [`SimpleOutput`].
        pub fn rand() -> Self {
            Self::new(Address::rand_ed25519(), crate::rand::rand_number_range(1_000..10_000_000))
        }
    }
}

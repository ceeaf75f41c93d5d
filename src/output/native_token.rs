// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`NativeToken`] types.

use std::{collections::BTreeMap, fmt};

use primitive_types::U256;

use crate::{
    codec::{ArrayRules, ArrayUniqueness, CodecMode, Packable, Packer, Unpacker},
    error::{Error, SemanticError},
    output::FoundryId,
    MAX_NATIVE_TOKENS_COUNT,
};

/// The array rules of the native tokens within an output.
pub const NATIVE_TOKENS_ARRAY_RULES: ArrayRules = ArrayRules::new(0, MAX_NATIVE_TOKENS_COUNT, ArrayUniqueness::Lexical);

/// Identifies a native token: the id of the minting foundry followed by its token tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct TokenId([u8; Self::LENGTH]);

impl TokenId {
    /// The byte length of a [`TokenId`].
    pub const LENGTH: usize = 38;

    /// Creates a new [`TokenId`].
    pub fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    /// Builds the token id of the given foundry and token tag.
    pub fn build(foundry_id: &FoundryId, token_tag: &[u8; 12]) -> Self {
        let mut bytes = [0u8; Self::LENGTH];
        bytes[..FoundryId::LENGTH].copy_from_slice(foundry_id.as_bytes());
        bytes[FoundryId::LENGTH..].copy_from_slice(token_tag);
        Self(bytes)
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }

    /// The id of the foundry that mints this token.
    pub fn foundry_id(&self) -> FoundryId {
        let mut bytes = [0u8; FoundryId::LENGTH];
        bytes.copy_from_slice(&self.0[..FoundryId::LENGTH]);
        FoundryId::new(bytes)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", prefix_hex::encode(self.0.as_slice()))
    }
}

/// An amount of a native token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NativeToken {
    /// The token this amount is denominated in.
    pub token_id: TokenId,
    /// The amount.
    pub amount: U256,
}

impl NativeToken {
    /// Creates a new [`NativeToken`].
    pub fn new(token_id: TokenId, amount: U256) -> Self {
        Self { token_id, amount }
    }
}

impl Packable for NativeToken {
    fn pack(&self, packer: &mut Packer, _mode: CodecMode) -> Result<(), Error> {
        packer.pack_bytes(self.token_id.as_bytes());
        let mut amount = [0u8; 32];
        self.amount.to_little_endian(&mut amount);
        packer.pack_bytes(&amount);
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, _mode: CodecMode) -> Result<Self, Error> {
        let token_id = TokenId::new(unpacker.unpack_array()?);
        let amount = U256::from_little_endian(&unpacker.unpack_array::<32>()?);
        Ok(Self::new(token_id, amount))
    }
}

/// Per-token sums over one side of a transaction.
pub type NativeTokenSum = BTreeMap<TokenId, U256>;

/// Sums native token amounts with overflow detection.
pub fn native_token_sum<'a>(
    native_tokens: impl Iterator<Item = &'a NativeToken>,
) -> Result<NativeTokenSum, SemanticError> {
    let mut sum = NativeTokenSum::new();
    for native_token in native_tokens {
        let entry = sum.entry(native_token.token_id).or_insert_with(U256::zero);
        *entry = entry
            .checked_add(native_token.amount)
            .ok_or(SemanticError::NativeTokenSumOverflow {
                token_id: native_token.token_id,
            })?;
    }
    Ok(sum)
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;
    use crate::rand::rand_bytes_array;

    impl TokenId {
        /// Generates a random [`TokenId`].
        pub fn rand() -> Self {
            Self::new(rand_bytes_array())
        }
    }

    impl NativeToken {
        /// Generates a random [`NativeToken`] with a small amount.
        pub fn rand() -> Self {
            Self::new(TokenId::rand(), U256::from(crate::rand::rand_number_range(1..u64::MAX)))
        }
    }
}

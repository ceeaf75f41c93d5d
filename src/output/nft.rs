// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`NftOutput`].

use crypto::hashes::{blake2b::Blake2b256, Digest};

use crate::{
    address::Address,
    codec::{pack_array, unpack_array, CodecMode, Packable, Packer, Unpacker},
    error::{Error, SemanticError},
    output::{
        feature_block::{issuer_block, FeatureBlock, FEATURE_BLOCKS_ARRAY_RULES},
        native_token::{NativeToken, NATIVE_TOKENS_ARRAY_RULES},
        ChainId, ChainTransitionKind, OutputId,
    },
    semantic::StateTransitionContext,
};

/// The persistent identity of an NFT chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct NftId([u8; Self::LENGTH]);

impl NftId {
    /// The byte length of an [`NftId`].
    pub const LENGTH: usize = 20;

    /// Creates a new [`NftId`].
    pub fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    /// The zeroed id an NFT carries before its first confirmation.
    pub fn null() -> Self {
        Self([0u8; Self::LENGTH])
    }

    /// Whether this id is zeroed.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; Self::LENGTH]
    }

    /// Derives the id from the output that created the chain: the
    /// left-truncated Blake2b-256 hash of the serialized output id.
    pub fn from_output_id(output_id: &OutputId) -> Self {
        let hash = Blake2b256::digest(output_id.to_bytes());
        let mut bytes = [0u8; Self::LENGTH];
        bytes.copy_from_slice(&hash[..Self::LENGTH]);
        Self(bytes)
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }
}

/// An output tracking a unique token with immutable associated metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NftOutput {
    /// The owning address.
    pub address: Address,
    /// The deposited amount.
    pub amount: u64,
    /// The native tokens held by the output.
    pub native_tokens: Vec<NativeToken>,
    /// The chain id; zeroed until the chain's first confirmation.
    pub nft_id: NftId,
    /// The metadata fixed at mint time.
    pub immutable_metadata: Box<[u8]>,
    /// The feature blocks of the output.
    pub feature_blocks: Vec<FeatureBlock>,
}

impl NftOutput {
    /// The type tag of an [`NftOutput`].
    pub const KIND: u8 = 6;

    /// The id of the chain, deriving it from the given output id if zeroed.
    pub fn chain_id(&self, output_id: &OutputId) -> ChainId {
        if self.nft_id.is_null() {
            ChainId::Nft(NftId::from_output_id(output_id))
        } else {
            ChainId::Nft(self.nft_id)
        }
    }
}

impl Packable for NftOutput {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        self.address.pack(packer, mode)?;
        packer.pack_u64(self.amount);
        pack_array(packer, &self.native_tokens, &NATIVE_TOKENS_ARRAY_RULES, mode)?;
        packer.pack_bytes(self.nft_id.as_bytes());
        packer.pack_u32(self.immutable_metadata.len() as u32);
        packer.pack_bytes(&self.immutable_metadata);
        pack_array(packer, &self.feature_blocks, &FEATURE_BLOCKS_ARRAY_RULES, mode)?;
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        let address = Address::unpack(unpacker, mode)?;
        let amount = unpacker.unpack_u64()?;
        let native_tokens = unpack_array(unpacker, &NATIVE_TOKENS_ARRAY_RULES, mode)?;
        let nft_id = NftId::new(unpacker.unpack_array()?);
        let metadata_len = unpacker.unpack_u32()? as usize;
        let immutable_metadata = unpacker.unpack_bytes(metadata_len)?.into();
        let feature_blocks = unpack_array(unpacker, &FEATURE_BLOCKS_ARRAY_RULES, mode)?;
        Ok(Self {
            address,
            amount,
            native_tokens,
            nft_id,
            immutable_metadata,
            feature_blocks,
        })
    }
}

/// Validates a transition of an NFT chain.
pub(crate) fn validate_transition(
    chain_id: ChainId,
    current: Option<&NftOutput>,
    next: Option<&NftOutput>,
    ctx: &StateTransitionContext<'_>,
) -> Result<(), SemanticError> {
    let invalid = |kind: ChainTransitionKind, reason: &str| SemanticError::InvalidChainTransition {
        chain_id,
        kind,
        reason: reason.to_owned(),
    };
    match (current, next) {
        // genesis
        (None, Some(next)) => {
            if let Some(issuer) = issuer_block(&next.feature_blocks) {
                if !ctx.is_unlocked(issuer) {
                    return Err(SemanticError::IssuerFeatureBlockNotUnlocked { chain_id });
                }
            }
            Ok(())
        }
        (Some(current), Some(next)) => {
            if current.immutable_metadata != next.immutable_metadata {
                return Err(invalid(
                    ChainTransitionKind::StateChange,
                    "immutable metadata must not change",
                ));
            }
            if issuer_block(&current.feature_blocks) != issuer_block(&next.feature_blocks) {
                return Err(invalid(ChainTransitionKind::StateChange, "issuer must not change"));
            }
            Ok(())
        }
        // an NFT may always be destroyed
        (Some(_), None) => Ok(()),
        (None, None) => Err(invalid(ChainTransitionKind::Destroy, "chain is on neither side")),
    }
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;

    impl NftId {
        /// Generates a random [`NftId`].
        pub fn rand() -> Self {
            Self::new(crate::rand::rand_bytes_array())
        }
    }

    impl NftOutput {
        /// Generates an [`NftOutput`] at its genesis state.
        pub fn rand_genesis() -> Self {
            Self {
                address: Address::rand_ed25519(),
                amount: crate::rand::rand_number_range(1_000..10_000_000),
                native_tokens: Vec::new(),
                nft_id: NftId::null(),
                immutable_metadata: Box::default(),
                feature_blocks: Vec::new(),
            }
        }
    }
}

#[cfg(all(test, feature = "rand"))]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn nft_output_round_trip() {
        let output = NftOutput {
            immutable_metadata: vec![7; 16].into(),
            ..NftOutput::rand_genesis()
        };
        let bytes = output.pack_to_vec(CodecMode::PERFORM_VALIDATION).unwrap();
        let mut unpacker = Unpacker::new(&bytes);
        assert_eq!(output, NftOutput::unpack(&mut unpacker, CodecMode::PERFORM_VALIDATION).unwrap());
        assert_eq!(unpacker.finish(), Ok(()));
    }
}

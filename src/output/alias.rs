// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`AliasOutput`].

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

/// The persistent identity of an alias chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct AliasId([u8; Self::LENGTH]);

impl AliasId {
    /// The byte length of an [`AliasId`].
    pub const LENGTH: usize = 20;

    /// Creates a new [`AliasId`].
    pub fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    /// The zeroed id an alias carries before its first confirmation.
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

/// An output carrying a state machine with separate state and governance controllers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasOutput {
    /// The deposited amount.
    pub amount: u64,
    /// The native tokens held by the output.
    pub native_tokens: Vec<NativeToken>,
    /// The chain id; zeroed until the chain's first confirmation.
    pub alias_id: AliasId,
    /// The identity allowed to perform state transitions.
    pub state_controller: Address,
    /// The identity allowed to perform governance transitions.
    pub governance_controller: Address,
    /// Counts the state transitions the chain went through.
    pub state_index: u32,
    /// Arbitrary state owned by the state controller.
    pub state_metadata: Box<[u8]>,
    /// Counts the foundries the alias has created.
    pub foundry_counter: u32,
    /// The feature blocks of the output.
    pub feature_blocks: Vec<FeatureBlock>,
}

impl AliasOutput {
    /// The type tag of an [`AliasOutput`].
    pub const KIND: u8 = 4;

    /// The id of the chain, deriving it from the given output id if zeroed.
    pub fn chain_id(&self, output_id: &OutputId) -> ChainId {
        if self.alias_id.is_null() {
            ChainId::Alias(AliasId::from_output_id(output_id))
        } else {
            ChainId::Alias(self.alias_id)
        }
    }
}

impl Packable for AliasOutput {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        packer.pack_u64(self.amount);
        pack_array(packer, &self.native_tokens, &NATIVE_TOKENS_ARRAY_RULES, mode)?;
        packer.pack_bytes(self.alias_id.as_bytes());
        self.state_controller.pack(packer, mode)?;
        self.governance_controller.pack(packer, mode)?;
        packer.pack_u32(self.state_index);
        packer.pack_u32(self.state_metadata.len() as u32);
        packer.pack_bytes(&self.state_metadata);
        packer.pack_u32(self.foundry_counter);
        pack_array(packer, &self.feature_blocks, &FEATURE_BLOCKS_ARRAY_RULES, mode)?;
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        let amount = unpacker.unpack_u64()?;
        let native_tokens = unpack_array(unpacker, &NATIVE_TOKENS_ARRAY_RULES, mode)?;
        let alias_id = AliasId::new(unpacker.unpack_array()?);
        let state_controller = Address::unpack(unpacker, mode)?;
        let governance_controller = Address::unpack(unpacker, mode)?;
        let state_index = unpacker.unpack_u32()?;
        let metadata_len = unpacker.unpack_u32()? as usize;
        let state_metadata = unpacker.unpack_bytes(metadata_len)?.into();
        let foundry_counter = unpacker.unpack_u32()?;
        let feature_blocks = unpack_array(unpacker, &FEATURE_BLOCKS_ARRAY_RULES, mode)?;
        Ok(Self {
            amount,
            native_tokens,
            alias_id,
            state_controller,
            governance_controller,
            state_index,
            state_metadata,
            foundry_counter,
            feature_blocks,
        })
    }
}

/// Validates a transition of an alias chain.
pub(crate) fn validate_transition(
    chain_id: ChainId,
    current: Option<&AliasOutput>,
    next: Option<&AliasOutput>,
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
            if next.state_index != 0 || next.foundry_counter != 0 {
                return Err(invalid(ChainTransitionKind::Genesis, "state counters must be zero"));
            }
            if let Some(issuer) = issuer_block(&next.feature_blocks) {
                if !ctx.is_unlocked(issuer) {
                    return Err(SemanticError::IssuerFeatureBlockNotUnlocked { chain_id });
                }
            }
            Ok(())
        }
        (Some(current), Some(next)) => {
            if next.state_index == current.state_index {
                // governance transition: only the controllers may rotate
                if next.amount != current.amount
                    || next.state_metadata != current.state_metadata
                    || next.foundry_counter != current.foundry_counter
                {
                    return Err(invalid(
                        ChainTransitionKind::StateChange,
                        "governance transition must not touch state fields",
                    ));
                }
            } else if next.state_index == current.state_index + 1 {
                // state transition: the controllers stay fixed
                if next.state_controller != current.state_controller
                    || next.governance_controller != current.governance_controller
                {
                    return Err(invalid(
                        ChainTransitionKind::StateChange,
                        "state transition must not rotate controllers",
                    ));
                }
                if next.foundry_counter < current.foundry_counter {
                    return Err(invalid(
                        ChainTransitionKind::StateChange,
                        "foundry counter must not decrease",
                    ));
                }
            } else {
                return Err(invalid(
                    ChainTransitionKind::StateChange,
                    "state index must stay or increment by one",
                ));
            }
            Ok(())
        }
        // an alias may always be destroyed
        (Some(_), None) => Ok(()),
        (None, None) => Err(invalid(ChainTransitionKind::Destroy, "chain is on neither side")),
    }
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;

    impl AliasId {
        /// Generates a random [`AliasId`].
        pub fn rand() -> Self {
            Self::new(crate::rand::rand_bytes_array())
        }
    }

    impl AliasOutput {
        /// Generates an [`AliasOutput`] at its genesis state.
        pub fn rand_genesis() -> Self {
            Self {
                amount: crate::rand::rand_number_range(1_000..10_000_000),
                native_tokens: Vec::new(),
                alias_id: AliasId::null(),
                state_controller: Address::rand_ed25519(),
                governance_controller: Address::rand_ed25519(),
                state_index: 0,
                state_metadata: Box::default(),
                foundry_counter: 0,
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
    fn alias_output_round_trip() {
        let output = AliasOutput {
            state_metadata: vec![1, 2, 3].into(),
            native_tokens: vec![NativeToken::rand()],
            ..AliasOutput::rand_genesis()
        };
        let bytes = output.pack_to_vec(CodecMode::PERFORM_VALIDATION).unwrap();
        let mut unpacker = Unpacker::new(&bytes);
        assert_eq!(
            output,
            AliasOutput::unpack(&mut unpacker, CodecMode::PERFORM_VALIDATION).unwrap()
        );
        assert_eq!(unpacker.finish(), Ok(()));
    }

    #[test]
    fn derived_id_is_stable() {
        let output_id = OutputId::rand();
        assert_eq!(AliasId::from_output_id(&output_id), AliasId::from_output_id(&output_id));
        assert!(!AliasId::from_output_id(&output_id).is_null());
    }
}

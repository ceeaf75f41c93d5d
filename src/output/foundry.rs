// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`FoundryOutput`].

use primitive_types::U256;

use crate::{
    address::{Address, AliasAddress},
    codec::{pack_array, unpack_array, CodecError, CodecMode, Packable, Packer, Unpacker},
    error::{Error, SemanticError},
    output::{
        feature_block::{FeatureBlock, FEATURE_BLOCKS_ARRAY_RULES},
        native_token::{NativeToken, TokenId, NATIVE_TOKENS_ARRAY_RULES},
        ChainId, ChainTransitionKind,
    },
    semantic::StateTransitionContext,
};

/// The persistent identity of a foundry chain: the packed controlling alias
/// address followed by the serial number and the token scheme tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct FoundryId([u8; Self::LENGTH]);

impl FoundryId {
    /// The byte length of a [`FoundryId`].
    pub const LENGTH: usize = 26;

    /// Creates a new [`FoundryId`].
    pub fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }
}

/// The scheme under which a foundry mints its tokens.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenScheme {
    /// The simple token scheme.
    Simple,
}

impl TokenScheme {
    /// The type tag of this token scheme.
    pub fn kind(&self) -> u8 {
        match self {
            Self::Simple => 0,
        }
    }
}

/// An output minting and controlling the supply of a native token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundryOutput {
    /// The alias controlling the foundry.
    pub address: AliasAddress,
    /// The deposited amount.
    pub amount: u64,
    /// The native tokens held by the output.
    pub native_tokens: Vec<NativeToken>,
    /// The serial number of the foundry within its alias.
    pub serial_number: u32,
    /// The tag appended to the foundry id to form the token id.
    pub token_tag: [u8; 12],
    /// The amount of tokens currently in circulation.
    pub circulating_supply: U256,
    /// The amount of tokens that may circulate at most.
    pub maximum_supply: U256,
    /// The token scheme of the foundry.
    pub token_scheme: TokenScheme,
    /// The feature blocks of the output.
    pub feature_blocks: Vec<FeatureBlock>,
}

impl FoundryOutput {
    /// The type tag of a [`FoundryOutput`].
    pub const KIND: u8 = 5;

    /// The id of this foundry's chain.
    pub fn id(&self) -> FoundryId {
        let mut bytes = [0u8; FoundryId::LENGTH];
        bytes[0] = AliasAddress::KIND;
        bytes[1..21].copy_from_slice(self.address.alias_id().as_bytes());
        bytes[21..25].copy_from_slice(&self.serial_number.to_le_bytes());
        bytes[25] = self.token_scheme.kind();
        FoundryId::new(bytes)
    }

    /// The id of the token this foundry mints.
    pub fn token_id(&self) -> TokenId {
        TokenId::build(&self.id(), &self.token_tag)
    }
}

impl Packable for FoundryOutput {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        Address::Alias(self.address).pack(packer, mode)?;
        packer.pack_u64(self.amount);
        pack_array(packer, &self.native_tokens, &NATIVE_TOKENS_ARRAY_RULES, mode)?;
        packer.pack_u32(self.serial_number);
        packer.pack_bytes(&self.token_tag);
        let mut supply = [0u8; 32];
        self.circulating_supply.to_little_endian(&mut supply);
        packer.pack_bytes(&supply);
        self.maximum_supply.to_little_endian(&mut supply);
        packer.pack_bytes(&supply);
        packer.pack_u8(self.token_scheme.kind());
        pack_array(packer, &self.feature_blocks, &FEATURE_BLOCKS_ARRAY_RULES, mode)?;
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        let address = match Address::unpack(unpacker, mode)? {
            Address::Alias(address) => address,
            address => return Err(CodecError::BadTypeTag { tag: address.kind() as u32 }.into()),
        };
        let amount = unpacker.unpack_u64()?;
        let native_tokens = unpack_array(unpacker, &NATIVE_TOKENS_ARRAY_RULES, mode)?;
        let serial_number = unpacker.unpack_u32()?;
        let token_tag = unpacker.unpack_array()?;
        let circulating_supply = U256::from_little_endian(&unpacker.unpack_array::<32>()?);
        let maximum_supply = U256::from_little_endian(&unpacker.unpack_array::<32>()?);
        let token_scheme = match unpacker.unpack_u8()? {
            0 => TokenScheme::Simple,
            tag => return Err(CodecError::BadTypeTag { tag: tag as u32 }.into()),
        };
        let feature_blocks = unpack_array(unpacker, &FEATURE_BLOCKS_ARRAY_RULES, mode)?;
        Ok(Self {
            address,
            amount,
            native_tokens,
            serial_number,
            token_tag,
            circulating_supply,
            maximum_supply,
            token_scheme,
            feature_blocks,
        })
    }
}

/// Validates a transition of a foundry chain against the token sums of the
/// enclosing transaction.
pub(crate) fn validate_transition(
    chain_id: ChainId,
    current: Option<&FoundryOutput>,
    next: Option<&FoundryOutput>,
    ctx: &StateTransitionContext<'_>,
) -> Result<(), SemanticError> {
    let invalid = |kind: ChainTransitionKind, reason: &str| SemanticError::InvalidChainTransition {
        chain_id,
        kind,
        reason: reason.to_owned(),
    };
    match (current, next) {
        // genesis: the controlling alias must transition alongside and the
        // minted amount must match the declared circulating supply
        (None, Some(next)) => {
            if !ctx.is_output_chain(&ChainId::Alias(*next.address.alias_id())) {
                return Err(invalid(
                    ChainTransitionKind::Genesis,
                    "controlling alias is not transitioning",
                ));
            }
            let token_id = next.token_id();
            let minted = ctx
                .out_token_sum(&token_id)
                .checked_sub(ctx.in_token_sum(&token_id))
                .ok_or_else(|| invalid(ChainTransitionKind::Genesis, "token sum decreases"))?;
            if minted != next.circulating_supply {
                return Err(invalid(
                    ChainTransitionKind::Genesis,
                    "minted tokens do not match the circulating supply",
                ));
            }
            Ok(())
        }
        (Some(current), Some(next)) => {
            if current.address != next.address
                || current.serial_number != next.serial_number
                || current.token_tag != next.token_tag
                || current.token_scheme != next.token_scheme
                || current.maximum_supply != next.maximum_supply
            {
                return Err(invalid(
                    ChainTransitionKind::StateChange,
                    "immutable fields must not change",
                ));
            }
            let token_id = current.token_id();
            let in_sum = ctx.in_token_sum(&token_id);
            let out_sum = ctx.out_token_sum(&token_id);
            let balanced = if out_sum >= in_sum {
                next.circulating_supply.checked_sub(current.circulating_supply) == out_sum.checked_sub(in_sum)
            } else {
                current.circulating_supply.checked_sub(next.circulating_supply) == in_sum.checked_sub(out_sum)
            };
            if !balanced {
                return Err(invalid(
                    ChainTransitionKind::StateChange,
                    "token delta does not match the circulating supply adjustment",
                ));
            }
            Ok(())
        }
        // destroy: the remaining circulating supply must be burned
        (Some(current), None) => {
            let token_id = current.token_id();
            let burned = ctx
                .in_token_sum(&token_id)
                .checked_sub(ctx.out_token_sum(&token_id))
                .ok_or_else(|| invalid(ChainTransitionKind::Destroy, "token sum increases"))?;
            if burned != current.circulating_supply {
                return Err(invalid(
                    ChainTransitionKind::Destroy,
                    "circulating supply must be burned in full",
                ));
            }
            Ok(())
        }
        (None, None) => Err(invalid(ChainTransitionKind::Destroy, "chain is on neither side")),
    }
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;
    use crate::output::AliasId;

    impl FoundryOutput {
        /// Generates a [`FoundryOutput`] controlled by the given alias.
        pub fn rand_for_alias(alias_id: AliasId) -> Self {
            Self {
                address: AliasAddress::new(alias_id),
                amount: crate::rand::rand_number_range(1_000..10_000_000),
                native_tokens: Vec::new(),
                serial_number: 1,
                token_tag: crate::rand::rand_bytes_array(),
                circulating_supply: U256::zero(),
                maximum_supply: U256::from(1_000_000u64),
                token_scheme: TokenScheme::Simple,
                feature_blocks: Vec::new(),
            }
        }
    }
}

#[cfg(all(test, feature = "rand"))]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::output::AliasId;

    #[test]
    fn foundry_output_round_trip() {
        let output = FoundryOutput::rand_for_alias(AliasId::rand());
        let bytes = output.pack_to_vec(CodecMode::PERFORM_VALIDATION).unwrap();
        let mut unpacker = Unpacker::new(&bytes);
        assert_eq!(
            output,
            FoundryOutput::unpack(&mut unpacker, CodecMode::PERFORM_VALIDATION).unwrap()
        );
        assert_eq!(unpacker.finish(), Ok(()));
    }

    #[test]
    fn foundry_id_embeds_alias_and_serial() {
        let output = FoundryOutput::rand_for_alias(AliasId::rand());
        let id = output.id();
        assert_eq!(id.as_bytes()[0], AliasAddress::KIND);
        assert_eq!(&id.as_bytes()[1..21], output.address.alias_id().as_bytes());
        assert_eq!(&id.as_bytes()[21..25], &output.serial_number.to_le_bytes());
        assert_eq!(output.token_id().foundry_id(), id);
    }
}

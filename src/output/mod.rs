// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`Output`] types.

mod chain_id;
mod feature_block;
mod native_token;

// The different output types
pub mod alias;
pub mod extended;
pub mod foundry;
pub mod nft;
pub mod simple;

use std::{collections::BTreeMap, collections::HashSet, fmt};

pub use self::{
    alias::{AliasId, AliasOutput},
    chain_id::{ChainId, ChainTransitionKind},
    extended::ExtendedOutput,
    feature_block::{issuer_block, requires_sender_block, sender_block, unique_kinds, FeatureBlock},
    foundry::{FoundryId, FoundryOutput, TokenScheme},
    native_token::{native_token_sum, NativeToken, NativeTokenSum, TokenId},
    nft::{NftId, NftOutput},
    simple::SimpleOutput,
};
use crate::{
    address::Address,
    codec::{ArrayRules, ArrayUniqueness, CodecError, CodecMode, Packable, Packer, Unpacker},
    error::{Error, SemanticError, SyntacticError},
    payload::transaction::TransactionId,
    rent::DeserializationParameters,
    semantic::StateTransitionContext,
    MAX_NATIVE_TOKENS_COUNT, MAX_OUTPUTS_COUNT, MIN_OUTPUTS_COUNT, TOKEN_SUPPLY,
};

/// The array rules of the outputs within a transaction essence.
pub const OUTPUTS_ARRAY_RULES: ArrayRules = ArrayRules::new(MIN_OUTPUTS_COUNT, MAX_OUTPUTS_COUNT, ArrayUniqueness::None);

/// Addresses one output slot of a transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputId {
    transaction_id: TransactionId,
    index: u16,
}

impl OutputId {
    /// The byte length of a serialized [`OutputId`].
    pub const LENGTH: usize = TransactionId::LENGTH + core::mem::size_of::<u16>();

    /// Creates a new [`OutputId`].
    pub fn new(transaction_id: TransactionId, index: u16) -> Self {
        Self { transaction_id, index }
    }

    /// The id of the transaction that created the output.
    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// The output slot within that transaction.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// The serialized form this id hashes under.
    pub fn to_bytes(self) -> [u8; Self::LENGTH] {
        let mut bytes = [0u8; Self::LENGTH];
        bytes[..TransactionId::LENGTH].copy_from_slice(self.transaction_id.as_bytes());
        bytes[TransactionId::LENGTH..].copy_from_slice(&self.index.to_le_bytes());
        bytes
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", prefix_hex::encode(self.to_bytes().as_slice()))
    }
}

/// A mapping from output ids to outputs; the consumed-output set of a
/// transaction is required to be complete with respect to its inputs.
pub type OutputSet = BTreeMap<OutputId, Output>;

/// The different output types.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::From)]
pub enum Output {
    /// A simple output.
    Simple(SimpleOutput),
    /// An extended output.
    Extended(ExtendedOutput),
    /// An alias output.
    Alias(AliasOutput),
    /// A foundry output.
    Foundry(FoundryOutput),
    /// An NFT output.
    Nft(NftOutput),
}

impl Output {
    /// The type tag of this output.
    pub fn kind(&self) -> u8 {
        match self {
            Self::Simple(_) => SimpleOutput::KIND,
            Self::Extended(_) => ExtendedOutput::KIND,
            Self::Alias(_) => AliasOutput::KIND,
            Self::Foundry(_) => FoundryOutput::KIND,
            Self::Nft(_) => NftOutput::KIND,
        }
    }

    /// The deposited amount.
    pub fn amount(&self) -> u64 {
        match self {
            Self::Simple(output) => output.amount,
            Self::Extended(output) => output.amount,
            Self::Alias(output) => output.amount,
            Self::Foundry(output) => output.amount,
            Self::Nft(output) => output.amount,
        }
    }

    /// The native tokens held by this output.
    pub fn native_tokens(&self) -> &[NativeToken] {
        match self {
            Self::Simple(_) => &[],
            Self::Extended(output) => &output.native_tokens,
            Self::Alias(output) => &output.native_tokens,
            Self::Foundry(output) => &output.native_tokens,
            Self::Nft(output) => &output.native_tokens,
        }
    }

    /// The feature blocks of this output.
    pub fn feature_blocks(&self) -> &[FeatureBlock] {
        match self {
            Self::Simple(_) => &[],
            Self::Extended(output) => &output.feature_blocks,
            Self::Alias(output) => &output.feature_blocks,
            Self::Foundry(output) => &output.feature_blocks,
            Self::Nft(output) => &output.feature_blocks,
        }
    }

    /// The single controlling identity, for every output that has one. An
    /// alias output's identity depends on the transition it undergoes and is
    /// resolved by the semantic validator instead.
    pub fn single_ident(&self) -> Option<Address> {
        match self {
            Self::Simple(output) => Some(output.address),
            Self::Extended(output) => Some(output.address),
            Self::Alias(_) => None,
            Self::Foundry(output) => Some(Address::Alias(output.address)),
            Self::Nft(output) => Some(output.address),
        }
    }

    /// The id of the chain this output tracks, deriving implicit ids from the
    /// given output id; `None` for outputs without chain identity.
    pub fn chain_id(&self, output_id: &OutputId) -> Option<ChainId> {
        match self {
            Self::Simple(_) | Self::Extended(_) => None,
            Self::Alias(output) => Some(output.chain_id(output_id)),
            Self::Foundry(output) => Some(ChainId::Foundry(output.id())),
            Self::Nft(output) => Some(output.chain_id(output_id)),
        }
    }

    /// This output as an alias output, if it is one.
    pub fn as_alias(&self) -> Option<&AliasOutput> {
        match self {
            Self::Alias(output) => Some(output),
            _ => None,
        }
    }

    /// This output as a foundry output, if it is one.
    pub fn as_foundry(&self) -> Option<&FoundryOutput> {
        match self {
            Self::Foundry(output) => Some(output),
            _ => None,
        }
    }

    /// This output as an NFT output, if it is one.
    pub fn as_nft(&self) -> Option<&NftOutput> {
        match self {
            Self::Nft(output) => Some(output),
            _ => None,
        }
    }

    /// Whether this output is a plain value transfer: a simple output, or an
    /// extended output without any feature blocks.
    pub fn is_simple_transfer(&self) -> bool {
        match self {
            Self::Simple(_) => true,
            Self::Extended(output) => output.feature_blocks.is_empty(),
            _ => false,
        }
    }
}

impl Packable for Output {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        packer.pack_u8(self.kind());
        match self {
            Self::Simple(output) => output.pack(packer, mode),
            Self::Extended(output) => output.pack(packer, mode),
            Self::Alias(output) => output.pack(packer, mode),
            Self::Foundry(output) => output.pack(packer, mode),
            Self::Nft(output) => output.pack(packer, mode),
        }
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        Ok(match unpacker.unpack_u8()? {
            SimpleOutput::KIND => Self::Simple(SimpleOutput::unpack(unpacker, mode)?),
            ExtendedOutput::KIND => Self::Extended(ExtendedOutput::unpack(unpacker, mode)?),
            AliasOutput::KIND => Self::Alias(AliasOutput::unpack(unpacker, mode)?),
            FoundryOutput::KIND => Self::Foundry(FoundryOutput::unpack(unpacker, mode)?),
            NftOutput::KIND => Self::Nft(NftOutput::unpack(unpacker, mode)?),
            tag => return Err(CodecError::BadTypeTag { tag: tag as u32 }.into()),
        })
    }
}

/// Dispatches a chain transition to the state transition rules of the
/// involved output variant.
pub(crate) fn validate_state_transition(
    chain_id: ChainId,
    current: Option<&Output>,
    next: Option<&Output>,
    ctx: &StateTransitionContext<'_>,
) -> Result<(), SemanticError> {
    match chain_id {
        ChainId::Alias(_) => alias::validate_transition(
            chain_id,
            current.and_then(Output::as_alias),
            next.and_then(Output::as_alias),
            ctx,
        ),
        ChainId::Foundry(_) => foundry::validate_transition(
            chain_id,
            current.and_then(Output::as_foundry),
            next.and_then(Output::as_foundry),
            ctx,
        ),
        ChainId::Nft(_) => nft::validate_transition(
            chain_id,
            current.and_then(Output::as_nft),
            next.and_then(Output::as_nft),
            ctx,
        ),
    }
}

/// Validates every output's deposit: non-zero, within the total supply, and
/// accumulating to no more than the total supply.
pub(crate) fn outputs_syntactic_deposit(outputs: &[Output]) -> Result<(), SyntacticError> {
    let mut sum: u64 = 0;
    for (index, output) in outputs.iter().enumerate() {
        let amount = output.amount();
        if amount == 0 {
            return Err(SyntacticError::DepositAmountZero { index });
        }
        if amount > TOKEN_SUPPLY {
            return Err(SyntacticError::OutputDepositsMoreThanTotalSupply { index });
        }
        sum = sum
            .checked_add(amount)
            .filter(|sum| *sum <= TOKEN_SUPPLY)
            .ok_or(SyntacticError::OutputsSumExceedsTotalSupply)?;
    }
    Ok(())
}

/// Validates the native token count across all outputs.
pub(crate) fn outputs_syntactic_native_tokens(outputs: &[Output]) -> Result<(), SyntacticError> {
    let count = outputs.iter().map(|output| output.native_tokens().len()).sum::<usize>();
    if count > MAX_NATIVE_TOKENS_COUNT as usize {
        return Err(SyntacticError::OutputsExceedMaxNativeTokensCount { count });
    }
    Ok(())
}

/// Validates each output's feature blocks: kinds unique, and a sender feature
/// block present whenever another feature block requires one.
pub(crate) fn outputs_syntactic_feature_blocks(outputs: &[Output]) -> Result<(), SyntacticError> {
    for (index, output) in outputs.iter().enumerate() {
        let feature_blocks = output.feature_blocks();
        if !unique_kinds(feature_blocks) {
            return Err(SyntacticError::FeatureBlocksNotUnique { index });
        }
        if requires_sender_block(feature_blocks) && sender_block(feature_blocks).is_none() {
            return Err(SyntacticError::OutputRequiresSenderFeatureBlock { index });
        }
    }
    Ok(())
}

/// Validates the supply parameters of every foundry output.
pub(crate) fn outputs_syntactic_foundry(outputs: &[Output]) -> Result<(), SyntacticError> {
    for (index, output) in outputs.iter().enumerate() {
        if let Output::Foundry(foundry) = output {
            if foundry.maximum_supply.is_zero() {
                return Err(SyntacticError::FoundryOutputInvalidMaximumSupply { index });
            }
            if foundry.circulating_supply > foundry.maximum_supply {
                return Err(SyntacticError::FoundryOutputInvalidCirculatingSupply { index });
            }
        }
    }
    Ok(())
}

/// Validates that no two simple outputs deposit to the same address.
pub(crate) fn outputs_syntactic_addr_unique(outputs: &[Output]) -> Result<(), SyntacticError> {
    let mut seen = HashSet::new();
    for (index, output) in outputs.iter().enumerate() {
        if let Output::Simple(simple) = output {
            if !seen.insert(simple.address) {
                return Err(SyntacticError::OutputAddrNotUnique { index });
            }
        }
    }
    Ok(())
}

/// Validates every alias output against the id of the enclosing transaction:
/// zeroed ids must carry empty state, and the id must not address the
/// output's own controllers.
pub(crate) fn outputs_syntactic_alias(tx_id: &TransactionId, outputs: &[Output]) -> Result<(), SyntacticError> {
    for (index, output) in outputs.iter().enumerate() {
        if let Output::Alias(alias) = output {
            let alias_id = if alias.alias_id.is_null() {
                if alias.state_index != 0 || alias.foundry_counter != 0 {
                    return Err(SyntacticError::AliasOutputNonEmptyState { index });
                }
                AliasId::from_output_id(&OutputId::new(*tx_id, index as u16))
            } else {
                alias.alias_id
            };
            let own_address = Address::Alias(alias_id.into());
            if alias.state_controller == own_address || alias.governance_controller == own_address {
                return Err(SyntacticError::AliasOutputCyclicAddress { index });
            }
        }
    }
    Ok(())
}

/// Validates every NFT output against the id of the enclosing transaction:
/// the id must not address the output itself.
pub(crate) fn outputs_syntactic_nft(tx_id: &TransactionId, outputs: &[Output]) -> Result<(), SyntacticError> {
    for (index, output) in outputs.iter().enumerate() {
        if let Output::Nft(nft) = output {
            let nft_id = if nft.nft_id.is_null() {
                NftId::from_output_id(&OutputId::new(*tx_id, index as u16))
            } else {
                nft.nft_id
            };
            if nft.address == Address::Nft(nft_id.into()) {
                return Err(SyntacticError::NftOutputCyclicAddress { index });
            }
        }
    }
    Ok(())
}

/// Validates dust protection: return amounts at least the configured minimum
/// and deposits covering each output's storage rent.
pub(crate) fn outputs_syntactic_dust(
    params: &DeserializationParameters,
    outputs: &[Output],
) -> Result<(), Error> {
    for (index, output) in outputs.iter().enumerate() {
        for block in output.feature_blocks() {
            if let Some(amount) = block.as_dust_deposit_return() {
                if amount < params.min_dust_deposit {
                    return Err(SyntacticError::ReturnAmountBelowDustDeposit {
                        index,
                        amount,
                        min: params.min_dust_deposit,
                    }
                    .into());
                }
            }
        }
        let required = params.rent_structure.min_deposit(output)?;
        if output.amount() < required {
            return Err(SyntacticError::InsufficientStorageDeposit {
                index,
                amount: output.amount(),
                required,
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;

    impl OutputId {
        /// Generates a random [`OutputId`].
        pub fn rand() -> Self {
            Self::new(TransactionId::rand(), crate::rand::rand_number_range(0..16) as u16)
        }
    }

    impl Output {
        /// Generates a random simple [`Output`].
        pub fn rand_simple() -> Self {
            Self::Simple(SimpleOutput::rand())
        }

        /// Generates a random extended [`Output`].
        pub fn rand_extended() -> Self {
            Self::Extended(ExtendedOutput::rand())
        }

        /// Generates a random alias [`Output`] at its genesis state.
        pub fn rand_alias_genesis() -> Self {
            Self::Alias(AliasOutput::rand_genesis())
        }

        /// Generates a random NFT [`Output`] at its genesis state.
        pub fn rand_nft_genesis() -> Self {
            Self::Nft(NftOutput::rand_genesis())
        }
    }
}

#[cfg(all(test, feature = "rand"))]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn output_round_trip() {
        for output in [
            Output::rand_simple(),
            Output::rand_extended(),
            Output::rand_alias_genesis(),
            Output::Foundry(FoundryOutput::rand_for_alias(AliasId::rand())),
            Output::rand_nft_genesis(),
        ] {
            let bytes = output.pack_to_vec(CodecMode::PERFORM_VALIDATION).unwrap();
            let mut unpacker = Unpacker::new(&bytes);
            assert_eq!(output, Output::unpack(&mut unpacker, CodecMode::PERFORM_VALIDATION).unwrap());
            assert_eq!(unpacker.finish(), Ok(()));
        }
    }

    #[test]
    fn zero_deposit_is_rejected() {
        let output = Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 0));
        assert_eq!(
            outputs_syntactic_deposit(&[output]),
            Err(SyntacticError::DepositAmountZero { index: 0 })
        );
    }

    #[test]
    fn deposits_must_stay_within_supply() {
        let outputs = [
            Output::Simple(SimpleOutput::new(Address::rand_ed25519(), TOKEN_SUPPLY)),
            Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 1)),
        ];
        assert_eq!(
            outputs_syntactic_deposit(&outputs),
            Err(SyntacticError::OutputsSumExceedsTotalSupply)
        );
    }

    #[test]
    fn simple_outputs_need_unique_addresses() {
        let address = Address::rand_ed25519();
        let outputs = [
            Output::Simple(SimpleOutput::new(address, 1_000)),
            Output::Simple(SimpleOutput::new(address, 2_000)),
        ];
        assert_eq!(
            outputs_syntactic_addr_unique(&outputs),
            Err(SyntacticError::OutputAddrNotUnique { index: 1 })
        );
    }

    #[test]
    fn expiration_requires_sender() {
        let mut extended = ExtendedOutput::rand();
        extended.feature_blocks = vec![FeatureBlock::ExpirationUnix(1)];
        assert_eq!(
            outputs_syntactic_feature_blocks(&[Output::Extended(extended)]),
            Err(SyntacticError::OutputRequiresSenderFeatureBlock { index: 0 })
        );
    }

    #[test]
    fn cyclic_alias_controller_is_rejected() {
        let tx_id = TransactionId::rand();
        let mut alias = AliasOutput::rand_genesis();
        alias.alias_id = AliasId::rand();
        alias.state_controller = Address::Alias(alias.alias_id.into());
        assert_eq!(
            outputs_syntactic_alias(&tx_id, &[Output::Alias(alias)]),
            Err(SyntacticError::AliasOutputCyclicAddress { index: 0 })
        );
    }

    #[test]
    fn cyclic_nft_address_is_rejected_for_derived_id() {
        let tx_id = TransactionId::rand();
        let derived = NftId::from_output_id(&OutputId::new(tx_id, 0));
        let mut nft = NftOutput::rand_genesis();
        nft.address = Address::Nft(derived.into());
        assert_eq!(
            outputs_syntactic_nft(&tx_id, &[Output::Nft(nft)]),
            Err(SyntacticError::NftOutputCyclicAddress { index: 0 })
        );
    }
}

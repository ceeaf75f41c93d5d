// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The error types surfaced by this crate.

use thiserror::Error;

use crate::{
    address::Address,
    codec::CodecError,
    output::{ChainId, ChainTransitionKind, TokenId},
    MIN_INPUTS_COUNT, MIN_OUTPUTS_COUNT,
};

/// The unified error type of the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A codec-level failure.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A context-free validation failure.
    #[error(transparent)]
    Syntactic(#[from] SyntacticError),
    /// A context-dependent validation failure.
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

/// An error found by validating a transaction in isolation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntacticError {
    /// The transaction carries fewer inputs than the minimum.
    #[error("min {MIN_INPUTS_COUNT} input(s) are required within a transaction")]
    MinInputsNotReached,
    /// The transaction carries fewer outputs than the minimum.
    #[error("min {MIN_OUTPUTS_COUNT} output(s) are required within a transaction")]
    MinOutputsNotReached,
    /// Two inputs reference the same UTXO.
    #[error("input {index} does not reference a unique UTXO")]
    InputUtxoRefsNotUnique {
        /// The position of the second reference.
        index: usize,
    },
    /// A referenced UTXO index exceeds the maximum output slot.
    #[error("input {index} references UTXO slot {ref_index} which is out of bounds")]
    InputRefIndexOutOfBounds {
        /// The position of the input.
        index: usize,
        /// The out-of-bounds slot.
        ref_index: u16,
    },
    /// The unlock count differs from the input count.
    #[error("{unlocks} unlock(s) do not match {inputs} input(s)")]
    UnlockCountMismatch {
        /// The input count.
        inputs: usize,
        /// The unlock count.
        unlocks: usize,
    },
    /// A signature unlock occurs more than once.
    #[error("unlock {index} duplicates an earlier signature unlock")]
    SignatureUnlockNotUnique {
        /// The position of the duplicate.
        index: usize,
    },
    /// A referential unlock does not point backward at a signature unlock.
    #[error("unlock {index} does not reference an earlier signature unlock")]
    ReferentialUnlockInvalid {
        /// The position of the invalid unlock.
        index: usize,
    },
    /// Two simple outputs deposit to the same address.
    #[error("output {index} does not deposit to a unique address")]
    OutputAddrNotUnique {
        /// The position of the second output.
        index: usize,
    },
    /// An output deposits nothing.
    #[error("output {index}'s deposit amount must be greater than zero")]
    DepositAmountZero {
        /// The position of the output.
        index: usize,
    },
    /// An output deposits more than the total supply.
    #[error("output {index} deposits more than the total supply")]
    OutputDepositsMoreThanTotalSupply {
        /// The position of the output.
        index: usize,
    },
    /// The accumulated output deposits exceed the total supply.
    #[error("accumulated output balance exceeds total supply")]
    OutputsSumExceedsTotalSupply,
    /// Too many native tokens across the outputs.
    #[error("{count} native token(s) exceed the maximum count")]
    OutputsExceedMaxNativeTokensCount {
        /// The observed count.
        count: usize,
    },
    /// A feature block kind occurs more than once within one output.
    #[error("output {index} carries more than one feature block of the same kind")]
    FeatureBlocksNotUnique {
        /// The position of the output.
        index: usize,
    },
    /// A feature block requires a companion sender feature block.
    #[error("output {index} does not contain a sender feature block")]
    OutputRequiresSenderFeatureBlock {
        /// The position of the output.
        index: usize,
    },
    /// An alias output with a zeroed id carries non-zero state.
    #[error("alias output {index} with zeroed id is not empty state")]
    AliasOutputNonEmptyState {
        /// The position of the output.
        index: usize,
    },
    /// An alias output's id corresponds to one of its own controllers.
    #[error("alias output {index}'s id corresponds to its state and/or governance controller")]
    AliasOutputCyclicAddress {
        /// The position of the output.
        index: usize,
    },
    /// An NFT output's id corresponds to its own address field.
    #[error("nft output {index}'s id corresponds to its address field")]
    NftOutputCyclicAddress {
        /// The position of the output.
        index: usize,
    },
    /// A foundry output's maximum supply is invalid.
    #[error("foundry output {index}'s maximum supply is invalid")]
    FoundryOutputInvalidMaximumSupply {
        /// The position of the output.
        index: usize,
    },
    /// A foundry output's circulating supply is invalid.
    #[error("foundry output {index}'s circulating supply is invalid")]
    FoundryOutputInvalidCirculatingSupply {
        /// The position of the output.
        index: usize,
    },
    /// A dust deposit return amount is below the configured minimum.
    #[error("output {index}'s return amount of {amount} is below the minimum dust deposit of {min}")]
    ReturnAmountBelowDustDeposit {
        /// The position of the output.
        index: usize,
        /// The declared return amount.
        amount: u64,
        /// The configured minimum dust deposit.
        min: u64,
    },
    /// An output does not cover its storage rent.
    #[error("output {index} deposits {amount} which does not cover its storage rent of {required}")]
    InsufficientStorageDeposit {
        /// The position of the output.
        index: usize,
        /// The deposited amount.
        amount: u64,
        /// The required minimum deposit.
        required: u64,
    },
}

/// An error found by validating a transaction against its consumed outputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SemanticError {
    /// The input set is missing an entry for a referenced UTXO.
    #[error("utxo for input {input_index} not supplied")]
    MissingUtxo {
        /// The position of the input.
        input_index: usize,
    },
    /// Inputs and outputs do not spend/deposit the same amount.
    #[error("inputs and outputs do not spend/deposit the same amount: in {input_sum}, out {output_sum}")]
    InputOutputSumMismatch {
        /// The accumulated input deposit.
        input_sum: u64,
        /// The accumulated output deposit.
        output_sum: u64,
    },
    /// A deposit sum does not fit a `u64`.
    #[error("accumulated deposits overflow")]
    DepositSumOverflow,
    /// A native token is unbalanced without a transitioning foundry.
    #[error("native token {token_id} is unbalanced and its foundry is not transitioning")]
    NativeTokenSumUnbalanced {
        /// The unbalanced token.
        token_id: TokenId,
    },
    /// A native token sum does not fit a `u256`.
    #[error("native token {token_id} sum overflows")]
    NativeTokenSumOverflow {
        /// The overflowing token.
        token_id: TokenId,
    },
    /// A dust deposit return is not fulfilled by the output side.
    #[error("return amount of {return_amount} to {address} not fulfilled by simple transfers of {output_sum}")]
    ReturnAmountNotFulfilled {
        /// The identity owed the return.
        address: Address,
        /// The accumulated declared return amount.
        return_amount: u64,
        /// The accumulated simple transfers to that identity.
        output_sum: u64,
    },
    /// An input cannot be unlocked.
    #[error("invalid input unlock: input {input_index} {reason}")]
    InvalidInputUnlock {
        /// The position of the input.
        input_index: usize,
        /// What went wrong.
        reason: String,
    },
    /// An output-side sender feature block's identity is not unlocked.
    #[error("sender feature block is not unlocked: output {output_index}")]
    SenderFeatureBlockNotUnlocked {
        /// The position of the output.
        output_index: usize,
    },
    /// An issuer feature block's identity is not unlocked.
    #[error("issuer feature block is not unlocked: chain {chain_id}")]
    IssuerFeatureBlockNotUnlocked {
        /// The chain being created.
        chain_id: ChainId,
    },
    /// A chain-constrained output fails its state transition rules.
    #[error("chain {chain_id} {kind} transition failed: {reason}")]
    InvalidChainTransition {
        /// The chain in question.
        chain_id: ChainId,
        /// The attempted transition.
        kind: ChainTransitionKind,
        /// What went wrong.
        reason: String,
    },
}

// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! The core transaction subsystem of a UTXO ledger with feature-annotated outputs.
//!
//! This crate provides the canonical binary codec for all ledger objects, the
//! syntactic validation of a transaction in isolation, and the semantic
//! validation of a transaction against a set of consumed outputs under a
//! confirmation context (milestone index and timestamp).
//!
//! All operations are synchronous, deterministic and free of shared mutable
//! state; a transaction can be validated from any number of independent
//! workers.

pub mod address;
pub mod codec;
pub mod dto;
pub mod error;
pub mod input;
pub mod output;
pub mod payload;
#[cfg(feature = "rand")]
pub mod rand;
pub mod rent;
pub mod semantic;
pub mod signature;
pub mod unlock;

pub use self::{
    address::Address,
    error::Error,
    input::Input,
    output::{Output, OutputId, OutputSet},
    payload::transaction::{Transaction, TransactionEssence, TransactionId},
    rent::{DeserializationParameters, RentStructure},
    semantic::ValidationContext,
    unlock::Unlock,
};

/// The total amount of base tokens in circulation.
pub const TOKEN_SUPPLY: u64 = 2_779_530_283_277_761;

/// The minimum amount of inputs within a transaction.
pub const MIN_INPUTS_COUNT: u16 = 1;
/// The maximum amount of inputs within a transaction.
pub const MAX_INPUTS_COUNT: u16 = 127;
/// The minimum amount of outputs within a transaction.
pub const MIN_OUTPUTS_COUNT: u16 = 1;
/// The maximum amount of outputs within a transaction.
pub const MAX_OUTPUTS_COUNT: u16 = 127;
/// The maximum amount of native tokens within an output and within each side of a transaction.
pub const MAX_NATIVE_TOKENS_COUNT: u16 = 256;

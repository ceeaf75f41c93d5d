// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`Transaction`] payload.

mod essence;

use std::{fmt, str::FromStr};

use crypto::hashes::{blake2b::Blake2b256, Digest};

pub use self::essence::TransactionEssence;
use crate::{
    codec::{pack_array, unpack_array, ArrayRules, CodecError, CodecMode, Packable, Packer, Unpacker},
    error::{Error, SyntacticError},
    output::{outputs_syntactic_alias, outputs_syntactic_dust, outputs_syntactic_nft, OutputId, OutputSet},
    rent::DeserializationParameters,
    semantic::{self, ValidationContext},
    unlock::{validate_unlocks, Unlock, UNLOCKS_ARRAY_RULES},
};

/// The id of a transaction: the Blake2b-256 hash of its serialized form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct TransactionId([u8; Self::LENGTH]);

impl TransactionId {
    /// The byte length of a [`TransactionId`].
    pub const LENGTH: usize = 32;

    /// Creates a new [`TransactionId`].
    pub fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", prefix_hex::encode(self.0.as_slice()))
    }
}

impl FromStr for TransactionId {
    type Err = prefix_hex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(prefix_hex::decode(s)?))
    }
}

/// A transaction: an essence together with the unlocks of its inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// The transfer part of the transaction.
    pub essence: TransactionEssence,
    /// One unlock per input, in input order.
    pub unlocks: Vec<Unlock>,
}

impl Transaction {
    /// The payload tag of a [`Transaction`].
    pub const KIND: u32 = 0;

    /// Creates a new [`Transaction`].
    pub fn new(essence: TransactionEssence, unlocks: Vec<Unlock>) -> Self {
        Self { essence, unlocks }
    }

    /// Computes the id of the transaction. Deterministic; independent of the
    /// consumed outputs and the confirmation context.
    pub fn id(&self) -> Result<TransactionId, Error> {
        let bytes = self.pack_to_vec(CodecMode::NO_VALIDATION)?;
        Ok(TransactionId::new(Blake2b256::digest(&bytes).into()))
    }

    /// The outputs this transaction creates, mapped by their output id.
    pub fn outputs_set(&self) -> Result<OutputSet, Error> {
        let transaction_id = self.id()?;
        Ok(self
            .essence
            .outputs
            .iter()
            .enumerate()
            .map(|(index, output)| (OutputId::new(transaction_id, index as u16), output.clone()))
            .collect())
    }

    /// Encodes the transaction, cross-validating it under the given
    /// parameters when the mode demands validation.
    pub fn to_bytes(&self, mode: CodecMode, params: &DeserializationParameters) -> Result<Vec<u8>, Error> {
        let bytes = self.pack_to_vec(mode)?;
        if mode.validating() {
            let transaction_id = TransactionId::new(Blake2b256::digest(&bytes).into());
            self.syntactically_validate(&transaction_id, params)?;
        }
        Ok(bytes)
    }

    /// Decodes a transaction from its serialized form, rejecting trailing
    /// bytes and cross-validating under the given parameters when the mode
    /// demands validation.
    pub fn from_bytes(bytes: &[u8], mode: CodecMode, params: &DeserializationParameters) -> Result<Self, Error> {
        let mut unpacker = Unpacker::new(bytes);
        let transaction = Self::unpack(&mut unpacker, mode)?;
        unpacker.finish()?;
        if mode.validating() {
            let transaction_id = TransactionId::new(Blake2b256::digest(bytes).into());
            transaction.syntactically_validate(&transaction_id, params)?;
        }
        Ok(transaction)
    }

    /// Validates the transaction in isolation; no external context beyond the
    /// decoding parameters is required.
    pub fn syntactically_validate(
        &self,
        transaction_id: &TransactionId,
        params: &DeserializationParameters,
    ) -> Result<(), Error> {
        self.essence.syntactically_validate()?;
        if self.unlocks.len() != self.essence.inputs.len() {
            return Err(SyntacticError::UnlockCountMismatch {
                inputs: self.essence.inputs.len(),
                unlocks: self.unlocks.len(),
            }
            .into());
        }
        validate_unlocks(&self.unlocks)?;
        outputs_syntactic_alias(transaction_id, &self.essence.outputs)?;
        outputs_syntactic_nft(transaction_id, &self.essence.outputs)?;
        outputs_syntactic_dust(params, &self.essence.outputs)?;
        Ok(())
    }

    /// Validates the transaction against its consumed outputs under the given
    /// confirmation context.
    pub fn semantically_validate(&self, input_set: &OutputSet, context: &ValidationContext) -> Result<(), Error> {
        semantic::semantically_validate(self, input_set, context)
    }
}

impl Packable for Transaction {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        packer.pack_u32(Self::KIND);
        self.essence.pack(packer, mode)?;
        // the unlock bounds depend on this transaction's input count; the
        // global rules stay untouched
        let mut unlock_rules: ArrayRules = UNLOCKS_ARRAY_RULES;
        unlock_rules.min = self.essence.inputs.len() as u16;
        unlock_rules.max = self.essence.inputs.len() as u16;
        pack_array(packer, &self.unlocks, &unlock_rules, mode)?;
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        let kind = unpacker.unpack_u32()?;
        if kind != Self::KIND {
            return Err(CodecError::BadTypeTag { tag: kind }.into());
        }
        let essence = TransactionEssence::unpack(unpacker, mode)?;
        let mut unlock_rules: ArrayRules = UNLOCKS_ARRAY_RULES;
        unlock_rules.min = essence.inputs.len() as u16;
        unlock_rules.max = essence.inputs.len() as u16;
        let unlocks = unpack_array(unpacker, &unlock_rules, mode)?;
        Ok(Self { essence, unlocks })
    }
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;

    impl TransactionId {
        /// Generates a random [`TransactionId`].
        pub fn rand() -> Self {
            Self::new(crate::rand::rand_bytes_array())
        }
    }
}

#[cfg(all(test, feature = "rand"))]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{input::Input, output::Output, unlock::Unlock};

    fn params() -> DeserializationParameters {
        DeserializationParameters::default()
    }

    fn transaction() -> Transaction {
        Transaction::new(
            TransactionEssence::new(vec![Input::rand()], vec![Output::rand_simple()], None),
            vec![Unlock::rand_signature()],
        )
    }

    #[test]
    fn id_is_deterministic() {
        let transaction = transaction();
        assert_eq!(transaction.id().unwrap(), transaction.id().unwrap());
    }

    #[test]
    fn transaction_round_trip() {
        let transaction = transaction();
        let bytes = transaction.to_bytes(CodecMode::PERFORM_VALIDATION, &params()).unwrap();
        let decoded = Transaction::from_bytes(&bytes, CodecMode::PERFORM_VALIDATION, &params()).unwrap();
        assert_eq!(transaction, decoded);
        assert_eq!(bytes, decoded.to_bytes(CodecMode::PERFORM_VALIDATION, &params()).unwrap());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = transaction().to_bytes(CodecMode::NO_VALIDATION, &params()).unwrap();
        bytes.push(0);
        assert!(matches!(
            Transaction::from_bytes(&bytes, CodecMode::NO_VALIDATION, &params()),
            Err(Error::Codec(CodecError::TrailingBytes { remaining: 1 }))
        ));
    }

    #[test]
    fn unlock_count_is_specialized_to_input_count() {
        let mut transaction = transaction();
        transaction.unlocks.push(Unlock::reference(0));
        assert!(matches!(
            transaction.to_bytes(CodecMode::PERFORM_VALIDATION, &params()),
            Err(Error::Codec(CodecError::ArrayBoundViolation { count: 2, min: 1, max: 1 }))
        ));
    }

    #[test]
    fn outputs_set_pairs_id_with_slots() {
        let transaction = transaction();
        let set = transaction.outputs_set().unwrap();
        let id = transaction.id().unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains_key(&OutputId::new(id, 0)));
    }

    #[test]
    fn bad_payload_tag() {
        let mut bytes = transaction().to_bytes(CodecMode::NO_VALIDATION, &params()).unwrap();
        bytes[0] = 9;
        assert!(matches!(
            Transaction::from_bytes(&bytes, CodecMode::NO_VALIDATION, &params()),
            Err(Error::Codec(CodecError::BadTypeTag { tag: 9 }))
        ));
    }
}

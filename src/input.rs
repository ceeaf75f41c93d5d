// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`Input`] types.

use crate::{
    codec::{ArrayRules, ArrayUniqueness, CodecError, CodecMode, Packable, Packer, Unpacker},
    error::Error,
    output::OutputId,
    payload::transaction::TransactionId,
    MAX_INPUTS_COUNT, MAX_OUTPUTS_COUNT, MIN_INPUTS_COUNT,
};

/// The array rules of the inputs within a transaction essence.
pub const INPUTS_ARRAY_RULES: ArrayRules =
    ArrayRules::new(MIN_INPUTS_COUNT, MAX_INPUTS_COUNT, ArrayUniqueness::NoDuplicates);

/// The maximum output slot an input may reference.
pub const MAX_REF_UTXO_INDEX: u16 = MAX_OUTPUTS_COUNT - 1;

/// A reference to an unspent transaction output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct UtxoInput(OutputId);

impl UtxoInput {
    /// The type tag of a [`UtxoInput`].
    pub const KIND: u8 = 0;

    /// Creates a new [`UtxoInput`].
    pub fn new(transaction_id: TransactionId, index: u16) -> Self {
        Self(OutputId::new(transaction_id, index))
    }

    /// The output this input consumes.
    pub fn output_id(&self) -> &OutputId {
        &self.0
    }
}

/// The different input types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, derive_more::From)]
pub enum Input {
    /// A UTXO input.
    Utxo(UtxoInput),
}

impl Input {
    /// The type tag of this input.
    pub fn kind(&self) -> u8 {
        match self {
            Self::Utxo(_) => UtxoInput::KIND,
        }
    }

    /// The output this input consumes.
    pub fn output_id(&self) -> &OutputId {
        match self {
            Self::Utxo(input) => input.output_id(),
        }
    }
}

impl Packable for Input {
    fn pack(&self, packer: &mut Packer, _mode: CodecMode) -> Result<(), Error> {
        packer.pack_u8(self.kind());
        match self {
            Self::Utxo(input) => {
                packer.pack_bytes(input.output_id().transaction_id().as_bytes());
                packer.pack_u16(input.output_id().index());
            }
        }
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, _mode: CodecMode) -> Result<Self, Error> {
        Ok(match unpacker.unpack_u8()? {
            UtxoInput::KIND => {
                let transaction_id = TransactionId::new(unpacker.unpack_array()?);
                let index = unpacker.unpack_u16()?;
                Self::Utxo(UtxoInput::new(transaction_id, index))
            }
            tag => return Err(CodecError::BadTypeTag { tag: tag as u32 }.into()),
        })
    }
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;

    impl UtxoInput {
        /// Generates a random [`UtxoInput`].
        pub fn rand() -> Self {
            Self(OutputId::rand())
        }
    }

    impl Input {
        /// Generates a random [`Input`].
        pub fn rand() -> Self {
            Self::Utxo(UtxoInput::rand())
        }
    }
}

#[cfg(all(test, feature = "rand"))]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn input_round_trip() {
        let input = Input::rand();
        let bytes = input.pack_to_vec(CodecMode::PERFORM_VALIDATION).unwrap();
        assert_eq!(bytes.len(), 1 + 32 + 2);
        let mut unpacker = Unpacker::new(&bytes);
        assert_eq!(input, Input::unpack(&mut unpacker, CodecMode::PERFORM_VALIDATION).unwrap());
        assert_eq!(unpacker.finish(), Ok(()));
    }
}

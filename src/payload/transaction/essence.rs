// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`TransactionEssence`].

use std::collections::HashSet;

use crypto::hashes::{blake2b::Blake2b256, Digest};

use crate::{
    codec::{pack_array, unpack_array, CodecMode, Packable, Packer, Unpacker},
    error::{Error, SyntacticError},
    input::{Input, INPUTS_ARRAY_RULES, MAX_REF_UTXO_INDEX},
    output::{
        outputs_syntactic_addr_unique, outputs_syntactic_deposit, outputs_syntactic_feature_blocks,
        outputs_syntactic_foundry, outputs_syntactic_native_tokens, Output, OUTPUTS_ARRAY_RULES,
    },
    payload::indexation::IndexationPayload,
};

/// The essence of a transaction: the signed part carrying inputs, outputs and
/// an optional indexation payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionEssence {
    /// The inputs of the transaction.
    pub inputs: Vec<Input>,
    /// The outputs of the transaction.
    pub outputs: Vec<Output>,
    /// The optional embedded payload.
    pub payload: Option<IndexationPayload>,
}

impl TransactionEssence {
    /// The type tag of a [`TransactionEssence`].
    pub const KIND: u8 = 0;

    /// Creates a new [`TransactionEssence`].
    pub fn new(inputs: Vec<Input>, outputs: Vec<Output>, payload: Option<IndexationPayload>) -> Self {
        Self {
            inputs,
            outputs,
            payload,
        }
    }

    /// The message signature unlocks sign: the Blake2b-256 hash of the
    /// canonical essence encoding. Errors if the essence does not validate
    /// under that encoding.
    pub fn signing_message(&self) -> Result<[u8; 32], Error> {
        let bytes = self.pack_to_vec(CodecMode::PERFORM_VALIDATION | CodecMode::PERFORM_LEXICAL_ORDERING)?;
        Ok(Blake2b256::digest(&bytes).into())
    }

    /// Validates the essence in isolation, without the enclosing transaction.
    pub fn syntactically_validate(&self) -> Result<(), SyntacticError> {
        if self.inputs.is_empty() {
            return Err(SyntacticError::MinInputsNotReached);
        }
        if self.outputs.is_empty() {
            return Err(SyntacticError::MinOutputsNotReached);
        }
        let mut seen = HashSet::new();
        for (index, input) in self.inputs.iter().enumerate() {
            let output_id = input.output_id();
            if output_id.index() > MAX_REF_UTXO_INDEX {
                return Err(SyntacticError::InputRefIndexOutOfBounds {
                    index,
                    ref_index: output_id.index(),
                });
            }
            if !seen.insert(*output_id) {
                return Err(SyntacticError::InputUtxoRefsNotUnique { index });
            }
        }
        outputs_syntactic_deposit(&self.outputs)?;
        outputs_syntactic_native_tokens(&self.outputs)?;
        outputs_syntactic_feature_blocks(&self.outputs)?;
        outputs_syntactic_foundry(&self.outputs)?;
        Ok(())
    }
}

impl Packable for TransactionEssence {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        if mode.validating() {
            self.syntactically_validate()?;
        }
        packer.pack_u8(Self::KIND);
        pack_array(packer, &self.inputs, &INPUTS_ARRAY_RULES, mode)?;
        pack_array(packer, &self.outputs, &OUTPUTS_ARRAY_RULES, mode)?;
        match &self.payload {
            Some(payload) => {
                let payload_bytes = payload.pack_to_vec(mode)?;
                packer.pack_u32(payload_bytes.len() as u32);
                packer.pack_bytes(&payload_bytes);
            }
            None => packer.pack_u32(0),
        }
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        let kind = unpacker.unpack_u8()?;
        if kind != Self::KIND {
            return Err(crate::codec::CodecError::BadTypeTag { tag: kind as u32 }.into());
        }
        let inputs = unpack_array(unpacker, &INPUTS_ARRAY_RULES, mode)?;
        let outputs = unpack_array(unpacker, &OUTPUTS_ARRAY_RULES, mode)?;
        let payload_len = unpacker.unpack_u32()? as usize;
        let payload = if payload_len == 0 {
            None
        } else {
            let payload_bytes = unpacker.unpack_bytes(payload_len)?;
            let mut payload_unpacker = Unpacker::new(payload_bytes);
            let payload = IndexationPayload::unpack(&mut payload_unpacker, mode)?;
            payload_unpacker.finish()?;
            Some(payload)
        };
        let essence = Self {
            inputs,
            outputs,
            payload,
        };
        if mode.validating() {
            essence.syntactically_validate()?;
            outputs_syntactic_addr_unique(&essence.outputs)?;
        }
        Ok(essence)
    }
}

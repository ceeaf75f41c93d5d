// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`IndexationPayload`].

use crate::{
    codec::{CodecError, CodecMode, Packable, Packer, Unpacker},
    error::Error,
};

/// The minimum byte length of an indexation tag.
pub const MIN_INDEXATION_TAG_LENGTH: usize = 1;
/// The maximum byte length of an indexation tag.
pub const MAX_INDEXATION_TAG_LENGTH: usize = 64;

/// A payload tagging arbitrary data for lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexationPayload {
    /// The tag the data is indexed under.
    pub tag: Box<[u8]>,
    /// The tagged data.
    pub data: Box<[u8]>,
}

impl IndexationPayload {
    /// The payload tag of an [`IndexationPayload`].
    pub const KIND: u32 = 2;

    /// Creates a new [`IndexationPayload`].
    pub fn new(tag: impl Into<Box<[u8]>>, data: impl Into<Box<[u8]>>) -> Self {
        Self {
            tag: tag.into(),
            data: data.into(),
        }
    }
}

impl Packable for IndexationPayload {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        if mode.validating() && !(MIN_INDEXATION_TAG_LENGTH..=MAX_INDEXATION_TAG_LENGTH).contains(&self.tag.len()) {
            return Err(CodecError::ArrayBoundViolation {
                count: self.tag.len(),
                min: MIN_INDEXATION_TAG_LENGTH as u16,
                max: MAX_INDEXATION_TAG_LENGTH as u16,
            }
            .into());
        }
        packer.pack_u32(Self::KIND);
        packer.pack_u16(self.tag.len() as u16);
        packer.pack_bytes(&self.tag);
        packer.pack_u32(self.data.len() as u32);
        packer.pack_bytes(&self.data);
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        let kind = unpacker.unpack_u32()?;
        if kind != Self::KIND {
            return Err(CodecError::BadTypeTag { tag: kind }.into());
        }
        let tag_len = unpacker.unpack_u16()? as usize;
        if mode.validating() && !(MIN_INDEXATION_TAG_LENGTH..=MAX_INDEXATION_TAG_LENGTH).contains(&tag_len) {
            return Err(CodecError::ArrayBoundViolation {
                count: tag_len,
                min: MIN_INDEXATION_TAG_LENGTH as u16,
                max: MAX_INDEXATION_TAG_LENGTH as u16,
            }
            .into());
        }
        let tag = unpacker.unpack_bytes(tag_len)?.into();
        let data_len = unpacker.unpack_u32()? as usize;
        let data = unpacker.unpack_bytes(data_len)?.into();
        Ok(Self { tag, data })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn indexation_round_trip() {
        let payload = IndexationPayload::new(b"index".to_vec(), vec![0xca, 0xfe]);
        let bytes = payload.pack_to_vec(CodecMode::PERFORM_VALIDATION).unwrap();
        let mut unpacker = Unpacker::new(&bytes);
        assert_eq!(
            payload,
            IndexationPayload::unpack(&mut unpacker, CodecMode::PERFORM_VALIDATION).unwrap()
        );
        assert_eq!(unpacker.finish(), Ok(()));
    }

    #[test]
    fn empty_tag_is_rejected() {
        let payload = IndexationPayload::new(Vec::new(), vec![1]);
        assert!(payload.pack_to_vec(CodecMode::PERFORM_VALIDATION).is_err());
        // but passes without validation
        assert!(payload.pack_to_vec(CodecMode::NO_VALIDATION).is_ok());
    }
}

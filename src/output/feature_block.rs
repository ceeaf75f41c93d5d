// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`FeatureBlock`] types.
//!
//! Within a single output each feature block kind appears at most once and the
//! sequence is stored in ascending kind order, which the codec enforces
//! through the lexical-ordering rule (the kind tag is the leading byte).

use crate::codec::{ArrayRules, ArrayUniqueness, CodecError, CodecMode, Packable, Packer, Unpacker};
use crate::{address::Address, error::Error};

/// The array rules of the feature blocks within an output.
pub const FEATURE_BLOCKS_ARRAY_RULES: ArrayRules = ArrayRules::new(0, 9, ArrayUniqueness::Lexical);

/// The maximum byte length of an indexation feature block tag.
pub const MAX_INDEXATION_TAG_LENGTH: usize = 64;

/// An optional annotation attached to an output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureBlock {
    /// Attests the sender of the enclosing transaction.
    Sender(Address),
    /// Attests the creator of the output's chain.
    Issuer(Address),
    /// Demands a deposit return to the attested sender.
    DustDepositReturn(u64),
    /// Locks the output until a milestone index.
    TimelockMilestoneIndex(u32),
    /// Locks the output until a unix timestamp.
    TimelockUnix(u64),
    /// Returns ownership to the sender after a milestone index.
    ExpirationMilestoneIndex(u32),
    /// Returns ownership to the sender after a unix timestamp.
    ExpirationUnix(u64),
    /// Arbitrary metadata.
    Metadata(Box<[u8]>),
    /// An indexation tag with associated data.
    Indexation {
        /// The tag the output is indexed under.
        tag: Box<[u8]>,
        /// The indexed data.
        data: Box<[u8]>,
    },
}

impl FeatureBlock {
    /// The type tag of a sender feature block.
    pub const SENDER: u8 = 0;
    /// The type tag of an issuer feature block.
    pub const ISSUER: u8 = 1;
    /// The type tag of a dust deposit return feature block.
    pub const DUST_DEPOSIT_RETURN: u8 = 2;
    /// The type tag of a milestone index timelock feature block.
    pub const TIMELOCK_MILESTONE_INDEX: u8 = 3;
    /// The type tag of a unix timelock feature block.
    pub const TIMELOCK_UNIX: u8 = 4;
    /// The type tag of a milestone index expiration feature block.
    pub const EXPIRATION_MILESTONE_INDEX: u8 = 5;
    /// The type tag of a unix expiration feature block.
    pub const EXPIRATION_UNIX: u8 = 6;
    /// The type tag of a metadata feature block.
    pub const METADATA: u8 = 7;
    /// The type tag of an indexation feature block.
    pub const INDEXATION: u8 = 8;

    /// The type tag of this feature block.
    pub fn kind(&self) -> u8 {
        match self {
            Self::Sender(_) => Self::SENDER,
            Self::Issuer(_) => Self::ISSUER,
            Self::DustDepositReturn(_) => Self::DUST_DEPOSIT_RETURN,
            Self::TimelockMilestoneIndex(_) => Self::TIMELOCK_MILESTONE_INDEX,
            Self::TimelockUnix(_) => Self::TIMELOCK_UNIX,
            Self::ExpirationMilestoneIndex(_) => Self::EXPIRATION_MILESTONE_INDEX,
            Self::ExpirationUnix(_) => Self::EXPIRATION_UNIX,
            Self::Metadata(_) => Self::METADATA,
            Self::Indexation { .. } => Self::INDEXATION,
        }
    }

    /// The attested sender, if this is a sender feature block.
    pub fn as_sender(&self) -> Option<&Address> {
        match self {
            Self::Sender(address) => Some(address),
            _ => None,
        }
    }

    /// The attested issuer, if this is an issuer feature block.
    pub fn as_issuer(&self) -> Option<&Address> {
        match self {
            Self::Issuer(address) => Some(address),
            _ => None,
        }
    }

    /// The demanded return amount, if this is a dust deposit return feature block.
    pub fn as_dust_deposit_return(&self) -> Option<u64> {
        match self {
            Self::DustDepositReturn(amount) => Some(*amount),
            _ => None,
        }
    }
}

/// Looks up the sender feature block within an output's feature blocks.
pub fn sender_block(feature_blocks: &[FeatureBlock]) -> Option<&Address> {
    feature_blocks.iter().find_map(FeatureBlock::as_sender)
}

/// Looks up the issuer feature block within an output's feature blocks.
pub fn issuer_block(feature_blocks: &[FeatureBlock]) -> Option<&Address> {
    feature_blocks.iter().find_map(FeatureBlock::as_issuer)
}

/// Whether each feature block kind appears at most once in the given sequence.
pub fn unique_kinds(feature_blocks: &[FeatureBlock]) -> bool {
    let mut seen = 0u16;
    for block in feature_blocks {
        let bit = 1u16 << block.kind();
        if seen & bit != 0 {
            return false;
        }
        seen |= bit;
    }
    true
}

/// Whether any feature block within the given sequence requires a companion
/// sender feature block.
pub fn requires_sender_block(feature_blocks: &[FeatureBlock]) -> bool {
    feature_blocks.iter().any(|block| {
        matches!(
            block,
            FeatureBlock::DustDepositReturn(_)
                | FeatureBlock::ExpirationMilestoneIndex(_)
                | FeatureBlock::ExpirationUnix(_)
        )
    })
}

impl Packable for FeatureBlock {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        packer.pack_u8(self.kind());
        match self {
            Self::Sender(address) | Self::Issuer(address) => address.pack(packer, mode)?,
            Self::DustDepositReturn(amount) | Self::TimelockUnix(amount) | Self::ExpirationUnix(amount) => {
                packer.pack_u64(*amount)
            }
            Self::TimelockMilestoneIndex(index) | Self::ExpirationMilestoneIndex(index) => packer.pack_u32(*index),
            Self::Metadata(data) => {
                packer.pack_u32(data.len() as u32);
                packer.pack_bytes(data);
            }
            Self::Indexation { tag, data } => {
                packer.pack_u8(tag.len() as u8);
                packer.pack_bytes(tag);
                packer.pack_u32(data.len() as u32);
                packer.pack_bytes(data);
            }
        }
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        Ok(match unpacker.unpack_u8()? {
            Self::SENDER => Self::Sender(Address::unpack(unpacker, mode)?),
            Self::ISSUER => Self::Issuer(Address::unpack(unpacker, mode)?),
            Self::DUST_DEPOSIT_RETURN => Self::DustDepositReturn(unpacker.unpack_u64()?),
            Self::TIMELOCK_MILESTONE_INDEX => Self::TimelockMilestoneIndex(unpacker.unpack_u32()?),
            Self::TIMELOCK_UNIX => Self::TimelockUnix(unpacker.unpack_u64()?),
            Self::EXPIRATION_MILESTONE_INDEX => Self::ExpirationMilestoneIndex(unpacker.unpack_u32()?),
            Self::EXPIRATION_UNIX => Self::ExpirationUnix(unpacker.unpack_u64()?),
            Self::METADATA => {
                let len = unpacker.unpack_u32()? as usize;
                Self::Metadata(unpacker.unpack_bytes(len)?.into())
            }
            Self::INDEXATION => {
                let tag_len = unpacker.unpack_u8()? as usize;
                if mode.validating() && tag_len > MAX_INDEXATION_TAG_LENGTH {
                    return Err(CodecError::ArrayBoundViolation {
                        count: tag_len,
                        min: 0,
                        max: MAX_INDEXATION_TAG_LENGTH as u16,
                    }
                    .into());
                }
                let tag = unpacker.unpack_bytes(tag_len)?.into();
                let data_len = unpacker.unpack_u32()? as usize;
                let data = unpacker.unpack_bytes(data_len)?.into();
                Self::Indexation { tag, data }
            }
            tag => return Err(CodecError::BadTypeTag { tag: tag as u32 }.into()),
        })
    }
}

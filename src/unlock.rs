// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`Unlock`] types.

use std::collections::HashSet;

use crate::{
    address::Address,
    codec::{ArrayRules, ArrayUniqueness, CodecError, CodecMode, Packable, Packer, Unpacker},
    error::{Error, SyntacticError},
    signature::Signature,
};

/// A signature unlock.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, derive_more::From)]
pub struct SignatureUnlock(Signature);

impl SignatureUnlock {
    /// The type tag of a [`SignatureUnlock`].
    pub const KIND: u8 = 0;

    /// The signature carried by this unlock.
    pub fn signature(&self) -> &Signature {
        &self.0
    }
}

/// A reference to an earlier signature unlock.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReferenceUnlock(u16);

impl ReferenceUnlock {
    /// The type tag of a [`ReferenceUnlock`].
    pub const KIND: u8 = 1;
}

/// An unlock through an earlier unlocked alias.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AliasUnlock(u16);

impl AliasUnlock {
    /// The type tag of an [`AliasUnlock`].
    pub const KIND: u8 = 2;
}

/// An unlock through an earlier unlocked NFT.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NftUnlock(u16);

impl NftUnlock {
    /// The type tag of an [`NftUnlock`].
    pub const KIND: u8 = 3;
}

/// The different unlock types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, derive_more::From)]
pub enum Unlock {
    /// A signature unlock.
    Signature(SignatureUnlock),
    /// A reference unlock.
    Reference(ReferenceUnlock),
    /// An alias unlock.
    Alias(AliasUnlock),
    /// An NFT unlock.
    Nft(NftUnlock),
}

impl Unlock {
    /// Creates a new signature [`Unlock`].
    pub fn signature(signature: Signature) -> Self {
        Self::Signature(SignatureUnlock(signature))
    }

    /// Creates a new reference [`Unlock`].
    pub fn reference(index: u16) -> Self {
        Self::Reference(ReferenceUnlock(index))
    }

    /// Creates a new alias [`Unlock`].
    pub fn alias(index: u16) -> Self {
        Self::Alias(AliasUnlock(index))
    }

    /// Creates a new NFT [`Unlock`].
    pub fn nft(index: u16) -> Self {
        Self::Nft(NftUnlock(index))
    }

    /// The type tag of this unlock.
    pub fn kind(&self) -> u8 {
        match self {
            Self::Signature(_) => SignatureUnlock::KIND,
            Self::Reference(_) => ReferenceUnlock::KIND,
            Self::Alias(_) => AliasUnlock::KIND,
            Self::Nft(_) => NftUnlock::KIND,
        }
    }

    /// The referenced unlock index, if this unlock is referential.
    pub fn reference_index(&self) -> Option<u16> {
        match self {
            Self::Signature(_) => None,
            Self::Reference(ReferenceUnlock(index)) | Self::Alias(AliasUnlock(index)) | Self::Nft(NftUnlock(index)) => {
                Some(*index)
            }
        }
    }

    /// Whether this referential unlock can unlock further chain-constrained outputs.
    pub fn chainable(&self) -> bool {
        matches!(self, Self::Alias(_) | Self::Nft(_))
    }

    /// Whether the given address may be unlocked by this referential unlock.
    pub fn source_allowed(&self, address: &Address) -> bool {
        match self {
            Self::Signature(_) => false,
            Self::Reference(_) => matches!(address, Address::Ed25519(_)),
            Self::Alias(_) => matches!(address, Address::Alias(_)),
            Self::Nft(_) => matches!(address, Address::Nft(_)),
        }
    }
}

impl Packable for Unlock {
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), Error> {
        packer.pack_u8(self.kind());
        match self {
            Self::Signature(unlock) => unlock.signature().pack(packer, mode)?,
            Self::Reference(ReferenceUnlock(index)) | Self::Alias(AliasUnlock(index)) | Self::Nft(NftUnlock(index)) => {
                packer.pack_u16(*index)
            }
        }
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, Error> {
        Ok(match unpacker.unpack_u8()? {
            SignatureUnlock::KIND => Self::Signature(SignatureUnlock(Signature::unpack(unpacker, mode)?)),
            ReferenceUnlock::KIND => Self::Reference(ReferenceUnlock(unpacker.unpack_u16()?)),
            AliasUnlock::KIND => Self::Alias(AliasUnlock(unpacker.unpack_u16()?)),
            NftUnlock::KIND => Self::Nft(NftUnlock(unpacker.unpack_u16()?)),
            tag => return Err(CodecError::BadTypeTag { tag: tag as u32 }.into()),
        })
    }
}

/// The array rules of the unlocks within a transaction; min and max are
/// specialized to the input count on a local copy before enforcement.
pub const UNLOCKS_ARRAY_RULES: ArrayRules = ArrayRules::new(0, u16::MAX, ArrayUniqueness::None);

/// Validates that signature unlocks are unique and that every referential
/// unlock points backward at a signature unlock.
pub fn validate_unlocks(unlocks: &[Unlock]) -> Result<(), SyntacticError> {
    let mut seen_signatures = HashSet::new();
    for (index, unlock) in unlocks.iter().enumerate() {
        match unlock {
            Unlock::Signature(signature) => {
                if !seen_signatures.insert(*signature) {
                    return Err(SyntacticError::SignatureUnlockNotUnique { index });
                }
            }
            _ => {
                // reference_index is always present for referential unlocks
                let referenced = unlock.reference_index().unwrap_or(u16::MAX) as usize;
                if referenced >= index || !matches!(unlocks.get(referenced), Some(Unlock::Signature(_))) {
                    return Err(SyntacticError::ReferentialUnlockInvalid { index });
                }
            }
        }
    }
    Ok(())
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;

    impl Unlock {
        /// Generates a random signature [`Unlock`].
        pub fn rand_signature() -> Self {
            Self::signature(Signature::rand())
        }
    }
}

#[cfg(all(test, feature = "rand"))]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn unlock_round_trip() {
        for unlock in [Unlock::rand_signature(), Unlock::reference(7), Unlock::alias(0), Unlock::nft(1)] {
            let bytes = unlock.pack_to_vec(CodecMode::PERFORM_VALIDATION).unwrap();
            let mut unpacker = Unpacker::new(&bytes);
            assert_eq!(unlock, Unlock::unpack(&mut unpacker, CodecMode::PERFORM_VALIDATION).unwrap());
            assert_eq!(unpacker.finish(), Ok(()));
        }
    }

    #[test]
    fn referential_unlock_must_point_backward() {
        let unlocks = [Unlock::reference(1), Unlock::rand_signature()];
        assert_eq!(
            validate_unlocks(&unlocks),
            Err(SyntacticError::ReferentialUnlockInvalid { index: 0 })
        );
    }

    #[test]
    fn referential_unlock_must_target_signature() {
        let unlocks = [Unlock::rand_signature(), Unlock::reference(0), Unlock::reference(1)];
        assert_eq!(
            validate_unlocks(&unlocks),
            Err(SyntacticError::ReferentialUnlockInvalid { index: 2 })
        );
    }

    #[test]
    fn duplicate_signature_unlock() {
        let signature = Unlock::rand_signature();
        assert_eq!(
            validate_unlocks(&[signature, signature]),
            Err(SyntacticError::SignatureUnlockNotUnique { index: 1 })
        );
    }

    #[test]
    fn valid_unlock_sequence() {
        let unlocks = [
            Unlock::rand_signature(),
            Unlock::reference(0),
            Unlock::alias(0),
            Unlock::rand_signature(),
            Unlock::nft(3),
        ];
        assert_eq!(validate_unlocks(&unlocks), Ok(()));
    }
}

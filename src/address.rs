// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`Address`] types.

use std::fmt;

use crypto::hashes::{blake2b::Blake2b256, Digest};

use crate::{
    codec::{CodecError, CodecMode, Packable, Packer, Unpacker},
    error::Error,
    output::{AliasId, NftId},
    signature::{Ed25519Signature, SignatureError},
};

/// An address controlled by an Ed25519 key pair: the Blake2b-256 hash of the public key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct Ed25519Address([u8; Self::LENGTH]);

impl Ed25519Address {
    /// The type tag of an [`Ed25519Address`].
    pub const KIND: u8 = 0;
    /// The byte length of the address hash.
    pub const LENGTH: usize = 32;

    /// Creates a new [`Ed25519Address`].
    pub fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derives the address of the given Ed25519 public key bytes.
    pub fn from_public_key_bytes(public_key: &[u8; Ed25519Signature::PUBLIC_KEY_LENGTH]) -> Self {
        Self(Blake2b256::digest(public_key).into())
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }

    /// Verifies that the given signature was produced over `message` by the
    /// key pair this address commits to.
    pub fn unlock(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), SignatureError> {
        if Self::from_public_key_bytes(signature.public_key()) != *self {
            return Err(SignatureError::PublicKeyAddressMismatch);
        }
        signature.verify(message)
    }
}

/// The address of an alias chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct AliasAddress(AliasId);

impl AliasAddress {
    /// The type tag of an [`AliasAddress`].
    pub const KIND: u8 = 8;

    /// Creates a new [`AliasAddress`].
    pub fn new(id: AliasId) -> Self {
        Self(id)
    }

    /// The alias id this address refers to.
    pub fn alias_id(&self) -> &AliasId {
        &self.0
    }
}

/// The address of an NFT chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct NftAddress(NftId);

impl NftAddress {
    /// The type tag of an [`NftAddress`].
    pub const KIND: u8 = 16;

    /// Creates a new [`NftAddress`].
    pub fn new(id: NftId) -> Self {
        Self(id)
    }

    /// The NFT id this address refers to.
    pub fn nft_id(&self) -> &NftId {
        &self.0
    }
}

/// The different address types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub enum Address {
    /// An Ed25519 address.
    Ed25519(Ed25519Address),
    /// An alias address.
    Alias(AliasAddress),
    /// An NFT address.
    Nft(NftAddress),
}

impl Address {
    /// The type tag of this address.
    pub fn kind(&self) -> u8 {
        match self {
            Self::Ed25519(_) => Ed25519Address::KIND,
            Self::Alias(_) => AliasAddress::KIND,
            Self::Nft(_) => NftAddress::KIND,
        }
    }

    /// Whether this address identifies a chain-constrained output.
    pub fn is_chain_constrained(&self) -> bool {
        matches!(self, Self::Alias(_) | Self::Nft(_))
    }

    /// Whether this address can be unlocked directly by a signature.
    pub fn is_direct_unlockable(&self) -> bool {
        matches!(self, Self::Ed25519(_))
    }

    /// The canonical key bytes of this address, used to track unlocked identities.
    pub fn to_key(&self) -> Vec<u8> {
        let mut key = vec![self.kind()];
        match self {
            Self::Ed25519(address) => key.extend_from_slice(address.as_bytes()),
            Self::Alias(address) => key.extend_from_slice(address.alias_id().as_bytes()),
            Self::Nft(address) => key.extend_from_slice(address.nft_id().as_bytes()),
        }
        key
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", prefix_hex::encode(self.to_key()))
    }
}

impl Packable for Address {
    fn pack(&self, packer: &mut Packer, _mode: CodecMode) -> Result<(), Error> {
        packer.pack_u8(self.kind());
        match self {
            Self::Ed25519(address) => packer.pack_bytes(address.as_bytes()),
            Self::Alias(address) => packer.pack_bytes(address.alias_id().as_bytes()),
            Self::Nft(address) => packer.pack_bytes(address.nft_id().as_bytes()),
        }
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, _mode: CodecMode) -> Result<Self, Error> {
        Ok(match unpacker.unpack_u8()? {
            Ed25519Address::KIND => Self::Ed25519(Ed25519Address::new(unpacker.unpack_array()?)),
            AliasAddress::KIND => Self::Alias(AliasAddress::new(AliasId::new(unpacker.unpack_array()?))),
            NftAddress::KIND => Self::Nft(NftAddress::new(NftId::new(unpacker.unpack_array()?))),
            tag => return Err(CodecError::BadTypeTag { tag: tag as u32 }.into()),
        })
    }
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;
    use crate::rand::rand_bytes_array;

    impl Ed25519Address {
        /// Generates a random [`Ed25519Address`].
        pub fn rand() -> Self {
            Self::new(rand_bytes_array())
        }
    }

    impl Address {
        /// Generates a random Ed25519 [`Address`].
        pub fn rand_ed25519() -> Self {
            Self::Ed25519(Ed25519Address::rand())
        }

        /// Generates a random alias [`Address`].
        pub fn rand_alias() -> Self {
            Self::Alias(AliasAddress::new(AliasId::rand()))
        }

        /// Generates a random NFT [`Address`].
        pub fn rand_nft() -> Self {
            Self::Nft(NftAddress::new(NftId::rand()))
        }
    }
}

#[cfg(all(test, feature = "rand"))]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn address_round_trip() {
        for address in [Address::rand_ed25519(), Address::rand_alias(), Address::rand_nft()] {
            let bytes = address.pack_to_vec(CodecMode::PERFORM_VALIDATION).unwrap();
            let mut unpacker = Unpacker::new(&bytes);
            let decoded = Address::unpack(&mut unpacker, CodecMode::PERFORM_VALIDATION).unwrap();
            assert_eq!(address, decoded);
            assert_eq!(unpacker.finish(), Ok(()));
        }
    }

    #[test]
    fn bad_address_tag() {
        let mut bytes = Address::rand_ed25519().pack_to_vec(CodecMode::NO_VALIDATION).unwrap();
        bytes[0] = 42;
        let mut unpacker = Unpacker::new(&bytes);
        assert!(matches!(
            Address::unpack(&mut unpacker, CodecMode::PERFORM_VALIDATION),
            Err(Error::Codec(CodecError::BadTypeTag { tag: 42 }))
        ));
    }

    #[test]
    fn ed25519_unlock() {
        use crypto::signatures::ed25519::SecretKey;

        let secret_key = SecretKey::generate().unwrap();
        let public_key = secret_key.public_key().to_bytes();
        let address = Ed25519Address::from_public_key_bytes(&public_key);
        let message = b"canonical essence bytes";
        let signature = Ed25519Signature::new(public_key, secret_key.sign(message).to_bytes());

        assert!(address.unlock(message, &signature).is_ok());
        assert_eq!(
            address.unlock(b"a different message", &signature),
            Err(SignatureError::SignatureInvalid)
        );
        let other = Ed25519Address::rand();
        assert_eq!(
            other.unlock(message, &signature),
            Err(SignatureError::PublicKeyAddressMismatch)
        );
    }
}

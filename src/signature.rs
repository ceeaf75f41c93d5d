// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the [`Signature`] types.

use crypto::signatures::ed25519;
use thiserror::Error;

use crate::{
    codec::{CodecError, CodecMode, Packable, Packer, Unpacker},
    error::Error,
};

/// An error produced while verifying a signature against an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The public key does not hash to the address being unlocked.
    #[error("public key does not correspond to the address")]
    PublicKeyAddressMismatch,
    /// The public key bytes do not form a valid Ed25519 point.
    #[error("malformed public key")]
    MalformedPublicKey,
    /// The signature does not verify over the message.
    #[error("signature does not verify")]
    SignatureInvalid,
}

/// An Ed25519 signature together with the public key that produced it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ed25519Signature {
    public_key: [u8; Self::PUBLIC_KEY_LENGTH],
    signature: [u8; Self::SIGNATURE_LENGTH],
}

impl Ed25519Signature {
    /// The type tag of an [`Ed25519Signature`].
    pub const KIND: u8 = 0;
    /// The byte length of an Ed25519 public key.
    pub const PUBLIC_KEY_LENGTH: usize = 32;
    /// The byte length of an Ed25519 signature.
    pub const SIGNATURE_LENGTH: usize = 64;

    /// Creates a new [`Ed25519Signature`].
    pub fn new(public_key: [u8; Self::PUBLIC_KEY_LENGTH], signature: [u8; Self::SIGNATURE_LENGTH]) -> Self {
        Self { public_key, signature }
    }

    /// The public key bytes.
    pub fn public_key(&self) -> &[u8; Self::PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    /// The signature bytes.
    pub fn signature(&self) -> &[u8; Self::SIGNATURE_LENGTH] {
        &self.signature
    }

    /// Verifies this signature over the given message.
    pub fn verify(&self, message: &[u8]) -> Result<(), SignatureError> {
        let public_key = ed25519::PublicKey::try_from_bytes(self.public_key)
            .map_err(|_| SignatureError::MalformedPublicKey)?;
        let signature = ed25519::Signature::from_bytes(self.signature);
        if !public_key.verify(&signature, message) {
            return Err(SignatureError::SignatureInvalid);
        }
        Ok(())
    }
}

/// The different signature types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, derive_more::From)]
pub enum Signature {
    /// An Ed25519 signature.
    Ed25519(Ed25519Signature),
}

impl Signature {
    /// The type tag of this signature.
    pub fn kind(&self) -> u8 {
        match self {
            Self::Ed25519(_) => Ed25519Signature::KIND,
        }
    }
}

impl Packable for Signature {
    fn pack(&self, packer: &mut Packer, _mode: CodecMode) -> Result<(), Error> {
        packer.pack_u8(self.kind());
        match self {
            Self::Ed25519(signature) => {
                packer.pack_bytes(signature.public_key());
                packer.pack_bytes(signature.signature());
            }
        }
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>, _mode: CodecMode) -> Result<Self, Error> {
        Ok(match unpacker.unpack_u8()? {
            Ed25519Signature::KIND => {
                let public_key = unpacker.unpack_array()?;
                let signature = unpacker.unpack_array()?;
                Self::Ed25519(Ed25519Signature::new(public_key, signature))
            }
            tag => return Err(CodecError::BadTypeTag { tag: tag as u32 }.into()),
        })
    }
}

#[cfg(feature = "rand")]
mod rand {
    use super::*;
    use crate::rand::rand_bytes_array;

    impl Ed25519Signature {
        /// Generates an [`Ed25519Signature`] with random key and signature bytes.
        pub fn rand() -> Self {
            Self::new(rand_bytes_array(), rand_bytes_array())
        }
    }

    impl Signature {
        /// Generates a random [`Signature`].
        pub fn rand() -> Self {
            Self::Ed25519(Ed25519Signature::rand())
        }
    }
}

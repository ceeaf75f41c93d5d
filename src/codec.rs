// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The dual-mode binary codec used by every ledger object.
//!
//! Encoding is canonical: all integers are little-endian, all arrays carry a
//! `u16` count prefix, and arrays that declare lexical ordering must be
//! strictly ascending by the byte representation of their elements. The codec
//! either runs raw ([`CodecMode::NO_VALIDATION`]) or enforces bounds, type
//! tags and uniqueness ([`CodecMode::PERFORM_VALIDATION`]); strict element
//! ordering is controlled by the independent
//! [`CodecMode::PERFORM_LEXICAL_ORDERING`] flag.

use std::ops::BitOr;

use thiserror::Error;

use crate::error::Error as CrateError;

/// The mode under which objects are packed and unpacked.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CodecMode(u8);

impl CodecMode {
    /// Raw round-trip without any validation.
    pub const NO_VALIDATION: Self = Self(0);
    /// Enforce minimum lengths, type tags, array bounds and uniqueness.
    pub const PERFORM_VALIDATION: Self = Self(1);
    /// Enforce strict byte-lexicographic element ordering in arrays that declare it.
    pub const PERFORM_LEXICAL_ORDERING: Self = Self(1 << 1);

    /// Whether [`CodecMode::PERFORM_VALIDATION`] is set.
    pub fn validating(self) -> bool {
        self.0 & Self::PERFORM_VALIDATION.0 != 0
    }

    /// Whether [`CodecMode::PERFORM_LEXICAL_ORDERING`] is set.
    pub fn lexical(self) -> bool {
        self.0 & Self::PERFORM_LEXICAL_ORDERING.0 != 0
    }
}

impl BitOr for CodecMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// An error produced while packing or unpacking a ledger object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Ran past the end of the buffer during a fixed-width or length-prefixed read.
    #[error("unexpected end of buffer: {needed} more byte(s) needed")]
    ShortBuffer {
        /// How many bytes the read was short of.
        needed: usize,
    },
    /// The discriminator does not belong to the closed set of the variant, or
    /// is disallowed at this position.
    #[error("type tag {tag} is not allowed at this position")]
    BadTypeTag {
        /// The offending tag, widened to `u32`.
        tag: u32,
    },
    /// An array count is outside its declared bounds.
    #[error("array of {count} element(s) is out of bounds [{min}, {max}]")]
    ArrayBoundViolation {
        /// The observed element count.
        count: usize,
        /// The declared minimum.
        min: u16,
        /// The declared maximum.
        max: u16,
    },
    /// Two elements of a no-duplicates array encode to the same bytes.
    #[error("element {index} is a duplicate")]
    DuplicateElement {
        /// Position of the duplicated element.
        index: usize,
    },
    /// A lexical-ordering array is not strictly ascending.
    #[error("element {index} breaks the lexical order")]
    OutOfOrderElement {
        /// Position of the misordered element.
        index: usize,
    },
    /// Input remained after the outermost object was consumed.
    #[error("{remaining} trailing byte(s) after the outermost object")]
    TrailingBytes {
        /// The number of unconsumed bytes.
        remaining: usize,
    },
}

/// How elements within a variable-length array relate to each other.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArrayUniqueness {
    /// No relation between elements.
    None,
    /// No two elements may encode to the same bytes.
    NoDuplicates,
    /// Elements must be strictly ascending by their encoded bytes.
    Lexical,
}

/// The bounds and uniqueness rules of a variable-length array.
#[derive(Copy, Clone, Debug)]
pub struct ArrayRules {
    /// Minimum element count.
    pub min: u16,
    /// Maximum element count.
    pub max: u16,
    /// The uniqueness mode of the array.
    pub uniqueness: ArrayUniqueness,
}

impl ArrayRules {
    /// Creates new array rules.
    pub const fn new(min: u16, max: u16, uniqueness: ArrayUniqueness) -> Self {
        Self { min, max, uniqueness }
    }

    fn check_bounds(&self, count: usize) -> Result<(), CodecError> {
        if count < self.min as usize || count > self.max as usize {
            return Err(CodecError::ArrayBoundViolation {
                count,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    fn check_element(
        &self,
        seen: &[Vec<u8>],
        encoded: &[u8],
        index: usize,
        mode: CodecMode,
    ) -> Result<(), CodecError> {
        match self.uniqueness {
            ArrayUniqueness::None => {}
            ArrayUniqueness::NoDuplicates => {
                if mode.validating() && seen.iter().any(|prev| prev == encoded) {
                    return Err(CodecError::DuplicateElement { index });
                }
            }
            ArrayUniqueness::Lexical => {
                if mode.lexical() {
                    if let Some(prev) = seen.last() {
                        if prev.as_slice() >= encoded {
                            return Err(CodecError::OutOfOrderElement { index });
                        }
                    }
                } else if mode.validating() && seen.iter().any(|prev| prev == encoded) {
                    return Err(CodecError::DuplicateElement { index });
                }
            }
        }
        Ok(())
    }
}

/// Accumulates the canonical byte form of a ledger object.
#[derive(Default)]
pub struct Packer {
    bytes: Vec<u8>,
}

impl Packer {
    /// Creates an empty packer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the packer, returning the written bytes.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Appends a `u8`.
    pub fn pack_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    /// Appends a `u16` in little-endian order.
    pub fn pack_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a `u32` in little-endian order.
    pub fn pack_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a `u64` in little-endian order.
    pub fn pack_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends raw bytes.
    pub fn pack_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }
}

/// Walks a borrowed byte slice, consuming one field at a time.
pub struct Unpacker<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Unpacker<'a> {
    /// Creates an unpacker over the given bytes.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// The number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// The current read position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The bytes consumed since the given mark.
    pub fn bytes_since(&self, mark: usize) -> &'a [u8] {
        &self.bytes[mark..self.pos]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::ShortBuffer {
                needed: n - self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consumes a `u8`.
    pub fn unpack_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    /// Consumes a little-endian `u16`.
    pub fn unpack_u16(&mut self) -> Result<u16, CodecError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Consumes a little-endian `u32`.
    pub fn unpack_u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Consumes a little-endian `u64`.
    pub fn unpack_u64(&mut self) -> Result<u64, CodecError> {
        let bytes = self.take(8)?;
        let mut array = [0u8; 8];
        array.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(array))
    }

    /// Consumes `n` raw bytes.
    pub fn unpack_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        self.take(n)
    }

    /// Consumes a fixed-size byte array.
    pub fn unpack_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    /// Errors with [`CodecError::TrailingBytes`] unless the buffer is exhausted.
    pub fn finish(&self) -> Result<(), CodecError> {
        if self.remaining() != 0 {
            return Err(CodecError::TrailingBytes {
                remaining: self.remaining(),
            });
        }
        Ok(())
    }
}

/// A ledger object with a canonical binary form.
pub trait Packable: Sized {
    /// Writes this object to the given packer.
    fn pack(&self, packer: &mut Packer, mode: CodecMode) -> Result<(), CrateError>;

    /// Reads an object of this type from the given unpacker.
    fn unpack(unpacker: &mut Unpacker<'_>, mode: CodecMode) -> Result<Self, CrateError>;

    /// Packs this object into a fresh byte vector.
    fn pack_to_vec(&self, mode: CodecMode) -> Result<Vec<u8>, CrateError> {
        let mut packer = Packer::new();
        self.pack(&mut packer, mode)?;
        Ok(packer.finish())
    }
}

/// Packs a slice of objects with a `u16` count prefix under the given array rules.
pub fn pack_array<T: Packable>(
    packer: &mut Packer,
    items: &[T],
    rules: &ArrayRules,
    mode: CodecMode,
) -> Result<(), CrateError> {
    if mode.validating() {
        rules.check_bounds(items.len())?;
    }
    packer.pack_u16(items.len() as u16);
    let checked = rules.uniqueness != ArrayUniqueness::None && (mode.validating() || mode.lexical());
    let mut seen: Vec<Vec<u8>> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let mark = packer.len();
        item.pack(packer, mode)?;
        if checked {
            let encoded = packer.as_slice()[mark..].to_vec();
            rules.check_element(&seen, &encoded, index, mode)?;
            seen.push(encoded);
        }
    }
    Ok(())
}

/// Unpacks a slice of objects with a `u16` count prefix under the given array rules.
pub fn unpack_array<T: Packable>(
    unpacker: &mut Unpacker<'_>,
    rules: &ArrayRules,
    mode: CodecMode,
) -> Result<Vec<T>, CrateError> {
    let count = unpacker.unpack_u16()? as usize;
    if mode.validating() {
        rules.check_bounds(count)?;
    }
    let checked = rules.uniqueness != ArrayUniqueness::None && (mode.validating() || mode.lexical());
    let mut items = Vec::with_capacity(count);
    let mut seen: Vec<Vec<u8>> = Vec::new();
    for index in 0..count {
        let mark = unpacker.pos();
        let item = T::unpack(unpacker, mode)?;
        if checked {
            let encoded = unpacker.bytes_since(mark).to_vec();
            rules.check_element(&seen, &encoded, index, mode)?;
            seen.push(encoded);
        }
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Error;

    impl Packable for u32 {
        fn pack(&self, packer: &mut Packer, _: CodecMode) -> Result<(), Error> {
            packer.pack_u32(*self);
            Ok(())
        }

        fn unpack(unpacker: &mut Unpacker<'_>, _: CodecMode) -> Result<Self, Error> {
            Ok(unpacker.unpack_u32()?)
        }
    }

    #[test]
    fn integer_round_trip() {
        let mut packer = Packer::new();
        packer.pack_u8(0xab);
        packer.pack_u16(0xcdef);
        packer.pack_u32(0x01234567);
        packer.pack_u64(u64::MAX - 1);
        let bytes = packer.finish();

        let mut unpacker = Unpacker::new(&bytes);
        assert_eq!(unpacker.unpack_u8().unwrap(), 0xab);
        assert_eq!(unpacker.unpack_u16().unwrap(), 0xcdef);
        assert_eq!(unpacker.unpack_u32().unwrap(), 0x01234567);
        assert_eq!(unpacker.unpack_u64().unwrap(), u64::MAX - 1);
        assert_eq!(unpacker.finish(), Ok(()));
    }

    #[test]
    fn short_buffer() {
        let mut unpacker = Unpacker::new(&[0x01, 0x02]);
        assert_eq!(
            unpacker.unpack_u32(),
            Err(CodecError::ShortBuffer { needed: 2 })
        );
    }

    #[test]
    fn trailing_bytes() {
        let mut unpacker = Unpacker::new(&[0x01, 0x02]);
        unpacker.unpack_u8().unwrap();
        assert_eq!(unpacker.finish(), Err(CodecError::TrailingBytes { remaining: 1 }));
    }

    #[test]
    fn array_bounds() {
        let rules = ArrayRules::new(1, 2, ArrayUniqueness::None);
        let mut packer = Packer::new();
        assert!(matches!(
            pack_array::<u32>(&mut packer, &[1, 2, 3], &rules, CodecMode::PERFORM_VALIDATION),
            Err(Error::Codec(CodecError::ArrayBoundViolation { count: 3, .. }))
        ));
        // Without validation the same array packs fine.
        pack_array::<u32>(&mut packer, &[1, 2, 3], &rules, CodecMode::NO_VALIDATION).unwrap();
    }

    #[test]
    fn duplicate_elements() {
        let rules = ArrayRules::new(0, 16, ArrayUniqueness::NoDuplicates);
        let mut packer = Packer::new();
        assert!(matches!(
            pack_array::<u32>(&mut packer, &[7, 7], &rules, CodecMode::PERFORM_VALIDATION),
            Err(Error::Codec(CodecError::DuplicateElement { index: 1 }))
        ));
    }

    #[test]
    fn lexical_ordering() {
        let rules = ArrayRules::new(0, 16, ArrayUniqueness::Lexical);
        let mode = CodecMode::PERFORM_VALIDATION | CodecMode::PERFORM_LEXICAL_ORDERING;
        let mut packer = Packer::new();
        // 2 encodes as 02 00 00 00, 1 as 01 00 00 00: descending.
        assert!(matches!(
            pack_array::<u32>(&mut packer, &[2, 1], &rules, mode),
            Err(Error::Codec(CodecError::OutOfOrderElement { index: 1 }))
        ));
        let mut packer = Packer::new();
        pack_array::<u32>(&mut packer, &[1, 2], &rules, mode).unwrap();
        let bytes = packer.finish();
        let mut unpacker = Unpacker::new(&bytes);
        let items: Vec<u32> = unpack_array(&mut unpacker, &rules, mode).unwrap();
        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn lexical_array_without_ordering_flag_still_rejects_duplicates() {
        let rules = ArrayRules::new(0, 16, ArrayUniqueness::Lexical);
        let mut packer = Packer::new();
        assert!(matches!(
            pack_array::<u32>(&mut packer, &[3, 3], &rules, CodecMode::PERFORM_VALIDATION),
            Err(Error::Codec(CodecError::DuplicateElement { index: 1 }))
        ));
    }
}

// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Random fixture constructors, used by the test suites.

use rand::Rng;

/// Generates a fixed-size array of random bytes.
pub fn rand_bytes_array<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill(&mut bytes[..]);
    bytes
}

/// Generates `len` random bytes.
pub fn rand_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill(&mut bytes[..]);
    bytes
}

/// Generates a random number within the given range.
pub fn rand_number_range(range: std::ops::Range<u64>) -> u64 {
    rand::thread_rng().gen_range(range)
}

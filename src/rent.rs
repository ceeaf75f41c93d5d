// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the storage rent parameters.

use crate::{
    codec::{CodecMode, Packable},
    error::Error,
    output::{Output, OutputId},
};

/// The cost parameters deciding the minimum deposit an output must carry to
/// pay for its storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RentStructure {
    /// The cost of one virtual byte.
    pub v_byte_cost: u32,
    /// The weight of the output's data bytes.
    pub v_byte_factor_data: u8,
    /// The weight of the key bytes the output is stored under.
    pub v_byte_factor_key: u8,
}

impl RentStructure {
    /// The minimum deposit the given output must carry.
    pub fn min_deposit(&self, output: &Output) -> Result<u64, Error> {
        let data_bytes = output.pack_to_vec(CodecMode::NO_VALIDATION)?.len() as u64;
        let key_bytes = OutputId::LENGTH as u64;
        // weighted virtual bytes; saturation is fine as a deposit can never
        // reach u64::MAX anyway
        let v_bytes = (self.v_byte_factor_data as u64)
            .saturating_mul(data_bytes)
            .saturating_add((self.v_byte_factor_key as u64).saturating_mul(key_bytes));
        Ok((self.v_byte_cost as u64).saturating_mul(v_bytes))
    }
}

impl Default for RentStructure {
    fn default() -> Self {
        Self {
            v_byte_cost: 1,
            v_byte_factor_data: 1,
            v_byte_factor_key: 1,
        }
    }
}

/// The parameters decode-time validation of a submitted transaction runs under.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DeserializationParameters {
    /// The minimum amount a dust deposit return may demand.
    pub min_dust_deposit: u64,
    /// The storage rent parameters.
    pub rent_structure: RentStructure,
}

#[cfg(all(test, feature = "rand"))]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn min_deposit_scales_with_packed_length() {
        let rent = RentStructure::default();
        let small = Output::rand_simple();
        let large = Output::rand_alias_genesis();
        let small_deposit = rent.min_deposit(&small).unwrap();
        let large_deposit = rent.min_deposit(&large).unwrap();
        assert!(small_deposit < large_deposit);
        assert_eq!(
            small_deposit,
            small.pack_to_vec(CodecMode::NO_VALIDATION).unwrap().len() as u64 + OutputId::LENGTH as u64
        );
    }
}

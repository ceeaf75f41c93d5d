// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the payload types.

pub mod indexation;
pub mod transaction;

pub use self::{
    indexation::IndexationPayload,
    transaction::{Transaction, TransactionEssence, TransactionId},
};

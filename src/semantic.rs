// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Semantic validation of a transaction against its consumed outputs.
//!
//! The pipeline resolves the unlocks of every input in ascending index order,
//! balances deposits and native tokens, checks timelocks and sender
//! attestations, and finally runs the state transition rules of every chain
//! touched by the transaction. The first failing step aborts the pipeline.

use std::collections::{BTreeMap, HashMap};

use primitive_types::U256;
use tracing::trace;

use crate::{
    address::Address,
    error::{Error, SemanticError},
    output::{
        native_token_sum, sender_block, validate_state_transition, AliasId, ChainId, FeatureBlock, NativeTokenSum,
        Output, OutputId, OutputSet, TokenId,
    },
    payload::transaction::Transaction,
    rent::RentStructure,
    signature::Signature,
    unlock::Unlock,
};

/// The confirmation context a transaction is validated under.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationContext {
    /// The index of the confirming milestone.
    pub milestone_index: u32,
    /// The unix timestamp of the confirming milestone, in seconds.
    pub milestone_timestamp: u64,
    /// The minimum amount a dust deposit return may demand.
    pub min_dust_deposit: u64,
    /// The storage rent parameters.
    pub rent_structure: RentStructure,
}

/// The identities unlocked on the input side of a transaction, keyed by their
/// canonical address bytes and carrying the input index that unlocked them.
pub type UnlockedIdentities = HashMap<Vec<u8>, u16>;

/// The read view the per-variant state transition rules run against.
pub struct StateTransitionContext<'a> {
    unlocked_idents: &'a UnlockedIdentities,
    in_native_tokens: &'a NativeTokenSum,
    out_native_tokens: &'a NativeTokenSum,
    out_chains: &'a BTreeMap<ChainId, &'a Output>,
}

impl StateTransitionContext<'_> {
    /// Whether the given identity was unlocked on the input side.
    pub(crate) fn is_unlocked(&self, address: &Address) -> bool {
        self.unlocked_idents.contains_key(&address.to_key())
    }

    /// Whether the given chain exists on the output side.
    pub(crate) fn is_output_chain(&self, chain_id: &ChainId) -> bool {
        self.out_chains.contains_key(chain_id)
    }

    /// The input-side sum of the given token.
    pub(crate) fn in_token_sum(&self, token_id: &TokenId) -> U256 {
        self.in_native_tokens.get(token_id).copied().unwrap_or_else(U256::zero)
    }

    /// The output-side sum of the given token.
    pub(crate) fn out_token_sum(&self, token_id: &TokenId) -> U256 {
        self.out_native_tokens.get(token_id).copied().unwrap_or_else(U256::zero)
    }
}

fn invalid_unlock(input_index: usize, reason: impl Into<String>) -> SemanticError {
    SemanticError::InvalidInputUnlock {
        input_index,
        reason: reason.into(),
    }
}

/// Runs the full semantic validation pipeline.
pub fn semantically_validate(
    transaction: &Transaction,
    input_set: &OutputSet,
    context: &ValidationContext,
) -> Result<(), Error> {
    let signing_message = transaction.essence.signing_message()?;
    let transaction_id = transaction.id()?;

    // resolve every input against the supplied set up front
    let mut resolved: Vec<(&OutputId, &Output)> = Vec::with_capacity(transaction.essence.inputs.len());
    for (input_index, input) in transaction.essence.inputs.iter().enumerate() {
        let output_id = input.output_id();
        let output = input_set
            .get(output_id)
            .ok_or(SemanticError::MissingUtxo { input_index })?;
        resolved.push((output_id, output));
    }

    // chains on both sides, implicit ids derived from the owning output id
    let in_chains: BTreeMap<ChainId, &Output> = input_set
        .iter()
        .filter_map(|(output_id, output)| output.chain_id(output_id).map(|chain_id| (chain_id, output)))
        .collect();
    let out_chains: BTreeMap<ChainId, &Output> = transaction
        .essence
        .outputs
        .iter()
        .enumerate()
        .filter_map(|(index, output)| {
            output
                .chain_id(&OutputId::new(transaction_id, index as u16))
                .map(|chain_id| (chain_id, output))
        })
        .collect();

    trace!(transaction = %transaction_id, inputs = resolved.len(), "resolving input unlocks");
    let mut unlocked_idents = UnlockedIdentities::new();
    for (input_index, (output_id, output)) in resolved.iter().enumerate() {
        unlock_output(
            transaction,
            context,
            output,
            output_id,
            input_index,
            &signing_message,
            &out_chains,
            &mut unlocked_idents,
        )?;
    }

    trace!("balancing deposits");
    deposit_balance(transaction, &resolved)?;

    trace!("balancing native tokens");
    let (in_native_tokens, out_native_tokens) = native_tokens(transaction, &resolved, &out_chains)?;

    trace!("checking timelocks");
    timelocks(context, &resolved)?;

    trace!("checking output-side sender attestations");
    outputs_sender(transaction, &unlocked_idents)?;

    trace!(chains_in = in_chains.len(), chains_out = out_chains.len(), "validating chain transitions");
    let stvf_context = StateTransitionContext {
        unlocked_idents: &unlocked_idents,
        in_native_tokens: &in_native_tokens,
        out_native_tokens: &out_native_tokens,
        out_chains: &out_chains,
    };
    for (chain_id, current) in &in_chains {
        validate_state_transition(*chain_id, Some(*current), out_chains.get(chain_id).copied(), &stvf_context)?;
    }
    for (chain_id, next) in &out_chains {
        if !in_chains.contains_key(chain_id) {
            validate_state_transition(*chain_id, None, Some(*next), &stvf_context)?;
        }
    }

    Ok(())
}

/// The identity an input requires to be unlocked, before any expiration
/// override. For alias outputs the identity depends on the transition: the
/// state controller by default, the governance controller when the chain is
/// destroyed or its state index stays.
fn ident_to_unlock(output: &Output, output_id: &OutputId, out_chains: &BTreeMap<ChainId, &Output>) -> Option<Address> {
    match output {
        Output::Alias(alias) => {
            let alias_id = if alias.alias_id.is_null() {
                AliasId::from_output_id(output_id)
            } else {
                alias.alias_id
            };
            match out_chains.get(&ChainId::Alias(alias_id)).and_then(|next| next.as_alias()) {
                Some(next) if next.state_index != alias.state_index => Some(alias.state_controller),
                _ => Some(alias.governance_controller),
            }
        }
        _ => output.single_ident(),
    }
}

/// The sender an expired output falls back to, if its expiration has passed
/// under the given context. Both expiration kinds must have passed when both
/// are present.
fn expired_sender_ident(output: &Output, context: &ValidationContext) -> Option<Address> {
    let feature_blocks = output.feature_blocks();
    let mut expiration_index = None;
    let mut expiration_unix = None;
    for block in feature_blocks {
        match block {
            FeatureBlock::ExpirationMilestoneIndex(index) => expiration_index = Some(*index),
            FeatureBlock::ExpirationUnix(timestamp) => expiration_unix = Some(*timestamp),
            _ => {}
        }
    }
    let expired = match (expiration_index, expiration_unix) {
        (None, None) => return None,
        (Some(index), Some(timestamp)) => index <= context.milestone_index && timestamp <= context.milestone_timestamp,
        (Some(index), None) => index <= context.milestone_index,
        (None, Some(timestamp)) => timestamp <= context.milestone_timestamp,
    };
    if expired {
        // a sender feature block is guaranteed by syntactic validation
        sender_block(feature_blocks).copied()
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn unlock_output(
    transaction: &Transaction,
    context: &ValidationContext,
    output: &Output,
    output_id: &OutputId,
    input_index: usize,
    signing_message: &[u8; 32],
    out_chains: &BTreeMap<ChainId, &Output>,
    unlocked_idents: &mut UnlockedIdentities,
) -> Result<(), SemanticError> {
    let mut target = ident_to_unlock(output, output_id, out_chains)
        .ok_or_else(|| invalid_unlock(input_index, "has no unlockable identity"))?;
    if let Some(sender) = expired_sender_ident(output, context) {
        target = sender;
    }
    let unlock = transaction
        .unlocks
        .get(input_index)
        .ok_or_else(|| invalid_unlock(input_index, "is missing its unlock"))?;
    let key = target.to_key();

    if target.is_chain_constrained() {
        let referenced = unlock
            .reference_index()
            .filter(|_| unlock.chainable() && unlock.source_allowed(&target))
            .ok_or_else(|| {
                invalid_unlock(
                    input_index,
                    format!(
                        "has a chain constrained address of kind {} but an unlock of kind {}",
                        target.kind(),
                        unlock.kind()
                    ),
                )
            })?;
        if unlocked_idents.get(&key) != Some(&referenced) {
            return Err(invalid_unlock(
                input_index,
                format!("is not unlocked through unlock {referenced}"),
            ));
        }
        // the consumed output's own chain, if addressable, unlocks alongside
        if let Some(address) = output.chain_id(output_id).and_then(ChainId::to_address) {
            unlocked_idents.insert(address.to_key(), input_index as u16);
        }
    } else {
        match unlock {
            Unlock::Signature(signature_unlock) => {
                if let Some(at) = unlocked_idents.get(&key) {
                    return Err(invalid_unlock(
                        input_index,
                        format!("is already unlocked through input {at} but uses a non referential unlock"),
                    ));
                }
                let Address::Ed25519(address) = target else {
                    return Err(invalid_unlock(input_index, "is not directly unlockable"));
                };
                let Signature::Ed25519(signature) = signature_unlock.signature();
                address
                    .unlock(signing_message, signature)
                    .map_err(|err| invalid_unlock(input_index, format!("signature check failed: {err}")))?;
                unlocked_idents.insert(key, input_index as u16);
            }
            referential => {
                let referenced = referential
                    .reference_index()
                    .filter(|_| !referential.chainable() && referential.source_allowed(&target))
                    .ok_or_else(|| {
                        invalid_unlock(
                            input_index,
                            format!(
                                "has an address of kind {} but an unlock of kind {}",
                                target.kind(),
                                referential.kind()
                            ),
                        )
                    })?;
                if unlocked_idents.get(&key) != Some(&referenced) {
                    return Err(invalid_unlock(
                        input_index,
                        format!("is not unlocked through unlock {referenced}"),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Balances the base token deposits of both sides and checks that dust
/// deposit returns are fulfilled per identity.
fn deposit_balance(transaction: &Transaction, resolved: &[(&OutputId, &Output)]) -> Result<(), SemanticError> {
    let mut input_sum: u64 = 0;
    let mut returns_per_ident: HashMap<Vec<u8>, (Address, u64)> = HashMap::new();
    for (_, output) in resolved {
        input_sum = input_sum
            .checked_add(output.amount())
            .ok_or(SemanticError::DepositSumOverflow)?;
        let feature_blocks = output.feature_blocks();
        if let Some(amount) = feature_blocks.iter().find_map(FeatureBlock::as_dust_deposit_return) {
            // a sender feature block is guaranteed by syntactic validation
            if let Some(sender) = sender_block(feature_blocks) {
                let entry = returns_per_ident.entry(sender.to_key()).or_insert((*sender, 0));
                entry.1 = entry.1.checked_add(amount).ok_or(SemanticError::DepositSumOverflow)?;
            }
        }
    }

    let mut output_sum: u64 = 0;
    let mut transfers_per_ident: HashMap<Vec<u8>, u64> = HashMap::new();
    for output in &transaction.essence.outputs {
        output_sum = output_sum
            .checked_add(output.amount())
            .ok_or(SemanticError::DepositSumOverflow)?;
        if output.is_simple_transfer() {
            if let Some(address) = output.single_ident() {
                let entry = transfers_per_ident.entry(address.to_key()).or_default();
                *entry = entry.checked_add(output.amount()).ok_or(SemanticError::DepositSumOverflow)?;
            }
        }
    }

    if input_sum != output_sum {
        return Err(SemanticError::InputOutputSumMismatch {
            input_sum,
            output_sum,
        });
    }

    for (key, (address, return_amount)) in returns_per_ident {
        let fulfilled = transfers_per_ident.get(&key).copied().unwrap_or(0);
        if fulfilled < return_amount {
            return Err(SemanticError::ReturnAmountNotFulfilled {
                address,
                return_amount,
                output_sum: fulfilled,
            });
        }
    }
    Ok(())
}

/// Balances the native tokens of both sides; imbalances are only permitted
/// for tokens whose foundry transitions on the output side.
fn native_tokens<'a>(
    transaction: &Transaction,
    resolved: &[(&OutputId, &'a Output)],
    out_chains: &BTreeMap<ChainId, &Output>,
) -> Result<(NativeTokenSum, NativeTokenSum), SemanticError> {
    let in_sums = native_token_sum(resolved.iter().flat_map(|(_, output)| output.native_tokens().iter()))?;
    let out_sums = native_token_sum(
        transaction
            .essence
            .outputs
            .iter()
            .flat_map(|output| output.native_tokens().iter()),
    )?;

    let any_foundry = resolved.iter().any(|(_, output)| output.as_foundry().is_some())
        || transaction.essence.outputs.iter().any(|output| output.as_foundry().is_some());

    for token_id in in_sums.keys().chain(out_sums.keys()) {
        let in_sum = in_sums.get(token_id).copied().unwrap_or_else(U256::zero);
        let out_sum = out_sums.get(token_id).copied().unwrap_or_else(U256::zero);
        if in_sum == out_sum {
            continue;
        }
        if !any_foundry || !out_chains.contains_key(&ChainId::Foundry(token_id.foundry_id())) {
            return Err(SemanticError::NativeTokenSumUnbalanced { token_id: *token_id });
        }
        // the exact delta is governed by the foundry's state transition rules
    }

    Ok((in_sums, out_sums))
}

/// Checks that every timelocked input is past its lock under the context.
fn timelocks(context: &ValidationContext, resolved: &[(&OutputId, &Output)]) -> Result<(), SemanticError> {
    for (input_index, (_, output)) in resolved.iter().enumerate() {
        for block in output.feature_blocks() {
            match block {
                FeatureBlock::TimelockMilestoneIndex(index) if context.milestone_index < *index => {
                    return Err(invalid_unlock(
                        input_index,
                        format!(
                            "milestone index timelock is not expired, at {index}, current {}",
                            context.milestone_index
                        ),
                    ));
                }
                FeatureBlock::TimelockUnix(timestamp) if context.milestone_timestamp < *timestamp => {
                    return Err(invalid_unlock(
                        input_index,
                        format!(
                            "unix timelock is not expired, at {timestamp}, current {}",
                            context.milestone_timestamp
                        ),
                    ));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Checks that every output-side sender attestation is backed by an unlocked
/// identity.
fn outputs_sender(transaction: &Transaction, unlocked_idents: &UnlockedIdentities) -> Result<(), SemanticError> {
    for (output_index, output) in transaction.essence.outputs.iter().enumerate() {
        if let Some(sender) = sender_block(output.feature_blocks()) {
            if !unlocked_idents.contains_key(&sender.to_key()) {
                return Err(SemanticError::SenderFeatureBlockNotUnlocked { output_index });
            }
        }
    }
    Ok(())
}

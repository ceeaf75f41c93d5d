// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Scenario tests driving the full validation pipeline.

use crypto::signatures::ed25519::SecretKey;
use pretty_assertions::assert_eq;
use primitive_types::U256;
use stardust_ledger::{
    address::{AliasAddress, Ed25519Address},
    codec::{CodecError, CodecMode},
    error::{Error, SemanticError},
    input::UtxoInput,
    output::{
        AliasId, AliasOutput, ExtendedOutput, FeatureBlock, FoundryOutput, NativeToken, SimpleOutput, TokenScheme,
    },
    payload::transaction::TransactionId,
    signature::{Ed25519Signature, Signature},
    Address, DeserializationParameters, Output, OutputId, OutputSet, Transaction, TransactionEssence, Unlock,
    ValidationContext,
};

struct Signer {
    secret: SecretKey,
    address: Address,
}

impl Signer {
    fn new() -> Self {
        let secret = SecretKey::generate().unwrap();
        let address = Address::Ed25519(Ed25519Address::from_public_key_bytes(&secret.public_key().to_bytes()));
        Self { secret, address }
    }

    fn unlock(&self, essence: &TransactionEssence) -> Unlock {
        let message = essence.signing_message().unwrap();
        Unlock::signature(Signature::Ed25519(Ed25519Signature::new(
            self.secret.public_key().to_bytes(),
            self.secret.sign(&message).to_bytes(),
        )))
    }
}

fn context() -> ValidationContext {
    ValidationContext {
        milestone_index: 10_000,
        milestone_timestamp: 1_700_000_000,
        ..Default::default()
    }
}

fn input_set(entries: Vec<(UtxoInput, Output)>) -> OutputSet {
    entries
        .into_iter()
        .map(|(input, output)| (*input.output_id(), output))
        .collect()
}

#[test]
fn minimal_valid_transfer() {
    let signer = Signer::new();
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let consumed = Output::Simple(SimpleOutput::new(signer.address, 1_000_000));
    let essence = TransactionEssence::new(
        vec![utxo.into()],
        vec![Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 1_000_000))],
        None,
    );
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);
    let inputs = input_set(vec![(utxo, consumed)]);

    transaction.semantically_validate(&inputs, &context()).unwrap();
    assert_eq!(transaction.id().unwrap(), transaction.id().unwrap());
}

#[test]
fn value_mismatch() {
    let signer = Signer::new();
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let consumed = Output::Simple(SimpleOutput::new(signer.address, 1_000_000));
    let essence = TransactionEssence::new(
        vec![utxo.into()],
        vec![Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 999_999))],
        None,
    );
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);
    let inputs = input_set(vec![(utxo, consumed)]);

    assert!(matches!(
        transaction.semantically_validate(&inputs, &context()),
        Err(Error::Semantic(SemanticError::InputOutputSumMismatch {
            input_sum: 1_000_000,
            output_sum: 999_999,
        }))
    ));
}

#[test]
fn duplicate_utxo_references_fail_decoding() {
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let essence = TransactionEssence::new(
        vec![utxo.into(), utxo.into()],
        vec![Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 1_000_000))],
        None,
    );
    let transaction = Transaction::new(essence, vec![Unlock::rand_signature(), Unlock::reference(0)]);
    let params = DeserializationParameters::default();
    let bytes = transaction.to_bytes(CodecMode::NO_VALIDATION, &params).unwrap();

    assert!(matches!(
        Transaction::from_bytes(&bytes, CodecMode::PERFORM_VALIDATION, &params),
        Err(Error::Codec(CodecError::DuplicateElement { index: 1 }))
    ));
}

#[test]
fn out_of_order_reference_unlock() {
    let signer = Signer::new();
    let first = UtxoInput::new(TransactionId::rand(), 0);
    let second = UtxoInput::new(TransactionId::rand(), 1);
    let essence = TransactionEssence::new(
        vec![first.into(), second.into()],
        vec![Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 2_000_000))],
        None,
    );
    let unlock = signer.unlock(&essence);
    // input 0 references forward at input 1
    let transaction = Transaction::new(essence, vec![Unlock::reference(1), unlock]);
    let inputs = input_set(vec![
        (first, Output::Simple(SimpleOutput::new(signer.address, 1_000_000))),
        (second, Output::Simple(SimpleOutput::new(signer.address, 1_000_000))),
    ]);

    assert!(matches!(
        transaction.semantically_validate(&inputs, &context()),
        Err(Error::Semantic(SemanticError::InvalidInputUnlock { input_index: 0, .. }))
    ));
}

#[test]
fn reference_unlock_reuses_signature() {
    let signer = Signer::new();
    let first = UtxoInput::new(TransactionId::rand(), 0);
    let second = UtxoInput::new(TransactionId::rand(), 1);
    let essence = TransactionEssence::new(
        vec![first.into(), second.into()],
        vec![Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 2_000_000))],
        None,
    );
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock, Unlock::reference(0)]);
    let inputs = input_set(vec![
        (first, Output::Simple(SimpleOutput::new(signer.address, 1_000_000))),
        (second, Output::Simple(SimpleOutput::new(signer.address, 1_000_000))),
    ]);

    transaction.semantically_validate(&inputs, &context()).unwrap();
}

#[test]
fn double_signature_for_same_identity_is_rejected() {
    let signer = Signer::new();
    let first = UtxoInput::new(TransactionId::rand(), 0);
    let second = UtxoInput::new(TransactionId::rand(), 1);
    let essence = TransactionEssence::new(
        vec![first.into(), second.into()],
        vec![Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 2_000_000))],
        None,
    );
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock, unlock]);
    let inputs = input_set(vec![
        (first, Output::Simple(SimpleOutput::new(signer.address, 1_000_000))),
        (second, Output::Simple(SimpleOutput::new(signer.address, 1_000_000))),
    ]);

    assert!(matches!(
        transaction.semantically_validate(&inputs, &context()),
        Err(Error::Semantic(SemanticError::InvalidInputUnlock { input_index: 1, .. }))
    ));
}

#[test]
fn alias_genesis_derives_id_from_output_id() {
    let signer = Signer::new();
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let consumed = Output::Simple(SimpleOutput::new(signer.address, 1_000_000));
    let alias = AliasOutput {
        amount: 1_000_000,
        ..AliasOutput::rand_genesis()
    };
    let essence = TransactionEssence::new(vec![utxo.into()], vec![Output::Alias(alias)], None);
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);
    let inputs = input_set(vec![(utxo, consumed)]);

    transaction.semantically_validate(&inputs, &context()).unwrap();

    // the chain id equals the left-truncated Blake2b-256 of (tx id ‖ index 0)
    use crypto::hashes::{blake2b::Blake2b256, Digest};
    let output_id = OutputId::new(transaction.id().unwrap(), 0);
    let derived = AliasId::from_output_id(&output_id);
    let hash = Blake2b256::digest(output_id.to_bytes());
    assert_eq!(derived.as_bytes()[..], hash[..20]);
}

#[test]
fn timelocked_input() {
    let signer = Signer::new();
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let mut consumed = ExtendedOutput::new(signer.address, 1_000_000);
    consumed.feature_blocks = vec![FeatureBlock::TimelockUnix(1_700_000_000)];
    let essence = TransactionEssence::new(
        vec![utxo.into()],
        vec![Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 1_000_000))],
        None,
    );
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);
    let inputs = input_set(vec![(utxo, Output::Extended(consumed))]);

    let locked = ValidationContext {
        milestone_timestamp: 1_699_999_999,
        ..context()
    };
    assert!(matches!(
        transaction.semantically_validate(&inputs, &locked),
        Err(Error::Semantic(SemanticError::InvalidInputUnlock { input_index: 0, .. }))
    ));

    let expired = ValidationContext {
        milestone_timestamp: 1_700_000_000,
        ..context()
    };
    transaction.semantically_validate(&inputs, &expired).unwrap();
}

#[test]
fn alias_governance_transition_unlocks_governor() {
    let state = Signer::new();
    let governor = Signer::new();
    let alias_id = AliasId::rand();
    let consumed = AliasOutput {
        amount: 1_000_000,
        native_tokens: Vec::new(),
        alias_id,
        state_controller: state.address,
        governance_controller: governor.address,
        state_index: 3,
        state_metadata: Box::default(),
        foundry_counter: 0,
        feature_blocks: Vec::new(),
    };
    // the governance transition rotates the state controller only
    let mut next = consumed.clone();
    next.state_controller = Address::rand_ed25519();

    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let essence = TransactionEssence::new(vec![utxo.into()], vec![Output::Alias(next)], None);
    let inputs = input_set(vec![(utxo, Output::Alias(consumed))]);

    // the state controller must not pass
    let transaction = Transaction::new(essence.clone(), vec![state.unlock(&essence)]);
    assert!(matches!(
        transaction.semantically_validate(&inputs, &context()),
        Err(Error::Semantic(SemanticError::InvalidInputUnlock { input_index: 0, .. }))
    ));

    // the governance controller does
    let transaction = Transaction::new(essence.clone(), vec![governor.unlock(&essence)]);
    transaction.semantically_validate(&inputs, &context()).unwrap();
}

#[test]
fn alias_state_transition_unlocks_state_controller() {
    let state = Signer::new();
    let governor = Signer::new();
    let alias_id = AliasId::rand();
    let consumed = AliasOutput {
        amount: 1_000_000,
        native_tokens: Vec::new(),
        alias_id,
        state_controller: state.address,
        governance_controller: governor.address,
        state_index: 3,
        state_metadata: Box::default(),
        foundry_counter: 0,
        feature_blocks: Vec::new(),
    };
    let mut next = consumed.clone();
    next.state_index = 4;
    next.state_metadata = vec![0xaa].into();

    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let essence = TransactionEssence::new(vec![utxo.into()], vec![Output::Alias(next)], None);
    let inputs = input_set(vec![(utxo, Output::Alias(consumed))]);

    let transaction = Transaction::new(essence.clone(), vec![state.unlock(&essence)]);
    transaction.semantically_validate(&inputs, &context()).unwrap();
}

#[test]
fn alias_unlock_requires_referentially_unlocked_alias() {
    let governor = Signer::new();
    let alias_id = AliasId::rand();
    let alias = AliasOutput {
        amount: 1_000_000,
        native_tokens: Vec::new(),
        alias_id,
        state_controller: Address::rand_ed25519(),
        governance_controller: governor.address,
        state_index: 0,
        state_metadata: Box::default(),
        foundry_counter: 0,
        feature_blocks: Vec::new(),
    };
    let held = ExtendedOutput {
        address: Address::Alias(AliasAddress::new(alias_id)),
        amount: 500_000,
        native_tokens: Vec::new(),
        feature_blocks: Vec::new(),
    };

    let alias_utxo = UtxoInput::new(TransactionId::rand(), 0);
    let held_utxo = UtxoInput::new(TransactionId::rand(), 1);
    let essence = TransactionEssence::new(
        vec![alias_utxo.into(), held_utxo.into()],
        vec![
            Output::Alias(alias.clone()),
            Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 500_000)),
        ],
        None,
    );
    let inputs = input_set(vec![
        (alias_utxo, Output::Alias(alias)),
        (held_utxo, Output::Extended(held)),
    ]);

    // unlocking the alias through its governor's signature registers the
    // governor only; the alias address itself enters the unlocked set solely
    // through the chain-constrained referential path, so the alias unlock at
    // input 1 finds nothing to reference
    let transaction = Transaction::new(essence.clone(), vec![governor.unlock(&essence), Unlock::alias(0)]);
    assert!(matches!(
        transaction.semantically_validate(&inputs, &context()),
        Err(Error::Semantic(SemanticError::InvalidInputUnlock { input_index: 1, .. }))
    ));

    // a plain reference unlock must not stand in for an alias unlock either
    let transaction = Transaction::new(essence.clone(), vec![governor.unlock(&essence), Unlock::reference(0)]);
    assert!(matches!(
        transaction.semantically_validate(&inputs, &context()),
        Err(Error::Semantic(SemanticError::InvalidInputUnlock { input_index: 1, .. }))
    ));
}

#[test]
fn foundry_genesis_mints_tokens() {
    let state = Signer::new();
    let alias_id = AliasId::rand();
    let consumed_alias = AliasOutput {
        amount: 3_000_000,
        native_tokens: Vec::new(),
        alias_id,
        state_controller: state.address,
        governance_controller: Address::rand_ed25519(),
        state_index: 0,
        state_metadata: Box::default(),
        foundry_counter: 0,
        feature_blocks: Vec::new(),
    };
    let mut next_alias = consumed_alias.clone();
    next_alias.amount = 1_000_000;
    next_alias.state_index = 1;
    next_alias.foundry_counter = 1;

    let foundry = FoundryOutput {
        address: AliasAddress::new(alias_id),
        amount: 1_000_000,
        native_tokens: Vec::new(),
        serial_number: 1,
        token_tag: [7; 12],
        circulating_supply: U256::from(100),
        maximum_supply: U256::from(10_000),
        token_scheme: TokenScheme::Simple,
        feature_blocks: Vec::new(),
    };
    let minted = NativeToken::new(foundry.token_id(), U256::from(100));
    let holder = ExtendedOutput {
        address: Address::rand_ed25519(),
        amount: 1_000_000,
        native_tokens: vec![minted],
        feature_blocks: Vec::new(),
    };

    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let essence = TransactionEssence::new(
        vec![utxo.into()],
        vec![Output::Alias(next_alias), Output::Foundry(foundry), Output::Extended(holder)],
        None,
    );
    let inputs = input_set(vec![(utxo, Output::Alias(consumed_alias))]);

    let transaction = Transaction::new(essence.clone(), vec![state.unlock(&essence)]);
    transaction.semantically_validate(&inputs, &context()).unwrap();
}

#[test]
fn minted_tokens_without_foundry_are_unbalanced() {
    let signer = Signer::new();
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let consumed = Output::Simple(SimpleOutput::new(signer.address, 1_000_000));
    let token = NativeToken::rand();
    let holder = ExtendedOutput {
        address: Address::rand_ed25519(),
        amount: 1_000_000,
        native_tokens: vec![token],
        feature_blocks: Vec::new(),
    };
    let essence = TransactionEssence::new(vec![utxo.into()], vec![Output::Extended(holder)], None);
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);
    let inputs = input_set(vec![(utxo, consumed)]);

    assert!(matches!(
        transaction.semantically_validate(&inputs, &context()),
        Err(Error::Semantic(SemanticError::NativeTokenSumUnbalanced { token_id })) if token_id == token.token_id
    ));
}

#[test]
fn dust_deposit_return_must_be_fulfilled() {
    let signer = Signer::new();
    let depositor = Address::rand_ed25519();
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let mut consumed = ExtendedOutput::new(signer.address, 2_000_000);
    consumed.feature_blocks = vec![
        FeatureBlock::Sender(depositor),
        FeatureBlock::DustDepositReturn(1_000_000),
    ];

    // the return goes back to the depositor as a plain transfer
    let essence = TransactionEssence::new(
        vec![utxo.into()],
        vec![
            Output::Simple(SimpleOutput::new(depositor, 1_000_000)),
            Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 1_000_000)),
        ],
        None,
    );
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);
    let inputs = input_set(vec![(utxo, Output::Extended(consumed.clone()))]);
    transaction.semantically_validate(&inputs, &context()).unwrap();

    // shortchanging the depositor fails
    let essence = TransactionEssence::new(
        vec![utxo.into()],
        vec![
            Output::Simple(SimpleOutput::new(depositor, 999_999)),
            Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 1_000_001)),
        ],
        None,
    );
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);
    let inputs = input_set(vec![(utxo, Output::Extended(consumed))]);
    assert!(matches!(
        transaction.semantically_validate(&inputs, &context()),
        Err(Error::Semantic(SemanticError::ReturnAmountNotFulfilled {
            return_amount: 1_000_000,
            output_sum: 999_999,
            ..
        }))
    ));
}

#[test]
fn expired_output_unlocks_through_sender() {
    let owner = Signer::new();
    let sender = Signer::new();
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let mut consumed = ExtendedOutput::new(owner.address, 1_000_000);
    consumed.feature_blocks = vec![
        FeatureBlock::Sender(sender.address),
        FeatureBlock::ExpirationUnix(1_650_000_000),
    ];
    let essence = TransactionEssence::new(
        vec![utxo.into()],
        vec![Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 1_000_000))],
        None,
    );
    let inputs = input_set(vec![(utxo, Output::Extended(consumed))]);

    // past the expiration the owner's signature no longer verifies
    let transaction = Transaction::new(essence.clone(), vec![owner.unlock(&essence)]);
    assert!(matches!(
        transaction.semantically_validate(&inputs, &context()),
        Err(Error::Semantic(SemanticError::InvalidInputUnlock { input_index: 0, .. }))
    ));

    let transaction = Transaction::new(essence.clone(), vec![sender.unlock(&essence)]);
    transaction.semantically_validate(&inputs, &context()).unwrap();

    // before the expiration the owner stays in control
    let before = ValidationContext {
        milestone_timestamp: 1_600_000_000,
        ..context()
    };
    let transaction = Transaction::new(essence.clone(), vec![owner.unlock(&essence)]);
    transaction.semantically_validate(&inputs, &before).unwrap();
}

#[test]
fn output_sender_attestation_requires_unlocked_identity() {
    let signer = Signer::new();
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let consumed = Output::Simple(SimpleOutput::new(signer.address, 1_000_000));

    // attesting the unlocked identity passes
    let mut attested = ExtendedOutput::new(Address::rand_ed25519(), 1_000_000);
    attested.feature_blocks = vec![FeatureBlock::Sender(signer.address)];
    let essence = TransactionEssence::new(vec![utxo.into()], vec![Output::Extended(attested)], None);
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);
    let inputs = input_set(vec![(utxo, consumed.clone())]);
    transaction.semantically_validate(&inputs, &context()).unwrap();

    // attesting a foreign identity fails
    let mut attested = ExtendedOutput::new(Address::rand_ed25519(), 1_000_000);
    attested.feature_blocks = vec![FeatureBlock::Sender(Address::rand_ed25519())];
    let essence = TransactionEssence::new(vec![utxo.into()], vec![Output::Extended(attested)], None);
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);
    let inputs = input_set(vec![(utxo, consumed)]);
    assert!(matches!(
        transaction.semantically_validate(&inputs, &context()),
        Err(Error::Semantic(SemanticError::SenderFeatureBlockNotUnlocked { output_index: 0 }))
    ));
}

#[test]
fn missing_utxo_is_reported() {
    let signer = Signer::new();
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let essence = TransactionEssence::new(
        vec![utxo.into()],
        vec![Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 1_000_000))],
        None,
    );
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);

    assert!(matches!(
        transaction.semantically_validate(&OutputSet::new(), &context()),
        Err(Error::Semantic(SemanticError::MissingUtxo { input_index: 0 }))
    ));
}

#[test]
fn binary_round_trip_is_byte_exact() {
    let signer = Signer::new();
    let utxo = UtxoInput::new(TransactionId::rand(), 0);
    let essence = TransactionEssence::new(
        vec![utxo.into()],
        vec![
            Output::Simple(SimpleOutput::new(Address::rand_ed25519(), 500_000)),
            Output::rand_alias_genesis(),
            Output::rand_nft_genesis(),
        ],
        None,
    );
    let unlock = signer.unlock(&essence);
    let transaction = Transaction::new(essence, vec![unlock]);
    let params = DeserializationParameters::default();

    let bytes = transaction.to_bytes(CodecMode::PERFORM_VALIDATION, &params).unwrap();
    let decoded = Transaction::from_bytes(&bytes, CodecMode::PERFORM_VALIDATION, &params).unwrap();
    assert_eq!(decoded, transaction);
    assert_eq!(decoded.to_bytes(CodecMode::PERFORM_VALIDATION, &params).unwrap(), bytes);
}

// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The JSON mirror of the binary model.
//!
//! Every variant carries an explicit integer `type` discriminator, arrays are
//! preserved in declaration order and byte strings are `0x`-prefixed hex.
//! Decoding a DTO produces the same internal model as the binary decoder;
//! the object can then be re-encoded to canonical binary.

use primitive_types::U256;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    address::{Address, AliasAddress, Ed25519Address, NftAddress},
    input::{Input, UtxoInput},
    output::{
        AliasId, AliasOutput, ExtendedOutput, FeatureBlock, FoundryOutput, NativeToken, NftId, NftOutput, Output,
        SimpleOutput, TokenId, TokenScheme,
    },
    payload::{indexation::IndexationPayload, transaction::TransactionId},
    signature::{Ed25519Signature, Signature},
    unlock::Unlock,
    Transaction, TransactionEssence,
};

/// An error produced while converting a DTO into the internal model.
#[derive(Debug, Error)]
pub enum DtoError {
    /// A field does not satisfy the model's invariants.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),
    /// A hex string does not decode.
    #[error(transparent)]
    Hex(#[from] prefix_hex::Error),
}

fn u256_to_hex(value: &U256) -> String {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    prefix_hex::encode(bytes.as_slice())
}

fn u256_from_hex(s: &str) -> Result<U256, DtoError> {
    let bytes: Vec<u8> = prefix_hex::decode(s)?;
    if bytes.len() > 32 {
        return Err(DtoError::InvalidField("u256"));
    }
    Ok(U256::from_big_endian(&bytes))
}

fn expect_kind(actual: u8, expected: u8) -> Result<(), DtoError> {
    if actual != expected {
        return Err(DtoError::InvalidField("type"));
    }
    Ok(())
}

fn dispatch_kind<E: de::Error>(value: &Value, what: &'static str) -> Result<u8, E> {
    value
        .get("type")
        .and_then(Value::as_u64)
        .and_then(|kind| u8::try_from(kind).ok())
        .ok_or_else(|| E::custom(format!("invalid {what} type")))
}

fn from_value<T: de::DeserializeOwned, E: de::Error>(value: Value) -> Result<T, E> {
    serde_json::from_value(value).map_err(E::custom)
}

/// The JSON representation of an [`Ed25519Address`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519AddressDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The hex encoded address hash.
    pub address: String,
}

/// The JSON representation of an [`AliasAddress`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasAddressDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The hex encoded alias id.
    pub alias_id: String,
}

/// The JSON representation of an [`NftAddress`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftAddressDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The hex encoded NFT id.
    pub nft_id: String,
}

/// The JSON representation of an [`Address`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AddressDto {
    /// An Ed25519 address.
    Ed25519(Ed25519AddressDto),
    /// An alias address.
    Alias(AliasAddressDto),
    /// An NFT address.
    Nft(NftAddressDto),
}

impl<'de> Deserialize<'de> for AddressDto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match dispatch_kind::<D::Error>(&value, "address")? {
            Ed25519Address::KIND => Self::Ed25519(from_value(value)?),
            AliasAddress::KIND => Self::Alias(from_value(value)?),
            NftAddress::KIND => Self::Nft(from_value(value)?),
            _ => return Err(de::Error::custom("invalid address type")),
        })
    }
}

impl From<&Address> for AddressDto {
    fn from(value: &Address) -> Self {
        match value {
            Address::Ed25519(address) => Self::Ed25519(Ed25519AddressDto {
                kind: Ed25519Address::KIND,
                address: prefix_hex::encode(address.as_bytes().as_slice()),
            }),
            Address::Alias(address) => Self::Alias(AliasAddressDto {
                kind: AliasAddress::KIND,
                alias_id: prefix_hex::encode(address.alias_id().as_bytes().as_slice()),
            }),
            Address::Nft(address) => Self::Nft(NftAddressDto {
                kind: NftAddress::KIND,
                nft_id: prefix_hex::encode(address.nft_id().as_bytes().as_slice()),
            }),
        }
    }
}

impl TryFrom<&AddressDto> for Address {
    type Error = DtoError;

    fn try_from(value: &AddressDto) -> Result<Self, Self::Error> {
        Ok(match value {
            AddressDto::Ed25519(dto) => {
                expect_kind(dto.kind, Ed25519Address::KIND)?;
                Self::Ed25519(Ed25519Address::new(prefix_hex::decode(&dto.address)?))
            }
            AddressDto::Alias(dto) => {
                expect_kind(dto.kind, AliasAddress::KIND)?;
                Self::Alias(AliasAddress::new(AliasId::new(prefix_hex::decode(&dto.alias_id)?)))
            }
            AddressDto::Nft(dto) => {
                expect_kind(dto.kind, NftAddress::KIND)?;
                Self::Nft(NftAddress::new(NftId::new(prefix_hex::decode(&dto.nft_id)?)))
            }
        })
    }
}

/// The JSON representation of an [`Ed25519Signature`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ed25519SignatureDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The hex encoded public key.
    pub public_key: String,
    /// The hex encoded signature.
    pub signature: String,
}

/// The JSON representation of a [`Signature`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SignatureDto {
    /// An Ed25519 signature.
    Ed25519(Ed25519SignatureDto),
}

impl<'de> Deserialize<'de> for SignatureDto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match dispatch_kind::<D::Error>(&value, "signature")? {
            Ed25519Signature::KIND => Self::Ed25519(from_value(value)?),
            _ => return Err(de::Error::custom("invalid signature type")),
        })
    }
}

impl From<&Signature> for SignatureDto {
    fn from(value: &Signature) -> Self {
        match value {
            Signature::Ed25519(signature) => Self::Ed25519(Ed25519SignatureDto {
                kind: Ed25519Signature::KIND,
                public_key: prefix_hex::encode(signature.public_key().as_slice()),
                signature: prefix_hex::encode(signature.signature().as_slice()),
            }),
        }
    }
}

impl TryFrom<&SignatureDto> for Signature {
    type Error = DtoError;

    fn try_from(value: &SignatureDto) -> Result<Self, Self::Error> {
        Ok(match value {
            SignatureDto::Ed25519(dto) => {
                expect_kind(dto.kind, Ed25519Signature::KIND)?;
                Self::Ed25519(Ed25519Signature::new(
                    prefix_hex::decode(&dto.public_key)?,
                    prefix_hex::decode(&dto.signature)?,
                ))
            }
        })
    }
}

/// The JSON representation of a [`UtxoInput`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoInputDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The hex encoded id of the consumed transaction.
    pub transaction_id: String,
    /// The consumed output slot.
    pub transaction_output_index: u16,
}

/// The JSON representation of an [`Input`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InputDto {
    /// A UTXO input.
    Utxo(UtxoInputDto),
}

impl<'de> Deserialize<'de> for InputDto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match dispatch_kind::<D::Error>(&value, "input")? {
            UtxoInput::KIND => Self::Utxo(from_value(value)?),
            _ => return Err(de::Error::custom("invalid input type")),
        })
    }
}

impl From<&Input> for InputDto {
    fn from(value: &Input) -> Self {
        match value {
            Input::Utxo(input) => Self::Utxo(UtxoInputDto {
                kind: UtxoInput::KIND,
                transaction_id: input.output_id().transaction_id().to_string(),
                transaction_output_index: input.output_id().index(),
            }),
        }
    }
}

impl TryFrom<&InputDto> for Input {
    type Error = DtoError;

    fn try_from(value: &InputDto) -> Result<Self, Self::Error> {
        Ok(match value {
            InputDto::Utxo(dto) => {
                expect_kind(dto.kind, UtxoInput::KIND)?;
                Self::Utxo(UtxoInput::new(
                    TransactionId::new(prefix_hex::decode(&dto.transaction_id)?),
                    dto.transaction_output_index,
                ))
            }
        })
    }
}

/// The JSON representation of a [`NativeToken`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTokenDto {
    /// The hex encoded token id.
    pub id: String,
    /// The hex encoded amount.
    pub amount: String,
}

impl From<&NativeToken> for NativeTokenDto {
    fn from(value: &NativeToken) -> Self {
        Self {
            id: value.token_id.to_string(),
            amount: u256_to_hex(&value.amount),
        }
    }
}

impl TryFrom<&NativeTokenDto> for NativeToken {
    type Error = DtoError;

    fn try_from(value: &NativeTokenDto) -> Result<Self, Self::Error> {
        Ok(Self::new(
            TokenId::new(prefix_hex::decode(&value.id)?),
            u256_from_hex(&value.amount)?,
        ))
    }
}

/// The JSON representation of a [`FeatureBlock`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FeatureBlockDto {
    /// A sender feature block.
    Sender(SenderFeatureBlockDto),
    /// An issuer feature block.
    Issuer(IssuerFeatureBlockDto),
    /// A dust deposit return feature block.
    DustDepositReturn(DustDepositReturnFeatureBlockDto),
    /// A milestone index timelock feature block.
    TimelockMilestoneIndex(MilestoneIndexFeatureBlockDto),
    /// A unix timelock feature block.
    TimelockUnix(UnixTimeFeatureBlockDto),
    /// A milestone index expiration feature block.
    ExpirationMilestoneIndex(MilestoneIndexFeatureBlockDto),
    /// A unix expiration feature block.
    ExpirationUnix(UnixTimeFeatureBlockDto),
    /// A metadata feature block.
    Metadata(MetadataFeatureBlockDto),
    /// An indexation feature block.
    Indexation(IndexationFeatureBlockDto),
}

/// The JSON representation of a sender feature block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderFeatureBlockDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The attested address.
    pub address: AddressDto,
}

/// The JSON representation of an issuer feature block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerFeatureBlockDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The attested address.
    pub address: AddressDto,
}

/// The JSON representation of a dust deposit return feature block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DustDepositReturnFeatureBlockDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The demanded return amount.
    pub amount: u64,
}

/// The JSON representation of a milestone-index based feature block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneIndexFeatureBlockDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The milestone index.
    pub milestone_index: u32,
}

/// The JSON representation of a unix-time based feature block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnixTimeFeatureBlockDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The unix timestamp, in seconds.
    pub unix_time: u64,
}

/// The JSON representation of a metadata feature block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFeatureBlockDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The hex encoded data.
    pub data: String,
}

/// The JSON representation of an indexation feature block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexationFeatureBlockDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The hex encoded tag.
    pub tag: String,
    /// The hex encoded data.
    pub data: String,
}

impl<'de> Deserialize<'de> for FeatureBlockDto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match dispatch_kind::<D::Error>(&value, "feature block")? {
            FeatureBlock::SENDER => Self::Sender(from_value(value)?),
            FeatureBlock::ISSUER => Self::Issuer(from_value(value)?),
            FeatureBlock::DUST_DEPOSIT_RETURN => Self::DustDepositReturn(from_value(value)?),
            FeatureBlock::TIMELOCK_MILESTONE_INDEX => Self::TimelockMilestoneIndex(from_value(value)?),
            FeatureBlock::TIMELOCK_UNIX => Self::TimelockUnix(from_value(value)?),
            FeatureBlock::EXPIRATION_MILESTONE_INDEX => Self::ExpirationMilestoneIndex(from_value(value)?),
            FeatureBlock::EXPIRATION_UNIX => Self::ExpirationUnix(from_value(value)?),
            FeatureBlock::METADATA => Self::Metadata(from_value(value)?),
            FeatureBlock::INDEXATION => Self::Indexation(from_value(value)?),
            _ => return Err(de::Error::custom("invalid feature block type")),
        })
    }
}

impl From<&FeatureBlock> for FeatureBlockDto {
    fn from(value: &FeatureBlock) -> Self {
        match value {
            FeatureBlock::Sender(address) => Self::Sender(SenderFeatureBlockDto {
                kind: FeatureBlock::SENDER,
                address: address.into(),
            }),
            FeatureBlock::Issuer(address) => Self::Issuer(IssuerFeatureBlockDto {
                kind: FeatureBlock::ISSUER,
                address: address.into(),
            }),
            FeatureBlock::DustDepositReturn(amount) => Self::DustDepositReturn(DustDepositReturnFeatureBlockDto {
                kind: FeatureBlock::DUST_DEPOSIT_RETURN,
                amount: *amount,
            }),
            FeatureBlock::TimelockMilestoneIndex(milestone_index) => {
                Self::TimelockMilestoneIndex(MilestoneIndexFeatureBlockDto {
                    kind: FeatureBlock::TIMELOCK_MILESTONE_INDEX,
                    milestone_index: *milestone_index,
                })
            }
            FeatureBlock::TimelockUnix(unix_time) => Self::TimelockUnix(UnixTimeFeatureBlockDto {
                kind: FeatureBlock::TIMELOCK_UNIX,
                unix_time: *unix_time,
            }),
            FeatureBlock::ExpirationMilestoneIndex(milestone_index) => {
                Self::ExpirationMilestoneIndex(MilestoneIndexFeatureBlockDto {
                    kind: FeatureBlock::EXPIRATION_MILESTONE_INDEX,
                    milestone_index: *milestone_index,
                })
            }
            FeatureBlock::ExpirationUnix(unix_time) => Self::ExpirationUnix(UnixTimeFeatureBlockDto {
                kind: FeatureBlock::EXPIRATION_UNIX,
                unix_time: *unix_time,
            }),
            FeatureBlock::Metadata(data) => Self::Metadata(MetadataFeatureBlockDto {
                kind: FeatureBlock::METADATA,
                data: prefix_hex::encode(data.as_ref()),
            }),
            FeatureBlock::Indexation { tag, data } => Self::Indexation(IndexationFeatureBlockDto {
                kind: FeatureBlock::INDEXATION,
                tag: prefix_hex::encode(tag.as_ref()),
                data: prefix_hex::encode(data.as_ref()),
            }),
        }
    }
}

impl TryFrom<&FeatureBlockDto> for FeatureBlock {
    type Error = DtoError;

    fn try_from(value: &FeatureBlockDto) -> Result<Self, Self::Error> {
        Ok(match value {
            FeatureBlockDto::Sender(dto) => {
                expect_kind(dto.kind, FeatureBlock::SENDER)?;
                Self::Sender((&dto.address).try_into()?)
            }
            FeatureBlockDto::Issuer(dto) => {
                expect_kind(dto.kind, FeatureBlock::ISSUER)?;
                Self::Issuer((&dto.address).try_into()?)
            }
            FeatureBlockDto::DustDepositReturn(dto) => {
                expect_kind(dto.kind, FeatureBlock::DUST_DEPOSIT_RETURN)?;
                Self::DustDepositReturn(dto.amount)
            }
            FeatureBlockDto::TimelockMilestoneIndex(dto) => {
                expect_kind(dto.kind, FeatureBlock::TIMELOCK_MILESTONE_INDEX)?;
                Self::TimelockMilestoneIndex(dto.milestone_index)
            }
            FeatureBlockDto::TimelockUnix(dto) => {
                expect_kind(dto.kind, FeatureBlock::TIMELOCK_UNIX)?;
                Self::TimelockUnix(dto.unix_time)
            }
            FeatureBlockDto::ExpirationMilestoneIndex(dto) => {
                expect_kind(dto.kind, FeatureBlock::EXPIRATION_MILESTONE_INDEX)?;
                Self::ExpirationMilestoneIndex(dto.milestone_index)
            }
            FeatureBlockDto::ExpirationUnix(dto) => {
                expect_kind(dto.kind, FeatureBlock::EXPIRATION_UNIX)?;
                Self::ExpirationUnix(dto.unix_time)
            }
            FeatureBlockDto::Metadata(dto) => {
                expect_kind(dto.kind, FeatureBlock::METADATA)?;
                Self::Metadata(prefix_hex::decode::<Vec<u8>>(&dto.data)?.into())
            }
            FeatureBlockDto::Indexation(dto) => {
                expect_kind(dto.kind, FeatureBlock::INDEXATION)?;
                Self::Indexation {
                    tag: prefix_hex::decode::<Vec<u8>>(&dto.tag)?.into(),
                    data: prefix_hex::decode::<Vec<u8>>(&dto.data)?.into(),
                }
            }
        })
    }
}

fn native_tokens_from_dto(dtos: &[NativeTokenDto]) -> Result<Vec<NativeToken>, DtoError> {
    dtos.iter().map(TryInto::try_into).collect()
}

fn feature_blocks_from_dto(dtos: &[FeatureBlockDto]) -> Result<Vec<FeatureBlock>, DtoError> {
    dtos.iter().map(TryInto::try_into).collect()
}

/// The JSON representation of a [`SimpleOutput`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleOutputDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The owning address.
    pub address: AddressDto,
    /// The deposited amount.
    pub amount: u64,
}

/// The JSON representation of an [`ExtendedOutput`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedOutputDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The owning address.
    pub address: AddressDto,
    /// The deposited amount.
    pub amount: u64,
    /// The native tokens held by the output.
    pub native_tokens: Vec<NativeTokenDto>,
    /// The feature blocks of the output.
    pub feature_blocks: Vec<FeatureBlockDto>,
}

/// The JSON representation of an [`AliasOutput`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasOutputDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The deposited amount.
    pub amount: u64,
    /// The native tokens held by the output.
    pub native_tokens: Vec<NativeTokenDto>,
    /// The hex encoded alias id.
    pub alias_id: String,
    /// The state controller.
    pub state_controller: AddressDto,
    /// The governance controller.
    pub governance_controller: AddressDto,
    /// The state index.
    pub state_index: u32,
    /// The hex encoded state metadata.
    pub state_metadata: String,
    /// The foundry counter.
    pub foundry_counter: u32,
    /// The feature blocks of the output.
    pub feature_blocks: Vec<FeatureBlockDto>,
}

/// The JSON representation of a [`FoundryOutput`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundryOutputDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The controlling alias address.
    pub address: AddressDto,
    /// The deposited amount.
    pub amount: u64,
    /// The native tokens held by the output.
    pub native_tokens: Vec<NativeTokenDto>,
    /// The serial number of the foundry.
    pub serial_number: u32,
    /// The hex encoded token tag.
    pub token_tag: String,
    /// The hex encoded circulating supply.
    pub circulating_supply: String,
    /// The hex encoded maximum supply.
    pub maximum_supply: String,
    /// The token scheme discriminator.
    pub token_scheme: u8,
    /// The feature blocks of the output.
    pub feature_blocks: Vec<FeatureBlockDto>,
}

/// The JSON representation of an [`NftOutput`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftOutputDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The owning address.
    pub address: AddressDto,
    /// The deposited amount.
    pub amount: u64,
    /// The native tokens held by the output.
    pub native_tokens: Vec<NativeTokenDto>,
    /// The hex encoded NFT id.
    pub nft_id: String,
    /// The hex encoded immutable metadata.
    pub immutable_metadata: String,
    /// The feature blocks of the output.
    pub feature_blocks: Vec<FeatureBlockDto>,
}

/// The JSON representation of an [`Output`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutputDto {
    /// A simple output.
    Simple(SimpleOutputDto),
    /// An extended output.
    Extended(ExtendedOutputDto),
    /// An alias output.
    Alias(AliasOutputDto),
    /// A foundry output.
    Foundry(FoundryOutputDto),
    /// An NFT output.
    Nft(NftOutputDto),
}

impl<'de> Deserialize<'de> for OutputDto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match dispatch_kind::<D::Error>(&value, "output")? {
            SimpleOutput::KIND => Self::Simple(from_value(value)?),
            ExtendedOutput::KIND => Self::Extended(from_value(value)?),
            AliasOutput::KIND => Self::Alias(from_value(value)?),
            FoundryOutput::KIND => Self::Foundry(from_value(value)?),
            NftOutput::KIND => Self::Nft(from_value(value)?),
            _ => return Err(de::Error::custom("invalid output type")),
        })
    }
}

impl From<&Output> for OutputDto {
    fn from(value: &Output) -> Self {
        match value {
            Output::Simple(output) => Self::Simple(SimpleOutputDto {
                kind: SimpleOutput::KIND,
                address: (&output.address).into(),
                amount: output.amount,
            }),
            Output::Extended(output) => Self::Extended(ExtendedOutputDto {
                kind: ExtendedOutput::KIND,
                address: (&output.address).into(),
                amount: output.amount,
                native_tokens: output.native_tokens.iter().map(Into::into).collect(),
                feature_blocks: output.feature_blocks.iter().map(Into::into).collect(),
            }),
            Output::Alias(output) => Self::Alias(AliasOutputDto {
                kind: AliasOutput::KIND,
                amount: output.amount,
                native_tokens: output.native_tokens.iter().map(Into::into).collect(),
                alias_id: prefix_hex::encode(output.alias_id.as_bytes().as_slice()),
                state_controller: (&output.state_controller).into(),
                governance_controller: (&output.governance_controller).into(),
                state_index: output.state_index,
                state_metadata: prefix_hex::encode(output.state_metadata.as_ref()),
                foundry_counter: output.foundry_counter,
                feature_blocks: output.feature_blocks.iter().map(Into::into).collect(),
            }),
            Output::Foundry(output) => Self::Foundry(FoundryOutputDto {
                kind: FoundryOutput::KIND,
                address: (&Address::Alias(output.address)).into(),
                amount: output.amount,
                native_tokens: output.native_tokens.iter().map(Into::into).collect(),
                serial_number: output.serial_number,
                token_tag: prefix_hex::encode(output.token_tag.as_slice()),
                circulating_supply: u256_to_hex(&output.circulating_supply),
                maximum_supply: u256_to_hex(&output.maximum_supply),
                token_scheme: output.token_scheme.kind(),
                feature_blocks: output.feature_blocks.iter().map(Into::into).collect(),
            }),
            Output::Nft(output) => Self::Nft(NftOutputDto {
                kind: NftOutput::KIND,
                address: (&output.address).into(),
                amount: output.amount,
                native_tokens: output.native_tokens.iter().map(Into::into).collect(),
                nft_id: prefix_hex::encode(output.nft_id.as_bytes().as_slice()),
                immutable_metadata: prefix_hex::encode(output.immutable_metadata.as_ref()),
                feature_blocks: output.feature_blocks.iter().map(Into::into).collect(),
            }),
        }
    }
}

impl TryFrom<&OutputDto> for Output {
    type Error = DtoError;

    fn try_from(value: &OutputDto) -> Result<Self, Self::Error> {
        Ok(match value {
            OutputDto::Simple(dto) => {
                expect_kind(dto.kind, SimpleOutput::KIND)?;
                Self::Simple(SimpleOutput::new((&dto.address).try_into()?, dto.amount))
            }
            OutputDto::Extended(dto) => {
                expect_kind(dto.kind, ExtendedOutput::KIND)?;
                Self::Extended(ExtendedOutput {
                    address: (&dto.address).try_into()?,
                    amount: dto.amount,
                    native_tokens: native_tokens_from_dto(&dto.native_tokens)?,
                    feature_blocks: feature_blocks_from_dto(&dto.feature_blocks)?,
                })
            }
            OutputDto::Alias(dto) => {
                expect_kind(dto.kind, AliasOutput::KIND)?;
                Self::Alias(AliasOutput {
                    amount: dto.amount,
                    native_tokens: native_tokens_from_dto(&dto.native_tokens)?,
                    alias_id: AliasId::new(prefix_hex::decode(&dto.alias_id)?),
                    state_controller: (&dto.state_controller).try_into()?,
                    governance_controller: (&dto.governance_controller).try_into()?,
                    state_index: dto.state_index,
                    state_metadata: prefix_hex::decode::<Vec<u8>>(&dto.state_metadata)?.into(),
                    foundry_counter: dto.foundry_counter,
                    feature_blocks: feature_blocks_from_dto(&dto.feature_blocks)?,
                })
            }
            OutputDto::Foundry(dto) => {
                expect_kind(dto.kind, FoundryOutput::KIND)?;
                let Address::Alias(address) = (&dto.address).try_into()? else {
                    return Err(DtoError::InvalidField("address"));
                };
                Self::Foundry(FoundryOutput {
                    address,
                    amount: dto.amount,
                    native_tokens: native_tokens_from_dto(&dto.native_tokens)?,
                    serial_number: dto.serial_number,
                    token_tag: prefix_hex::decode(&dto.token_tag)?,
                    circulating_supply: u256_from_hex(&dto.circulating_supply)?,
                    maximum_supply: u256_from_hex(&dto.maximum_supply)?,
                    token_scheme: match dto.token_scheme {
                        0 => TokenScheme::Simple,
                        _ => return Err(DtoError::InvalidField("tokenScheme")),
                    },
                    feature_blocks: feature_blocks_from_dto(&dto.feature_blocks)?,
                })
            }
            OutputDto::Nft(dto) => {
                expect_kind(dto.kind, NftOutput::KIND)?;
                Self::Nft(NftOutput {
                    address: (&dto.address).try_into()?,
                    amount: dto.amount,
                    native_tokens: native_tokens_from_dto(&dto.native_tokens)?,
                    nft_id: NftId::new(prefix_hex::decode(&dto.nft_id)?),
                    immutable_metadata: prefix_hex::decode::<Vec<u8>>(&dto.immutable_metadata)?.into(),
                    feature_blocks: feature_blocks_from_dto(&dto.feature_blocks)?,
                })
            }
        })
    }
}

/// The JSON representation of a signature [`Unlock`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureUnlockDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The signature.
    pub signature: SignatureDto,
}

/// The JSON representation of a referential [`Unlock`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceUnlockDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The referenced unlock index.
    pub reference: u16,
}

/// The JSON representation of an [`Unlock`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UnlockDto {
    /// A signature unlock.
    Signature(SignatureUnlockDto),
    /// A reference unlock.
    Reference(ReferenceUnlockDto),
    /// An alias unlock.
    Alias(ReferenceUnlockDto),
    /// An NFT unlock.
    Nft(ReferenceUnlockDto),
}

impl<'de> Deserialize<'de> for UnlockDto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use crate::unlock::{AliasUnlock, NftUnlock, ReferenceUnlock, SignatureUnlock};

        let value = Value::deserialize(deserializer)?;
        Ok(match dispatch_kind::<D::Error>(&value, "unlock")? {
            SignatureUnlock::KIND => Self::Signature(from_value(value)?),
            ReferenceUnlock::KIND => Self::Reference(from_value(value)?),
            AliasUnlock::KIND => Self::Alias(from_value(value)?),
            NftUnlock::KIND => Self::Nft(from_value(value)?),
            _ => return Err(de::Error::custom("invalid unlock type")),
        })
    }
}

impl From<&Unlock> for UnlockDto {
    fn from(value: &Unlock) -> Self {
        match value {
            Unlock::Signature(unlock) => Self::Signature(SignatureUnlockDto {
                kind: value.kind(),
                signature: unlock.signature().into(),
            }),
            Unlock::Reference(_) => Self::Reference(ReferenceUnlockDto {
                kind: value.kind(),
                // reference_index is always present for referential unlocks
                reference: value.reference_index().unwrap_or_default(),
            }),
            Unlock::Alias(_) => Self::Alias(ReferenceUnlockDto {
                kind: value.kind(),
                reference: value.reference_index().unwrap_or_default(),
            }),
            Unlock::Nft(_) => Self::Nft(ReferenceUnlockDto {
                kind: value.kind(),
                reference: value.reference_index().unwrap_or_default(),
            }),
        }
    }
}

impl TryFrom<&UnlockDto> for Unlock {
    type Error = DtoError;

    fn try_from(value: &UnlockDto) -> Result<Self, Self::Error> {
        use crate::unlock::{AliasUnlock, NftUnlock, ReferenceUnlock, SignatureUnlock};

        Ok(match value {
            UnlockDto::Signature(dto) => {
                expect_kind(dto.kind, SignatureUnlock::KIND)?;
                Self::signature((&dto.signature).try_into()?)
            }
            UnlockDto::Reference(dto) => {
                expect_kind(dto.kind, ReferenceUnlock::KIND)?;
                Self::reference(dto.reference)
            }
            UnlockDto::Alias(dto) => {
                expect_kind(dto.kind, AliasUnlock::KIND)?;
                Self::alias(dto.reference)
            }
            UnlockDto::Nft(dto) => {
                expect_kind(dto.kind, NftUnlock::KIND)?;
                Self::nft(dto.reference)
            }
        })
    }
}

/// The JSON representation of an [`IndexationPayload`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexationPayloadDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u32,
    /// The hex encoded tag.
    pub index: String,
    /// The hex encoded data.
    pub data: String,
}

impl From<&IndexationPayload> for IndexationPayloadDto {
    fn from(value: &IndexationPayload) -> Self {
        Self {
            kind: IndexationPayload::KIND,
            index: prefix_hex::encode(value.tag.as_ref()),
            data: prefix_hex::encode(value.data.as_ref()),
        }
    }
}

impl TryFrom<&IndexationPayloadDto> for IndexationPayload {
    type Error = DtoError;

    fn try_from(value: &IndexationPayloadDto) -> Result<Self, Self::Error> {
        if value.kind != IndexationPayload::KIND {
            return Err(DtoError::InvalidField("type"));
        }
        Ok(Self::new(
            prefix_hex::decode::<Vec<u8>>(&value.index)?,
            prefix_hex::decode::<Vec<u8>>(&value.data)?,
        ))
    }
}

/// The JSON representation of a [`TransactionEssence`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEssenceDto {
    /// The type discriminator.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The inputs of the transaction.
    pub inputs: Vec<InputDto>,
    /// The outputs of the transaction.
    pub outputs: Vec<OutputDto>,
    /// The optional embedded payload.
    pub payload: Option<IndexationPayloadDto>,
}

impl From<&TransactionEssence> for TransactionEssenceDto {
    fn from(value: &TransactionEssence) -> Self {
        Self {
            kind: TransactionEssence::KIND,
            inputs: value.inputs.iter().map(Into::into).collect(),
            outputs: value.outputs.iter().map(Into::into).collect(),
            payload: value.payload.as_ref().map(Into::into),
        }
    }
}

impl TryFrom<&TransactionEssenceDto> for TransactionEssence {
    type Error = DtoError;

    fn try_from(value: &TransactionEssenceDto) -> Result<Self, Self::Error> {
        expect_kind(value.kind, TransactionEssence::KIND)?;
        Ok(Self::new(
            value.inputs.iter().map(TryInto::try_into).collect::<Result<_, _>>()?,
            value.outputs.iter().map(TryInto::try_into).collect::<Result<_, _>>()?,
            value.payload.as_ref().map(TryInto::try_into).transpose()?,
        ))
    }
}

/// The JSON representation of a [`Transaction`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    /// The payload discriminator.
    #[serde(rename = "type")]
    pub kind: u32,
    /// The essence of the transaction.
    pub essence: TransactionEssenceDto,
    /// The unlocks of the transaction.
    pub unlock_blocks: Vec<UnlockDto>,
}

impl From<&Transaction> for TransactionDto {
    fn from(value: &Transaction) -> Self {
        Self {
            kind: Transaction::KIND,
            essence: (&value.essence).into(),
            unlock_blocks: value.unlocks.iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<&TransactionDto> for Transaction {
    type Error = DtoError;

    fn try_from(value: &TransactionDto) -> Result<Self, Self::Error> {
        if value.kind != Transaction::KIND {
            return Err(DtoError::InvalidField("type"));
        }
        Ok(Self::new(
            (&value.essence).try_into()?,
            value
                .unlock_blocks
                .iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
        ))
    }
}

#[cfg(all(test, feature = "rand"))]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::input::Input;

    #[test]
    fn address_json_round_trip() {
        for address in [Address::rand_ed25519(), Address::rand_alias(), Address::rand_nft()] {
            let dto = AddressDto::from(&address);
            let json = serde_json::to_string(&dto).unwrap();
            let decoded: AddressDto = serde_json::from_str(&json).unwrap();
            assert_eq!(Address::try_from(&decoded).unwrap(), address);
        }
    }

    #[test]
    fn address_json_carries_integer_type() {
        let json = serde_json::to_value(AddressDto::from(&Address::rand_alias())).unwrap();
        assert_eq!(json["type"], serde_json::json!(8));
    }

    #[test]
    fn transaction_json_round_trip() {
        let transaction = Transaction::new(
            TransactionEssence::new(
                vec![Input::rand()],
                vec![
                    Output::rand_simple(),
                    Output::rand_extended(),
                    Output::rand_alias_genesis(),
                    Output::rand_nft_genesis(),
                ],
                Some(IndexationPayload::new(b"tag".to_vec(), vec![1, 2, 3])),
            ),
            vec![Unlock::rand_signature()],
        );
        let dto = TransactionDto::from(&transaction);
        let json = serde_json::to_string(&dto).unwrap();
        let decoded: TransactionDto = serde_json::from_str(&json).unwrap();
        assert_eq!(Transaction::try_from(&decoded).unwrap(), transaction);
    }

    #[test]
    fn mismatching_kind_is_rejected() {
        let mut dto = TransactionDto::from(&Transaction::new(
            TransactionEssence::new(vec![Input::rand()], vec![Output::rand_simple()], None),
            vec![Unlock::rand_signature()],
        ));
        dto.kind = 1;
        assert!(matches!(Transaction::try_from(&dto), Err(DtoError::InvalidField("type"))));
    }
}

//! # ABI Codec
//!
//! Minimal Solidity ABI support for the PoSH contracts: static descriptors,
//! selector and topic hashing, and head/tail encoding of the handful of types
//! the contracts use (`address`, `bool`, `uintN`, `bytes32`, `string`,
//! `bytes32[]`).

use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use crate::domain::PoshError;

const WORD: usize = 32;

/// `Error(string)` selector.
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Parameter or return type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbiType {
    /// `address`
    Address,
    /// `bool`
    Bool,
    /// Unsigned integer of the given bit width.
    Uint(u16),
    /// `bytes32`
    FixedBytes32,
    /// `string`
    String,
    /// `bytes32[]`
    Bytes32Array,
}

impl AbiType {
    /// Canonical type name used in signatures.
    pub fn canonical(&self) -> String {
        match self {
            AbiType::Address => "address".to_string(),
            AbiType::Bool => "bool".to_string(),
            AbiType::Uint(bits) => format!("uint{}", bits),
            AbiType::FixedBytes32 => "bytes32".to_string(),
            AbiType::String => "string".to_string(),
            AbiType::Bytes32Array => "bytes32[]".to_string(),
        }
    }

    /// Dynamic types are stored in the tail and referenced by offset.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, AbiType::String | AbiType::Bytes32Array)
    }
}

/// Decoded ABI value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbiValue {
    /// 20-byte address.
    Address(H160),
    /// Boolean.
    Bool(bool),
    /// Any `uintN`.
    Uint(U256),
    /// `bytes32`.
    FixedBytes(H256),
    /// UTF-8 string.
    String(String),
    /// Dynamic array.
    Array(Vec<AbiValue>),
}

impl AbiValue {
    fn mismatch(&self, expected: &str, context: &str) -> PoshError {
        PoshError::decode(context, format!("expected {}, got {:?}", expected, self))
    }

    /// Bool or decode error.
    pub fn to_bool(&self, context: &str) -> Result<bool, PoshError> {
        match self {
            AbiValue::Bool(v) => Ok(*v),
            other => Err(other.mismatch("bool", context)),
        }
    }

    /// Unsigned integer or decode error.
    pub fn to_uint(&self, context: &str) -> Result<U256, PoshError> {
        match self {
            AbiValue::Uint(v) => Ok(*v),
            other => Err(other.mismatch("uint", context)),
        }
    }

    /// Address or decode error.
    pub fn to_address(&self, context: &str) -> Result<H160, PoshError> {
        match self {
            AbiValue::Address(v) => Ok(*v),
            other => Err(other.mismatch("address", context)),
        }
    }

    /// `bytes32` or decode error.
    pub fn to_fixed_bytes(&self, context: &str) -> Result<H256, PoshError> {
        match self {
            AbiValue::FixedBytes(v) => Ok(*v),
            other => Err(other.mismatch("bytes32", context)),
        }
    }

    /// String or decode error.
    pub fn to_text(&self, context: &str) -> Result<String, PoshError> {
        match self {
            AbiValue::String(v) => Ok(v.clone()),
            other => Err(other.mismatch("string", context)),
        }
    }

    /// `bytes32[]` or decode error.
    pub fn to_fixed_bytes_array(&self, context: &str) -> Result<Vec<H256>, PoshError> {
        match self {
            AbiValue::Array(items) => items.iter().map(|v| v.to_fixed_bytes(context)).collect(),
            other => Err(other.mismatch("bytes32[]", context)),
        }
    }

    /// Short rendering used in cache keys and logs.
    pub fn render(&self) -> String {
        match self {
            AbiValue::Address(v) => format!("0x{}", hex::encode(v.as_bytes())),
            AbiValue::Bool(v) => v.to_string(),
            AbiValue::Uint(v) => v.to_string(),
            AbiValue::FixedBytes(v) => format!("0x{}", hex::encode(v.as_bytes())),
            AbiValue::String(v) => v.clone(),
            AbiValue::Array(items) => {
                let inner: Vec<String> = items.iter().map(AbiValue::render).collect();
                format!("[{}]", inner.join(","))
            }
        }
    }
}

/// Named parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbiParam {
    /// Parameter name.
    pub name: &'static str,
    /// Parameter type.
    pub kind: AbiType,
    /// Event parameters only.
    pub indexed: bool,
}

impl AbiParam {
    /// Non-indexed parameter.
    pub const fn new(name: &'static str, kind: AbiType) -> Self {
        Self {
            name,
            kind,
            indexed: false,
        }
    }

    /// Indexed event parameter.
    pub const fn indexed(name: &'static str, kind: AbiType) -> Self {
        Self {
            name,
            kind,
            indexed: true,
        }
    }
}

/// Function state mutability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateMutability {
    /// Read-only.
    View,
    /// State-changing, no value.
    NonPayable,
}

/// Static function descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbiFunction {
    /// Solidity name.
    pub name: &'static str,
    /// Parameters in order.
    pub inputs: &'static [AbiParam],
    /// Return types in order.
    pub outputs: &'static [AbiType],
    /// Call kind.
    pub mutability: StateMutability,
}

impl AbiFunction {
    /// `name(type,type)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|p| p.kind.canonical()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// First four bytes of the signature hash.
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Selector followed by the encoded arguments.
    pub fn encode_call(&self, args: &[AbiValue]) -> Result<Vec<u8>, PoshError> {
        let types: Vec<AbiType> = self.inputs.iter().map(|p| p.kind).collect();
        let mut out = self.selector().to_vec();
        out.extend(encode(&types, args).map_err(|e| rename_context(e, self.name))?);
        Ok(out)
    }

    /// Decode return data.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<AbiValue>, PoshError> {
        decode(self.outputs, data).map_err(|e| rename_context(e, self.name))
    }

    /// Encode return values. Used by in-process providers.
    pub fn encode_output(&self, values: &[AbiValue]) -> Result<Vec<u8>, PoshError> {
        encode(self.outputs, values).map_err(|e| rename_context(e, self.name))
    }
}

/// Static event descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbiEvent {
    /// Solidity name.
    pub name: &'static str,
    /// Parameters in declaration order.
    pub inputs: &'static [AbiParam],
}

impl AbiEvent {
    /// `Name(type,type)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|p| p.kind.canonical()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// `topics[0]` of every log of this event.
    pub fn topic0(&self) -> H256 {
        H256(keccak256(self.signature().as_bytes()))
    }

    /// Build topics and data for a log carrying `values` in declaration order.
    pub fn encode_log(&self, values: &[AbiValue]) -> Result<(Vec<H256>, Vec<u8>), PoshError> {
        if values.len() != self.inputs.len() {
            return Err(PoshError::decode(
                self.name,
                format!("expected {} values, got {}", self.inputs.len(), values.len()),
            ));
        }
        let mut topics = vec![self.topic0()];
        let mut data_types = Vec::new();
        let mut data_values = Vec::new();
        for (param, value) in self.inputs.iter().zip(values) {
            if param.indexed {
                topics.push(H256(encode_static(param.kind, value)?));
            } else {
                data_types.push(param.kind);
                data_values.push(value.clone());
            }
        }
        Ok((topics, encode(&data_types, &data_values)?))
    }

    /// Decode a log into values in declaration order. Indexed values come
    /// from `topics[1..]`, the rest from `data`.
    pub fn decode_log(&self, topics: &[H256], data: &[u8]) -> Result<Vec<AbiValue>, PoshError> {
        if topics.first() != Some(&self.topic0()) {
            return Err(PoshError::decode(self.name, "topic0 does not match event signature"));
        }
        let data_types: Vec<AbiType> = self
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind)
            .collect();
        let mut data_values = decode(&data_types, data)
            .map_err(|e| rename_context(e, self.name))?
            .into_iter();
        let mut indexed_topics = topics[1..].iter();

        let mut values = Vec::with_capacity(self.inputs.len());
        for param in self.inputs {
            if param.indexed {
                let topic = indexed_topics.next().ok_or_else(|| {
                    PoshError::decode(self.name, format!("missing topic for {}", param.name))
                })?;
                values.push(decode_static(param.kind, topic.as_bytes(), self.name)?);
            } else {
                let value = data_values.next().ok_or_else(|| {
                    PoshError::decode(self.name, format!("missing data for {}", param.name))
                })?;
                values.push(value);
            }
        }
        Ok(values)
    }
}

fn rename_context(err: PoshError, context: &str) -> PoshError {
    match err {
        PoshError::Decode { reason, .. } => PoshError::decode(context, reason),
        other => other,
    }
}

fn uint_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

fn encode_static(kind: AbiType, value: &AbiValue) -> Result<[u8; 32], PoshError> {
    let mut word = [0u8; 32];
    match (kind, value) {
        (AbiType::Address, AbiValue::Address(a)) => word[12..].copy_from_slice(a.as_bytes()),
        (AbiType::Bool, AbiValue::Bool(b)) => word[31] = *b as u8,
        (AbiType::Uint(bits), AbiValue::Uint(v)) => {
            if v.bits() > bits as usize {
                return Err(PoshError::decode(
                    "abi",
                    format!("value {} overflows uint{}", v, bits),
                ));
            }
            word = uint_word(*v);
        }
        (AbiType::FixedBytes32, AbiValue::FixedBytes(h)) => word.copy_from_slice(h.as_bytes()),
        (kind, value) => {
            return Err(PoshError::decode(
                "abi",
                format!("cannot encode {:?} as {}", value, kind.canonical()),
            ))
        }
    }
    Ok(word)
}

fn encode_dynamic(kind: AbiType, value: &AbiValue) -> Result<Vec<u8>, PoshError> {
    match (kind, value) {
        (AbiType::String, AbiValue::String(s)) => {
            let bytes = s.as_bytes();
            let mut out = uint_word(U256::from(bytes.len())).to_vec();
            out.extend_from_slice(bytes);
            let padding = (WORD - bytes.len() % WORD) % WORD;
            out.extend(std::iter::repeat(0u8).take(padding));
            Ok(out)
        }
        (AbiType::Bytes32Array, AbiValue::Array(items)) => {
            let mut out = uint_word(U256::from(items.len())).to_vec();
            for item in items {
                out.extend_from_slice(&encode_static(AbiType::FixedBytes32, item)?);
            }
            Ok(out)
        }
        (kind, value) => Err(PoshError::decode(
            "abi",
            format!("cannot encode {:?} as {}", value, kind.canonical()),
        )),
    }
}

/// Head/tail encode `values` as the tuple `types`.
pub fn encode(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, PoshError> {
    if types.len() != values.len() {
        return Err(PoshError::decode(
            "abi",
            format!("expected {} values, got {}", types.len(), values.len()),
        ));
    }

    let head_len = types.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (kind, value) in types.iter().zip(values) {
        if kind.is_dynamic() {
            head.extend_from_slice(&uint_word(U256::from(head_len + tail.len())));
            tail.extend(encode_dynamic(*kind, value)?);
        } else {
            head.extend_from_slice(&encode_static(*kind, value)?);
        }
    }

    head.extend(tail);
    Ok(head)
}

fn read_word<'a>(data: &'a [u8], at: usize, context: &str) -> Result<&'a [u8], PoshError> {
    data.get(at..at + WORD)
        .ok_or_else(|| PoshError::decode(context, format!("data too short at offset {}", at)))
}

fn read_usize(data: &[u8], at: usize, context: &str) -> Result<usize, PoshError> {
    let value = U256::from_big_endian(read_word(data, at, context)?);
    if value > U256::from(data.len()) {
        return Err(PoshError::decode(context, format!("offset or length {} out of range", value)));
    }
    Ok(value.as_usize())
}

fn decode_static(kind: AbiType, word: &[u8], context: &str) -> Result<AbiValue, PoshError> {
    match kind {
        AbiType::Address => Ok(AbiValue::Address(H160::from_slice(&word[12..32]))),
        AbiType::Bool => match U256::from_big_endian(word) {
            v if v.is_zero() => Ok(AbiValue::Bool(false)),
            v if v == U256::one() => Ok(AbiValue::Bool(true)),
            v => Err(PoshError::decode(context, format!("invalid bool {}", v))),
        },
        AbiType::Uint(bits) => {
            let v = U256::from_big_endian(word);
            if v.bits() > bits as usize {
                return Err(PoshError::decode(context, format!("{} overflows uint{}", v, bits)));
            }
            Ok(AbiValue::Uint(v))
        }
        AbiType::FixedBytes32 => Ok(AbiValue::FixedBytes(H256::from_slice(word))),
        AbiType::String | AbiType::Bytes32Array => Err(PoshError::decode(
            context,
            format!("{} is not a static type", kind.canonical()),
        )),
    }
}

fn decode_dynamic(kind: AbiType, data: &[u8], offset: usize, context: &str) -> Result<AbiValue, PoshError> {
    let len = read_usize(data, offset, context)?;
    let start = offset + WORD;
    match kind {
        AbiType::String => {
            let bytes = data
                .get(start..start + len)
                .ok_or_else(|| PoshError::decode(context, "string exceeds data"))?;
            String::from_utf8(bytes.to_vec())
                .map(AbiValue::String)
                .map_err(|e| PoshError::decode(context, e.to_string()))
        }
        AbiType::Bytes32Array => {
            let mut items = Vec::with_capacity(len);
            for i in 0..len {
                let word = read_word(data, start + i * WORD, context)?;
                items.push(AbiValue::FixedBytes(H256::from_slice(word)));
            }
            Ok(AbiValue::Array(items))
        }
        other => decode_static(other, read_word(data, offset, context)?, context),
    }
}

/// Decode `data` as the tuple `types`.
pub fn decode(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, PoshError> {
    let context = "abi";
    types
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            if kind.is_dynamic() {
                let offset = read_usize(data, i * WORD, context)?;
                decode_dynamic(*kind, data, offset, context)
            } else {
                decode_static(*kind, read_word(data, i * WORD, context)?, context)
            }
        })
        .collect()
}

/// Revert reason from `Error(string)` return data.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 + 2 * WORD || data[..4] != ERROR_STRING_SELECTOR {
        return None;
    }
    match decode(&[AbiType::String], &data[4..]).ok()?.pop()? {
        AbiValue::String(reason) => Some(reason),
        _ => None,
    }
}

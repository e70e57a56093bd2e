//! Schema definitions: parsing, value encoding and UID derivation.
//!
//! A schema is a comma-separated list of `type name` pairs such as
//! `"uint256 eventId, uint8 voteIndex"`. Attestation data is the ABI
//! encoding of the values as function parameters, in schema order.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::hex;
use alloy::primitives::{keccak256, Address, Bytes, B256};

use crate::eas::types::{EasError, EasResult};

/// One `type name` entry of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub type_name: String,
    pub ty: DynSolType,
}

/// A parsed schema definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    raw: String,
    fields: Vec<SchemaField>,
}

/// A decoded attestation value with its schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub name: String,
    pub type_name: String,
    pub value: DynSolValue,
}

impl fmt::Display for DecodedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} = {}", self.type_name, self.name, format_value(&self.value))
    }
}

impl SchemaDefinition {
    /// Parse a schema string.
    pub fn parse(definition: &str) -> EasResult<Self> {
        let invalid = |reason: String| EasError::InvalidSchema {
            definition: definition.to_string(),
            reason,
        };

        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        for entry in split_top_level(definition) {
            let entry = entry.trim();
            if entry.is_empty() {
                return Err(invalid("empty field entry".to_string()));
            }
            let (type_name, name) = entry
                .rsplit_once(char::is_whitespace)
                .ok_or_else(|| invalid(format!("field '{}' has no name", entry)))?;
            let (type_name, name) = (type_name.trim(), name.trim());
            let ty = DynSolType::parse(type_name)
                .map_err(|e| invalid(format!("unknown type '{}': {}", type_name, e)))?;
            if !seen.insert(name.to_string()) {
                return Err(invalid(format!("duplicate field name '{}'", name)));
            }
            fields.push(SchemaField {
                name: name.to_string(),
                type_name: type_name.to_string(),
                ty,
            });
        }

        Ok(Self {
            raw: definition.trim().to_string(),
            fields,
        })
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// ABI-encode `values` in schema order. Every field must have a value.
    pub fn encode(&self, values: &BTreeMap<String, serde_json::Value>) -> EasResult<Bytes> {
        let mut encoded = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = values
                .get(&field.name)
                .ok_or_else(|| EasError::MissingField(field.name.clone()))?;
            let value = coerce_value(&field.ty, value).map_err(|reason| EasError::Encoding {
                field: field.name.clone(),
                reason,
            })?;
            encoded.push(value);
        }
        Ok(DynSolValue::Tuple(encoded).abi_encode_params().into())
    }

    /// Decode attestation data produced under this schema.
    pub fn decode(&self, data: &[u8]) -> EasResult<Vec<DecodedField>> {
        let types = self.fields.iter().map(|f| f.ty.clone()).collect();
        let decoded = DynSolType::Tuple(types)
            .abi_decode_params(data)
            .map_err(|e| EasError::Decoding(e.to_string()))?;

        let DynSolValue::Tuple(values) = decoded else {
            return Err(EasError::Decoding("expected a parameter tuple".to_string()));
        };

        Ok(self
            .fields
            .iter()
            .zip(values)
            .map(|(field, value)| DecodedField {
                name: field.name.clone(),
                type_name: field.type_name.clone(),
                value,
            })
            .collect())
    }

    /// UID this schema gets when registered with `resolver` and `revocable`.
    pub fn uid(&self, resolver: Address, revocable: bool) -> B256 {
        schema_uid(&self.raw, resolver, revocable)
    }
}

impl fmt::Display for SchemaDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// `keccak256(abi.encodePacked(schema, resolver, revocable))`, as the
/// registry computes it.
pub fn schema_uid(definition: &str, resolver: Address, revocable: bool) -> B256 {
    let mut data = Vec::with_capacity(definition.len() + 21);
    data.extend_from_slice(definition.as_bytes());
    data.extend_from_slice(resolver.as_slice());
    data.push(revocable as u8);
    keccak256(&data)
}

/// Turn a YAML/JSON scalar or list into an ABI value of type `ty`.
pub fn coerce_value(ty: &DynSolType, value: &serde_json::Value) -> Result<DynSolValue, String> {
    use serde_json::Value;

    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce_value(inner, item))
            .collect::<Result<_, _>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(format!("expected {} elements, got {}", len, items.len()));
            }
            items
                .iter()
                .map(|item| coerce_value(inner, item))
                .collect::<Result<_, _>>()
                .map(DynSolValue::FixedArray)
        }
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(format!("expected {} tuple members, got {}", types.len(), items.len()));
            }
            types
                .iter()
                .zip(items)
                .map(|(ty, item)| coerce_value(ty, item))
                .collect::<Result<_, _>>()
                .map(DynSolValue::Tuple)
        }
        (_, Value::String(s)) => coerce_scalar(ty, s),
        (_, Value::Number(n)) => coerce_scalar(ty, &n.to_string()),
        (_, Value::Bool(b)) => coerce_scalar(ty, &b.to_string()),
        (_, Value::Null) => Err("value is null".to_string()),
        (_, other) => Err(format!("cannot convert {} to {}", other, ty.sol_type_name())),
    }
}

fn coerce_scalar(ty: &DynSolType, s: &str) -> Result<DynSolValue, String> {
    let value = ty.coerce_str(s).map_err(|e| e.to_string())?;
    match &value {
        DynSolValue::Uint(v, bits) if *bits < 256 && v.bit_len() > *bits => {
            Err(format!("{} does not fit in uint{}", v, bits))
        }
        _ => Ok(value),
    }
}

/// Human-readable rendering of a decoded ABI value.
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => hex::encode_prefixed(&word[..*size]),
        DynSolValue::Address(a) => a.to_checksum(None),
        DynSolValue::Bytes(b) => hex::encode_prefixed(b),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let items: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        DynSolValue::Tuple(items) => {
            let items: Vec<_> = items.iter().map(format_value).collect();
            format!("({})", items.join(", "))
        }
        other => format!("{:?}", other),
    }
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

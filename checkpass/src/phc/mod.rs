//! Structured hash string codec.
//!
//! Reads and writes the `$id$k1=v1,k2=v2$salt$checksum` layout shared by the
//! modern schemes. Salt and checksum travel as unpadded standard base64.

pub mod b64;
pub(crate) mod grammar;

use std::fmt;

use serde::Serialize;
use serde::Serializer;

use crate::errors::FormatError;
use crate::errors::HashError;
use grammar::Cursor;

const MAX_NAME_LENGTH: usize = 32;

/// Value of one structured-hash parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Decimal integer without superfluous leading zero
    Int(i64),
    /// Opaque base64-like text
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(value) => value.fmt(f),
            ParamValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Decoded structured hash string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedHash {
    pub id: String,
    pub params: Vec<(String, ParamValue)>,
    #[serde(serialize_with = "serialize_b64")]
    pub salt: Vec<u8>,
    #[serde(serialize_with = "serialize_b64")]
    pub checksum: Vec<u8>,
}

fn serialize_b64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&b64::encode(bytes))
}

impl ParsedHash {
    /// Look up a parameter by key.
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Re-encode into canonical form.
    pub fn encode(&self) -> String {
        encode(&self.id, &self.params, &self.salt, &self.checksum)
    }

    /// Extract exactly the integer parameters `expected`, in that order.
    ///
    /// # Errors
    /// * `UnexpectedParam` - A key outside `expected` is present
    /// * `MissingParam` - A key of `expected` is absent
    /// * `ParamOrder` - All keys are present but not in canonical order
    /// * `NotAnInteger` - A value is not a decimal integer
    pub(crate) fn integer_params(
        &self,
        scheme: &'static str,
        expected: &[&str],
    ) -> Result<Vec<i64>, FormatError> {
        if let Some((key, _)) = self
            .params
            .iter()
            .find(|(key, _)| !expected.contains(&key.as_str()))
        {
            return Err(FormatError::UnexpectedParam {
                scheme,
                key: key.clone(),
            });
        }
        if let Some(key) = expected.iter().find(|key| self.param(key).is_none()) {
            return Err(FormatError::MissingParam {
                scheme,
                key: key.to_string(),
            });
        }
        if !self
            .params
            .iter()
            .map(|(key, _)| key.as_str())
            .eq(expected.iter().copied())
        {
            return Err(FormatError::ParamOrder {
                scheme,
                expected: expected.join(","),
            });
        }
        self.params
            .iter()
            .map(|(key, value)| match value {
                ParamValue::Int(value) => Ok(*value),
                ParamValue::Text(_) => Err(FormatError::NotAnInteger {
                    scheme,
                    key: key.clone(),
                }),
            })
            .collect()
    }
}

/// Decode a structured hash string.
///
/// # Arguments
/// * `input` - String in `$id$params$salt$checksum` layout
///
/// # Returns
/// ParsedHash with decoded salt and checksum bytes
///
/// # Errors
/// * `Format` - Layout violated, conflicting duplicate key, or bad base64 field
/// * `OutOfRange` - A decimal parameter does not fit in 64 bits
pub fn decode(input: &str) -> Result<ParsedHash, HashError> {
    let not_structured = || FormatError::NotStructured(input.to_string());
    let mut cursor = Cursor::new(input);

    if !cursor.eat("$") {
        return Err(not_structured().into());
    }
    let id = cursor
        .take_run(1, MAX_NAME_LENGTH, grammar::is_name)
        .ok_or_else(not_structured)?;
    if !cursor.eat("$") {
        return Err(not_structured().into());
    }
    let pairs = cursor.take_while(|b| b != b'$');
    if !cursor.eat("$") {
        return Err(not_structured().into());
    }
    let salt = cursor.take_while(grammar::is_b64);
    if !cursor.eat("$") {
        return Err(not_structured().into());
    }
    let checksum = cursor.take_while(grammar::is_b64);
    if !cursor.is_end() {
        return Err(not_structured().into());
    }

    Ok(ParsedHash {
        id: id.to_string(),
        params: decode_params(input, pairs)?,
        salt: b64::decode(salt)?,
        checksum: b64::decode(checksum)?,
    })
}

fn decode_params(input: &str, pairs: &str) -> Result<Vec<(String, ParamValue)>, HashError> {
    let mut params: Vec<(String, ParamValue)> = Vec::new();
    if pairs.is_empty() {
        return Ok(params);
    }

    for pair in pairs.split(',') {
        let (key, value) = decode_pair(pair)
            .ok_or_else(|| FormatError::NotStructured(input.to_string()))?;
        let value = if grammar::is_decimal(value) {
            value
                .parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|_| HashError::out_of_range(key, value, "a 64-bit integer"))?
        } else {
            ParamValue::Text(value.to_string())
        };

        match params.iter().find(|(name, _)| name == key) {
            Some((_, existing)) if *existing == value => {}
            Some((_, existing)) => {
                return Err(FormatError::ConflictingParam {
                    key: key.to_string(),
                    first: existing.to_string(),
                    second: value.to_string(),
                }
                .into())
            }
            None => params.push((key.to_string(), value)),
        }
    }
    Ok(params)
}

fn decode_pair(pair: &str) -> Option<(&str, &str)> {
    let mut cursor = Cursor::new(pair);
    let key = cursor.take_run(1, MAX_NAME_LENGTH, grammar::is_name)?;
    if !cursor.eat("=") {
        return None;
    }
    let value = cursor.take_while(grammar::is_value);
    cursor.is_end().then_some((key, value))
}

/// Whether the checksum field of `hash`, after its last `$`, is in canonical
/// form. A checksum with unused low bits set never matches.
pub(crate) fn canonical_checksum(hash: &str) -> bool {
    hash.rsplit('$').next().is_some_and(b64::is_canonical)
}

/// Render parameters as `k1=v1,k2=v2` in the order given.
pub fn encode_params<K: AsRef<str>>(params: &[(K, ParamValue)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key.as_ref(), value))
        .collect::<Vec<_>>()
        .join(",")
}

/// Encode a structured hash string.
///
/// Parameters are written in exactly the order supplied.
///
/// # Arguments
/// * `id` - Scheme identifier
/// * `params` - Ordered parameters
/// * `salt` - Raw salt bytes
/// * `checksum` - Raw checksum bytes
///
/// # Returns
/// `$id$params$salt$checksum` with unpadded base64 fields
pub fn encode<K: AsRef<str>>(
    id: &str,
    params: &[(K, ParamValue)],
    salt: &[u8],
    checksum: &[u8],
) -> String {
    format!(
        "${}${}${}${}",
        id,
        encode_params(params),
        b64::encode(salt),
        b64::encode(checksum)
    )
}

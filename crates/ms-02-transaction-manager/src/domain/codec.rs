//! # Parameter Codec
//!
//! Sub-operation parameters are persisted as the JSON text the owners
//! submitted and materialized into typed values right before a call:
//!
//! ```json
//! [{"name": "_to", "type": "Address", "value": "hx…"},
//!  {"name": "_value", "type": "int", "value": "0x64"}]
//! ```
//!
//! | Tag | Accepted text |
//! |-----|---------------|
//! | `int` | decimal, `0x`/`0o`/`0b` prefixed, optional sign, `_` separators |
//! | `str` | anything |
//! | `bool` | `True`/`0x1`/`1`, `False`/`0x0`/`0` |
//! | `Address` | `hx…` or `cx…` |
//! | `bytes` | hex, optional `0x` |
//! | `List` | JSON array of `{type, value}` |
//! | `TypedDict` | JSON object of `{type, value}` |

use crate::domain::errors::CodecError;
use crate::ports::outbound::ParamCodec;
use serde::Deserialize;
use shared_types::Address;
use std::collections::BTreeMap;

/// A typed call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i128),
    Str(String),
    Bool(bool),
    Address(Address),
    Bytes(Vec<u8>),
    List(Vec<ParamValue>),
    Dict(BTreeMap<String, ParamValue>),
}

/// Named call arguments.
pub type ParamMap = BTreeMap<String, ParamValue>;

impl ParamValue {
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Self::Address(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, ParamValue>> {
        match self {
            Self::Dict(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct TypedItem {
    #[serde(rename = "type")]
    type_tag: String,
    value: String,
}

#[derive(Deserialize)]
struct NamedParam {
    name: String,
    #[serde(rename = "type")]
    type_tag: String,
    value: String,
}

/// The reference codec for the tags listed in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreTypeCodec;

impl ScoreTypeCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ParamCodec for ScoreTypeCodec {
    fn convert(&self, type_tag: &str, raw: &str) -> Result<ParamValue, CodecError> {
        let converted = match type_tag {
            "int" => parse_int(raw).map(ParamValue::Int),
            "str" => Ok(ParamValue::Str(raw.to_string())),
            "bool" => parse_bool(raw).map(ParamValue::Bool),
            "Address" => raw
                .parse::<Address>()
                .map(ParamValue::Address)
                .map_err(|e| e.to_string()),
            "bytes" => hex::decode(raw.strip_prefix("0x").unwrap_or(raw))
                .map(ParamValue::Bytes)
                .map_err(|e| e.to_string()),
            "List" => self.convert_list(raw).map(ParamValue::List),
            "TypedDict" => self.convert_dict(raw).map(ParamValue::Dict),
            _ => {
                return Err(CodecError::UnsupportedType {
                    type_tag: type_tag.to_string(),
                })
            }
        };

        converted.map_err(|reason| CodecError::ConversionFailed {
            type_tag: type_tag.to_string(),
            value: raw.to_string(),
            reason,
        })
    }

    fn decode_params(&self, params: &str) -> Result<ParamMap, CodecError> {
        if params.is_empty() {
            return Ok(ParamMap::new());
        }
        let named: Vec<NamedParam> =
            serde_json::from_str(params).map_err(|e| CodecError::MalformedParams(e.to_string()))?;

        named
            .into_iter()
            .map(|param| Ok((param.name, self.convert(&param.type_tag, &param.value)?)))
            .collect()
    }
}

impl ScoreTypeCodec {
    fn convert_list(&self, raw: &str) -> Result<Vec<ParamValue>, String> {
        let items: Vec<TypedItem> = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        items
            .iter()
            .map(|item| {
                self.convert(&item.type_tag, &item.value)
                    .map_err(|e| e.to_string())
            })
            .collect()
    }

    fn convert_dict(&self, raw: &str) -> Result<BTreeMap<String, ParamValue>, String> {
        let items: BTreeMap<String, TypedItem> =
            serde_json::from_str(raw).map_err(|e| e.to_string())?;
        items
            .into_iter()
            .map(|(key, item)| {
                self.convert(&item.type_tag, &item.value)
                    .map(|value| (key, value))
                    .map_err(|e| e.to_string())
            })
            .collect()
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "True" | "0x1" | "1" => Ok(true),
        "False" | "0x0" | "0" => Ok(false),
        _ => Err("invalid bool value".to_string()),
    }
}

/// Integer literal with automatic base detection.
fn parse_int(raw: &str) -> Result<i128, String> {
    let text = raw.trim();
    let (negative, body) = if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text.strip_prefix('+').unwrap_or(text))
    };

    let lower = body.to_ascii_lowercase();
    let (radix, digits) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest.strip_prefix('_').unwrap_or(rest))
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest.strip_prefix('_').unwrap_or(rest))
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest.strip_prefix('_').unwrap_or(rest))
    } else {
        (10, lower.as_str())
    };

    if digits.is_empty() || digits.starts_with(['_', '+', '-']) {
        return Err("missing digits".to_string());
    }
    if digits.ends_with('_') || digits.contains("__") {
        return Err("misplaced digit separator".to_string());
    }
    if radix == 10 && digits.starts_with('0') && digits.chars().any(|c| c != '0' && c != '_') {
        return Err("leading zeros in decimal literal".to_string());
    }

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let magnitude = u128::from_str_radix(&cleaned, radix).map_err(|e| e.to_string())?;

    if negative {
        if magnitude > i128::MAX as u128 + 1 {
            return Err("integer out of range".to_string());
        }
        Ok((magnitude as i128).wrapping_neg())
    } else {
        i128::try_from(magnitude).map_err(|_| "integer out of range".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(tag: &str, raw: &str) -> Result<ParamValue, CodecError> {
        ScoreTypeCodec.convert(tag, raw)
    }

    #[test]
    fn test_int_bases_and_signs() {
        assert_eq!(convert("int", "42").unwrap(), ParamValue::Int(42));
        assert_eq!(convert("int", "0x64").unwrap(), ParamValue::Int(100));
        assert_eq!(convert("int", "0o17").unwrap(), ParamValue::Int(15));
        assert_eq!(convert("int", "0b101").unwrap(), ParamValue::Int(5));
        assert_eq!(convert("int", "-0x10").unwrap(), ParamValue::Int(-16));
        assert_eq!(convert("int", "1_000").unwrap(), ParamValue::Int(1000));
        assert_eq!(convert("int", "0").unwrap(), ParamValue::Int(0));
        assert_eq!(convert("int", "000").unwrap(), ParamValue::Int(0));
    }

    #[test]
    fn test_int_rejects_malformed() {
        for raw in ["", "abc", "010", "1__0", "1_", "0x", "--1", "12.5"] {
            assert!(
                matches!(
                    convert("int", raw),
                    Err(CodecError::ConversionFailed { .. })
                ),
                "{raw:?} should not convert"
            );
        }
    }

    #[test]
    fn test_bool_str_bytes_address() {
        assert_eq!(convert("bool", "0x1").unwrap(), ParamValue::Bool(true));
        assert_eq!(convert("bool", "False").unwrap(), ParamValue::Bool(false));
        assert!(convert("bool", "yes").is_err());

        assert_eq!(
            convert("str", "hello").unwrap(),
            ParamValue::Str("hello".into())
        );
        assert_eq!(
            convert("bytes", "0xdead").unwrap(),
            ParamValue::Bytes(vec![0xde, 0xad])
        );
        assert_eq!(
            convert("bytes", "beef").unwrap(),
            ParamValue::Bytes(vec![0xbe, 0xef])
        );

        let addr = Address::account_from_byte(7);
        assert_eq!(
            convert("Address", &addr.to_string()).unwrap(),
            ParamValue::Address(addr)
        );
    }

    #[test]
    fn test_unsupported_type() {
        assert_eq!(
            convert("float", "1.0"),
            Err(CodecError::UnsupportedType {
                type_tag: "float".into()
            })
        );
    }

    #[test]
    fn test_nested_containers() {
        let list = r#"[{"type": "int", "value": "1"}, {"type": "str", "value": "a"}]"#;
        assert_eq!(
            convert("List", list).unwrap(),
            ParamValue::List(vec![ParamValue::Int(1), ParamValue::Str("a".into())])
        );

        let dict = r#"{"flag": {"type": "bool", "value": "1"}}"#;
        let value = convert("TypedDict", dict).unwrap();
        assert_eq!(
            value.as_dict().unwrap().get("flag"),
            Some(&ParamValue::Bool(true))
        );

        let bad = r#"[{"type": "float", "value": "1"}]"#;
        assert!(matches!(
            convert("List", bad),
            Err(CodecError::ConversionFailed { .. })
        ));
    }

    #[test]
    fn test_decode_params() {
        let codec = ScoreTypeCodec::new();
        let params = r#"[
            {"name": "_to", "type": "Address", "value": "hx0101010101010101010101010101010101010101"},
            {"name": "_value", "type": "int", "value": "0x64"}
        ]"#;
        let map = codec.decode_params(params).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["_value"].as_int(), Some(100));
        assert_eq!(
            map["_to"].as_address(),
            Some(&Address::account_from_byte(1))
        );

        assert!(codec.decode_params("").unwrap().is_empty());
        assert!(matches!(
            codec.decode_params("{not json"),
            Err(CodecError::MalformedParams(_))
        ));
    }
}

//! Rendering of decoded Solidity values into JSON for the traffic log.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::hex;
use serde_json::{Map, Value};

/// Renders a decoded Solidity value as JSON.
///
/// Numbers that fit a 64-bit integer become JSON numbers; larger ones become
/// decimal strings so no precision is lost. Byte strings are `0x`-prefixed
/// hex, addresses are checksummed.
pub fn sol_value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::from(*b),

        DynSolValue::Int(n, _) => match i64::try_from(*n) {
            Ok(n) => Value::from(n),
            Err(_) => Value::from(n.to_string()),
        },

        DynSolValue::Uint(n, _) => match u64::try_from(*n) {
            Ok(n) => Value::from(n),
            Err(_) => Value::from(n.to_string()),
        },

        DynSolValue::Address(addr) => Value::from(addr.to_string()),

        DynSolValue::Function(func) => Value::from(format!("0x{}", hex::encode(func.as_slice()))),

        DynSolValue::FixedBytes(bytes, size) => {
            Value::from(format!("0x{}", hex::encode(&bytes[..*size])))
        }

        DynSolValue::Bytes(bytes) => Value::from(format!("0x{}", hex::encode(bytes))),

        DynSolValue::String(s) => Value::from(s.clone()),

        DynSolValue::Array(values) | DynSolValue::FixedArray(values) | DynSolValue::Tuple(values) => {
            Value::Array(values.iter().map(sol_value_to_json).collect())
        }

        DynSolValue::CustomStruct { prop_names, tuple, .. } => {
            if prop_names.len() == tuple.len() {
                let mut object = Map::new();
                for (name, value) in prop_names.iter().zip(tuple.iter()) {
                    object.insert(name.clone(), sol_value_to_json(value));
                }
                Value::Object(object)
            } else {
                Value::Array(tuple.iter().map(sol_value_to_json).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, I256, U256};
    use serde_json::json;

    #[test]
    fn test_small_numbers_render_as_json_numbers() {
        assert_eq!(sol_value_to_json(&DynSolValue::Uint(U256::from(1000u64), 256)), json!(1000));
        assert_eq!(
            sol_value_to_json(&DynSolValue::Int(I256::try_from(-5i64).unwrap(), 256)),
            json!(-5)
        );
    }

    #[test]
    fn test_large_uint_renders_as_decimal_string() {
        let huge = U256::MAX;
        assert_eq!(sol_value_to_json(&DynSolValue::Uint(huge, 256)), json!(huge.to_string()));
    }

    #[test]
    fn test_address_and_bytes_render_as_hex() {
        let addr = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        assert_eq!(
            sol_value_to_json(&DynSolValue::Address(addr)),
            json!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")
        );
        assert_eq!(
            sol_value_to_json(&DynSolValue::Bytes(vec![0xde, 0xad])),
            json!("0xdead")
        );
    }

    #[test]
    fn test_nested_values_render_recursively() {
        let value = DynSolValue::Array(vec![
            DynSolValue::Tuple(vec![
                DynSolValue::Bool(true),
                DynSolValue::String("ok".to_string()),
            ]),
        ]);
        assert_eq!(sol_value_to_json(&value), json!([[true, "ok"]]));
    }
}

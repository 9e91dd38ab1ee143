//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! ```text
//! "Lamp"        <-> {"stringValue": "Lamp"}
//! 7             <-> {"integerValue": "7"}
//! 19.99         <-> {"doubleValue": 19.99}
//! [1, 2]        <-> {"arrayValue": {"values": [...]}}
//! {"a": 1}      <-> {"mapValue": {"fields": {...}}}
//! ```
//!
//! Timestamps written by other clients decode to their RFC 3339 string.

use serde_json::{Map, Number, Value, json};

use crate::documents::{DocumentStoreError, Fields};

/// Encode a document body as a Firestore `fields` map.
#[must_use]
pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

/// Encode one JSON value.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decode a Firestore `fields` map. A missing map decodes as empty.
///
/// # Errors
///
/// Returns an error if any value has an unknown or malformed encoding.
pub fn decode_fields(fields: Option<&Value>) -> Result<Fields, DocumentStoreError> {
    let Some(fields) = fields else {
        return Ok(Map::new());
    };
    let map = fields
        .as_object()
        .ok_or_else(|| DocumentStoreError::Malformed("fields is not an object".to_string()))?;
    map.iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

/// Decode one typed value.
///
/// # Errors
///
/// Returns an error if the value has an unknown or malformed encoding.
pub fn decode_value(value: &Value) -> Result<Value, DocumentStoreError> {
    let malformed = || DocumentStoreError::Malformed(value.to_string());
    let object = value.as_object().ok_or_else(malformed)?;
    let (kind, inner) = object.iter().next().ok_or_else(malformed)?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner.as_bool().map(Value::Bool).ok_or_else(malformed),
        "integerValue" => {
            // Integers arrive as decimal strings to survive 64-bit precision.
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed.map(|i| Value::Number(i.into())).ok_or_else(malformed)
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(malformed),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            inner.as_str().map(|s| Value::String(s.to_string())).ok_or_else(malformed)
        }
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map_or_else(|| Ok(Vec::new()), |values| values.iter().map(decode_value).collect())
            .map(Value::Array),
        "mapValue" => decode_fields(inner.get("fields")).map(Value::Object),
        "geoPointValue" => Ok(inner.clone()),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::documents::to_fields;

    #[test]
    fn test_encode_product_document() {
        let fields = to_fields(&json!({
            "name": "Lamp",
            "price": 19.99,
            "stock": 7,
            "isFeatured": true,
        }))
        .unwrap();
        let encoded = encode_fields(&fields);
        assert_eq!(encoded["name"], json!({"stringValue": "Lamp"}));
        assert_eq!(encoded["price"], json!({"doubleValue": 19.99}));
        assert_eq!(encoded["stock"], json!({"integerValue": "7"}));
        assert_eq!(encoded["isFeatured"], json!({"booleanValue": true}));
    }

    #[test]
    fn test_nested_order_items_survive() {
        let original = to_fields(&json!({
            "items": [{"productId": "p1", "quantity": 2, "price": 10.5}],
            "status": "pending",
            "note": null,
        }))
        .unwrap();
        let decoded = decode_fields(Some(&encode_fields(&original))).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_foreign_encodings() {
        let fields = json!({
            "createdAt": {"timestampValue": "2025-03-01T10:00:00Z"},
            "price": {"integerValue": "25"},
            "tags": {"arrayValue": {}},
        });
        let decoded = decode_fields(Some(&fields)).unwrap();
        assert_eq!(decoded["createdAt"], "2025-03-01T10:00:00Z");
        assert_eq!(decoded["price"], 25);
        assert_eq!(decoded["tags"], json!([]));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let err = decode_value(&json!({"mysteryValue": 1})).unwrap_err();
        assert!(matches!(err, DocumentStoreError::Malformed(_)));
        assert!(decode_value(&json!({"integerValue": "seven"})).is_err());
    }

    #[test]
    fn test_missing_fields_is_empty_document() {
        assert!(decode_fields(None).unwrap().is_empty());
    }
}

//! URL-encoded form body decoder.

use async_trait::async_trait;
use serde_json::{Map, Value};
use url::form_urlencoded;

use super::BodyDecoder;

/// Parses the body as URL-encoded key/value pairs.
///
/// Every pair in the body appears in the output; a repeated key keeps its
/// last value.
pub struct UrlencodedDecoder;

#[async_trait]
impl BodyDecoder for UrlencodedDecoder {
    async fn decode(&self, body: &str) -> Value {
        let mut pairs = Map::new();
        for (key, value) in form_urlencoded::parse(body.as_bytes()) {
            pairs.insert(key.into_owned(), Value::String(value.into_owned()));
        }
        Value::Object(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_pairs_are_preserved() {
        let decoded = UrlencodedDecoder.decode("a=1&b=two&c=%20three%20").await;
        assert_eq!(decoded, json!({ "a": "1", "b": "two", "c": " three " }));
    }

    #[tokio::test]
    async fn test_round_trip_preserves_all_keys() {
        let original = [("jsonrpc", "2.0"), ("method", "eth_chainId"), ("id", "1")];
        let body: String = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(original)
            .finish();

        let decoded = UrlencodedDecoder.decode(&body).await;
        for (key, value) in original {
            assert_eq!(decoded[key], json!(value));
        }
    }

    #[tokio::test]
    async fn test_valueless_key_decodes_to_empty_string() {
        let decoded = UrlencodedDecoder.decode("flag&x=1").await;
        assert_eq!(decoded, json!({ "flag": "", "x": "1" }));
    }
}

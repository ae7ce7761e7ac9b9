//! Pass-through JSON decoder.

use async_trait::async_trait;
use serde_json::Value;

use super::{opaque_body, BodyDecoder};

/// Parses the body as generic JSON with no semantic interpretation.
pub struct JsonDecoder;

#[async_trait]
impl BodyDecoder for JsonDecoder {
    async fn decode(&self, body: &str) -> Value {
        serde_json::from_str(body).unwrap_or_else(|_| opaque_body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_valid_json_round_trips() {
        let decoded = JsonDecoder.decode(r#"{"id":1,"method":"eth_blockNumber","params":[]}"#).await;
        assert_eq!(decoded, json!({ "id": 1, "method": "eth_blockNumber", "params": [] }));
    }

    #[tokio::test]
    async fn test_malformed_body_degrades_to_raw() {
        let decoded = JsonDecoder.decode("{oops").await;
        assert_eq!(decoded, json!({ "body": "{oops" }));
    }
}

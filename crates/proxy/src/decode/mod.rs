//! Body decoders: turn a raw body string into a structured, loggable value.
//!
//! A decoder variant is selected once per proxy run. Decoding is strictly
//! best-effort: no variant may fail for malformed input, because the decoded
//! value only feeds the traffic log while the raw bytes are forwarded
//! regardless.

mod eth;
mod json;
mod urlencoded;

pub use eth::{EthDecoder, RpcMethod};
pub use json::JsonDecoder;
pub use urlencoded::UrlencodedDecoder;

use std::sync::Arc;

use async_trait::async_trait;
use eyre::{bail, Result};
use serde_json::{json, Value};

use crate::interfaces::known_interfaces;

/// Names of the registered decoder variants, in selection order.
pub const DECODER_NAMES: &[&str] = &["eth", "json", "urlencoded"];

/// A strategy for decoding request and response bodies for logging.
#[async_trait]
pub trait BodyDecoder: Send + Sync {
    /// One-time setup against the upstream endpoint before the listener
    /// opens. Variants that need no upstream context keep the default no-op.
    async fn init(&self, _upstream: &str) -> Result<()> {
        Ok(())
    }

    /// Decodes a raw body into a loggable value.
    ///
    /// Must not fail: malformed input degrades to the raw body wrapped via
    /// [`opaque_body`].
    async fn decode(&self, body: &str) -> Value;
}

/// Wraps a body that could not be decoded so it still logs as-is.
pub fn opaque_body(body: &str) -> Value {
    json!({ "body": body })
}

/// Instantiates the decoder variant registered under `name`.
///
/// Unknown names are a configuration error.
pub fn decoder_by_name(name: &str) -> Result<Arc<dyn BodyDecoder>> {
    match name {
        "eth" => Ok(Arc::new(EthDecoder::new(known_interfaces())?)),
        "json" => Ok(Arc::new(JsonDecoder)),
        "urlencoded" => Ok(Arc::new(UrlencodedDecoder)),
        other => bail!("unknown decoder {other:?}, expected one of {DECODER_NAMES:?}"),
    }
}

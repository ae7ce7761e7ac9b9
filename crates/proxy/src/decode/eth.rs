//! Protocol-aware decoder for Ethereum JSON-RPC bodies.
//!
//! Requests are registered with the correlator so the matching response can
//! be decoded when it arrives. Call data and return data are resolved against
//! the interface registry using the active chain id, which is itself learned
//! by observing `eth_chainId` responses flowing through the proxy.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{hex, Address, Selector};
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{opaque_body, BodyDecoder};
use crate::{correlator::Correlator, interfaces::InterfaceRegistry, sol_value::sol_value_to_json};

/// Chain id assumed until the upstream tells us otherwise.
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// The recognized JSON-RPC method set.
///
/// Closed on purpose: adding a decoded method means adding a variant here and
/// a match arm in the decoder, visible at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcMethod {
    /// `eth_chainId`
    ChainId,
    /// `eth_call`
    Call,
    /// `eth_getLogs`
    GetLogs,
    /// Any other method; logged and correlated but not interpreted.
    Other(String),
}

impl RpcMethod {
    /// Classifies a method name.
    pub fn parse(name: &str) -> Self {
        match name {
            "eth_chainId" => Self::ChainId,
            "eth_call" => Self::Call,
            "eth_getLogs" => Self::GetLogs,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire name of the method.
    pub fn name(&self) -> &str {
        match self {
            Self::ChainId => "eth_chainId",
            Self::Call => "eth_call",
            Self::GetLogs => "eth_getLogs",
            Self::Other(name) => name,
        }
    }
}

/// Decoder for Ethereum JSON-RPC request/response bodies.
///
/// Owns the correlator and the active chain id; one instance serves one
/// proxy run, so two proxies against two upstreams cannot corrupt each
/// other's correlation state.
pub struct EthDecoder {
    correlator: Correlator,
    interfaces: InterfaceRegistry,
    chain_id: Arc<AtomicU64>,
    client: reqwest::Client,
}

impl EthDecoder {
    /// Creates a decoder over the given interface registry.
    pub fn new(interfaces: InterfaceRegistry) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;

        Ok(Self {
            correlator: Correlator::new(),
            interfaces,
            chain_id: Arc::new(AtomicU64::new(DEFAULT_CHAIN_ID)),
            client,
        })
    }

    /// The chain id used to pick the interface table partition.
    pub fn chain_id(&self) -> u64 {
        self.chain_id.load(Ordering::SeqCst)
    }

    /// The correlator tracking this decoder's in-flight calls.
    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    /// Registers a pending call whose response passes through undecoded,
    /// tagged with the method that produced it.
    async fn register_passthrough(&self, id: u64, method: &str) {
        let method_owned = method.to_string();
        self.correlator
            .register(
                id,
                Some(method.to_string()),
                Box::new(move |result| {
                    json!({ "id": id, "method": method_owned, "result": result })
                }),
            )
            .await;
    }

    async fn decode_chain_id_request(&self, id: u64) -> Value {
        let chain_id = Arc::clone(&self.chain_id);
        self.correlator
            .register(
                id,
                Some("eth_chainId".to_string()),
                Box::new(move |result| match parse_quantity(&result) {
                    Some(new_chain_id) => {
                        chain_id.store(new_chain_id, Ordering::SeqCst);
                        json!({ "id": id, "method": "eth_chainId", "result": new_chain_id })
                    }
                    None => json!({ "id": id, "method": "eth_chainId", "result": result }),
                }),
            )
            .await;

        // Nothing else to show: eth_chainId takes no params.
        json!({ "id": id, "method": "eth_chainId" })
    }

    async fn decode_call_request(&self, id: u64, payload: &Value) -> Value {
        let call = payload.pointer("/params/0");
        let to = call.and_then(|c| c.get("to")).and_then(Value::as_str);
        let data = call.and_then(|c| c.get("data")).and_then(Value::as_str);

        let (Some(to), Some(data)) = (to, data) else {
            self.register_passthrough(id, "eth_call").await;
            return payload.clone();
        };

        let abi = match to.parse::<Address>() {
            Ok(address) => self.interfaces.resolve(self.chain_id(), address).await,
            Err(_) => None,
        };

        let Some((function, args)) = abi.as_deref().and_then(|abi| decode_call_data(abi, data))
        else {
            // Unknown interface or undecodable data: keep the call data opaque.
            self.register_passthrough(id, "eth_call").await;
            return json!({ "id": id, "method": "eth_call", "to": to, "data": data });
        };

        debug!("Decoded eth_call to {to} as {}", function.name);

        let args: Vec<Value> = args.iter().map(sol_value_to_json).collect();
        let fn_name = function.name.clone();
        let to_owned = to.to_string();
        self.correlator
            .register(
                id,
                Some("eth_call".to_string()),
                Box::new(move |result| match decode_return_data(&function, &result) {
                    Some(values) => json!({
                        "id": id,
                        "method": "eth_call",
                        "result": {
                            "fn": function.name,
                            "address": to_owned,
                            "return": values,
                        },
                    }),
                    None => json!({ "id": id, "method": "eth_call", "result": result }),
                }),
            )
            .await;

        json!({
            "id": id,
            "method": "eth_call",
            "to": to,
            "data": { "fn": fn_name, "args": args },
        })
    }

    async fn decode_get_logs_request(&self, id: u64, payload: &Value) -> Value {
        self.register_passthrough(id, "eth_getLogs").await;

        // TODO(topic decoding): resolve topics against the registry the way
        // call data is resolved.
        let filter = payload.pointer("/params/0");
        json!({
            "id": id,
            "method": "eth_getLogs",
            "address": filter.and_then(|f| f.get("address")).cloned().unwrap_or(Value::Null),
            "topics": filter.and_then(|f| f.get("topics")).cloned().unwrap_or(Value::Null),
        })
    }
}

#[async_trait]
impl BodyDecoder for EthDecoder {
    /// Seeds the active chain id with a single `eth_chainId` query against
    /// the upstream endpoint.
    async fn init(&self, upstream: &str) -> Result<()> {
        let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "eth_chainId", "params": [] });
        let response: Value =
            self.client.post(upstream).json(&request).send().await?.json().await?;

        let chain_id = response
            .get("result")
            .and_then(parse_quantity)
            .ok_or_else(|| eyre!("upstream returned no chain id: {response}"))?;

        self.chain_id.store(chain_id, Ordering::SeqCst);
        info!("Active chain id: {chain_id}");
        Ok(())
    }

    async fn decode(&self, body: &str) -> Value {
        let Ok(payload) = serde_json::from_str::<Value>(body) else {
            return opaque_body(body);
        };

        let id = payload.get("id").and_then(Value::as_u64);

        // Response path: pair with the pending call that produced it.
        if let Some(result) = payload.get("result") {
            return match id {
                Some(id) => self.correlator.resolve(id, result.clone()).await,
                None => payload,
            };
        }

        // Request path. Without a numeric id there is nothing to correlate,
        // so the payload is logged as-is.
        let method = payload.get("method").and_then(Value::as_str);
        let (Some(id), Some(method)) = (id, method) else {
            return payload;
        };

        match RpcMethod::parse(method) {
            RpcMethod::ChainId => self.decode_chain_id_request(id).await,
            RpcMethod::Call => self.decode_call_request(id, &payload).await,
            RpcMethod::GetLogs => self.decode_get_logs_request(id, &payload).await,
            RpcMethod::Other(method) => {
                self.register_passthrough(id, &method).await;
                payload
            }
        }
    }
}

/// Parses a hex quantity value (`"0x1"`) into its numeric form.
fn parse_quantity(value: &Value) -> Option<u64> {
    let text = value.as_str()?;
    u64::from_str_radix(text.trim_start_matches("0x"), 16).ok()
}

/// Matches call data against the interface by selector and decodes the
/// argument tuple.
fn decode_call_data(abi: &JsonAbi, data: &str) -> Option<(Function, Vec<DynSolValue>)> {
    let calldata = hex::decode(data).ok()?;
    if calldata.len() < 4 {
        return None;
    }

    let selector = Selector::from_slice(&calldata[..4]);
    let function = abi.function_by_selector(selector)?.clone();
    let args = function.abi_decode_input(&calldata[4..]).ok()?;
    Some((function, args))
}

/// Decodes return bytes against the function that produced them.
fn decode_return_data(function: &Function, result: &Value) -> Option<Vec<Value>> {
    let bytes = hex::decode(result.as_str()?).ok()?;
    let values = function.abi_decode_output(&bytes).ok()?;
    Some(values.iter().map(sol_value_to_json).collect())
}

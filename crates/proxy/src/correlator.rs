//! Pairing of in-flight JSON-RPC calls with their eventual responses.

use std::collections::HashMap;

use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

/// Capability that turns a response's `result` payload into its decoded,
/// loggable form. Registered alongside the request that produced it.
pub type ResolveFn = Box<dyn FnOnce(Value) -> Value + Send>;

/// One in-flight call awaiting its response.
struct PendingCall {
    method: Option<String>,
    resolve: ResolveFn,
}

/// Tracks in-flight calls by their caller-assigned numeric id so that a later
/// response body can be paired with the request that produced it.
///
/// Ids are not guaranteed unique across time or across client connections; on
/// a collision the newest registration wins and the previous entry becomes
/// permanently unreachable. Entries for responses that never arrive are never
/// removed. One correlator is owned by one decoder instance.
#[derive(Default)]
pub struct Correlator {
    pending: Mutex<HashMap<u64, PendingCall>>,
}

impl Correlator {
    /// Creates an empty correlator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending call under `id`.
    ///
    /// An existing entry for the same id is silently overwritten; callers must
    /// tolerate this.
    pub async fn register(&self, id: u64, method: Option<String>, resolve: ResolveFn) {
        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.insert(id, PendingCall { method, resolve }) {
            debug!(
                "Pending call {id} ({}) overwritten before its response arrived",
                previous.method.as_deref().unwrap_or("<unknown>")
            );
        }
    }

    /// Resolves the pending call registered under `id` with the response's
    /// `result` payload, removing it.
    ///
    /// A response with no matching entry is returned as the raw
    /// `{"id", "result"}` pair so that unregistered responses still log,
    /// just undecoded.
    pub async fn resolve(&self, id: u64, result: Value) -> Value {
        let entry = self.pending.lock().await.remove(&id);
        match entry {
            Some(call) => (call.resolve)(result),
            None => {
                debug!("No pending call for response id {id}");
                json!({ "id": id, "result": result })
            }
        }
    }

    /// Number of calls still awaiting a response.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Whether a call is pending under `id`.
    pub async fn is_pending(&self, id: u64) -> bool {
        self.pending.lock().await.contains_key(&id)
    }
}

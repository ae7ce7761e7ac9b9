// rpclens - inspecting reverse proxy for Ethereum JSON-RPC
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Resolution of `(chain id, contract address)` pairs to known contract
//! interfaces, with lazy, memoized loading.

mod known;

pub use known::known_interfaces;

use std::{collections::HashMap, future::Future, sync::Arc};

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use eyre::Result;
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::{debug, warn};

type AbiLoader = Arc<dyn Fn() -> BoxFuture<'static, Result<JsonAbi>> + Send + Sync>;

/// One resolvable contract interface: a display name plus an idempotent,
/// lazily-invoked loader returning the interface's callable signatures.
#[derive(Clone)]
pub struct InterfaceEntry {
    /// Human-readable contract name.
    pub name: &'static str,
    loader: AbiLoader,
}

impl InterfaceEntry {
    /// Creates an entry from a name and an async loader.
    pub fn new<F, Fut>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JsonAbi>> + Send + 'static,
    {
        Self {
            name,
            loader: Arc::new(move || Box::pin(loader()) as BoxFuture<'static, Result<JsonAbi>>),
        }
    }
}

/// Maps `(chain id, contract address)` to a lazily-loaded contract interface.
///
/// The static entry table is fixed at construction; loaded interfaces are
/// memoized so that each entry's loader runs at most once for the registry's
/// lifetime. Absence of an entry, and a failing loader, both degrade to
/// `None` rather than an error.
pub struct InterfaceRegistry {
    entries: HashMap<u64, HashMap<Address, InterfaceEntry>>,
    cache: RwLock<HashMap<(u64, Address), Arc<JsonAbi>>>,
}

impl InterfaceRegistry {
    /// Creates a registry over the given entry table.
    pub fn new(entries: HashMap<u64, HashMap<Address, InterfaceEntry>>) -> Self {
        Self { entries, cache: RwLock::new(HashMap::new()) }
    }

    /// Creates a registry with no entries.
    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    /// Adds an entry, replacing any previous entry for the same key.
    pub fn with_entry(mut self, chain_id: u64, address: Address, entry: InterfaceEntry) -> Self {
        self.entries.entry(chain_id).or_default().insert(address, entry);
        self
    }

    /// Whether an entry exists for `(chain_id, address)`, loaded or not.
    pub fn contains(&self, chain_id: u64, address: Address) -> bool {
        self.entries.get(&chain_id).is_some_and(|chain| chain.contains_key(&address))
    }

    /// Resolves `(chain_id, address)` to its interface, loading it on first
    /// use.
    ///
    /// Returns `None` for unknown keys and for entries whose loader fails;
    /// failures are not cached, so a later resolution retries the loader.
    pub async fn resolve(&self, chain_id: u64, address: Address) -> Option<Arc<JsonAbi>> {
        let entry = self.entries.get(&chain_id)?.get(&address)?;

        if let Some(abi) = self.cache.read().await.get(&(chain_id, address)) {
            return Some(abi.clone());
        }

        // Holding the write lock across the load serializes first-time loads
        // and guarantees the loader runs at most once per key.
        let mut cache = self.cache.write().await;
        if let Some(abi) = cache.get(&(chain_id, address)) {
            return Some(abi.clone());
        }

        match (entry.loader)().await {
            Ok(abi) => {
                debug!("Loaded interface {} for chain {chain_id} at {address}", entry.name);
                let abi = Arc::new(abi);
                cache.insert((chain_id, address), abi.clone());
                Some(abi)
            }
            Err(e) => {
                warn!(
                    "Failed to load interface {} for chain {chain_id} at {address}: {e}",
                    entry.name
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TOKEN: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

    fn erc20_entry(calls: Arc<AtomicUsize>) -> InterfaceEntry {
        InterfaceEntry::new("ERC20", move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::from_str(include_str!("abis/erc20.json"))?)
            }
        })
    }

    #[tokio::test]
    async fn test_unknown_key_resolves_to_none() {
        let registry = InterfaceRegistry::empty();
        assert!(registry.resolve(1, TOKEN).await.is_none());

        let registry =
            InterfaceRegistry::empty().with_entry(1, TOKEN, erc20_entry(Default::default()));
        // Known address on the wrong chain is still unknown.
        assert!(registry.resolve(130, TOKEN).await.is_none());
    }

    #[tokio::test]
    async fn test_loader_runs_at_most_once_per_key() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry =
            InterfaceRegistry::empty().with_entry(1, TOKEN, erc20_entry(calls.clone()));

        let first = registry.resolve(1, TOKEN).await.unwrap();
        let second = registry.resolve(1, TOKEN).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_loader_failure_degrades_and_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let entry = InterfaceEntry::new("Flaky", move || {
            let calls = counter.clone();
            async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                if attempt == 0 {
                    eyre::bail!("interface artifact unavailable");
                }
                Ok(serde_json::from_str(include_str!("abis/erc20.json"))?)
            }
        });
        let registry = InterfaceRegistry::empty().with_entry(1, TOKEN, entry);

        assert!(registry.resolve(1, TOKEN).await.is_none());
        assert!(registry.resolve(1, TOKEN).await.is_some());
        // Memoized after the first success.
        assert!(registry.resolve(1, TOKEN).await.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_address_lookup_is_case_insensitive() {
        let registry =
            InterfaceRegistry::empty().with_entry(1, TOKEN, erc20_entry(Default::default()));

        let mixed: Address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".parse().unwrap();
        assert!(registry.resolve(1, mixed).await.is_some());
    }
}

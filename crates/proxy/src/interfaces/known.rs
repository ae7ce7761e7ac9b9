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

//! The static table of known contract interfaces.
//!
//! This is configuration data, not behavior: add a chain or an address here
//! and the registry picks it up without any algorithmic change. Interface
//! artifacts live in `abis/` as standard Ethereum ABI JSON and are parsed on
//! first resolution.

use std::collections::HashMap;

use alloy_primitives::{address, Address};

use super::{InterfaceEntry, InterfaceRegistry};

/// Multicall3 is deployed at the same address on every supported chain.
const MULTICALL3: Address = address!("ca11bde05977b3631167028862be2a173976ca11");

// Ethereum mainnet
const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
const DAI: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");

// Unichain
const UNISWAP_V2_ROUTER02: Address = address!("284f11109359a7e1306c3e447ef14d38400063ff");

macro_rules! abi_entry {
    ($name:literal, $artifact:literal) => {
        InterfaceEntry::new($name, || async {
            Ok(serde_json::from_str(include_str!(concat!("abis/", $artifact)))?)
        })
    };
}

fn erc20(name: &'static str) -> InterfaceEntry {
    InterfaceEntry::new(name, || async {
        Ok(serde_json::from_str(include_str!("abis/erc20.json"))?)
    })
}

fn multicall3() -> (Address, InterfaceEntry) {
    (MULTICALL3, abi_entry!("Multicall3", "multicall3.json"))
}

/// Builds the registry pre-seeded with every known contract interface.
pub fn known_interfaces() -> InterfaceRegistry {
    let mut entries: HashMap<u64, HashMap<Address, InterfaceEntry>> = HashMap::new();

    // Ethereum mainnet
    entries.insert(
        1,
        HashMap::from([
            multicall3(),
            (USDC, erc20("USDC")),
            (WETH, erc20("WETH9")),
            (DAI, erc20("DAI")),
        ]),
    );

    // Unichain
    entries.insert(
        130,
        HashMap::from([
            multicall3(),
            (UNISWAP_V2_ROUTER02, abi_entry!("UniswapV2Router02", "uniswap_v2_router02.json")),
        ]),
    );

    InterfaceRegistry::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_artifacts_parse() {
        let registry = known_interfaces();

        for (chain_id, address) in
            [(1, MULTICALL3), (1, USDC), (1, WETH), (1, DAI), (130, MULTICALL3), (130, UNISWAP_V2_ROUTER02)]
        {
            let abi = registry.resolve(chain_id, address).await;
            assert!(abi.is_some(), "interface at chain {chain_id} address {address} did not load");
            assert!(abi.unwrap().functions().count() > 0);
        }
    }

    #[tokio::test]
    async fn test_multicall_is_registered_per_chain() {
        let registry = known_interfaces();
        assert!(registry.contains(1, MULTICALL3));
        assert!(registry.contains(130, MULTICALL3));
        assert!(!registry.contains(42, MULTICALL3));
    }
}

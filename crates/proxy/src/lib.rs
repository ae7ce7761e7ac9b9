// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0
//! rpclens proxy library
//!
//! An inspecting reverse proxy for JSON-RPC-over-HTTP traffic. Every request
//! and response is forwarded byte-for-byte while a pluggable body decoder
//! produces a human-readable rendition of the same traffic for logging,
//! correlating in-flight calls with their responses and resolving known
//! contract interfaces where possible. Decoding never gates forwarding.

pub mod correlator;
pub mod decode;
pub mod interfaces;
pub mod proxy;
pub mod sink;
pub mod sol_value;

pub use correlator::Correlator;
pub use decode::{decoder_by_name, BodyDecoder};
pub use interfaces::InterfaceRegistry;
pub use proxy::{ProxyServer, ProxyServerBuilder};
pub use sink::LogSink;

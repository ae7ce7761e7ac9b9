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

//! String encoding conversions backing the `encode` and `decode` commands.

use std::{fmt, str::FromStr};

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use eyre::{bail, Result};

/// A supported text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Plain UTF-8 text (identity conversion).
    Utf8,
    /// `0x`-prefixed hex bytes.
    Hex,
    /// Space-separated 8-bit binary groups, e.g. `01101000 01101001`.
    Binary,
    /// Standard base64 with padding.
    Base64,
    /// URL-safe base64 without padding.
    Base64Url,
}

impl Encoding {
    /// All supported encodings, in display order.
    pub const ALL: &'static [Self] =
        &[Self::Utf8, Self::Hex, Self::Binary, Self::Base64, Self::Base64Url];

    /// The canonical name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Hex => "hex",
            Self::Binary => "binary",
            Self::Base64 => "base64",
            Self::Base64Url => "base64url",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" | "ascii" => Ok(Self::Utf8),
            "hex" => Ok(Self::Hex),
            "binary" => Ok(Self::Binary),
            "base64" => Ok(Self::Base64),
            "base64url" => Ok(Self::Base64Url),
            other => bail!("unknown encoding: {other}"),
        }
    }
}

/// Encodes UTF-8 `text` into the given encoding.
pub fn encode(text: &str, encoding: Encoding) -> String {
    match encoding {
        Encoding::Utf8 => text.to_string(),
        Encoding::Hex => format!("0x{}", hex::encode(text.as_bytes())),
        Encoding::Binary => text_to_binary(text),
        Encoding::Base64 => STANDARD.encode(text.as_bytes()),
        Encoding::Base64Url => URL_SAFE_NO_PAD.encode(text.as_bytes()),
    }
}

/// Decodes `input` from the given encoding back into text.
///
/// Byte sequences that are not valid UTF-8 are replaced rather than rejected,
/// matching the lossy conversion of the original tooling this replaces.
pub fn decode(input: &str, encoding: Encoding) -> Result<String> {
    let bytes = match encoding {
        Encoding::Utf8 => return Ok(input.to_string()),
        Encoding::Hex => hex::decode(input.strip_prefix("0x").unwrap_or(input))?,
        Encoding::Binary => return binary_to_text(input),
        Encoding::Base64 => STANDARD.decode(input)?,
        Encoding::Base64Url => URL_SAFE_NO_PAD.decode(input)?,
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Converts text to a string of space-separated 8-bit binary groups.
pub fn text_to_binary(text: &str) -> String {
    text.bytes().map(|byte| format!("{byte:08b}")).collect::<Vec<_>>().join(" ")
}

/// Converts a string of space-separated binary groups back to text.
///
/// An optional leading `0b` is accepted.
pub fn binary_to_text(binary: &str) -> Result<String> {
    let binary = binary.strip_prefix("0b").unwrap_or(binary);
    let bytes = binary
        .split_whitespace()
        .map(|group| u8::from_str_radix(group, 2))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

//! `rpclens encode` / `rpclens decode` - string encoding conversions.

use clap::{Parser, ValueEnum};
use eyre::Result;
use rpclens_common::encoding::{self, Encoding};

/// Arguments for the encode command
#[derive(Debug, Parser)]
pub struct EncodeArgs {
    /// The input string to encode
    pub input: String,

    /// The encoding type
    #[arg(short, long, value_enum)]
    pub encoding: EncodingArg,
}

/// Arguments for the decode command
#[derive(Debug, Parser)]
pub struct DecodeArgs {
    /// The input string to decode
    pub input: String,

    /// The encoding type
    #[arg(short, long, value_enum)]
    pub encoding: EncodingArg,
}

/// The encodings selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EncodingArg {
    /// 7-bit text, treated as UTF-8
    Ascii,
    /// Standard base64 with padding
    Base64,
    /// URL-safe base64 without padding
    Base64url,
    /// Space-separated 8-bit binary groups
    Binary,
    /// `0x`-prefixed hex bytes
    Hex,
    /// Plain UTF-8 text
    #[value(name = "utf-8")]
    Utf8,
}

impl EncodingArg {
    fn encoding(self) -> Encoding {
        match self {
            Self::Ascii | Self::Utf8 => Encoding::Utf8,
            Self::Base64 => Encoding::Base64,
            Self::Base64url => Encoding::Base64Url,
            Self::Binary => Encoding::Binary,
            Self::Hex => Encoding::Hex,
        }
    }
}

/// Encode the input and print the result
pub fn run_encode(args: &EncodeArgs) -> Result<()> {
    println!("{}", encoding::encode(&args.input, args.encoding.encoding()));
    Ok(())
}

/// Decode the input and print the result
pub fn run_decode(args: &DecodeArgs) -> Result<()> {
    println!("{}", encoding::decode(&args.input, args.encoding.encoding())?);
    Ok(())
}

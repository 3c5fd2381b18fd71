//! Text encodings for string fields.

use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::errors::Error;

/// How the bytes of a string field are turned into text.
///
/// `Base64` and `Hex` render the raw bytes in that notation rather than
/// decoding them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// 7-bit ASCII; the high bit of every byte is dropped.
    #[default]
    Ascii,
    /// UTF-8; invalid sequences become U+FFFD.
    Utf8,
    /// UTF-16, little-endian code units; a trailing odd byte is ignored.
    Utf16Le,
    /// ISO-8859-1: every byte is one code point.
    Latin1,
    Base64,
    Hex,
}

impl Encoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Ascii => bytes.iter().map(|&byte| (byte & 0x7F) as char).collect(),
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Encoding::Latin1 => bytes.iter().map(|&byte| byte as char).collect(),
            Encoding::Base64 => STANDARD.encode(bytes),
            Encoding::Hex => hex::encode(bytes),
        }
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(Encoding::Ascii),
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(Encoding::Utf16Le),
            "latin1" | "binary" => Ok(Encoding::Latin1),
            "base64" => Ok(Encoding::Base64),
            "hex" => Ok(Encoding::Hex),
            _ => Err(Error::bad_parameter("encoding", s)),
        }
    }
}

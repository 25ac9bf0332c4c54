//! `xs:base64Binary` and `xs:hexBinary`.

use crate::error::Error;
use crate::types::XdmType;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryEncoding {
    Base64,
    Hex,
}

impl BinaryEncoding {
    pub fn xdm_type(self) -> XdmType {
        match self {
            BinaryEncoding::Base64 => XdmType::Base64Binary,
            BinaryEncoding::Hex => XdmType::HexBinary,
        }
    }

    pub fn from_type(t: XdmType) -> Option<Self> {
        match t {
            XdmType::Base64Binary => Some(BinaryEncoding::Base64),
            XdmType::HexBinary => Some(BinaryEncoding::Hex),
            _ => None,
        }
    }
}

/// Octets plus the encoding that names their type. Two values are equal only
/// when both the bytes and the encoding match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BinaryValue {
    bytes: Vec<u8>,
    encoding: BinaryEncoding,
}

impl BinaryValue {
    pub fn new(bytes: Vec<u8>, encoding: BinaryEncoding) -> Self {
        Self { bytes, encoding }
    }

    /// Decodes the lexical form; whitespace inside base64 text is ignored.
    pub fn parse(encoding: BinaryEncoding, input: &str) -> Result<Self, Error> {
        let bytes = match encoding {
            BinaryEncoding::Base64 => {
                let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
                BASE64_STANDARD
                    .decode(compact.as_bytes())
                    .map_err(|e| Error::invalid_lexical(XdmType::Base64Binary, input, e))?
            }
            BinaryEncoding::Hex => decode_hex(input.trim()).ok_or_else(|| {
                Error::invalid_lexical(XdmType::HexBinary, input, "odd length or non-hex digit")
            })?,
        };
        Ok(Self { bytes, encoding })
    }

    pub fn encoding(&self) -> BinaryEncoding {
        self.encoding
    }

    pub fn xdm_type(&self) -> XdmType {
        self.encoding.xdm_type()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Same octets under the other encoding.
    pub fn with_encoding(&self, encoding: BinaryEncoding) -> Self {
        Self {
            bytes: self.bytes.clone(),
            encoding,
        }
    }

    pub fn to_lexical(&self) -> String {
        match self.encoding {
            BinaryEncoding::Base64 => BASE64_STANDARD.encode(&self.bytes),
            BinaryEncoding::Hex => encode_hex_upper(&self.bytes),
        }
    }
}

impl fmt::Display for BinaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lexical())
    }
}

fn decode_hex(input: &str) -> Option<Vec<u8>> {
    if !input.len().is_multiple_of(2) {
        return None;
    }
    let digits: Vec<u8> = input
        .chars()
        .map(|c| c.to_digit(16).and_then(|d| u8::try_from(d).ok()))
        .collect::<Option<_>>()?;
    Some(digits.chunks_exact(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

fn encode_hex_upper(bytes: &[u8]) -> String {
    use fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02X}");
    }
    out
}

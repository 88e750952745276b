// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Store (canister) identifiers.
//!
//! The textual form is the remote system's principal encoding: a CRC-32
//! (big endian) of the raw bytes is prepended, the result is base32 encoded
//! (lowercase, no padding) and split into groups of five characters. Raw
//! hex (optionally `0x` prefixed) is accepted too.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseStoreIdError {
    #[error("store id is not valid base32: {0}")]
    InvalidEncoding(String),
    #[error("store id is too short to carry a checksum")]
    TooShort,
    #[error("store id is {0} bytes, at most 29 allowed")]
    TooLong(usize),
    #[error("store id checksum mismatch")]
    ChecksumMismatch,
    #[error("store id is not in canonical form, expected {0}")]
    NotCanonical(String),
}

/// Identifies the logical sub-store a certificate path lookup targets.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreId(Vec<u8>);

impl StoreId {
    pub const MAX_LEN: usize = 29;

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, ParseStoreIdError> {
        let bytes = bytes.into();
        if bytes.len() > Self::MAX_LEN {
            return Err(ParseStoreIdError::TooLong(bytes.len()));
        }
        Ok(StoreId(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_text(&self) -> String {
        let mut full = Vec::with_capacity(4 + self.0.len());
        full.extend_from_slice(&crc32fast::hash(&self.0).to_be_bytes());
        full.extend_from_slice(&self.0);

        let encoded = base32_encode(&full);
        let mut out = String::with_capacity(encoded.len() + encoded.len() / 5);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % 5 == 0 {
                out.push('-');
            }
            out.push(c);
        }
        out
    }
}

impl FromStr for StoreId {
    type Err = ParseStoreIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        // The text form always carries dashes; anything without is raw hex.
        if !text.contains('-') {
            return parse_hex(text);
        }

        let lowered = text.to_ascii_lowercase();
        let compact: String = lowered.chars().filter(|c| *c != '-').collect();
        let full = base32_decode(&compact)
            .ok_or_else(|| ParseStoreIdError::InvalidEncoding(text.to_string()))?;
        if full.len() < 4 {
            return Err(ParseStoreIdError::TooShort);
        }

        let (checksum, raw) = full.split_at(4);
        if checksum != crc32fast::hash(raw).to_be_bytes() {
            return Err(ParseStoreIdError::ChecksumMismatch);
        }

        let id = StoreId::from_bytes(raw.to_vec())?;
        let canonical = id.to_text();
        if canonical != lowered {
            return Err(ParseStoreIdError::NotCanonical(canonical));
        }
        Ok(id)
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreId({})", self.to_text())
    }
}

fn parse_hex(text: &str) -> Result<StoreId, ParseStoreIdError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if text.is_empty() {
        return Err(ParseStoreIdError::InvalidEncoding(text.to_string()));
    }
    let bytes =
        hex::decode(digits).map_err(|_| ParseStoreIdError::InvalidEncoding(text.to_string()))?;
    StoreId::from_bytes(bytes)
}

fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8 + 4) / 5);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &b in bytes {
        buffer = (buffer << 8) | u32::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for c in text.bytes() {
        let value = ALPHABET.iter().position(|a| *a == c)? as u32;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    // Leftover bits are padding and must be zero.
    if buffer & ((1u32 << bits) - 1) != 0 {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn management_canister_is_empty() {
        let id: StoreId = "aaaaa-aa".parse().unwrap();
        assert!(id.as_bytes().is_empty());
        assert_eq!(id.to_text(), "aaaaa-aa");
    }

    #[test]
    fn parses_first_local_canister() {
        let id: StoreId = "rrkah-fqaaa-aaaaa-aaaaq-cai".parse().unwrap();
        assert_eq!(id.as_bytes(), &[0, 0, 0, 0, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn parses_hex_form() {
        let id: StoreId = "0x00000000000000010101".parse().unwrap();
        assert_eq!(id.to_text(), "rrkah-fqaaa-aaaaa-aaaaq-cai");
        let bare: StoreId = "00000000000000010101".parse().unwrap();
        assert_eq!(bare, id);
        assert_eq!("0x".parse::<StoreId>().unwrap(), "aaaaa-aa".parse::<StoreId>().unwrap());

        assert!(matches!("".parse::<StoreId>(), Err(ParseStoreIdError::InvalidEncoding(_))));
        assert!(matches!("0xabc".parse::<StoreId>(), Err(ParseStoreIdError::InvalidEncoding(_))));
        assert!(matches!(
            "00".repeat(30).parse::<StoreId>(),
            Err(ParseStoreIdError::TooLong(30))
        ));
    }

    #[test]
    fn text_form_round_trips() {
        let id = StoreId::from_bytes(vec![0, 0, 0, 0, 0, 0xf0, 0x10, 0x42, 0x01, 0x01]).unwrap();
        let parsed: StoreId = id.to_text().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_bad_checksum() {
        // Flip one character in a valid id.
        let err = "rrkah-fqaaa-aaaaa-aaaar-cai".parse::<StoreId>().unwrap_err();
        assert!(matches!(
            err,
            ParseStoreIdError::ChecksumMismatch | ParseStoreIdError::InvalidEncoding(_)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!("not a principal!".parse::<StoreId>().is_err());
        assert!(StoreId::from_bytes(vec![0u8; 30]).is_err());
    }
}

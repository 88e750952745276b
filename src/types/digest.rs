// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Fixed-size digests.

use core::fmt;

use crate::error::{VerifyError, VerifyResult};

/// A 32-byte digest: a blob's content address or a Merkle root.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub const LEN: usize = 32;
    pub const ZERO: Digest = Digest([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Exactly 32 bytes, or `None`.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(Digest)
    }

    /// Takes the first 32 bytes of `bytes`, zero-padding shorter input.
    ///
    /// Certified data committed by a store is an arbitrary blob; only its
    /// leading 32 bytes are interpreted as a root digest.
    pub fn from_prefix(bytes: &[u8]) -> Self {
        let mut out = [0u8; 32];
        let n = bytes.len().min(Self::LEN);
        out[..n].copy_from_slice(&bytes[..n]);
        Digest(out)
    }

    /// Parses 64 hex characters, with or without a `0x` prefix.
    pub fn from_hex(text: &str) -> VerifyResult<Self> {
        let trimmed = text.strip_prefix("0x").unwrap_or(text);
        let raw = hex::decode(trimmed).map_err(|_| VerifyError::InvalidHash(text.to_string()))?;
        Self::from_slice(&raw).ok_or_else(|| VerifyError::InvalidHash(text.to_string()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Digest(bytes)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_accepts_optional_prefix() {
        let text = "ab".repeat(32);
        let plain = Digest::from_hex(&text).unwrap();
        let prefixed = Digest::from_hex(&format!("0x{}", text)).unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain.to_hex(), text);
    }

    #[test]
    fn hex_rejects_wrong_length() {
        assert!(matches!(Digest::from_hex("abcd"), Err(VerifyError::InvalidHash(_))));
        assert!(matches!(Digest::from_hex("zz"), Err(VerifyError::InvalidHash(_))));
    }

    #[test]
    fn prefix_pads_and_truncates() {
        let short = Digest::from_prefix(&[7, 7]);
        assert_eq!(&short.0[..2], &[7, 7]);
        assert!(short.0[2..].iter().all(|b| *b == 0));

        let long = Digest::from_prefix(&[9u8; 40]);
        assert_eq!(long, Digest([9u8; 32]));
    }
}

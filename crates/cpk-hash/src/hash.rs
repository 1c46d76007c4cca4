// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::fmt::Display;

use data_encoding::BASE32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(test)]
#[path = "./hash_test.rs"]
mod hash_test;

/// The number of bytes in a digest (sha256).
pub const DIGEST_SIZE: usize = 32;

/// The number of characters in the string form of a digest
/// (unpadded base32 of [`DIGEST_SIZE`] bytes).
pub const ENCODED_DIGEST_SIZE: usize = 52;

/// The bytes of an empty digest. This represents the result of hashing no bytes.
pub const NULL_DIGEST: [u8; DIGEST_SIZE] = [
    0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f, 0xb9,
    0x24, 0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b, 0x78, 0x52,
    0xb8, 0x55,
];

/// Digest is the result of a hashing operation over binary data.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    pub fn from_bytes(digest_bytes: &[u8]) -> crate::Result<Digest> {
        match digest_bytes.try_into() {
            Err(_) => Err(crate::Error::InvalidDigestLength(digest_bytes.len())),
            Ok(bytes) => Ok(Digest(bytes)),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Parse the given string as an encoded digest.
    pub fn parse(digest_str: &str) -> crate::Result<Digest> {
        // the string form is case-insensitive: short forms are
        // presented lowercase while the full form is uppercase
        let mut padded = digest_str.to_uppercase();
        while padded.len() % 8 != 0 {
            padded.push('=');
        }
        let decoded = BASE32
            .decode(padded.as_bytes())
            .map_err(crate::Error::InvalidDigestEncoding)?;
        Self::from_bytes(decoded.as_slice())
    }

    /// An abbreviated form of this digest for humans,
    /// suitable for install path names and log lines.
    pub fn short(&self) -> String {
        let encoded = BASE32.encode(self.as_bytes());
        encoded[..8].to_lowercase()
    }
}

impl Default for Digest {
    fn default() -> Self {
        Digest(NULL_DIGEST)
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_string().as_ref())
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // ignore padding as it's not needed to reparse this value
        let encoded = BASE32.encode(self.as_bytes());
        f.write_str(encoded.trim_end_matches('='))
    }
}

impl std::str::FromStr for Digest {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Digest::parse(s)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl From<[u8; DIGEST_SIZE]> for Digest {
    fn from(bytes: [u8; DIGEST_SIZE]) -> Self {
        Digest(bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Digest::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Hasher accumulates bytes and produces a [`Digest`].
pub struct Hasher(ring::digest::Context);

impl Default for Hasher {
    fn default() -> Self {
        Self(ring::digest::Context::new(&ring::digest::SHA256))
    }
}

impl Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    pub fn digest(self) -> Digest {
        let ring_digest = self.0.finish();
        let bytes: [u8; DIGEST_SIZE] = ring_digest
            .as_ref()
            .try_into()
            .expect("sha256 digest should be the exact desired length");
        Digest(bytes)
    }
}

impl std::io::Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document fingerprints: SHA-256 hashing for log correlation.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
///
/// Submissions log this instead of the document name so that requests can be
/// traced across log lines without leaking what was printed.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// First 12 hex digits of [`hash_bytes`], enough to tell documents apart in
/// logs.
pub fn short_fingerprint(data: &[u8]) -> String {
    let mut full = hash_bytes(data);
    full.truncate(12);
    full
}

/// Incremental version of [`hash_bytes`] for data that arrives in chunks,
/// such as a streamed upload.
#[derive(Default, Clone)]
pub struct Fingerprinter {
    hasher: Sha256,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    /// Full lowercase hex digest.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }

    /// Same prefix as [`short_fingerprint`].
    pub fn finish_short(self) -> String {
        let mut full = self.finish();
        full.truncate(12);
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
    }

    #[test]
    fn hash_known_value() {
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(hash_bytes(b"hello"), expected);
    }

    #[test]
    fn short_fingerprint_is_prefix() {
        let short = short_fingerprint(b"hello");
        assert_eq!(short.len(), 12);
        assert!(hash_bytes(b"hello").starts_with(&short));
    }

    #[test]
    fn chunked_digest_matches_one_shot() {
        let mut streamed = Fingerprinter::new();
        streamed.update(b"hel");
        streamed.update(b"lo");
        assert_eq!(streamed.clone().finish(), hash_bytes(b"hello"));
        assert_eq!(streamed.finish_short(), short_fingerprint(b"hello"));
    }
}

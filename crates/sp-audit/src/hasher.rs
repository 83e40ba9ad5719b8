// hasher.rs — SHA-256 hashing utilities.
//
// All hashes in SuitePilot are SHA-256, encoded as 64-character lowercase
// hex strings: file content baselines, artifact digests, and the audit
// log's chain links all use the same encoding.

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a UTF-8 string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

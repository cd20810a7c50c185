use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a staged document's bytes
pub fn content_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

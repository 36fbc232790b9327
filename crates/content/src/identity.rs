//! Stable document identity.

/// Number of hex characters kept from the digest (128 bits).
pub const IDENTITY_HEX_LEN: usize = 32;

/// Deterministic identity for a document: blake3 over `namespace ++ path`,
/// truncated to 128 bits of lowercase hex.
///
/// Same namespace and same relative path always produce the same key, so a
/// document keeps its remote record across runs.
pub fn identity_key(namespace: &str, path: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(namespace.as_bytes());
    hasher.update(path.as_bytes());
    let hex = hasher.finalize().to_hex();
    hex[..IDENTITY_HEX_LEN].to_string()
}

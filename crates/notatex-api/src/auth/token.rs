//! Opaque bearer token generation and hashing.
//!
//! Tokens are stored as SHA-256 hashes; the raw token is returned to the
//! client once at login and never persisted.

use sha2::{Digest, Sha256};

/// Prefix identifying Notatex bearer tokens.
pub const TOKEN_PREFIX: &str = "ntx_";

// 20 random bytes = 160 bits of entropy.
const TOKEN_RANDOM_BYTES: usize = 20;
const DISPLAY_PREFIX_LEN: usize = 12;

/// Generate a secure bearer token: "ntx_" + 40 hex chars.
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..TOKEN_RANDOM_BYTES).map(|_| rng.random()).collect();

    format!("{}{}", TOKEN_PREFIX, hex::encode(random_bytes))
}

/// SHA-256 hash stored in place of the raw token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Leading characters of the token, kept alongside the hash for
/// identification in logs and listings.
pub fn token_prefix(token: &str) -> String {
    token.chars().take(DISPLAY_PREFIX_LEN).collect()
}

// Digests and random tokens for the admin session gate.

use rand::RngCore;
use sha2::{Digest, Sha256};

// Domain separation constants so a session token digest can never equal a password digest.
const SECRET_DOMAIN: &[u8] = b"SLMOBISECRET";
const TOKEN_DOMAIN: &[u8] = b"SLMOBITOKEN";

/// Hashes a shared secret (the admin password) into a 32-byte digest.
pub fn hash_secret(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SECRET_DOMAIN);
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Hashes a session token; only digests are kept in the session store.
pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(TOKEN_DOMAIN);
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generates a fresh 256-bit session token, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compares two digests without short-circuiting on the first differing byte.
pub fn digests_equal(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn secret_and_token_domains_differ() {
        assert!(!digests_equal(&hash_secret("x"), &hash_token("x")));
        assert!(digests_equal(&hash_secret("pw"), &hash_secret("pw")));
        assert!(!digests_equal(&hash_secret("pw"), &hash_secret("pw ")));
    }
}

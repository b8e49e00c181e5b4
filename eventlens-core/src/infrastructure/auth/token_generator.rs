//! Access token generation, hashing and masking

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::config::CredentialConfig;
use crate::domain::auth::{AccessToken, TokenHash};

/// Issues random access tokens and derives their stored hash
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    /// Random bytes per token (hex encoding doubles the length)
    token_bytes: usize,
    /// Prefix for tokens (e.g., "evl_")
    prefix: String,
}

impl TokenGenerator {
    /// Create a generator with the default prefix and 32 random bytes
    pub fn new() -> Self {
        Self::with_prefix_and_length("evl_".to_string(), 32)
    }

    pub fn with_prefix_and_length(prefix: String, token_bytes: usize) -> Self {
        Self {
            token_bytes,
            prefix,
        }
    }

    pub fn from_config(config: &CredentialConfig) -> Self {
        Self::with_prefix_and_length(config.token_prefix.clone(), config.token_bytes)
    }

    /// Generate a new token and its hash.
    /// Returns (plaintext_token, token_hash)
    pub fn generate(&self) -> (AccessToken, TokenHash) {
        let mut random_bytes = vec![0u8; self.token_bytes];
        rand::rng().fill_bytes(&mut random_bytes);

        let token = format!("{}{}", self.prefix, hex::encode(random_bytes));
        let hash = self.hash_token(&token);

        (AccessToken::new(token), hash)
    }

    /// SHA-256 of the full token, prefix included
    pub fn hash_token(&self, token: &str) -> TokenHash {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        TokenHash::from(hex::encode(hasher.finalize()))
    }

    /// Mask a token for display (prefix, first 4 and last 4 characters)
    pub fn mask_token(&self, token: &str) -> String {
        if token.len() <= 12 || !token.is_ascii() {
            return "*".repeat(token.chars().count());
        }

        match token.strip_prefix(&self.prefix) {
            Some(rest) if rest.len() <= 8 => format!("{}{}", self.prefix, "*".repeat(rest.len())),
            Some(rest) => format!(
                "{}{}...{}",
                self.prefix,
                &rest[..4],
                &rest[rest.len() - 4..]
            ),
            None => format!("{}...{}", &token[..4], &token[token.len() - 4..]),
        }
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

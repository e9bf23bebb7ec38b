//! Registry-unique token issuance.

use crate::codec::TokenCodec;
use crate::registry::Registry;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Issues tokens that are unique against everything issued or loaded so far.
///
/// The generate-check-record sequence runs under a single mutex, so two
/// concurrent callers can never walk away with the same token.
pub struct TokenIssuer {
    codec: TokenCodec,
    issued: Mutex<HashSet<String>>,
}

impl TokenIssuer {
    /// Create an issuer seeded with every token currently in `registry`.
    pub fn new(registry: &Registry, codec: TokenCodec) -> Self {
        let issued = registry.tokens();
        debug!("Loaded {} used token(s)", issued.len());

        Self {
            codec,
            issued: Mutex::new(issued),
        }
    }

    /// Generate a token that has never been issued or loaded before.
    pub fn generate_unused_token(&self) -> String {
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);

        let token = loop {
            let candidate = self.codec.generate();
            if !issued.contains(&candidate) {
                break candidate;
            }
            info!("Generated token collided with an existing one, retrying");
        };

        issued.insert(token.clone());
        debug!(token = %token, "Issued new token");
        token
    }

    /// Number of tokens known to the issuer.
    pub fn issued_count(&self) -> usize {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_from_registry() {
        let registry = Registry::new();
        registry.register("1", "tok-1", "chat-1").unwrap();
        registry.register("2", "tok-2", "chat-2").unwrap();

        let issuer = TokenIssuer::new(&registry, TokenCodec::default());
        assert_eq!(issuer.issued_count(), 2);
    }

    #[test]
    fn test_tokens_are_recorded() {
        let issuer = TokenIssuer::new(&Registry::new(), TokenCodec::default());

        let a = issuer.generate_unused_token();
        let b = issuer.generate_unused_token();

        assert_ne!(a, b);
        assert_eq!(issuer.issued_count(), 2);
    }

    #[test]
    fn test_small_token_space_never_repeats() {
        // One byte gives 256 possible tokens; collisions are frequent
        let issuer = TokenIssuer::new(&Registry::new(), TokenCodec::new(1));

        let tokens: HashSet<String> = (0..200).map(|_| issuer.generate_unused_token()).collect();
        assert_eq!(tokens.len(), 200);
    }

    #[test]
    fn test_avoids_loaded_tokens() {
        // Fill 255 of the 256 one-byte tokens; the issuer must find the last one
        let registry = Registry::new();
        for b in 0u8..255 {
            let token = crate::codec::encode(&[b]);
            registry
                .register(&format!("user-{}", b), &token, "chat")
                .unwrap();
        }

        let issuer = TokenIssuer::new(&registry, TokenCodec::new(1));
        let token = issuer.generate_unused_token();

        assert_eq!(token, crate::codec::encode(&[255]));
        assert!(!registry.is_registered(None, Some(&token)).unwrap());
    }
}

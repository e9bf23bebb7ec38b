//! Random token generation and URL-safe encoding.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, DecodeError, Engine as _};
use rand::RngCore;

/// Default number of random bytes in a user token.
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Stateless token codec.
///
/// Tokens are `size` bytes from the thread-local CSPRNG rendered as
/// base64url without padding, so they can be dropped into a query string
/// as-is.
#[derive(Debug, Clone, Copy)]
pub struct TokenCodec {
    size: usize,
}

impl TokenCodec {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Generate a fresh random byte string.
    pub fn random_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.size];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    /// Generate and encode a fresh token.
    pub fn generate(&self) -> String {
        encode(&self.random_bytes())
    }
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_BYTES)
    }
}

/// Encode bytes as unpadded base64url.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url, with or without trailing padding.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD.decode(text.trim_end_matches('='))
}

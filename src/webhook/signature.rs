//! Webhook signature verification
//!
//! The platform signs every delivery with HMAC-SHA256 over the raw request
//! body, keyed by the shared webhook secret, and sends the base64 digest in
//! the `X-Shopify-Hmac-Sha256` header. Verification must run on the exact
//! bytes received, before any JSON parsing.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};

/// Header carrying the base64 HMAC of the body
pub const SIGNATURE_HEADER: &str = "x-shopify-hmac-sha256";

type HmacSha256 = Hmac<Sha256>;

/// Verifies webhook bodies against a shared secret
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Arc<[u8]>,
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SignatureVerifier {
    /// Create a verifier for `secret`
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
        }
    }

    /// Base64 HMAC-SHA256 of `body`, as the platform would send it.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(body);
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Whether `claimed` is the signature of `body`.
    ///
    /// A missing or empty claim never verifies. The comparison runs in
    /// constant time over the encoded signature.
    pub fn verify(&self, body: &[u8], claimed: Option<&str>) -> bool {
        match claimed {
            Some(claimed) if !claimed.is_empty() => {
                constant_time_compare(self.sign(body).as_bytes(), claimed.as_bytes())
            }
            _ => false,
        }
    }

    /// Like [`verify`](Self::verify), but as an authentication result.
    pub fn check(&self, body: &[u8], claimed: Option<&str>) -> Result<()> {
        match claimed {
            None => Err(Error::authentication("missing webhook signature")),
            Some(_) if self.verify(body, claimed) => Ok(()),
            Some(_) => Err(Error::authentication("invalid webhook signature")),
        }
    }
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

use hmac::{Hmac, Mac};
use sha2::Sha256;

use quotagate_core::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 verifier for billing webhook bodies.
#[derive(Clone)]
pub struct WebhookSignatureVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for WebhookSignatureVerifier {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("WebhookSignatureVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl WebhookSignatureVerifier {
    /// Creates a verifier from the pre-shared secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> AppResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AppError::Configuration(
                "webhook secret must not be empty".to_owned(),
            ));
        }

        Ok(Self { secret })
    }

    /// Computes the hex signature the provider sends for `body`.
    pub fn sign(&self, body: &[u8]) -> AppResult<String> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks `signature` (hex) against the exact raw `body`.
    ///
    /// The comparison is constant time.
    pub fn verify(&self, body: &[u8], signature: &str) -> AppResult<()> {
        let provided = hex::decode(signature.trim())
            .map_err(|_| AppError::Unauthorized("invalid signature".to_owned()))?;

        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(&provided)
            .map_err(|_| AppError::Unauthorized("invalid signature".to_owned()))
    }

    fn mac(&self) -> AppResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|error| AppError::Internal(format!("failed to initialize hmac: {error}")))
    }
}

/// OAuth 1.0 PLAINTEXT request signing for the MAAS API
use rand::Rng;
use reqwest::header::HeaderValue;

use super::error::{MaasError, Result};

/// MAAS API credentials, parsed from a `consumer_key:token_key:token_secret` token.
///
/// The consumer secret is always empty for MAAS API keys.
#[derive(Clone)]
pub struct MaasOAuth {
    consumer_key: String,
    token_key: String,
    token_secret: String,
}

impl std::fmt::Debug for MaasOAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaasOAuth")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &self.token_key)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl MaasOAuth {
    /// Parse an API token
    pub fn from_token(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.trim().split(':').collect();
        match parts.as_slice() {
            [consumer_key, token_key, token_secret]
                if parts.iter().all(|p| !p.is_empty()) =>
            {
                Ok(Self {
                    consumer_key: consumer_key.to_string(),
                    token_key: token_key.to_string(),
                    token_secret: token_secret.to_string(),
                })
            }
            _ => Err(MaasError::Configuration(format!(
                "MAAS token must have the form consumer_key:token_key:token_secret (got {} part(s))",
                parts.len()
            ))),
        }
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// Build the `Authorization` header for a single request.
    ///
    /// A fresh nonce and timestamp are generated on every call.
    pub fn authorization(&self) -> Result<HeaderValue> {
        let nonce = generate_nonce();
        let timestamp = chrono::Utc::now().timestamp();
        let header = self.header_with(&nonce, timestamp);

        HeaderValue::from_str(&header)
            .map_err(|e| MaasError::Configuration(format!("Invalid MAAS token characters: {}", e)))
    }

    fn header_with(&self, nonce: &str, timestamp: i64) -> String {
        // PLAINTEXT signature is "<consumer_secret>&<token_secret>" with an empty consumer secret
        let signature = format!("&{}", self.token_secret);
        let timestamp = timestamp.to_string();

        let params = [
            ("oauth_nonce", nonce),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_signature_method", "PLAINTEXT"),
            ("oauth_version", "1.0"),
            ("oauth_token", self.token_key.as_str()),
            ("oauth_signature", signature.as_str()),
        ];

        let mut header = String::from("OAuth realm=\"\"");
        for (key, value) in params {
            header.push_str(&format!(", {}=\"{}\"", key, urlencoding::encode(value)));
        }
        header
    }
}

/// Eight random decimal digits
fn generate_nonce() -> String {
    let mut rng = rand::thread_rng();
    (0..8).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}

//! Pi42 Request Signing
//!
//! Private endpoints take an `api-key` header and a `signature` header: the
//! hex HMAC-SHA256 of the exact JSON body bytes, keyed with the API secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::ports::ExecutionError;

type HmacSha256 = Hmac<Sha256>;

pub const API_KEY_VAR: &str = "PI42_API_KEY";
pub const API_SECRET_VAR: &str = "PI42_API_SECRET";

/// Hex HMAC-SHA256 of `payload`
pub fn sign_payload(payload: &str, secret: &str) -> Result<String, ExecutionError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExecutionError::SigningError(e.to_string()))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Millisecond timestamp string, as the order endpoints expect
pub fn timestamp_ms() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Reads `PI42_API_KEY` / `PI42_API_SECRET`
    pub fn from_env() -> Result<Self, ExecutionError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ExecutionError::SigningError(format!("{} is not set", name)))
        };
        Ok(Self::new(read(API_KEY_VAR)?, read(API_SECRET_VAR)?))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn sign(&self, payload: &str) -> Result<String, ExecutionError> {
        sign_payload(payload, &self.api_secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

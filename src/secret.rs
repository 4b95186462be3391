use serde_json::Value;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::ApiError;

// Checks the {"secret": "..."} object sent with every generation request.
// It must hold exactly one string field named `secret`; values are compared
// as SHA-256 digests in constant time.
#[derive(Clone)]
pub struct SecretValidator {
    expected: [u8; 32],
}

impl SecretValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            expected: digest(secret),
        }
    }

    pub fn verify(&self, payload: &Value) -> Result<(), ApiError> {
        let presented = match payload.as_object() {
            Some(map) if map.len() == 1 => map.get("secret").and_then(Value::as_str),
            _ => None,
        };

        match presented {
            Some(secret) if self.matches(secret) => Ok(()),
            _ => Err(ApiError::Unauthorized),
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.expected[..].ct_eq(&digest(candidate)[..]).into()
    }
}

impl std::fmt::Debug for SecretValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretValidator(..)")
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

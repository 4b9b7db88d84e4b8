use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use super::gate::AuthFailure;
use crate::config::AppConfig;

/// Claims
///
/// The payload of a bearer token. Tokens are issued by the login flow (not part of this
/// service) and verified here on every protected request; nothing about them is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity key (account email) used for the identity store lookup.
    pub sub: String,
    /// Issued at, seconds since the epoch.
    pub iat: u64,
    /// Expiry, seconds since the epoch. The only invalidation mechanism: there is no revocation list.
    pub exp: u64,
    /// Credentials fingerprint of the identity at issuance. Binds the token to the
    /// identity's credentials; a token without one never binds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fpr: Option<String>,
    /// Informational only. Authorities always come from the identity store.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

/// TokenVerifier
///
/// Stateless HS256 signature and expiry check with the service's fixed secret.
/// Pure CPU work, safe to run inline on the request task.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.jwt_leeway_secs)
    }

    /// verify
    ///
    /// Decodes and validates the token. Expiry and signature failures are reported
    /// separately from everything else (bad encoding, bad JSON, wrong algorithm,
    /// missing claims), which is folded into `MalformedToken`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthFailure> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthFailure::ExpiredToken,
                ErrorKind::InvalidSignature => AuthFailure::InvalidSignature,
                _ => AuthFailure::MalformedToken,
            })
    }
}

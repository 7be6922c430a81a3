//! # Session Tokens
//!
//! RS256-signed JWTs. The private key signs at login; the public key
//! verifies every authenticated request.
//!
//! ## Token Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /auth/login                                                       │
//! │       │  password verified                                              │
//! │       ▼                                                                 │
//! │  issue_token(user_id)                                                   │
//! │       │  { sub: user_id, iat: now, exp: now + 36h }  signed RS256       │
//! │       ▼                                                                 │
//! │  Authorization: Bearer <token>  ──►  verify_token                       │
//! │                                          │                              │
//! │                     bad signature ───────┤                              │
//! │                     malformed ───────────┼──► 401 UNAUTHENTICATED       │
//! │                     expired ─────────────┘                              │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                                   Claims { sub, .. }                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are PEM encoded and loaded once at startup; there is no revocation,
//! refresh or key rotation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ApiError;

/// Lifetime of a session token unless configured otherwise.
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 36;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Signs and verifies session tokens.
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl JwtManager {
    /// Builds a manager from an RSA key pair in PEM form.
    ///
    /// ## Errors
    /// Returns the jsonwebtoken error when either PEM cannot be parsed as an
    /// RSA key.
    pub fn from_pem(
        private_pem: &[u8],
        public_pem: &[u8],
        lifetime_hours: i64,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(JwtManager {
            encoding_key,
            decoding_key,
            validation,
            lifetime: Duration::hours(lifetime_hours),
        })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a token for `user_id`, valid from now.
    pub fn issue_token(&self, user_id: &str) -> Result<String, ApiError> {
        self.issue_token_at(user_id, Utc::now())
    }

    /// Issues a token as if the current time were `issued_at`.
    pub fn issue_token_at(
        &self,
        user_id: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, ApiError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    /// Validates signature and expiry and returns the claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                warn!(reason = %e, "Rejected session token");
                ApiError::unauthenticated("Invalid or expired token")
            })
    }
}

/// Extracts the credential from an `Authorization` header value.
///
/// Accepts exactly `Bearer <token>`: the scheme, one space and a single
/// non-empty credential without further whitespace.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

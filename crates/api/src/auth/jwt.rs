//! JWT token codec
//!
//! Session tokens are HS256-signed JWTs carrying `user_name`, `iss`, `iat`
//! and `exp`. Signature checks go through `jsonwebtoken`; expiry is checked
//! against a caller-supplied timestamp so the clock can be injected.

use std::collections::HashSet;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer stamped on every token minted by this service
pub const DEFAULT_ISSUER: &str = "PenbunAPI";

/// Token lifetime: one hour
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Longest lifetime a deployment may configure: one year
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub user_name: String,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

impl Claims {
    pub fn new(
        user_name: impl Into<String>,
        issuer: impl Into<String>,
        iat: i64,
        ttl_secs: i64,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            iss: issuer.into(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        }
    }

    /// A token stays valid through its `exp` second and is void after it
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token has expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Signs and verifies session tokens with the process-wide secret
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `decode_at` against the injected clock
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: issuer.into(),
            ttl_secs,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign a claim set
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Expiry of a token issued at `now`
    pub fn expiry_from(&self, now: i64) -> Result<i64, TokenError> {
        now.checked_add(self.ttl_secs).ok_or_else(|| {
            TokenError::Signing(format!(
                "expiry overflows: issued at {now} with ttl {}s",
                self.ttl_secs
            ))
        })
    }

    fn claims_for(&self, user_name: &str, issuer: &str, now: i64) -> Result<Claims, TokenError> {
        Ok(Claims {
            user_name: user_name.to_string(),
            iss: issuer.to_string(),
            iat: now,
            exp: self.expiry_from(now)?,
        })
    }

    /// Mint a fresh token for `user_name` issued at `now`
    pub fn issue(&self, user_name: &str, now: i64) -> Result<(String, Claims), TokenError> {
        let claims = self.claims_for(user_name, &self.issuer, now)?;
        let token = self.encode(&claims)?;
        Ok((token, claims))
    }

    /// Mint a successor token that keeps the subject and issuer of `previous`
    pub fn reissue(&self, previous: &Claims, now: i64) -> Result<(String, Claims), TokenError> {
        let claims = self.claims_for(&previous.user_name, &previous.iss, now)?;
        let token = self.encode(&claims)?;
        Ok((token, claims))
    }

    /// Verify the signature only; expired tokens still decode
    pub fn verify_signature(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT verification failed");
                TokenError::Invalid
            })
    }

    /// Verify the signature and that the token has not expired at `now`
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = self.verify_signature(token)?;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

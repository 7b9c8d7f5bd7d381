//! Signed, self-contained bearer tokens.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    error::{AuthError, TokenError},
    types::{Claims, UserId},
};

/// Issues and verifies access tokens. The signing secret is loaded once at
/// construction and held in memory only; it never appears in logs or
/// responses.
pub struct TokenService {
    issuer: String,
    secret: SecretString,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(issuer: String, secret: SecretString, lifetime: Duration) -> Self {
        Self {
            issuer,
            secret,
            lifetime,
        }
    }

    /// Mint a token for the given subject, valid from `now` until
    /// `now + lifetime`.
    pub fn issue(&self, subject: &UserId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let issued_at = now.timestamp();

        let claims = Claims {
            sub: subject.0.clone(),
            iss: self.issuer.clone(),
            iat: issued_at,
            exp: issued_at + self.lifetime.as_secs() as i64,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )?;

        Ok(token)
    }

    /// Verify a token against the signing secret and the supplied clock,
    /// returning the subject id. Resolving the subject to a stored user is
    /// the caller's concern.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        // Expiry is checked below against the caller's clock, not the
        // system clock.
        validation.validate_exp = false;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map_err(|err| match err.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        })?;

        if now.timestamp() > data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(UserId(data.claims.sub))
    }
}

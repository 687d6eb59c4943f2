use chrono::{Duration, Utc};
use jsonwebtoken::{encode, decode, Header, EncodingKey, DecodingKey, Validation, Algorithm};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AuthError};

/// Claims carried by both token kinds. `data` holds the user id as a string;
/// the field name is part of the wire format existing clients decode.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub data: String,
    pub exp: i64,
    pub iat: i64,
}

/// Stateless issuer for the access/refresh token pair.
///
/// The two kinds are signed with distinct secrets, so an access token can
/// never be replayed as a refresh token or vice versa. Issuing has no side
/// effects; signing only fails on misconfigured key material.
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: String,
    refresh_secret: String,
    access_expiry: Duration,
    refresh_expiry: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_expiry: Duration::minutes(config.access_token_expiry_minutes),
            refresh_expiry: Duration::days(config.refresh_token_expiry_days),
        }
    }

    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String, AppError> {
        self.issue(user_id, &self.access_secret, self.access_expiry)
    }

    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, AppError> {
        self.issue(user_id, &self.refresh_secret, self.refresh_expiry)
    }

    /// Decode and validate a refresh token against the refresh secret.
    /// Any failure (bad signature, expired, malformed) is reported as an
    /// invalid refresh token; callers never learn which check tripped.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.refresh_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| AuthError::InvalidRefreshToken)?;

        Ok(data.claims)
    }

    /// Lifetime of a refresh token, also used as the cookie max-age.
    pub fn refresh_expiry(&self) -> Duration {
        self.refresh_expiry
    }

    fn issue(&self, user_id: Uuid, secret: &str, expiry: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            data: user_id.to_string(),
            exp: (now + expiry).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(AuthError::Signing)?;

        Ok(token)
    }
}

//! Bearer token verification.
//!
//! Tokens are JWTs signed by the identity service. The gateway only verifies
//! them; it never issues tokens.
//!
//! Checks, in order:
//! 1. structure (three segments, base64, JSON header) → `Malformed`
//! 2. algorithm pinned by configuration + signature → `InvalidSignature`
//! 3. claim payload shape → `Malformed`
//! 4. `exp <= now` → `Expired` (no leeway)

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::validation::MIN_SECRET_LEN;
use crate::config::{AuthConfig, ConfigError};
use crate::security::identity::Claims;

/// Reasons a token is refused. Never shown to the caller.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,
}

impl TokenError {
    /// Short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
        }
    }
}

/// Claim layout on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireClaims {
    sub: Option<String>,
    user_id: Option<String>,
    organization_id: Option<String>,
    department_id: Option<String>,
    team_id: Option<String>,
    authorities: Option<Vec<String>>,
    roles: Option<Vec<String>>,
    exp: i64,
    iat: Option<i64>,
}

impl WireClaims {
    fn into_claims(self) -> Result<Claims, TokenError> {
        Ok(Claims {
            subject: self.sub.unwrap_or_default(),
            user_id: parse_uuid(self.user_id)?,
            organization_id: parse_uuid(self.organization_id)?,
            department_id: parse_uuid(self.department_id)?,
            team_id: parse_uuid(self.team_id)?,
            authorities: dedup(self.authorities.unwrap_or_default()),
            roles: dedup(self.roles.unwrap_or_default()),
            expires_at: self.exp,
            issued_at: self.iat,
        })
    }
}

fn parse_uuid(raw: Option<String>) -> Result<Option<Uuid>, TokenError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| TokenError::Malformed),
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Verifies tokens against a fixed key and algorithm.
#[derive(Clone)]
pub struct TokenCodec {
    key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Codec for an HMAC algorithm with a shared secret.
    pub fn hmac(algorithm: Algorithm, secret: &[u8]) -> Self {
        Self::with_key(algorithm, DecodingKey::from_secret(secret))
    }

    /// Codec for an arbitrary algorithm/key pair.
    pub fn with_key(algorithm: Algorithm, key: DecodingKey) -> Self {
        let mut validation = Validation::new(algorithm);
        // Expiry is checked by `decode_at` so the boundary is exact and testable.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);
        Self { key, validation }
    }

    /// Build the codec from validated configuration, reading PEM keys from disk.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|e| ConfigError::Key(format!("{}: {}", config.algorithm, e)))?;

        let key = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                if config.secret.len() < MIN_SECRET_LEN {
                    return Err(ConfigError::Key(format!(
                        "HMAC secret must be at least {} bytes",
                        MIN_SECRET_LEN
                    )));
                }
                DecodingKey::from_secret(config.secret.as_bytes())
            }
            _ => {
                let path = config
                    .public_key_path
                    .as_deref()
                    .ok_or_else(|| ConfigError::Key("public_key_path is not set".into()))?;
                let pem = std::fs::read(path)?;
                let key = match algorithm {
                    Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(&pem),
                    Algorithm::EdDSA => DecodingKey::from_ed_pem(&pem),
                    _ => DecodingKey::from_rsa_pem(&pem),
                };
                key.map_err(|e| ConfigError::Key(format!("{}: {}", path, e)))?
            }
        };

        Ok(Self::with_key(algorithm, key))
    }

    /// Verify a token against the current system time.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        self.decode_at(token, now)
    }

    /// Verify a token as of `now` (seconds since epoch).
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let data = decode::<WireClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::InvalidEcdsaKey
                | ErrorKind::Crypto(_) => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = data.claims.into_claims()?;
        if claims.expires_at <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

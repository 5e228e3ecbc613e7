//! Session token verification.
//!
//! Tokens are HS256 JWTs issued at login. The login flow itself lives
//! elsewhere; this service only needs the shared secret.

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Principal, Role};

/// Default session token lifetime in seconds (7 days).
pub const SESSION_TOKEN_LIFETIME: i64 = 7 * 86400;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID.
    pub sub: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_banned: bool,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    /// Turn verified claims into a principal.
    pub fn into_principal(self) -> Result<Principal> {
        let user_id = self
            .sub
            .parse::<Uuid>()
            .with_context(|| format!("invalid token subject: {}", self.sub))?;

        Ok(Principal {
            user_id,
            name: self.name,
            email: self.email,
            role: Role::from_claim(&self.role),
            is_banned: self.is_banned,
        })
    }
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for `principal` valid for `lifetime` seconds.
    pub fn issue(&self, principal: &Principal, lifetime: i64) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            sub: principal.user_id.to_string(),
            name: principal.name.clone(),
            email: principal.email.clone(),
            role: principal.role.as_str().to_string(),
            is_banned: principal.is_banned,
            iat: now,
            exp: now + lifetime,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("failed to encode session token")
    }

    /// Verify signature and expiry and return the claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .context("invalid token")?;

        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-at-least-32-bytes-long!!";

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: Uuid::now_v7(),
            name: "Rina".into(),
            email: "rina@campus.test".into(),
            role,
            is_banned: false,
        }
    }

    #[test]
    fn token_roundtrip() {
        let service = TokenService::new(SECRET);
        let original = principal(Role::Admin);
        let token = service.issue(&original, SESSION_TOKEN_LIFETIME).unwrap();

        let decoded = service.verify(&token).unwrap().into_principal().unwrap();
        assert_eq!(decoded, original);
        assert!(decoded.is_admin());
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = TokenService::new(SECRET)
            .issue(&principal(Role::User), SESSION_TOKEN_LIFETIME)
            .unwrap();
        let other = TokenService::new(b"another-secret-key-at-least-32-bytes!!");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let service = TokenService::new(SECRET);
        let token = service.issue(&principal(Role::User), -3600).unwrap();
        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn non_uuid_subject_rejected() {
        let claims = TokenClaims {
            sub: "42".into(),
            name: String::new(),
            email: String::new(),
            role: String::new(),
            is_banned: false,
            iat: 0,
            exp: 0,
        };
        assert!(claims.into_principal().is_err());
    }
}

//! services/api/src/auth/token.rs
//!
//! HS256 JWT identity tokens.
//!
//! Header and payload are JSON objects, encoded base64url WITHOUT padding.
//! The signature is checked with `Hmac::verify_slice` before the payload is
//! parsed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("unsupported token header")]
    UnsupportedHeader,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

/// The claims embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies identity tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let header = JwtHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };

        let header_json =
            serde_json::to_vec(&header).map_err(|e| TokenError::Signing(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| TokenError::Signing(e.to_string()))?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verifies the token and returns the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, Utc::now()).map(|claims| claims.sub)
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header: JwtHeader = decode_json(header_b64)?;
        if header.alg != "HS256" || !header.typ.eq_ignore_ascii_case("JWT") {
            return Err(TokenError::UnsupportedHeader);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64.as_bytes())
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = self.mac()?;
        mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: Claims = decode_json(payload_b64)?;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<Hmac<Sha256>, TokenError> {
        Hmac::<Sha256>::new_from_slice(&self.secret).map_err(|e| TokenError::Signing(e.to_string()))
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let raw = URL_SAFE_NO_PAD
        .decode(segment.as_bytes())
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret-0123456789", Duration::days(7))
    }

    #[test]
    fn issued_token_verifies_to_the_same_user() {
        let user = Uuid::new_v4();
        let token = signer().issue(user).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(signer().verify(&token), Ok(user));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = Utc::now() - Duration::days(8);
        let token = signer().issue_at(Uuid::new_v4(), issued).unwrap();
        assert_eq!(signer().verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let other = TokenSigner::new("another-secret-0123456789", Duration::days(7));
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert_eq!(signer().verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = signer().issue(Uuid::new_v4()).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                sub: Uuid::new_v4(),
                iat: 0,
                exp: i64::MAX,
            })
            .unwrap(),
        );
        parts[1] = &forged;
        assert_eq!(signer().verify(&parts.join(".")), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(signer().verify("abc"), Err(TokenError::Malformed));
        assert_eq!(signer().verify("a.b.c.d"), Err(TokenError::Malformed));
    }
}

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Identity;
use crate::config::SigningKey;
use crate::error::{Error, Result};

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id, as a string per the JWT convention.
    sub: String,
    username: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("token signature does not verify")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256-signed identity tokens.
///
/// Validation is a pure function of the token, the signing key and the
/// supplied `now`; nothing is stored server-side, so a token stays valid
/// until it expires or the key changes.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(key: &SigningKey, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `validate`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = ["exp", "sub"].into_iter().map(String::from).collect();

        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `identity` that expires at `now + ttl`, truncated
    /// to whole seconds so the advertised expiry matches the `exp` claim.
    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .and_then(|at| DateTime::from_timestamp(at.timestamp(), 0))
            .ok_or_else(|| Error::TokenIssue("token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: identity.user_id.to_string(),
            username: identity.username.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::TokenIssue(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies the signature, then the expiry, and returns the embedded identity.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> std::result::Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = data.claims;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        let user_id = claims.sub.parse().map_err(|_| TokenError::Malformed)?;

        Ok(Identity {
            user_id,
            username: claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const SECRET: &str = "test-signing-key-with-at-least-32-bytes!";

    fn service() -> TokenService {
        TokenService::new(
            &SigningKey::new(SECRET).unwrap(),
            Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        )
    }

    fn alice() -> Identity {
        Identity {
            user_id: 7,
            username: "alice".to_string(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issued_token_validates_before_expiry() {
        let tokens = service();
        let issued = tokens.issue(&alice(), t0()).unwrap();

        assert_eq!(issued.expires_at, t0() + Duration::hours(24));

        let identity = tokens.validate(&issued.token, t0()).unwrap();
        assert_eq!(identity, alice());

        let just_before = t0() + tokens.ttl() - Duration::seconds(1);
        assert_eq!(tokens.validate(&issued.token, just_before).unwrap(), alice());
    }

    #[test]
    fn test_token_expires_at_ttl() {
        let tokens = service();
        let issued = tokens.issue(&alice(), t0()).unwrap();

        let at_expiry = t0() + tokens.ttl();
        assert_eq!(
            tokens.validate(&issued.token, at_expiry),
            Err(TokenError::Expired)
        );

        let after = t0() + tokens.ttl() + Duration::seconds(1);
        assert_eq!(tokens.validate(&issued.token, after), Err(TokenError::Expired));
    }

    #[test]
    fn test_advertised_expiry_matches_enforced_expiry() {
        let tokens = service();
        let issued_at = t0() + Duration::milliseconds(700);
        let issued = tokens.issue(&alice(), issued_at).unwrap();

        assert_eq!(issued.expires_at, t0() + tokens.ttl());
        assert_eq!(issued.expires_at.timestamp_subsec_nanos(), 0);

        let just_before = issued.expires_at - Duration::milliseconds(200);
        assert_eq!(tokens.validate(&issued.token, just_before).unwrap(), alice());
        assert_eq!(
            tokens.validate(&issued.token, issued.expires_at),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_custom_ttl() {
        let tokens = TokenService::new(&SigningKey::new(SECRET).unwrap(), Duration::minutes(5));
        let issued = tokens.issue(&alice(), t0()).unwrap();

        assert!(tokens.validate(&issued.token, t0() + Duration::minutes(4)).is_ok());
        assert_eq!(
            tokens.validate(&issued.token, t0() + Duration::minutes(6)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_token_from_other_key_has_bad_signature() {
        let issued = service().issue(&alice(), t0()).unwrap();

        let other = TokenService::new(
            &SigningKey::new("a-completely-different-signing-key-0123").unwrap(),
            Duration::hours(24),
        );

        assert_eq!(
            other.validate(&issued.token, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_single_byte_flip_never_validates() {
        let tokens = service();
        let issued = tokens.issue(&alice(), t0()).unwrap();
        let bytes = issued.token.as_bytes();

        for i in 0..bytes.len() {
            let mut tampered = bytes.to_vec();
            tampered[i] ^= 0x01;
            let tampered = String::from_utf8(tampered).unwrap();

            let result = tokens.validate(&tampered, t0());
            assert!(
                matches!(
                    result,
                    Err(TokenError::BadSignature) | Err(TokenError::Malformed)
                ),
                "flipping byte {i} produced {result:?}"
            );
        }
    }

    #[test]
    fn test_tampered_payload_has_bad_signature() {
        let tokens = service();
        let issued = tokens.issue(&alice(), t0()).unwrap();
        let forged_for = tokens
            .issue(
                &Identity {
                    user_id: 8,
                    username: "mallory".to_string(),
                },
                t0(),
            )
            .unwrap();

        // Splice mallory's payload into alice's header and signature.
        let parts: Vec<&str> = issued.token.split('.').collect();
        let forged_parts: Vec<&str> = forged_for.token.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(
            tokens.validate(&spliced, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let tokens = service();

        for input in ["", "abc", "a.b", "a.b.c.d", "!!!.???.***", "Bearer xyz"] {
            assert_eq!(
                tokens.validate(input, t0()),
                Err(TokenError::Malformed),
                "input {input:?}"
            );
        }
    }
}

//! Signed bearer token creation and validation.
//!
//! Access and refresh tokens are JWTs carrying the subject, a unique token
//! ID (`jti`) used as the revocation key, an expiry, and a type tag. The
//! signing algorithm is pinned from configuration; a token declaring any
//! other algorithm fails validation, which closes off algorithm-confusion
//! attacks.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{AuthError, ServiceResult};

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Claim set embedded in every issued token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the credential record's ID.
    pub sub: String,
    /// Unique token ID, the key under which a revocation is recorded.
    pub jti: String,
    /// "access" or "refresh".
    pub token_type: String,
    /// Expiry timestamp (seconds since epoch).
    pub exp: usize,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
}

impl Claims {
    pub fn is_access(&self) -> bool {
        self.token_type == TOKEN_TYPE_ACCESS
    }

    pub fn is_refresh(&self) -> bool {
        self.token_type == TOKEN_TYPE_REFRESH
    }

    /// Seconds until this token expires, if it has not already.
    pub fn remaining_ttl_seconds(&self) -> Option<u64> {
        let now = Utc::now().timestamp();
        let exp = self.exp as i64;
        if exp > now { Some((exp - now) as u64) } else { None }
    }
}

/// Token codec for creating and validating signed tokens.
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec from the configured secret and algorithm.
    pub fn new(config: &Config) -> ServiceResult<Self> {
        let algorithm = config
            .jwt_algorithm
            .parse::<Algorithm>()
            .map_err(|_| AuthError::internal(format!(
                "Unsupported signing algorithm: {}",
                config.jwt_algorithm
            )))?;

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        // Validation is pinned to the configured algorithm only.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;

        Ok(TokenCodec {
            algorithm,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Issue a short-lived access token.
    ///
    /// A caller-supplied `jti` is honored, otherwise a fresh one is
    /// generated.
    pub fn issue_access(
        &self,
        subject: &str,
        ttl_seconds: i64,
        jti: Option<String>,
    ) -> ServiceResult<String> {
        self.issue(subject, ttl_seconds, jti, TOKEN_TYPE_ACCESS)
    }

    /// Issue a long-lived refresh token with its own unique `jti`, so it
    /// can be individually revoked when rotated out.
    pub fn issue_refresh(&self, subject: &str, ttl_seconds: i64) -> ServiceResult<String> {
        self.issue(subject, ttl_seconds, None, TOKEN_TYPE_REFRESH)
    }

    fn issue(
        &self,
        subject: &str,
        ttl_seconds: i64,
        jti: Option<String>,
        token_type: &str,
    ) -> ServiceResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(ttl_seconds);

        let claims = Claims {
            sub: subject.to_string(),
            jti: jti.unwrap_or_else(|| Uuid::new_v4().to_string()),
            token_type: token_type.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("Token generation failed: {}", e)))
    }

    /// Validate signature, algorithm, and expiry, and return the claims.
    ///
    /// Callers on the refresh path must additionally check `token_type`.
    pub fn decode(&self, token: &str) -> ServiceResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::ImmatureSignature => AuthError::TokenInvalid,
                _ => AuthError::TokenMalformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&Config::for_tests()).unwrap()
    }

    #[test]
    fn test_access_token_roundtrip() {
        let codec = codec();
        let token = codec
            .issue_access("user-1", 1800, Some("jti-1".to_string()))
            .unwrap();
        let claims = codec.decode(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.jti, "jti-1");
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
        assert!(claims.is_access());
        assert!(claims.remaining_ttl_seconds().unwrap() > 1700);
    }

    #[test]
    fn test_refresh_token_has_unique_jti() {
        let codec = codec();
        let first = codec.decode(&codec.issue_refresh("user-1", 3600).unwrap()).unwrap();
        let second = codec.decode(&codec.issue_refresh("user-1", 3600).unwrap()).unwrap();

        assert!(first.is_refresh());
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_tampered_token_fails() {
        let codec = codec();
        let token = codec.issue_access("user-1", 1800, None).unwrap();

        // Flip a byte in the signed payload
        let mut bytes = token.into_bytes();
        let mid = bytes.len() / 2;
        bytes[mid] = if bytes[mid] == b'a' { b'b' } else { b'a' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(codec.decode(&tampered).is_err());
    }

    #[test]
    fn test_expired_token_reports_expired() {
        let codec = codec();
        // Beyond the default validation leeway
        let token = codec.issue_access("user-1", -120, None).unwrap();

        assert!(matches!(codec.decode(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_foreign_algorithm_is_rejected() {
        let mut config = Config::for_tests();
        config.jwt_algorithm = "HS384".to_string();
        let other = TokenCodec::new(&config).unwrap();
        let token = other.issue_access("user-1", 1800, None).unwrap();

        assert!(matches!(
            codec().decode(&token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        assert!(matches!(
            codec().decode("not.a.token"),
            Err(AuthError::TokenMalformed)
        ));
    }
}

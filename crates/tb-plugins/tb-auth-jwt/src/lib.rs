//! # tb-auth-jwt
//!
//! HS256 JWT implementation of `TokenIssuer`.
//! Tokens carry the username as `sub` and expire after a configurable TTL.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tb_core::traits::TokenIssuer;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    /// Token lifetime in seconds
    ttl_secs: i64,
}

impl JwtTokenIssuer {
    pub fn new(secret: &SecretString, ttl_secs: u64) -> Self {
        let key = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, username: &str) -> anyhow::Result<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    fn verify(&self, token: &str) -> anyhow::Result<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims.sub)
    }
}

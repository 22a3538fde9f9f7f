use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{decode, DecodingKey, Validation};

use super::{Claims, TokenError};
use crate::config::SecurityConfig;

/// Outcome of decoding a bearer token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenDecode {
    Valid(Claims),
    Invalid(String),
}

impl TokenDecode {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenDecode::Valid(_))
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            TokenDecode::Valid(claims) => Some(claims),
            TokenDecode::Invalid(_) => None,
        }
    }
}

/// Turns a raw bearer token into a claim set.
///
/// One decoder is shared by every in-flight request, so implementations must
/// only read their key material.
#[async_trait]
pub trait TokenDecoder: Send + Sync {
    async fn decode(&self, token: &str) -> TokenDecode;
}

/// HS256 decoder backed by a shared secret
#[derive(Clone)]
pub struct JwtDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl JwtDecoder {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        Self::new(&security.jwt_secret)
    }
}

#[async_trait]
impl TokenDecoder for JwtDecoder {
    async fn decode(&self, token: &str) -> TokenDecode {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => TokenDecode::Valid(data.claims),
            Err(e) => TokenDecode::Invalid(format!("Invalid JWT token: {}", e)),
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
/// Missing header, other schemes and empty tokens all yield `None`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

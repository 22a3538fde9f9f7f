use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod decoder;

pub use decoder::{extract_bearer_token, JwtDecoder, TokenDecode, TokenDecoder};

/// Claim set carried by an access token.
///
/// `role` stays a raw string here: checking it against the known roles is the
/// scope deriver's job, so a token with an unknown role still decodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub role: String,
    #[serde(default)]
    pub id_site: Option<i64>,
    #[serde(default)]
    pub id_subsite: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Any claim not modelled above, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn new(
        id: i64,
        role: impl Into<String>,
        id_site: Option<i64>,
        id_subsite: Option<i64>,
        expiry_hours: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            id,
            role: role.into(),
            id_site,
            id_subsite,
            username: None,
            name: None,
            dni: None,
            phone: None,
            status: None,
            exp,
            iat: Some(now.timestamp()),
            extra: Map::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Look up a claim by its wire key. JSON `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = match key {
            "id" => Some(Value::from(self.id)),
            "role" => Some(Value::from(self.role.clone())),
            "id_site" => self.id_site.map(Value::from),
            "id_subsite" => self.id_subsite.map(Value::from),
            "username" => self.username.clone().map(Value::from),
            "name" => self.name.clone().map(Value::from),
            "dni" => self.dni.clone().map(Value::from),
            "phone" => self.phone.clone().map(Value::from),
            "status" => self.status.clone().map(Value::from),
            "exp" => Some(Value::from(self.exp)),
            "iat" => self.iat.map(Value::from),
            other => self.extra.get(other).cloned(),
        };
        value.filter(|v| !v.is_null())
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    Generation(String),
}

/// Sign a token for local development and tests. Production tokens are issued elsewhere.
pub fn mint_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| TokenError::Generation(e.to_string()))
}

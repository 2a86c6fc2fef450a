use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

pub type Claims = Map<String, Value>;

/// Signs client supplied claims into HS256 JSON web tokens.
#[derive(Debug)]
pub struct TokenIssuer {
    secret: SecretString,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: SecretString, lifetime: Duration) -> TokenIssuer {
        TokenIssuer { secret, lifetime }
    }

    /// Adds `iat` and `exp` to `claims` and signs them.
    ///
    /// Any `iat`/`exp` supplied by the client is overwritten.
    pub fn issue(&self, mut claims: Claims) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        claims.insert("iat".to_string(), Value::from(now.timestamp()));
        claims.insert(
            "exp".to_string(),
            Value::from((now + self.lifetime).timestamp()),
        );

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key)
    }

    pub fn verify(&self, token: impl AsRef<str>) -> Result<Claims, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        decode::<Claims>(token.as_ref(), &key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
    }
}

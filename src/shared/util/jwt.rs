//! Signed login tokens: a token binds an account id, its email and its
//! role at issuance time, and expires after a fixed duration

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TokenError {
    Expired,
    Invalid
}

pub fn sign(account_id: Uuid, email: &str, role: &str, secret: &[u8], ttl_seconds: i64)
        -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: account_id,
        email: email.to_string(),
        role: role.to_string(),
        iat: now,
        exp: now + ttl_seconds
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret))
}

pub fn verify(token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
    let validation = Validation::new(Algorithm::HS256);
    match decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation) {
        Ok(data) => Ok(data.claims),
        Err(err) => match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            _ => Err(TokenError::Invalid)
        }
    }
}

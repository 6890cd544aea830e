use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::Account;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owner id of the account
    pub sub: Uuid,
    pub login: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(account: &Account, expiry_hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| JwtError::TokenGeneration(format!("expiry of {} hours is out of range", expiry_hours)))?;

        Ok(Self {
            sub: account.id,
            login: account.login.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(security: &SecurityConfig, claims: &Claims) -> Result<String, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(security: &SecurityConfig, token: &str) -> Result<Claims, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// Hash a password for storage. The salt is generated by bcrypt and kept
/// inside the returned hash.
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            username: "Teacher".into(),
            login: "t1".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip_keeps_owner() {
        let security = AppConfig::development().security;
        let account = account();
        let token = generate_jwt(&security, &Claims::new(&account, 1).unwrap()).unwrap();
        let claims = validate_jwt(&security, &token).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.login, "t1");
    }

    #[test]
    fn tokens_from_other_secrets_are_rejected() {
        let mut security = AppConfig::development().security;
        let token = generate_jwt(&security, &Claims::new(&account(), 1).unwrap()).unwrap();
        security.jwt_secret = "another-secret".into();
        assert!(matches!(validate_jwt(&security, &token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_refused() {
        let mut security = AppConfig::development().security;
        security.jwt_secret.clear();
        assert!(matches!(generate_jwt(&security, &Claims::new(&account(), 1).unwrap()), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn out_of_range_expiry_is_an_error() {
        let account = account();
        assert!(matches!(Claims::new(&account, u64::MAX), Err(JwtError::TokenGeneration(_))));
        assert!(matches!(Claims::new(&account, 99_999_999_999_999_999), Err(JwtError::TokenGeneration(_))));

        let claims = Claims::new(&account, 2).unwrap();
        assert_eq!(claims.exp - claims.iat, 2 * 3600);
    }

    #[test]
    fn passwords_verify_against_their_hash() {
        let hash = hash_password("hunter2", 4).unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());

        // Fresh salt each time
        let other = hash_password("hunter2", 4).unwrap();
        assert_ne!(hash, other);
        assert!(verify_password("hunter2", &other).unwrap());
    }

    #[test]
    fn foreign_hash_formats_are_errors() {
        assert!(verify_password("hunter2", "5e884898da28047151d0e56f8dc6292773603d0d").is_err());
    }
}

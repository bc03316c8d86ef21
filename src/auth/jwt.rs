use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub papel: String,
    pub exp: i64,
}

/// Token issuance lives in the identity platform; this signer exists for
/// tests and local tooling against the same secret.
pub fn create_jwt(user_id: Uuid, papel: &str, secret: &str, expiration_hours: i64) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(expiration_hours))
        .ok_or(AppError::NotAuthenticated)?
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        papel: papel.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AppError::NotAuthenticated)
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::NotAuthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = create_jwt(user_id, "paciente", "segredo-de-teste", 1).unwrap();
        let claims = verify_jwt(&token, "segredo-de-teste").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.papel, "paciente");
    }

    #[test]
    fn test_jwt_wrong_secret_rejected() {
        let token = create_jwt(Uuid::new_v4(), "psicologo", "segredo-a", 1).unwrap();
        assert!(verify_jwt(&token, "segredo-b").is_err());
    }

    #[test]
    fn test_jwt_expired_rejected() {
        let token = create_jwt(Uuid::new_v4(), "paciente", "segredo", -1).unwrap();
        assert!(verify_jwt(&token, "segredo").is_err());
    }
}

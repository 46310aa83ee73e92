use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod password;

/// Signed session claim. Carried by the client, verified per request,
/// never stored server-side.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, ttl_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(ttl_hours as i64)).timestamp();

        Self {
            user_id,
            email,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug)]
pub enum TokenError {
    MissingSecret,
    Generation(String),
    Expired,
    Invalid(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::MissingSecret => write!(f, "Signing secret not configured"),
            TokenError::Generation(msg) => write!(f, "Token generation error: {}", msg),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Invalid(msg) => write!(f, "Invalid token: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// Sign a claim set into a tamper-evident token string.
pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| TokenError::Generation(e.to_string()))
}

/// Verify signature and expiry, returning the embedded claims.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            _ => Err(TokenError::Invalid(e.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn token_round_trip_recovers_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "a@x.com".to_string(), 1);
        let token = encode_token(&claims, SECRET).unwrap();

        let decoded = decode_token(&token, SECRET).unwrap();
        assert_eq!(decoded.user_id, user_id);
        assert_eq!(decoded.email, "a@x.com");
    }

    #[test]
    fn expired_token_is_rejected_despite_valid_signature() {
        let mut claims = Claims::new(Uuid::new_v4(), "a@x.com".to_string(), 1);
        claims.exp = (Utc::now() - Duration::hours(2)).timestamp();
        claims.iat = (Utc::now() - Duration::hours(3)).timestamp();

        let token = encode_token(&claims, SECRET).unwrap();
        assert!(matches!(decode_token(&token, SECRET), Err(TokenError::Expired)));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "a@x.com".to_string(), 1);
        let token = encode_token(&claims, SECRET).unwrap();

        let mut tampered = token.clone();
        // Flip a character in the payload segment
        let idx = token.find('.').unwrap() + 2;
        let original = tampered.remove(idx);
        tampered.insert(idx, if original == 'A' { 'B' } else { 'A' });

        assert!(decode_token(&tampered, SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "a@x.com".to_string(), 1);
        let token = encode_token(&claims, SECRET).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn empty_secret_fails_both_ways() {
        let claims = Claims::new(Uuid::new_v4(), "a@x.com".to_string(), 1);
        assert!(matches!(encode_token(&claims, ""), Err(TokenError::MissingSecret)));
        assert!(matches!(decode_token("x.y.z", ""), Err(TokenError::MissingSecret)));
    }
}

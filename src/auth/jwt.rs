use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,      // email
    pub role: String,
    pub exp: i64,         // expiration timestamp
}

/// Signs and checks HS256 bearer tokens with one shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
}

impl JwtKeys {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn issue_token(&self, email: &str, role: &str, ttl: chrono::Duration) -> Result<String> {
        let expiration = chrono::Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| anyhow!("Invalid timestamp"))?
            .timestamp();

        let claims = Claims {
            sub: email.to_string(),
            role: role.to_string(),
            exp: expiration,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| anyhow!("Token generation failed: {}", e))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }
}

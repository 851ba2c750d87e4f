use crate::auth::Actor;
use crate::core::errors::LendingError;
use crate::core::models::Role;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

const TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // User ID
    pub roles: Vec<Role>,
    pub staff: bool,
    pub exp: usize,
}

impl From<Claims> for Actor {
    fn from(claims: Claims) -> Self {
        Actor {
            user_id: claims.sub,
            is_staff: claims.staff,
            roles: claims.roles.into_iter().collect(),
        }
    }
}

/// Issues and verifies HS256 tokens carrying an actor's capabilities.
pub struct JwtService {
    secret: String,
}

impl JwtService {
    pub fn new(secret: String) -> Self {
        JwtService { secret }
    }

    pub fn generate_token(&self, actor: &Actor) -> Result<String, LendingError> {
        let expiration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| (d.as_secs() + TOKEN_TTL_SECS) as usize)
            .map_err(|e| LendingError::InvalidToken(format!("Time error: {}", e)))?;

        let claims = Claims {
            sub: actor.user_id.clone(),
            roles: actor.roles.iter().copied().collect(),
            staff: actor.is_staff,
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| LendingError::InvalidToken(format!("JWT encoding error: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, LendingError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| LendingError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims)
    }

    pub fn resolve_actor(&self, token: &str) -> Result<Actor, LendingError> {
        self.validate_token(token).map(Actor::from)
    }
}

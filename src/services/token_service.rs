// src/services/token_service.rs

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    models::auth::{Claims, TokenType, User},
};

/// Par de tokens devolvido no login/refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.create_token(user, TokenType::Access)?,
            refresh_token: self.create_token(user, TokenType::Refresh)?,
        })
    }

    /// Decodifica e confere o tipo: um refresh token nunca serve como access e vice-versa.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::InvalidToken)?;

        if token_data.claims.token_type != expected {
            return Err(AppError::InvalidToken);
        }
        Ok(token_data.claims)
    }

    fn create_token(&self, user: &User, token_type: TokenType) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user.id,
            company_id: user.company_id,
            role: user.role,
            token_type,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use uuid::Uuid;

    fn service() -> TokenService {
        TokenService::new("segredo-de-teste-com-32-caracteres!", Duration::minutes(15), Duration::days(7))
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            unit_id: None,
            email: "ana@clinica.com".to_string(),
            password_hash: String::new(),
            name: "Ana".to_string(),
            role: Role::Dentist,
            specialty: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_carries_tenant_and_role() {
        let user = user();
        let pair = service().issue_pair(&user).unwrap();
        let claims = service().decode(&pair.access_token, TokenType::Access).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.company_id, user.company_id);
        assert_eq!(claims.role, Role::Dentist);
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let pair = service().issue_pair(&user()).unwrap();

        assert!(matches!(
            service().decode(&pair.refresh_token, TokenType::Access),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            service().decode(&pair.access_token, TokenType::Refresh),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = TokenService::new("segredo-de-teste-com-32-caracteres!", Duration::hours(-2), Duration::days(7));
        let pair = expired.issue_pair(&user()).unwrap();

        assert!(service().decode(&pair.access_token, TokenType::Access).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = TokenService::new("outro-segredo-bem-diferente-123456", Duration::minutes(15), Duration::days(7));
        let pair = other.issue_pair(&user()).unwrap();

        assert!(service().decode(&pair.access_token, TokenType::Access).is_err());
    }
}

use jsonwebtoken::{encode, Header, decode, Validation, TokenData, Algorithm};
use chrono::{Utc, Duration};
use crate::entities::employee::Employee;
use crate::entities::token::Claims;
use crate::repositories::token::TokenServiceRepository;
use crate::settings::{AppConfig, JwtKeys};
use crate::errors::AuthError;

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;
const TOKEN_VALIDITY_DAYS: i64 = 1;

#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    expiration: Duration,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
            expiration: Duration::days(TOKEN_VALIDITY_DAYS),
        }
    }

    pub fn create_jwt(&self, employee: &Employee) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = (now + self.expiration).timestamp() as usize;

        let claims = Claims {
            sub: employee.id.to_string(),
            email: employee.email.clone(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding).map_err(|e| {
            tracing::warn!("Failed to create JWT: {}", e);
            AuthError::TokenCreation
        })
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(
            token,
            &self.keys.decoding,
            &validation
        )
        .map_err(AuthError::from)
    }
}

impl TokenServiceRepository for JwtService {
    fn create_jwt(&self, employee: &Employee) -> Result<String, AuthError> {
        self.create_jwt(employee)
    }

    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        self.decode_jwt(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AppConfig {
        AppConfig::testing(secret)
    }

    fn employee() -> Employee {
        Employee::fixture("abebe@example.com", "$argon2id$v=19$m=15000,t=2,p=1$c2FsdA$aGFzaA")
    }

    #[test]
    fn token_carries_id_and_email_for_one_day() {
        let service = JwtService::new(&config("test_jwt_secret_that_is_long_enough_for_hs512"));
        let employee = employee();

        let token = service.create_jwt(&employee).unwrap();
        let claims = service.decode_jwt(&token).unwrap().claims;

        assert_eq!(claims.sub, employee.id.to_string());
        assert_eq!(claims.email, employee.email);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let issuer = JwtService::new(&config("first_secret_that_is_long_enough_for_hs512"));
        let verifier = JwtService::new(&config("other_secret_that_is_long_enough_for_hs512"));

        let token = issuer.create_jwt(&employee()).unwrap();

        assert_eq!(verifier.decode_jwt(&token).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn expired_tokens_are_reported_as_expired() {
        let keys = JwtKeys::from(&config("test_jwt_secret_that_is_long_enough_for_hs512"));
        let service = JwtService {
            keys,
            expiration: Duration::days(-2),
        };

        let token = service.create_jwt(&employee()).unwrap();

        assert_eq!(service.decode_jwt(&token).unwrap_err(), AuthError::TokenExpired);
    }
}

use jsonwebtoken::TokenData;
use crate::{entities::{employee::Employee, token::Claims}, errors::AuthError};

pub trait TokenServiceRepository: Send + Sync {
    /// Creates a session token for the employee
    fn create_jwt(&self, employee: &Employee) -> Result<String, AuthError>;

    /// Decodes a session token and returns the claims
    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError>;
}

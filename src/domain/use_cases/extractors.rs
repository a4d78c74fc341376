use actix_web::{FromRequest, HttpRequest, HttpMessage};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::{entities::token::Claims, errors::{AppError, AuthError}};

/// Extractor for authenticated claims, ensuring the caller is authenticated.
/// Returns 401 if the request carried no valid token.
/// Usage: Add `claims: AuthClaims` as a parameter to your handler function.
#[derive(Debug)]
pub struct AuthClaims(pub Claims);

impl AuthClaims {
    pub fn employee_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.0.sub).map_err(|_| AuthError::InvalidUserId)
    }

    /// Only the account owner may mutate an account.
    pub fn ensure_owner(&self, id: &Uuid) -> Result<(), AppError> {
        match self.employee_id() {
            Ok(sub) if sub == *id => Ok(()),
            _ => Err(AppError::ForbiddenAccess),
        }
    }
}

impl FromRequest for AuthClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthClaims(claims.clone()))),
            None => ready(Err(AuthError::MissingCredentials.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> AuthClaims {
        AuthClaims(Claims {
            sub: sub.into(),
            email: "abebe@example.com".into(),
            exp: 0,
            iat: 0,
        })
    }

    #[test]
    fn owner_check_compares_subject_with_path_id() {
        let id = Uuid::new_v4();

        assert!(claims(&id.to_string()).ensure_owner(&id).is_ok());
        assert!(matches!(
            claims(&Uuid::new_v4().to_string()).ensure_owner(&id),
            Err(AppError::ForbiddenAccess)
        ));
        assert!(matches!(claims("not-a-uuid").ensure_owner(&id), Err(AppError::ForbiddenAccess)));
    }
}

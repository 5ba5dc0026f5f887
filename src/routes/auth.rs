use actix_web::{dev::Payload, http::header, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ErrorResponse;

/// Claims carried by bearer tokens issued by the Lume auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or invalid token")]
    MissingToken,

    #[error("Invalid or expired token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token claims")]
    InvalidClaims,

    #[error("Token verification is not configured")]
    NotConfigured,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: "unauthorized".to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// HS256 bearer token verifier
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a token and return the caller's user id
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Uuid::parse_str(&data.claims.user_id).map_err(|_| AuthError::InvalidClaims)
    }
}

/// Verified identity of the caller
///
/// Extracting it requires a `web::Data<JwtVerifier>` in app data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AuthError> {
    let verifier = req
        .app_data::<web::Data<JwtVerifier>>()
        .ok_or(AuthError::NotConfigured)?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    let user_id = verifier.verify(token).map_err(|e| {
        tracing::debug!("Rejected bearer token on {}: {}", req.path(), e);
        e
    })?;

    Ok(AuthenticatedUser(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, user_id: &str, exp: usize) -> String {
        let claims = Claims {
            user_id: user_id.to_string(),
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn in_one_hour() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_valid_token() {
        let verifier = JwtVerifier::new("secret");
        let user = "00000000-0000-0000-0000-000000000001";

        let id = verifier.verify(&token("secret", user, in_one_hour())).unwrap();
        assert_eq!(id.to_string(), user);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = JwtVerifier::new("secret");
        let t = token("other", "00000000-0000-0000-0000-000000000001", in_one_hour());

        assert!(matches!(verifier.verify(&t), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = JwtVerifier::new("secret");
        let t = token("secret", "00000000-0000-0000-0000-000000000001", 1);

        assert!(matches!(verifier.verify(&t), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let verifier = JwtVerifier::new("secret");
        let t = token("secret", "not-a-uuid", in_one_hour());

        assert!(matches!(verifier.verify(&t), Err(AuthError::InvalidClaims)));
    }
}

//! Bearer-token authentication.
//!
//! Tokens are issued by the hosted auth service. They are either verified
//! locally with the shared HS256 secret or handed to the auth service's
//! `/user` endpoint, depending on configuration.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::clients::auth::AuthClient;
use crate::config::AuthSettings;
use crate::errors::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Malformed Authorization header")]
    MalformedHeader,
    #[error("Token expired")]
    Expired,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Token rejected by auth service")]
    Rejected,
    #[error("Auth service unavailable: {0}")]
    Upstream(String),
}

/// Claims carried by access tokens from the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize,
}

/// Identity of the caller, as established by the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[audience]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

#[derive(Clone)]
pub enum AuthVerifier {
    Jwt(JwtVerifier),
    Remote(AuthClient),
}

impl AuthVerifier {
    pub fn from_settings(settings: &AuthSettings) -> Self {
        match settings {
            AuthSettings::Jwt { secret, audience } => AuthVerifier::Jwt(JwtVerifier::new(secret, audience)),
            AuthSettings::Remote { url, anon_key } => {
                AuthVerifier::Remote(AuthClient::new(url, anon_key.clone()))
            }
        }
    }

    pub async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        match self {
            AuthVerifier::Jwt(verifier) => verifier.verify(token),
            AuthVerifier::Remote(client) => client.get_user(token).await,
        }
    }
}

pub fn bearer_token(req: &HttpRequest) -> Result<String, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token.to_string())
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let verifier = req.app_data::<web::Data<AuthVerifier>>().cloned();
        let path = req.path().to_string();

        Box::pin(async move {
            let verifier =
                verifier.ok_or_else(|| ApiError::Internal("Auth verifier is not configured".into()))?;
            let token = token?;
            verifier.verify(&token).await.map_err(|err| {
                log::warn!("Rejected token for {path}: {err}");
                ApiError::from(err)
            })
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub(crate) const TEST_SECRET: &str = "test-secret";
    pub(crate) const TEST_AUDIENCE: &str = "authenticated";

    pub(crate) fn token_for(user_id: Uuid, exp_offset_secs: i64, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            email: Some("customer@example.com".into()),
            aud: TEST_AUDIENCE.into(),
            exp: (now + exp_offset_secs) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_subject() {
        let verifier = JwtVerifier::new(TEST_SECRET, TEST_AUDIENCE);
        let id = Uuid::new_v4();
        let user = verifier.verify(&token_for(id, 3600, TEST_SECRET)).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("customer@example.com"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = JwtVerifier::new(TEST_SECRET, TEST_AUDIENCE);
        let err = verifier
            .verify(&token_for(Uuid::new_v4(), -3600, TEST_SECRET))
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let verifier = JwtVerifier::new(TEST_SECRET, TEST_AUDIENCE);
        let err = verifier
            .verify(&token_for(Uuid::new_v4(), 3600, "another-secret"))
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let verifier = JwtVerifier::new(TEST_SECRET, "service_role");
        let err = verifier
            .verify(&token_for(Uuid::new_v4(), 3600, TEST_SECRET))
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req).unwrap(), "abc.def");

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req).unwrap(), "abc.def");

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(matches!(bearer_token(&req), Err(AuthError::MalformedHeader)));

        let req = TestRequest::default().to_http_request();
        assert!(matches!(bearer_token(&req), Err(AuthError::MissingToken)));
    }
}

use std::future::{ready, Ready};

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::ResponseError;
use actix_web::HttpMessage;
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use crate::errors::ApiError;

/// Identity resolved by the gate, attached to request extensions for the
/// protected handlers downstream.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Bearer-token authentication gate. Verifies the token once per request and
/// injects [`AuthenticatedUser`]; any failure short-circuits with 401.
#[derive(Clone)]
pub struct AuthGate {
    jwt_secret: String,
}

impl AuthGate {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            jwt_secret: jwt_secret.to_string(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = AuthGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateService {
            service,
            jwt_secret: self.jwt_secret.clone(),
        }))
    }
}

pub struct AuthGateService<S> {
    service: S,
    jwt_secret: String,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req, &self.jwt_secret) {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthenticatedUser { user_id });
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(err) => {
                let res = req.into_response(err.error_response()).map_into_right_body();
                Box::pin(ready(Ok(res)))
            }
        }
    }
}

fn authenticate(req: &ServiceRequest, secret: &str) -> Result<Uuid, ApiError> {
    let token = parse_bearer(req)?;
    jwt::verify(&token, secret)
}

fn parse_bearer(req: &ServiceRequest) -> Result<String, ApiError> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or(ApiError::Unauthenticated)?;
    let value = header.to_str().map_err(|_| ApiError::Unauthenticated)?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .ok_or(ApiError::Unauthenticated)
}

pub mod jwt {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
    use uuid::Uuid;

    use crate::dto::Claims;
    use crate::errors::ApiError;

    pub const TOKEN_TTL_HOURS: i64 = 24;

    /// Signs a token asserting `user_id`, expiring 24 hours from issuance.
    pub fn issue(user_id: Uuid, secret: &str) -> Result<String, ApiError> {
        let exp = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
        let claims = Claims::new(user_id, exp);
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|err| ApiError::Storage(format!("sign token: {err}")))
    }

    /// Malformed, tampered and expired tokens are deliberately
    /// indistinguishable to the caller.
    pub fn verify(token: &str, secret: &str) -> Result<Uuid, ApiError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| ApiError::Unauthenticated)?;
        Ok(data.claims.user_id)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn issued_token_round_trips() {
            let user_id = Uuid::new_v4();
            let token = issue(user_id, "test-secret").unwrap();
            assert_eq!(verify(&token, "test-secret").unwrap(), user_id);
        }

        #[test]
        fn wrong_secret_is_rejected() {
            let token = issue(Uuid::new_v4(), "test-secret").unwrap();
            assert!(matches!(
                verify(&token, "other-secret").unwrap_err(),
                ApiError::Unauthenticated
            ));
        }

        #[test]
        fn garbage_token_is_rejected() {
            assert!(matches!(
                verify("not-a-token", "test-secret").unwrap_err(),
                ApiError::Unauthenticated
            ));
        }
    }
}

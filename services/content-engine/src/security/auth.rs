//! Bearer-token identity middleware.
//!
//! The content store serves anonymous readers, so a missing Authorization
//! header is not an error: the request proceeds with no identity and the
//! visibility predicates narrow what it can see. A header that is present
//! but unverifiable is rejected.

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: String,
    pub exp: usize,
}

/// A verified identity attached to the current request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
    pub elevated: bool,
}

impl AuthenticatedUser {
    fn from_claims(claims: &Claims) -> Option<Self> {
        let id = Uuid::parse_str(&claims.sub).ok()?;
        Some(AuthenticatedUser {
            id,
            name: claims.name.clone(),
            elevated: matches!(claims.role.as_str(), "staff" | "admin"),
        })
    }
}

/// The requester of the current operation: an authenticated user or nobody.
#[derive(Debug, Clone)]
pub enum Requester {
    Anonymous,
    User(AuthenticatedUser),
}

impl Requester {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Requester::Anonymous => None,
            Requester::User(user) => Some(user),
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.user().map_or(false, |u| u.elevated)
    }
}

impl FromRequest for Requester {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let requester = req
            .extensions()
            .get::<Claims>()
            .and_then(AuthenticatedUser::from_claims)
            .map_or(Requester::Anonymous, Requester::User);
        ready(Ok(requester))
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .extensions()
            .get::<Claims>()
            .and_then(AuthenticatedUser::from_claims);
        ready(user.ok_or_else(|| {
            actix_web::error::ErrorUnauthorized("Authentication required")
        }))
    }
}

pub struct BearerIdentity {
    secret: String,
}

impl BearerIdentity {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerIdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerIdentityMiddleware {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct BearerIdentityMiddleware<S> {
    service: Rc<S>,
    secret: String,
}

impl<S, B> Service<ServiceRequest> for BearerIdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let auth_header = match req.headers().get("Authorization") {
            Some(value) => value.to_str().unwrap_or("").to_string(),
            None => {
                let fut = self.service.call(req);
                return Box::pin(async move { fut.await });
            }
        };

        let token = match auth_header.strip_prefix("Bearer ") {
            Some(token) => token.to_string(),
            None => {
                return Box::pin(async {
                    Err(actix_web::error::ErrorUnauthorized(
                        "Invalid auth header format",
                    ))
                });
            }
        };

        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(
            &token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(token_data) => {
                req.extensions_mut().insert(token_data.claims);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await })
            }
            Err(err) => {
                tracing::warn!("Bearer token validation failed: {:?}", err);
                Box::pin(async {
                    Err(actix_web::error::ErrorUnauthorized(
                        "Invalid or expired token",
                    ))
                })
            }
        }
    }
}

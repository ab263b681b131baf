/// Bearer-token authentication for the blog service.
///
/// A request is authenticated by validating its `Authorization: Bearer`
/// header against the platform JWT keys and threading the resulting
/// [`Identity`] into whatever needs it. Protected scopes wrap
/// [`JwtAuthMiddleware`]; resources that mix public and protected methods
/// rely on the [`Identity`] extractor, which performs the same validation
/// itself when no middleware ran. Either way the check happens before any
/// handler or store code.
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{http::header, Error, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::AppError;

/// Verified caller identity: who the token says they are, and until when.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Uuid,
    pub token_expiry: DateTime<Utc>,
}

/// Validate the bearer token on a request, if any.
fn authenticate(req: &HttpRequest) -> Result<Identity, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("invalid Authorization scheme".to_string()))?;

    let data = auth_core::jwt::validate_token(token)
        .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

    let user_id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| AppError::Unauthorized("invalid user id in token".to_string()))?;

    Ok(Identity {
        user_id,
        token_expiry: data.claims.expires_at(),
    })
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        if let Some(identity) = req.extensions().get::<Identity>() {
            return ready(Ok(*identity));
        }
        ready(authenticate(req).map_err(Error::from))
    }
}

/// Actix middleware that rejects unauthenticated requests for a whole scope.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
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
        let service = self.service.clone();

        Box::pin(async move {
            let identity = authenticate(req.request())?;
            req.extensions_mut().insert(identity);

            service.call(req).await
        })
    }
}

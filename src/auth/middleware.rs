use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::verify_token;
use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie set at login.
pub const TOKEN_COOKIE: &str = "token";

/// Routes reachable without a token.
pub fn is_public(method: &Method, path: &str) -> bool {
    if path == "/health" {
        return true;
    }
    if path.starts_with("/api/auth/") && path != "/api/auth/change-password" {
        return true;
    }
    *method == Method::GET
        && (path == "/api/categories"
            || path.starts_with("/api/categories/")
            || path == "/api/ratings"
            || path.starts_with("/api/ratings/"))
}

/// Validates the JWT of every non-public request and stores its `Claims` in the
/// request extensions. The token is read from the `Authorization: Bearer` header,
/// falling back to the `token` cookie.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(req.method(), req.path()) {
            return Box::pin(self.service.call(req));
        }

        let secret = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.jwt_secret.clone(),
            None => {
                let app_err = AppError::InternalServerError("Application state missing".into());
                return Box::pin(async move { Err(app_err.into()) });
            }
        };

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string)
            .or_else(|| req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string()));

        match token {
            Some(token) => match verify_token(&token, &secret) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    Box::pin(self.service.call(req))
                }
                Err(app_err) => {
                    log::debug!("Rejected token for {}: {}", req.path(), app_err);
                    Box::pin(async move { Err(app_err.into()) })
                }
            },
            None => {
                let app_err = AppError::Unauthorized("JWT token is missing".into());
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::POST, "/api/auth/login"));
        assert!(is_public(&Method::POST, "/api/auth/sendotp"));
        assert!(is_public(&Method::GET, "/api/categories"));
        assert!(is_public(&Method::GET, "/api/ratings/average/abc"));

        assert!(!is_public(&Method::POST, "/api/auth/change-password"));
        assert!(!is_public(&Method::POST, "/api/categories"));
        assert!(!is_public(&Method::POST, "/api/ratings"));
        assert!(!is_public(&Method::POST, "/api/progress/update"));
        assert!(!is_public(&Method::GET, "/api/courses"));
    }
}

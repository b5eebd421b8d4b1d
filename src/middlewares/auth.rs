use crate::error::AppError;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

const ADMIN_PREFIX: &str = "/api/v1/admin";

/// Caller identity injected into request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub is_staff: bool,
}

struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    /// Open for GET only
    read_only_prefixes: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            prefix_paths: vec![
                "/swagger-ui/",
                "/api-docs/",
                "/api/v1/auth/",
                // signed with HMAC instead of a bearer token
                "/api/v1/internal/",
                "/webhook/",
            ],
            read_only_prefixes: vec![
                "/api/v1/stations",
                "/api/v1/packages",
                "/api/v1/referrals/validate/",
            ],
        }
    }

    fn is_public_path(&self, method: &Method, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }
        if self
            .prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
        {
            return true;
        }
        *method == Method::GET
            && self
                .read_only_prefixes
                .iter()
                .any(|&prefix| path.starts_with(prefix))
    }
}

fn is_admin_path(path: &str) -> bool {
    path == ADMIN_PREFIX || path.starts_with("/api/v1/admin/")
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S> AuthMiddlewareService<S> {
    fn authenticate(&self, req: &ServiceRequest) -> Result<AuthUser, AppError> {
        let token = bearer_token(req)
            .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))?;
        let claims = self
            .jwt_service
            .verify_access_token(token)
            .map_err(|_| AppError::AuthError("Invalid access token".to_string()))?;
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;

        if is_admin_path(req.path()) && !claims.is_staff {
            log::warn!("Non-staff user {id} denied access to {}", req.path());
            return Err(AppError::Forbidden);
        }

        Ok(AuthUser {
            id,
            is_staff: claims.is_staff,
        })
    }
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
        // CORS preflight
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        if self.public_paths.is_public_path(req.method(), req.path()) {
            return Box::pin(self.service.call(req));
        }

        match self.authenticate(&req) {
            Ok(user) => {
                req.extensions_mut().insert(user);
                Box::pin(self.service.call(req))
            }
            Err(error) => Box::pin(async move { Err(error.into()) }),
        }
    }
}

/// Caller injected by `AuthMiddleware`; handlers behind it can rely on it.
pub fn current_user(req: &HttpRequest) -> Result<AuthUser, AppError> {
    req.extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path(&Method::POST, "/api/v1/auth/login"));
        assert!(paths.is_public_path(&Method::POST, "/api/v1/auth/refresh"));
        assert!(paths.is_public_path(&Method::POST, "/api/v1/internal/stations/data"));
        assert!(paths.is_public_path(&Method::POST, "/webhook/payments/khalti"));
        assert!(paths.is_public_path(&Method::GET, "/swagger-ui/"));
        assert!(paths.is_public_path(&Method::GET, "/api-docs/openapi.json"));
    }

    #[test]
    fn test_station_browsing_is_read_only_public() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path(&Method::GET, "/api/v1/stations"));
        assert!(paths.is_public_path(&Method::GET, "/api/v1/stations/CG-001"));
        assert!(paths.is_public_path(&Method::GET, "/api/v1/referrals/validate/ABCD1234"));
        assert!(!paths.is_public_path(&Method::POST, "/api/v1/stations"));
    }

    #[test]
    fn test_private_paths() {
        let paths = PublicPaths::new();
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/users/me"));
        assert!(!paths.is_public_path(&Method::POST, "/api/v1/rentals/start"));
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/admin/dashboard"));
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/referrals/my"));
    }

    #[test]
    fn test_admin_path_detection() {
        assert!(is_admin_path("/api/v1/admin"));
        assert!(is_admin_path("/api/v1/admin/users"));
        assert!(!is_admin_path("/api/v1/administrators"));
        assert!(!is_admin_path("/api/v1/rentals"));
    }
}

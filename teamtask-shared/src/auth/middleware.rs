//! Authentication middleware for Axum
//!
//! [`jwt_auth`] validates the `Authorization: Bearer <token>` header and puts
//! an [`AuthContext`] into the request extensions. [`role_guard`] runs after
//! it and rejects callers whose role does not match the route group.
//!
//! # Example
//!
//! ```no_run
//! use axum::{middleware, routing::get, Router};
//! use chrono::Duration;
//! use std::sync::Arc;
//! use teamtask_shared::auth::jwt::TokenIssuer;
//! use teamtask_shared::auth::middleware::{jwt_auth, role_guard, AuthContext};
//! use teamtask_shared::models::user::Role;
//!
//! async fn handler(auth: AuthContext) -> String {
//!     format!("Hello, {}", auth.user_id)
//! }
//!
//! let issuer = Arc::new(TokenIssuer::new("a-secret-of-at-least-thirty-two-bytes!", Duration::hours(1)));
//! let app: Router = Router::new()
//!     .route("/manager-only", get(handler))
//!     .layer(middleware::from_fn_with_state(Role::Manager, role_guard))
//!     .layer(middleware::from_fn_with_state(issuer, jwt_auth));
//! ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::jwt::{JwtError, TokenIssuer};
use crate::models::user::Role;

/// Authenticated caller, added to request extensions by [`jwt_auth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

/// Error type for authentication middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Authenticated, but the route requires another role
    WrongRole { required: Role },
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            AuthError::WrongRole { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthError::MissingCredentials => "Missing credentials".to_string(),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg.clone(),
            AuthError::WrongRole { required } => {
                format!("This action requires the {} role", required)
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidFormat(_) => "bad_request",
            AuthError::WrongRole { .. } => "forbidden",
            _ => "unauthorized",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.message(),
        }));
        (self.status(), body).into_response()
    }
}

/// JWT authentication middleware
///
/// Returns 401 when the header is missing or the token is invalid or expired,
/// 400 when the header is not a bearer token.
pub async fn jwt_auth(
    State(issuer): State<Arc<TokenIssuer>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = issuer.verify(token).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        role: claims.role,
    });

    Ok(next.run(req).await)
}

/// Role gate; must be layered inside [`jwt_auth`]
pub async fn role_guard(
    State(required): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or(AuthError::MissingCredentials)?;

    if auth.role != required {
        tracing::debug!(user_id = %auth.user_id, role = %auth.role, required = %required, "Role mismatch");
        return Err(AuthError::WrongRole { required });
    }

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use chrono::Duration;
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn app(issuer: Arc<TokenIssuer>, role: Role) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|auth: AuthContext| async move { auth.user_id.to_string() }),
            )
            .layer(middleware::from_fn_with_state(role, role_guard))
            .layer(middleware::from_fn_with_state(issuer, jwt_auth))
    }

    async fn call(app: Router, auth: Option<String>) -> StatusCode {
        let mut builder = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_matching_role_passes() {
        let issuer = Arc::new(TokenIssuer::new(SECRET, Duration::hours(1)));
        let token = issuer.issue(Uuid::new_v4(), Role::Manager).unwrap();

        let status = call(app(issuer, Role::Manager), Some(format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_role_forbidden() {
        let issuer = Arc::new(TokenIssuer::new(SECRET, Duration::hours(1)));
        let token = issuer.issue(Uuid::new_v4(), Role::Member).unwrap();

        let status = call(app(issuer, Role::Manager), Some(format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_tokens() {
        let issuer = Arc::new(TokenIssuer::new(SECRET, Duration::hours(1)));

        assert_eq!(
            call(app(issuer.clone(), Role::Member), None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            call(app(issuer.clone(), Role::Member), Some("Bearer nope".into())).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            call(app(issuer, Role::Member), Some("Basic abc".into())).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_error_status() {
        assert_eq!(AuthError::MissingCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::WrongRole { required: Role::Member }.status(),
            StatusCode::FORBIDDEN
        );
    }
}

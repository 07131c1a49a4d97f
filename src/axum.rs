//! Axum integration utilities.
//!
//! [`ScopeLayer`] turns a verified [`Identity`] found in request extensions
//! into a per-request [`CallerContext`]; [`RoleLayer`] applies the coarse role
//! gate; handlers extract the context with `CallerContext` as an argument.
//! Domain errors convert into responses through [`IntoResponse`].

use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::directory::Directory;
use crate::error::{Error, ErrorKind};
use crate::identity::{CallerContext, Identity};
use crate::store::Store;
use crate::types::Role;

use ::axum::Json;
use ::axum::body::Body;
use ::axum::extract::FromRequestParts;
use ::axum::http::request::Parts;
use ::axum::http::{Request, StatusCode};
use ::axum::response::{IntoResponse, Response};
use ::tower::{Layer, Service};

/// HTTP status for an error.
pub fn status_for(error: &Error) -> StatusCode {
    match error.kind() {
        ErrorKind::Invalid => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let message = match self.kind() {
            ErrorKind::Internal => {
                tracing::error!(error = %self, "internal error while handling request");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };
        let body = serde_json::json!({
            "error": {
                "message": message,
                "code": self.code(),
            }
        });
        (status, Json(body)).into_response()
    }
}

fn unauthenticated(message: &'static str) -> Response {
    let body = serde_json::json!({
        "error": { "message": message, "code": "UNAUTHENTICATED" }
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

impl<St> FromRequestParts<St> for CallerContext
where
    St: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerContext>()
            .cloned()
            .ok_or_else(|| unauthenticated("missing caller context"))
    }
}

/// Middleware layer that resolves the caller's accessible scope per request.
pub struct ScopeLayer<S> {
    directory: Arc<Directory<S>>,
}

impl<S> ScopeLayer<S> {
    /// Creates a new scope layer.
    pub fn new(directory: Arc<Directory<S>>) -> Self {
        Self { directory }
    }
}

impl<S> Clone for ScopeLayer<S> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
        }
    }
}

impl<S, Inner> Layer<Inner> for ScopeLayer<S>
where
    S: Store,
{
    type Service = ScopeService<Inner, S>;

    fn layer(&self, inner: Inner) -> Self::Service {
        ScopeService {
            inner,
            directory: self.directory.clone(),
        }
    }
}

/// Middleware service that inserts a [`CallerContext`] into request extensions.
pub struct ScopeService<Inner, S> {
    inner: Inner,
    directory: Arc<Directory<S>>,
}

impl<Inner: Clone, S> Clone for ScopeService<Inner, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            directory: self.directory.clone(),
        }
    }
}

impl<Inner, S> Service<Request<Body>> for ScopeService<Inner, S>
where
    Inner: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
    S: Store + 'static,
{
    type Response = Response;
    type Error = Inner::Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let directory = self.directory.clone();

        Box::pin(async move {
            let identity = req.extensions().get::<Identity>().cloned();
            let Some(identity) = identity else {
                return Ok(unauthenticated("missing identity"));
            };

            match directory.authenticate(identity).await {
                Ok(context) => {
                    req.extensions_mut().insert(context);
                    poll_fn(|cx| inner.poll_ready(cx)).await?;
                    inner.call(req).await
                }
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}

/// Middleware layer that admits only callers holding a role.
#[derive(Debug, Clone, Copy)]
pub struct RoleLayer {
    role: Role,
}

impl RoleLayer {
    /// Creates a layer requiring `role`.
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    /// Creates a layer admitting managers only.
    pub fn managers() -> Self {
        Self::new(Role::Manager)
    }
}

impl<Inner> Layer<Inner> for RoleLayer {
    type Service = RoleService<Inner>;

    fn layer(&self, inner: Inner) -> Self::Service {
        RoleService {
            inner,
            role: self.role,
        }
    }
}

/// Middleware service enforcing the role gate.
#[derive(Debug, Clone)]
pub struct RoleService<Inner> {
    inner: Inner,
    role: Role,
}

impl<Inner> Service<Request<Body>> for RoleService<Inner>
where
    Inner: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
{
    type Response = Response;
    type Error = Inner::Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let role = self.role;

        Box::pin(async move {
            let gate = match req.extensions().get::<CallerContext>() {
                Some(context) => context.require_role(role),
                None => return Ok(unauthenticated("missing caller context")),
            };
            match gate {
                Ok(()) => {
                    poll_fn(|cx| inner.poll_ready(cx)).await?;
                    inner.call(req).await
                }
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}

#[cfg(feature = "axum-jwt")]
pub mod jwt {
    use std::fmt;
    use std::future::poll_fn;
    use std::marker::PhantomData;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};

    use jsonwebtoken::{DecodingKey, Validation, decode};
    use serde::de::DeserializeOwned;
    use thiserror::Error;

    use crate::identity::Identity;
    use crate::types::{NodeId, Role, UserId};

    use ::axum::Json;
    use ::axum::body::Body;
    use ::axum::http::header::AUTHORIZATION;
    use ::axum::http::{HeaderMap, Request, StatusCode};
    use ::axum::response::{IntoResponse, Response};
    use ::tower::{Layer, Service};

    /// Errors returned by JWT auth helpers.
    #[derive(Debug, Error)]
    pub enum AuthError {
        /// Authorization header is missing.
        #[error("not authenticated (no token)")]
        MissingAuthorization,
        /// Authorization header format is invalid.
        #[error("bad authorization header format")]
        InvalidAuthorization,
        /// Signature, expiry or encoding check failed.
        #[error("invalid or expired token")]
        InvalidToken,
        /// Required claims are missing or invalid.
        #[error("invalid claims: {0}")]
        InvalidClaims(String),
    }

    impl AuthError {
        fn code(&self) -> &'static str {
            match self {
                Self::MissingAuthorization => "NO_TOKEN",
                Self::InvalidAuthorization => "BAD_HEADER",
                Self::InvalidToken => "INVALID_TOKEN",
                Self::InvalidClaims(_) => "INVALID_CLAIMS",
            }
        }
    }

    impl IntoResponse for AuthError {
        fn into_response(self) -> Response {
            let body = serde_json::json!({
                "error": { "message": self.to_string(), "code": self.code() }
            });
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }

    /// Claims type that yields a caller identity.
    pub trait IdentityClaims: DeserializeOwned + Send + Sync + Clone + 'static {
        /// Builds the identity carried by the token.
        fn identity(&self) -> Result<Identity, AuthError>;
    }

    /// Default JWT claims shape: `{ userId, role, nodeId }`.
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Claims {
        /// Authenticated user.
        pub user_id: String,
        /// Role at issuance time.
        pub role: Role,
        /// Node the user was attached to at issuance time.
        pub node_id: String,
        /// Standard JWT expiration.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub exp: Option<u64>,
    }

    impl IdentityClaims for Claims {
        fn identity(&self) -> Result<Identity, AuthError> {
            let user_id = UserId::try_from(self.user_id.as_str())
                .map_err(|err| AuthError::InvalidClaims(err.to_string()))?;
            let node_id = NodeId::try_from(self.node_id.as_str())
                .map_err(|err| AuthError::InvalidClaims(err.to_string()))?;
            Ok(Identity::new(user_id, self.role, node_id))
        }
    }

    /// JWT auth state holding decoding settings.
    pub struct JwtAuthState<C: IdentityClaims = Claims> {
        decoding_key: DecodingKey,
        validation: Validation,
        _marker: PhantomData<fn() -> C>,
    }

    impl<C: IdentityClaims> fmt::Debug for JwtAuthState<C> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("JwtAuthState")
                .field("decoding_key", &"<redacted>")
                .field("validation", &self.validation)
                .finish()
        }
    }

    impl<C: IdentityClaims> JwtAuthState<C> {
        /// Creates a new JWT auth state.
        pub fn new(decoding_key: DecodingKey, validation: Validation) -> Self {
            Self {
                decoding_key,
                validation,
                _marker: PhantomData,
            }
        }

        /// Verifies the bearer token in `headers` and returns its identity.
        pub fn decode_identity(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
            let token = bearer_token(headers)?;
            let data = decode::<C>(token, &self.decoding_key, &self.validation)
                .map_err(|_| AuthError::InvalidToken)?;
            data.claims.identity()
        }
    }

    /// Middleware layer that verifies the bearer token and inserts the [`Identity`].
    pub struct JwtAuthLayer<C: IdentityClaims = Claims> {
        state: Arc<JwtAuthState<C>>,
    }

    impl<C: IdentityClaims> JwtAuthLayer<C> {
        /// Creates a new JWT auth layer.
        pub fn new(state: JwtAuthState<C>) -> Self {
            Self {
                state: Arc::new(state),
            }
        }
    }

    impl<C: IdentityClaims> Clone for JwtAuthLayer<C> {
        fn clone(&self) -> Self {
            Self {
                state: self.state.clone(),
            }
        }
    }

    impl<S, C> Layer<S> for JwtAuthLayer<C>
    where
        C: IdentityClaims,
    {
        type Service = JwtAuthService<S, C>;

        fn layer(&self, inner: S) -> Self::Service {
            JwtAuthService {
                inner,
                state: self.state.clone(),
            }
        }
    }

    /// Middleware service that verifies the bearer token.
    pub struct JwtAuthService<S, C: IdentityClaims = Claims> {
        inner: S,
        state: Arc<JwtAuthState<C>>,
    }

    impl<S: Clone, C: IdentityClaims> Clone for JwtAuthService<S, C> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
                state: self.state.clone(),
            }
        }
    }

    impl<S, C> Service<Request<Body>> for JwtAuthService<S, C>
    where
        S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
        S::Future: Send + 'static,
        C: IdentityClaims,
    {
        type Response = Response;
        type Error = S::Error;
        type Future =
            Pin<Box<dyn std::future::Future<Output = Result<Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, mut req: Request<Body>) -> Self::Future {
            let state = self.state.clone();
            let mut inner = self.inner.clone();

            Box::pin(async move {
                match state.decode_identity(req.headers()) {
                    Ok(identity) => {
                        req.extensions_mut().insert(identity);
                        poll_fn(|cx| inner.poll_ready(cx)).await?;
                        inner.call(req).await
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "bearer authentication failed");
                        Ok(err.into_response())
                    }
                }
            })
        }
    }

    /// Extracts the token from an `Authorization: Bearer <token>` header.
    pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;
        let value = value
            .to_str()
            .map_err(|_| AuthError::InvalidAuthorization)?;
        let mut parts = value.split(' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
            _ => Err(AuthError::InvalidAuthorization),
        }
    }

}

//! Bearer token identity middleware

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::{
    collections::HashMap,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::warn;

use crate::error::AppError;
use crate::middleware::is_public_path;

/// The user a request acts on behalf of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
    pub fn user_id(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("No caller identity".to_string()))
    }
}

/// Resolves `Authorization: Bearer <token>` to a user id.
///
/// With no tokens configured every request acts as the default user.
#[derive(Clone)]
pub struct AuthLayer {
    tokens: Arc<HashMap<String, String>>,
    default_user: Arc<str>,
}

impl AuthLayer {
    pub fn new(tokens: HashMap<String, String>, default_user: impl Into<String>) -> Self {
        Self {
            tokens: Arc::new(tokens),
            default_user: Arc::from(default_user.into()),
        }
    }

    /// Every request acts as `user`
    pub fn single_user(user: impl Into<String>) -> Self {
        Self::new(HashMap::new(), user)
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            tokens: self.tokens.clone(),
            default_user: self.default_user.clone(),
        }
    }
}

/// Authentication middleware service
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    tokens: Arc<HashMap<String, String>>,
    default_user: Arc<str>,
}

impl<S> AuthMiddleware<S> {
    fn resolve(&self, request: &Request<Body>) -> Result<Identity, &'static str> {
        if self.tokens.is_empty() {
            return Ok(Identity(self.default_user.to_string()));
        }

        let token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|h| h.strip_prefix("Bearer ").unwrap_or(h).trim())
            .filter(|t| !t.is_empty())
            .ok_or("Authentication required. Provide 'Authorization: Bearer <token>'")?;

        self.tokens
            .get(token)
            .map(|user| Identity(user.clone()))
            .ok_or("Invalid token")
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        if is_public_path(request.uri().path()) {
            let future = self.inner.call(request);
            return Box::pin(future);
        }

        match self.resolve(&request) {
            Ok(identity) => {
                request.extensions_mut().insert(identity);
                let future = self.inner.call(request);
                Box::pin(future)
            }
            Err(message) => {
                warn!(path = %request.uri().path(), reason = message, "Rejected unauthenticated request");
                Box::pin(async move { Ok(AppError::Unauthorized(message.to_string()).into_response()) })
            }
        }
    }
}

//! Caller identity
//!
//! Token verification happens upstream. This layer only needs to know which
//! owner (`openid`) a request acts for, or that it acts for nobody.

use crate::core::error::ApiError;
use anyhow::Result;
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use std::collections::HashMap;
use std::sync::Arc;

/// Header carrying the opaque access token
pub const TOKEN_HEADER: &str = "token";

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Authenticated owner
    User { openid: String },

    /// No resolvable identity
    Anonymous,
}

impl AuthContext {
    pub fn user(openid: impl Into<String>) -> Self {
        AuthContext::User {
            openid: openid.into(),
        }
    }

    /// Get the owner identity if available
    pub fn openid(&self) -> Option<&str> {
        match self {
            AuthContext::User { openid } => Some(openid),
            AuthContext::Anonymous => None,
        }
    }
}

/// Trait for auth providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Extract auth context from HTTP request headers
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext>;
}

/// Provider that treats every request as anonymous
pub struct NoAuthProvider;

#[async_trait]
impl AuthProvider for NoAuthProvider {
    async fn extract_context(&self, _headers: &HeaderMap) -> Result<AuthContext> {
        Ok(AuthContext::Anonymous)
    }
}

/// Resolves the `token` header through a fixed token -> openid table.
///
/// Unknown or missing tokens resolve to [`AuthContext::Anonymous`].
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthProvider {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuthProvider {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// Register a token for an owner
    pub fn with_token(mut self, token: impl Into<String>, openid: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), openid.into());
        self
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuthProvider {
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext> {
        let Some(token) = headers.get(TOKEN_HEADER) else {
            return Ok(AuthContext::Anonymous);
        };
        let token = token.to_str()?;

        Ok(match self.tokens.get(token) {
            Some(openid) => AuthContext::user(openid.clone()),
            None => {
                tracing::debug!("unknown token, treating request as anonymous");
                AuthContext::Anonymous
            }
        })
    }
}

/// Extractor resolving the caller through the state's [`AuthProvider`]
#[derive(Debug, Clone)]
pub struct Caller(pub AuthContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    Arc<dyn AuthProvider>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let provider = <Arc<dyn AuthProvider> as FromRef<S>>::from_ref(state);
        let context = provider
            .extract_context(&parts.headers)
            .await
            .map_err(|e| ApiError::Internal(format!("auth provider failed: {}", e)))?;
        Ok(Caller(context))
    }
}

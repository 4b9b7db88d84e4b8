use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::error::ApiError;

/// Principal
///
/// The resolved identity of the current request. Lives only as long as the request:
/// it is built by the token gate, carried in the request's [`AuthContext`] and dropped
/// with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject: String,
    authorities: Vec<String>,
    authenticated: bool,
}

impl Principal {
    /// An authenticated principal, as produced by a successful gate pass.
    pub fn authenticated(subject: impl Into<String>, authorities: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            authorities,
            authenticated: true,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// AuthContext
///
/// Request-scoped authentication state, stored in the request extensions by the gate
/// middleware. Starts anonymous; the gate installs at most one principal.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    principal: Option<Principal>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.as_ref().is_some_and(Principal::is_authenticated)
    }

    pub(crate) fn install(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    pub(crate) fn clear(&mut self) {
        self.principal = None;
    }
}

fn current_principal(parts: &Parts) -> Option<Principal> {
    parts
        .extensions
        .get::<AuthContext>()
        .and_then(AuthContext::principal)
        .filter(|p| p.is_authenticated())
        .cloned()
}

/// Authenticated
///
/// Handler extractor requiring an authenticated principal. This is the handler-level
/// check that stands behind the authorization layer: a handler taking `Authenticated`
/// cannot run without a principal even if a route's policy entry were wrong.
///
/// Rejection: `ApiError::authentication_required()` (401).
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_principal(parts)
            .map(Authenticated)
            .ok_or_else(ApiError::authentication_required)
    }
}

/// CurrentPrincipal
///
/// The principal if one was installed, `None` otherwise. Never rejects; for public
/// handlers that personalise when a caller happens to be signed in.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Option<Principal>);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentPrincipal(current_principal(parts)))
    }
}

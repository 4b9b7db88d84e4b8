use axum::http::{HeaderMap, header};
use thiserror::Error;

use super::{
    principal::{AuthContext, Principal},
    token::{Claims, TokenVerifier},
};
use crate::identity::{Identity, IdentityState};

const BEARER_PREFIX: &str = "Bearer ";

/// AuthFailure
///
/// Why a protected request ended up unauthenticated. Every variant has the same effect
/// on the request (it continues without a principal); they differ only in how they are
/// logged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("no bearer credentials presented")]
    MissingCredentials,
    #[error("bearer token is malformed")]
    MalformedToken,
    #[error("bearer token has expired")]
    ExpiredToken,
    #[error("bearer token signature is invalid")]
    InvalidSignature,
    #[error("token subject has no identity")]
    UnknownIdentity,
    #[error("token is not bound to the identity's current credentials")]
    BindingMismatch,
    #[error("identity store is unavailable")]
    IdentityStoreUnavailable,
}

impl AuthFailure {
    fn log(self) {
        match self {
            AuthFailure::MissingCredentials => {
                tracing::debug!(reason = %self, "request unauthenticated")
            }
            AuthFailure::ExpiredToken | AuthFailure::UnknownIdentity => {
                tracing::info!(reason = %self, "request unauthenticated")
            }
            AuthFailure::MalformedToken
            | AuthFailure::InvalidSignature
            | AuthFailure::BindingMismatch => {
                tracing::warn!(reason = %self, "request unauthenticated")
            }
            AuthFailure::IdentityStoreUnavailable => {
                tracing::error!(reason = %self, "request unauthenticated")
            }
        }
    }
}

/// GateOutcome
///
/// Terminal state of one gate pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The route classifier marked the request public; the gate did not run.
    Bypassed,
    /// A principal was resolved and installed in the request context.
    Authenticated(Principal),
    /// The token verified and the context already held a principal; no lookup was made.
    AlreadyAuthenticated(Principal),
    /// No principal. Rejection, if any, is the authorization layer's job.
    Unauthenticated(AuthFailure),
}

impl GateOutcome {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            GateOutcome::Authenticated(p) | GateOutcome::AlreadyAuthenticated(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal().is_some()
    }
}

/// bearer_token
///
/// The raw token from `Authorization: Bearer <token>`. Any other scheme, a
/// non-visible-ASCII header value, or an empty token yields `None` without any
/// attempt at parsing.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// TokenGate
///
/// Turns the bearer credentials of a protected request into a principal:
///
/// 1. Extract the bearer token (absent or non-Bearer: unauthenticated).
/// 2. Verify signature and expiry.
/// 3. If the context already holds a principal for the token's subject, keep it (no
///    second lookup). A principal for any other subject is dropped.
/// 4. Load the subject's identity (unknown subject: unauthenticated).
/// 5. Check the token's fingerprint against the identity's current one.
/// 6. Install the principal in the request context.
///
/// The gate never produces an error response and never fails: every failure becomes
/// `GateOutcome::Unauthenticated`.
pub struct TokenGate {
    verifier: TokenVerifier,
    identities: IdentityState,
}

impl TokenGate {
    pub fn new(verifier: TokenVerifier, identities: IdentityState) -> Self {
        Self {
            verifier,
            identities,
        }
    }

    pub async fn authenticate(&self, headers: &HeaderMap, context: &mut AuthContext) -> GateOutcome {
        let Some(token) = bearer_token(headers) else {
            return unauthenticated(AuthFailure::MissingCredentials);
        };

        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(failure) => return unauthenticated(failure),
        };

        if let Some(existing) = context.principal() {
            if existing.subject() == claims.sub {
                tracing::debug!(subject = %existing.subject(), "principal already installed");
                return GateOutcome::AlreadyAuthenticated(existing.clone());
            }
            // A second token for another subject drops the installed principal too.
            context.clear();
            return unauthenticated(AuthFailure::BindingMismatch);
        }

        match self.resolve(&claims).await {
            Ok(principal) => {
                tracing::debug!(subject = %principal.subject(), "principal installed");
                context.install(principal.clone());
                GateOutcome::Authenticated(principal)
            }
            Err(failure) => unauthenticated(failure),
        }
    }

    async fn resolve(&self, claims: &Claims) -> Result<Principal, AuthFailure> {
        let identity = self
            .load_identity(&claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::debug!(subject = %claims.sub, "no identity for token subject");
                AuthFailure::UnknownIdentity
            })?;

        let bound = identity.subject == claims.sub
            && claims.fpr.as_deref() == Some(identity.credentials_fingerprint.as_str());
        if !bound {
            return Err(AuthFailure::BindingMismatch);
        }

        Ok(Principal::authenticated(identity.subject, identity.authorities))
    }

    /// load_identity
    ///
    /// Runs the store lookup on its own task, so a panicking store comes back as a
    /// `JoinError` and folds into `IdentityStoreUnavailable` like any other store fault.
    async fn load_identity(&self, subject: &str) -> Result<Option<Identity>, AuthFailure> {
        let identities = self.identities.clone();
        let subject = subject.to_string();

        match tokio::spawn(async move { identities.load_identity(&subject).await }).await {
            Ok(Ok(identity)) => Ok(identity),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "identity lookup failed");
                Err(AuthFailure::IdentityStoreUnavailable)
            }
            Err(e) if e.is_panic() => {
                tracing::error!("identity lookup panicked");
                Err(AuthFailure::IdentityStoreUnavailable)
            }
            Err(e) => {
                tracing::error!(error = %e, "identity lookup did not complete");
                Err(AuthFailure::IdentityStoreUnavailable)
            }
        }
    }
}

fn unauthenticated(failure: AuthFailure) -> GateOutcome {
    failure.log();
    GateOutcome::Unauthenticated(failure)
}

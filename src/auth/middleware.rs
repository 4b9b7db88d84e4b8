use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{
    gate::{GateOutcome, TokenGate},
    principal::AuthContext,
};
use crate::{
    error::ApiError,
    rules::{Access, Classification, RuleTable},
};

/// AuthLayer
///
/// State shared by the two auth middlewares. Both hold the *same* rule table, which is
/// what keeps gate bypass and authorization in agreement.
#[derive(Clone)]
pub struct AuthLayer {
    pub rules: Arc<RuleTable>,
    pub gate: Arc<TokenGate>,
}

impl AuthLayer {
    pub fn new(rules: RuleTable, gate: TokenGate) -> Self {
        Self {
            rules: Arc::new(rules),
            gate: Arc::new(gate),
        }
    }
}

/// authenticate_request
///
/// The gate middleware. Classifies the request; for protected requests runs the token
/// gate against the request's `AuthContext`. Always passes the request on, with an
/// `AuthContext` (possibly anonymous) in its extensions.
pub async fn authenticate_request(
    State(auth): State<AuthLayer>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut context = request
        .extensions_mut()
        .remove::<AuthContext>()
        .unwrap_or_default();

    let outcome = match auth.rules.classify(request.method(), request.uri().path()) {
        Classification::Public => GateOutcome::Bypassed,
        Classification::Protected => auth.gate.authenticate(request.headers(), &mut context).await,
    };
    tracing::trace!(?outcome, "auth gate");

    request.extensions_mut().insert(context);
    next.run(request).await
}

/// enforce_access
///
/// The authorization middleware. Re-derives the required access from the rule table and
/// rejects protected requests that carry no authenticated principal. The one place the
/// 401 is produced for a route-level denial.
pub async fn enforce_access(State(auth): State<AuthLayer>, request: Request, next: Next) -> Response {
    let required = auth.rules.required_access(request.method(), request.uri().path());
    let authenticated = request
        .extensions()
        .get::<AuthContext>()
        .is_some_and(AuthContext::is_authenticated);

    if required == Access::Authenticated && !authenticated {
        tracing::debug!(
            method = %request.method(),
            path = %request.uri().path(),
            "rejecting unauthenticated request to protected route"
        );
        return ApiError::authentication_required().into_response();
    }

    next.run(request).await
}

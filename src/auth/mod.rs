//! Request authentication.
//!
//! Every request passes two middlewares, both driven by the one [`RuleTable`]:
//!
//! 1. [`authenticate_request`]: if the route is public, nothing happens. Otherwise the
//!    [`TokenGate`] tries to turn the `Authorization: Bearer` token into a [`Principal`]
//!    and installs it in the request's [`AuthContext`]. It never rejects.
//! 2. [`enforce_access`]: rejects with 401 when the route needs authentication and the
//!    context holds no principal.
//!
//! Handlers then take [`Authenticated`] or [`CurrentPrincipal`].
//!
//! [`RuleTable`]: crate::rules::RuleTable

pub mod gate;
pub mod middleware;
pub mod principal;
pub mod token;

pub use gate::{AuthFailure, GateOutcome, TokenGate, bearer_token};
pub use middleware::{AuthLayer, authenticate_request, enforce_access};
pub use principal::{AuthContext, Authenticated, CurrentPrincipal, Principal};
pub use token::{Claims, TokenVerifier};

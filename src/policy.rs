use crate::rules::{MethodMatch, RuleSpec, RuleTable, RuleTableError};

/// Platform Access Policy
///
/// The one hand-authored list of which routes are public. Both the token gate and the
/// authorization layer are driven from the `RuleTable` built from this list, so a route
/// can only change access level here.
///
/// Ordering matters: first match wins. Carve-outs go *above* the broader rule they
/// narrow; `RuleTable::new` refuses to start if a rule is shadowed.
pub const PLATFORM_RULES: &[RuleSpec] = &[
    // The profile lives under the auth namespace but is the caller's own data.
    RuleSpec::authenticated(MethodMatch::Any, "/api/auth/profile/**"),
    // Login and registration are served by the identity provider.
    RuleSpec::public(MethodMatch::Any, "/api/auth/**"),
    // Operational endpoints.
    RuleSpec::public(MethodMatch::Any, "/health"),
    RuleSpec::public(MethodMatch::Any, "/swagger-ui/**"),
    RuleSpec::public(MethodMatch::Any, "/api-docs/**"),
    // Anonymous catalog browsing. Read-only, and only the resource itself:
    // nested resources such as `/api/videos/{id}/progress` stay protected.
    RuleSpec::public(MethodMatch::Get, "/api/courses"),
    RuleSpec::public(MethodMatch::Get, "/api/courses/{id}"),
    RuleSpec::public(MethodMatch::Get, "/api/modules/{id}"),
    RuleSpec::public(MethodMatch::Get, "/api/videos/{id}"),
    RuleSpec::public(MethodMatch::Get, "/api/public/modules/{id}/assessments"),
    // Everything else in the API is learner data.
    RuleSpec::authenticated(MethodMatch::Any, "/api/**"),
];

/// Builds the validated table from [`PLATFORM_RULES`]. Called once at startup.
pub fn platform_rule_table() -> Result<RuleTable, RuleTableError> {
    RuleTable::new(PLATFORM_RULES)
}

/// Router Module Index
///
/// Routes are grouped by domain, not by access level. Which requests need a principal
/// is decided only by the rule table in `policy`, applied by the auth middlewares in
/// `create_router`; handlers that need the principal additionally take `Authenticated`.

/// Operational endpoints and the read-only course catalog.
pub mod catalog;

/// Learner state: watch progress, favorites, and the caller's profile.
pub mod learner;

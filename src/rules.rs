use axum::http::Method;
use std::fmt;
use thiserror::Error;

/// Access
///
/// The access level a route rule declares for the paths it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Served without any credentials. The token gate is bypassed entirely.
    Public,
    /// Requires an authenticated principal in the request context.
    Authenticated,
}

/// Classification
///
/// The verdict of the route classifier: whether the token gate runs for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Public,
    Protected,
}

impl From<Access> for Classification {
    fn from(access: Access) -> Self {
        match access {
            Access::Public => Classification::Public,
            Access::Authenticated => Classification::Protected,
        }
    }
}

/// MethodMatch
///
/// The HTTP method(s) a rule applies to. `Any` covers every method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodMatch {
    Any,
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl MethodMatch {
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodMatch::Any => true,
            // The router answers HEAD with the GET handler, so access must agree.
            MethodMatch::Get => method == Method::GET || method == Method::HEAD,
            MethodMatch::Head => method == Method::HEAD,
            MethodMatch::Post => method == Method::POST,
            MethodMatch::Put => method == Method::PUT,
            MethodMatch::Patch => method == Method::PATCH,
            MethodMatch::Delete => method == Method::DELETE,
        }
    }

    /// True when every method matched by `other` is also matched by `self`.
    fn covers(&self, other: &MethodMatch) -> bool {
        *self == MethodMatch::Any
            || self == other
            || (*self == MethodMatch::Get && *other == MethodMatch::Head)
    }
}

impl fmt::Display for MethodMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MethodMatch::Any => "ANY",
            MethodMatch::Get => "GET",
            MethodMatch::Head => "HEAD",
            MethodMatch::Post => "POST",
            MethodMatch::Put => "PUT",
            MethodMatch::Patch => "PATCH",
            MethodMatch::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// One segment of a templated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// `{name}`: one or more ASCII digits.
    Numeric,
}

impl Segment {
    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == segment,
            Segment::Numeric => is_numeric(segment),
        }
    }
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// PathPattern
///
/// The three pattern kinds the platform's routes are expressed in:
///
/// * `Exact`    - `/api/courses`, literal equality.
/// * `Prefix`   - `/api/auth/**`, the base path itself and everything below it.
/// * `Template` - `/api/courses/{id}`, fixed segment count, `{..}` segments match digits only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    /// Base path without the trailing `/**`. Empty for the catch-all `/**`.
    Prefix(String),
    Template(Vec<Segment>),
}

impl PathPattern {
    /// parse
    ///
    /// Parses the textual form used in the rule table. Rejects anything the matcher
    /// could misread: relative paths, empty segments (and therefore trailing slashes),
    /// wildcards other than a final `/**`, and malformed placeholders.
    pub fn parse(pattern: &str) -> Result<Self, &'static str> {
        if !pattern.starts_with('/') {
            return Err("pattern must start with '/'");
        }
        if pattern == "/" {
            return Ok(PathPattern::Exact(pattern.to_string()));
        }

        if let Some(base) = pattern.strip_suffix("/**") {
            if base.contains(['*', '{', '}']) {
                return Err("prefix base must be a literal path");
            }
            if base.split('/').skip(1).any(str::is_empty) {
                return Err("empty path segment");
            }
            return Ok(PathPattern::Prefix(base.to_string()));
        }

        if pattern.contains('*') {
            return Err("'**' is only allowed as the final segment");
        }

        let mut segments = Vec::new();
        for raw in pattern[1..].split('/') {
            if raw.is_empty() {
                return Err("empty path segment");
            }
            if let Some(name) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err("placeholder name must be a non-empty identifier");
                }
                segments.push(Segment::Numeric);
            } else if raw.contains(['{', '}']) {
                return Err("placeholder must span a whole segment");
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        if segments.iter().any(|s| *s == Segment::Numeric) {
            Ok(PathPattern::Template(segments))
        } else {
            Ok(PathPattern::Exact(pattern.to_string()))
        }
    }

    /// Matches an already normalized path (see [`normalize_path`]).
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(literal) => literal == path,
            PathPattern::Prefix(base) => {
                path == base
                    || (path.starts_with(base.as_str()) && path[base.len()..].starts_with('/'))
            }
            PathPattern::Template(segments) => {
                let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
                parts.len() == segments.len()
                    && segments.iter().zip(parts).all(|(seg, part)| seg.matches(part))
            }
        }
    }

    /// covers
    ///
    /// True when every path matched by `other` is also matched by `self`.
    /// Used at table construction to detect rules that can never fire.
    pub fn covers(&self, other: &PathPattern) -> bool {
        match (self, other) {
            (PathPattern::Exact(a), PathPattern::Exact(b)) => a == b,
            (PathPattern::Exact(_), _) => false,

            (PathPattern::Prefix(_), PathPattern::Exact(path)) => self.matches(path),
            (PathPattern::Prefix(_), PathPattern::Prefix(base)) => {
                // An empty base means "everything"; only another catch-all covers it.
                if base.is_empty() {
                    matches!(self, PathPattern::Prefix(b) if b.is_empty())
                } else {
                    self.matches(base)
                }
            }
            (PathPattern::Prefix(base), PathPattern::Template(segments)) => {
                let base_parts: Vec<&str> =
                    base.split('/').skip(1).collect();
                base_parts.len() <= segments.len()
                    && base_parts
                        .iter()
                        .zip(segments)
                        .all(|(part, seg)| *seg == Segment::Literal(part.to_string()))
            }

            (PathPattern::Template(_), PathPattern::Exact(path)) => self.matches(path),
            (PathPattern::Template(_), PathPattern::Prefix(_)) => false,
            (PathPattern::Template(a), PathPattern::Template(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(outer, inner)| match (outer, inner) {
                        (Segment::Literal(x), Segment::Literal(y)) => x == y,
                        (Segment::Numeric, Segment::Numeric) => true,
                        (Segment::Numeric, Segment::Literal(y)) => is_numeric(y),
                        (Segment::Literal(_), Segment::Numeric) => false,
                    })
            }
        }
    }
}

/// normalize_path
///
/// Canonical form every path is classified in: query string and fragment removed,
/// repeated and trailing slashes collapsed, `.` and `..` segments resolved.
/// `..` above the root is dropped, so the result always starts with `/`.
pub fn normalize_path(raw: &str) -> String {
    let path = raw.split(['?', '#']).next().unwrap_or_default();

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// RuleSpec
///
/// The compile-time form of a rule, as written in the policy table.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub method: MethodMatch,
    pub pattern: &'static str,
    pub access: Access,
}

impl RuleSpec {
    pub const fn public(method: MethodMatch, pattern: &'static str) -> Self {
        Self { method, pattern, access: Access::Public }
    }

    pub const fn authenticated(method: MethodMatch, pattern: &'static str) -> Self {
        Self { method, pattern, access: Access::Authenticated }
    }
}

/// RouteRule
///
/// A parsed, validated rule. Only constructed through [`RuleTable::new`].
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub method: MethodMatch,
    pub pattern: PathPattern,
    pub access: Access,
    source: &'static str,
}

impl RouteRule {
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.matches(method) && self.pattern.matches(path)
    }

    /// The pattern as written in the table.
    pub fn source(&self) -> &'static str {
        self.source
    }

    fn shadows(&self, later: &RouteRule) -> bool {
        self.method.covers(&later.method) && self.pattern.covers(&later.pattern)
    }
}

impl fmt::Display for RouteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {:?}", self.method, self.source, self.access)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleTableError {
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern {
        pattern: &'static str,
        reason: &'static str,
    },
    #[error("rule #{index} ({rule}) can never match: shadowed by rule #{shadowed_by} ({by})")]
    Unreachable {
        index: usize,
        rule: String,
        shadowed_by: usize,
        by: String,
    },
}

/// RuleTable
///
/// The single, ordered source of truth for route access. Consulted by the token gate
/// (to decide whether to authenticate at all) and by the authorization layer (to decide
/// whether to reject). Rules are evaluated top to bottom and the first match wins;
/// a path no rule matches is protected.
///
/// Immutable once built, so it is shared across request tasks behind an `Arc`
/// without synchronization.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<RouteRule>,
}

impl RuleTable {
    /// new
    ///
    /// Parses and validates every rule. Fails on the first malformed pattern, or on a
    /// rule that an earlier rule completely shadows (for example a narrower carve-out
    /// placed after the broad prefix it was meant to carve out of).
    pub fn new(specs: &[RuleSpec]) -> Result<Self, RuleTableError> {
        let mut rules: Vec<RouteRule> = Vec::with_capacity(specs.len());

        for spec in specs {
            let pattern = PathPattern::parse(spec.pattern).map_err(|reason| {
                RuleTableError::InvalidPattern { pattern: spec.pattern, reason }
            })?;
            let rule = RouteRule {
                method: spec.method,
                pattern,
                access: spec.access,
                source: spec.pattern,
            };

            if let Some((earlier_index, earlier)) =
                rules.iter().enumerate().find(|(_, earlier)| earlier.shadows(&rule))
            {
                return Err(RuleTableError::Unreachable {
                    index: rules.len(),
                    rule: rule.to_string(),
                    shadowed_by: earlier_index,
                    by: earlier.to_string(),
                });
            }

            rules.push(rule);
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// First rule matching the method and the (already normalized) path.
    pub fn first_match(&self, method: &Method, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.matches(method, path))
    }

    /// required_access
    ///
    /// The access level a request needs. CORS preflight is always public: it never
    /// carries credentials. Unmatched paths fail closed.
    pub fn required_access(&self, method: &Method, raw_path: &str) -> Access {
        if method == Method::OPTIONS {
            return Access::Public;
        }

        let path = normalize_path(raw_path);
        self.first_match(method, &path)
            .map(|rule| rule.access)
            .unwrap_or(Access::Authenticated)
    }

    /// classify
    ///
    /// Decides whether the token gate runs for a request.
    pub fn classify(&self, method: &Method, raw_path: &str) -> Classification {
        self.required_access(method, raw_path).into()
    }
}

use axum::http::Method;
use learnhub::{
    policy::{PLATFORM_RULES, platform_rule_table},
    rules::{
        Access, MethodMatch, PathPattern, RuleSpec, RuleTable, RuleTableError, Segment,
        normalize_path,
    },
};

#[test]
fn parses_the_three_pattern_kinds() {
    assert_eq!(
        PathPattern::parse("/api/courses"),
        Ok(PathPattern::Exact("/api/courses".to_string()))
    );
    assert_eq!(
        PathPattern::parse("/api/auth/**"),
        Ok(PathPattern::Prefix("/api/auth".to_string()))
    );
    assert_eq!(
        PathPattern::parse("/api/courses/{id}"),
        Ok(PathPattern::Template(vec![
            Segment::Literal("api".to_string()),
            Segment::Literal("courses".to_string()),
            Segment::Numeric,
        ]))
    );
    assert_eq!(PathPattern::parse("/**"), Ok(PathPattern::Prefix(String::new())));
}

#[test]
fn rejects_malformed_patterns() {
    assert!(PathPattern::parse("api/courses").is_err());
    assert!(PathPattern::parse("/api/courses/").is_err());
    assert!(PathPattern::parse("/api//courses").is_err());
    assert!(PathPattern::parse("/api/**/courses").is_err());
    assert!(PathPattern::parse("/api/*").is_err());
    assert!(PathPattern::parse("/api/{}").is_err());
    assert!(PathPattern::parse("/api/id{id}").is_err());
    assert!(PathPattern::parse("/api/{id}/**").is_err());
}

#[test]
fn prefix_matches_base_and_descendants_only() {
    let prefix = PathPattern::parse("/api/auth/**").unwrap();
    assert!(prefix.matches("/api/auth"));
    assert!(prefix.matches("/api/auth/login"));
    assert!(prefix.matches("/api/auth/profile/42"));
    assert!(!prefix.matches("/api/authority"));
    assert!(!prefix.matches("/api"));
}

#[test]
fn template_requires_digits_in_placeholder() {
    let template = PathPattern::parse("/api/courses/{id}").unwrap();
    assert!(template.matches("/api/courses/17"));
    assert!(!template.matches("/api/courses/abc"));
    assert!(!template.matches("/api/courses/17a"));
    assert!(!template.matches("/api/courses"));
    assert!(!template.matches("/api/courses/17/modules"));
}

#[test]
fn catch_all_matches_everything() {
    let all = PathPattern::parse("/**").unwrap();
    assert!(all.matches("/"));
    assert!(all.matches("/anything/at/all"));
}

#[test]
fn coverage_between_pattern_kinds() {
    let p = |s: &str| PathPattern::parse(s).unwrap();

    assert!(p("/api/auth/**").covers(&p("/api/auth/profile/**")));
    assert!(!p("/api/auth/profile/**").covers(&p("/api/auth/**")));
    assert!(p("/api/**").covers(&p("/api/courses/{id}")));
    assert!(!p("/api/courses/**").covers(&p("/api/{id}")));
    assert!(p("/api/courses/{id}").covers(&p("/api/courses/42")));
    assert!(!p("/api/courses/{id}").covers(&p("/api/courses/abc")));
    assert!(p("/api/{a}/x").covers(&p("/api/{b}/x")));
    assert!(!p("/api/x/{a}").covers(&p("/api/**")));
    assert!(!p("/api/**").covers(&p("/**")));
    assert!(p("/**").covers(&p("/**")));
}

#[test]
fn normalizes_query_slashes_and_dot_segments() {
    assert_eq!(normalize_path("/api/courses/"), "/api/courses");
    assert_eq!(normalize_path("/api/courses?page=2"), "/api/courses");
    assert_eq!(normalize_path("/api//courses///17/"), "/api/courses/17");
    assert_eq!(normalize_path("/api/auth/../favorites"), "/api/favorites");
    assert_eq!(normalize_path("/./api/./courses#top"), "/api/courses");
    assert_eq!(normalize_path("/../.."), "/");
    assert_eq!(normalize_path(""), "/");
}

#[test]
fn later_rule_shadowed_by_earlier_prefix_is_rejected() {
    let result = RuleTable::new(&[
        RuleSpec::public(MethodMatch::Any, "/api/auth/**"),
        RuleSpec::authenticated(MethodMatch::Any, "/api/auth/profile/**"),
    ]);
    assert!(matches!(
        result,
        Err(RuleTableError::Unreachable { index: 1, shadowed_by: 0, .. })
    ));
}

#[test]
fn method_specific_rule_after_any_rule_is_rejected() {
    let result = RuleTable::new(&[
        RuleSpec::authenticated(MethodMatch::Any, "/api/courses"),
        RuleSpec::public(MethodMatch::Get, "/api/courses"),
    ]);
    assert!(matches!(result, Err(RuleTableError::Unreachable { .. })));
}

#[test]
fn differing_methods_do_not_shadow() {
    let table = RuleTable::new(&[
        RuleSpec::public(MethodMatch::Get, "/api/courses"),
        RuleSpec::authenticated(MethodMatch::Post, "/api/courses"),
    ]);
    assert!(table.is_ok());
}

#[test]
fn invalid_pattern_is_reported_with_its_source() {
    let result = RuleTable::new(&[RuleSpec::public(MethodMatch::Get, "/api/courses/")]);
    assert_eq!(
        result.unwrap_err(),
        RuleTableError::InvalidPattern {
            pattern: "/api/courses/",
            reason: "empty path segment",
        }
    );
}

#[test]
fn platform_table_is_valid() {
    let table = platform_rule_table().expect("platform rules must validate");
    assert_eq!(table.rules().len(), PLATFORM_RULES.len());
}

#[test]
fn get_rules_also_admit_head() {
    assert!(MethodMatch::Get.matches(&Method::GET));
    assert!(MethodMatch::Get.matches(&Method::HEAD));
    assert!(!MethodMatch::Get.matches(&Method::POST));
    assert!(!MethodMatch::Head.matches(&Method::GET));
}

#[test]
fn head_rule_after_matching_get_rule_is_rejected() {
    let result = RuleTable::new(&[
        RuleSpec::public(MethodMatch::Get, "/api/courses"),
        RuleSpec::authenticated(MethodMatch::Head, "/api/courses"),
    ]);
    assert!(matches!(result, Err(RuleTableError::Unreachable { index: 1, .. })));
}

#[test]
fn head_on_public_catalog_is_public() {
    let table = platform_rule_table().unwrap();
    assert_eq!(table.required_access(&Method::HEAD, "/api/courses"), Access::Public);
    assert_eq!(table.required_access(&Method::HEAD, "/api/courses/17"), Access::Public);
    assert_eq!(table.required_access(&Method::HEAD, "/api/favorites"), Access::Authenticated);
}

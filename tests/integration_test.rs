//! Cross-module smoke tests against the public facade.

use pcrekit_core::{CacheKind, Config, Facade, Node, PcreError};

#[test]
fn facade_parses_validates_and_profiles_one_pattern() {
    let facade = Facade::new(Config::default());
    let parsed = facade.parse("/(\\w+)@(\\w+)\\.com/i").expect("should parse");
    assert_eq!(parsed.numbering.max_group_number, 2);
    assert!(parsed.flags.contains('i'));

    let problems = facade.validate("/(\\w+)@(\\w+)\\.com/i").expect("should validate");
    assert!(problems.is_empty());

    let literals = facade.literals("/hello world/").expect("should extract literals");
    assert_eq!(literals.prefixes, vec!["hello world"]);
    assert!(literals.complete);

    let redos = facade.redos("/(a+)+b/").expect("should profile");
    assert!(!redos.findings.is_empty());
}

#[test]
fn facade_reports_dangling_backreferences() {
    let facade = Facade::new(Config::default());
    let problems = facade.validate(r"/(a)\2/").unwrap();
    assert!(problems.iter().any(|p| p.code == "unknown-group-reference"));
}

#[test]
fn facade_surfaces_delimiter_errors_with_an_offset() {
    let facade = Facade::new(Config::default());
    let err = facade.parse("/abc").unwrap_err();
    assert!(matches!(err.error, PcreError::Delimiter(_)));
}

#[test]
fn facade_tolerant_parse_never_fails() {
    let facade = Facade::new(Config::default());
    let result = facade.parse_tolerant("/ab(cd/");
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(result.pattern, Node::Literal(_)));
}

#[test]
fn facade_caches_across_repeated_calls() {
    let facade = Facade::new(Config::default());
    for _ in 0..5 {
        facade.parse("/a{2,4}b|c/x").unwrap();
    }
    let stats = facade.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.layer1_hits, 4);
}

#[test]
fn noop_cache_reparses_every_time() {
    let facade = Facade::new(Config::default().with_cache(CacheKind::NoOp));
    facade.parse("/abc/").unwrap();
    facade.parse("/abc/").unwrap();
    assert_eq!(facade.cache_stats().entries, 0);
}

#[test]
fn branch_reset_numbering_is_visible_through_the_facade() {
    let facade = Facade::new(Config::default());
    let parsed = facade.parse("/(?|(a)(b)|(c))(d)/").unwrap();
    assert_eq!(parsed.numbering.capture_sequence, vec![1, 2, 1, 3]);
}

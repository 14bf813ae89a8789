// tests/parser_tests.rs

use proptest::prelude::*;
use tagql::ast::{Op, QueryNode, QueryTree, Term};
use tagql::lexer::ScanOptions;
use tagql::output::quote_literal;
use tagql::parser::{ParseError, SyntaxErrorKind, parse, parse_with};

fn children(input: &str) -> Vec<QueryNode> {
    parse(input).unwrap().root.children
}

fn error_kind(input: &str) -> SyntaxErrorKind {
    match parse(input) {
        Ok(tree) => panic!("{:?} parsed to {:?}", input, tree),
        Err(ParseError { kind, .. }) => kind,
    }
}

fn literal(s: &str) -> Option<Term> {
    Some(Term::Literal(s.to_string()))
}

// ============================================================================
// Leaves
// ============================================================================

#[test]
fn test_single_tag() {
    let nodes = children("status:active");
    assert_eq!(nodes.len(), 1);
    assert!(nodes[0].is_leaf());
    assert_eq!(nodes[0].category, literal("status"));
    assert_eq!(nodes[0].value, literal("active"));
    assert_eq!(nodes[0].comp, Op::Match);
}

#[test]
fn test_bare_term_uses_primary() {
    let nodes = children("acme");
    assert_eq!(nodes[0].category, literal("id"));
    assert_eq!(nodes[0].value, literal("acme"));

    let tree = parse_with("acme", "name", ScanOptions::default()).unwrap();
    assert_eq!(tree.root.children[0].category, literal("name"));
}

#[test]
fn test_category_only() {
    let nodes = children("owner:,name:x");
    assert_eq!(nodes[0].category, literal("owner"));
    assert_eq!(nodes[0].value, None);
    assert_eq!(nodes[1].value, literal("x"));
}

#[test]
fn test_category_only_at_end() {
    let nodes = children("and(owner:)");
    assert_eq!(nodes[0].children[0].value, None);
}

#[test]
fn test_empty_quoted_value() {
    let nodes = children("owner:\"\"");
    assert_eq!(nodes[0].value, literal(""));
}

#[test]
fn test_value_may_contain_colons() {
    let nodes = children("gt(created:2024-01-01T10:00:00Z)");
    assert_eq!(nodes[0].children[0].value, literal("2024-01-01T10:00:00Z"));
}

#[test]
fn test_patterns_are_lifted() {
    let nodes = children("/^tag_/:/re(d|ed)/");
    assert_eq!(nodes[0].category, Some(Term::Pattern("^tag_".to_string())));
    assert_eq!(nodes[0].value, Some(Term::Pattern("re(d|ed)".to_string())));
}

#[test]
fn test_quoted_slashes_stay_literal() {
    assert_eq!(children("path:\"/a/\"")[0].value, literal("/a/"));
    assert_eq!(children("path:b\"L2Ev\"")[0].value, literal("/a/"));
}

#[test]
fn test_base64_slash_form_is_lifted() {
    let nodes = children("path:b/YS9i/");
    assert_eq!(nodes[0].value, Some(Term::Pattern("a/b".to_string())));
}

#[test]
fn test_space_after_category_then_value() {
    let nodes = children("name: acme");
    assert_eq!(nodes[0].value, literal("acme"));
}

// ============================================================================
// Groups
// ============================================================================

#[test]
fn test_nested_groups() {
    let nodes = children("and(a:1,or(b:2,c:3),not(d:4))");
    assert_eq!(nodes.len(), 1);
    let and = &nodes[0];
    assert_eq!(and.op, Op::And);
    assert_eq!(and.children.len(), 3);
    assert_eq!(and.children[1].op, Op::Or);
    assert_eq!(and.children[1].children.len(), 2);
    assert_eq!(and.children[2].op, Op::Not);
    assert_eq!(and.children[2].children[0].value, literal("4"));
}

#[test]
fn test_comparison_is_inherited() {
    let nodes = children("gt(a:1,or(b:2,not(c:3)),match(d:4))");
    let gt = &nodes[0];
    assert_eq!(gt.op, Op::Gt);
    assert_eq!(gt.comp, Op::Gt);
    assert_eq!(gt.children[0].comp, Op::Gt);

    let or = &gt.children[1];
    assert_eq!(or.comp, Op::Gt);
    assert_eq!(or.children[0].comp, Op::Gt);
    assert_eq!(or.children[1].children[0].comp, Op::Gt);

    let eq = &gt.children[2];
    assert_eq!(eq.op, Op::Match);
    assert!(!eq.is_leaf());
    assert_eq!(eq.children[0].comp, Op::Match);
}

#[test]
fn test_whitespace_separates_siblings() {
    assert_eq!(children("a:1 b:2"), children("a:1,b:2"));
    assert_eq!(children(" and( a:1 , b:2 ) "), children("and(a:1,b:2)"));
}

#[test]
fn test_unclosed_group_ends_at_input_end() {
    assert_eq!(children("and(a:1,or(b:2"), children("and(a:1,or(b:2))"));
}

#[test]
fn test_empty_search() {
    let tree = parse("").unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree, QueryTree::empty());
    assert!(parse("  , ,").unwrap().is_empty());
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_empty_group() {
    assert_eq!(error_kind("and()"), SyntaxErrorKind::EmptyGroup);
    assert_eq!(error_kind("or(a:1,not())"), SyntaxErrorKind::EmptyGroup);
}

#[test]
fn test_stray_close_paren() {
    assert_eq!(error_kind("a:1)"), SyntaxErrorKind::UnexpectedTerminator);
}

#[test]
fn test_whitespace_before_terminator() {
    assert_eq!(error_kind("owner: ,x"), SyntaxErrorKind::InvalidWhitespace);
    assert_eq!(error_kind("and(owner: )"), SyntaxErrorKind::InvalidWhitespace);
    assert_eq!(error_kind("owner: "), SyntaxErrorKind::InvalidWhitespace);
}

#[test]
fn test_illegal_tokens() {
    assert_eq!(error_kind("name:\"open"), SyntaxErrorKind::IllegalToken);
    assert_eq!(error_kind("b\"!!\""), SyntaxErrorKind::IllegalToken);
    assert_eq!(error_kind(":value"), SyntaxErrorKind::IllegalToken);
}

#[test]
fn test_error_quotes_literal() {
    let err = parse("a:1,name:\"open").unwrap_err();
    assert_eq!(err.literal, "\"open");
    assert_eq!(err.offset, 9);
    assert!(err.to_string().contains("illegal token"));
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_round_trip_examples() {
    for input in [
        "and(id:test1,not(id:test2))",
        "gte(score:10,or(rank:2,rank:3))",
        "name:\"acme, inc\"*",
        "tags:*b\"Lw==\"*",
        "/^tag_/:/re(d|ed)/",
        "owner:,note:\"\"",
        "path:\"/usr\"/bin",
        "path:\"/a/\"",
        "path:b/YS9i/",
        "path:b/YVxc/",
        "match(a:\"why?\")",
    ] {
        let tree = parse(input).unwrap();
        let rendered = tree.to_string();
        assert_eq!(parse(&rendered).unwrap(), tree, "{} -> {}", input, rendered);
    }
}

fn leaf_text() -> impl Strategy<Value = String> {
    let category = "[a-z][a-z0-9_]{0,5}";
    let value = proptest::option::of("[a-z0-9 ,:()*?\"/-]{0,8}");
    (category, value).prop_map(|(category, value)| match value {
        Some(value) => format!("{}:{}", category, quote_literal(&value)),
        None => format!("{}:", category),
    })
}

fn search_text() -> impl Strategy<Value = String> {
    leaf_text().prop_recursive(4, 24, 4, |inner| {
        (
            prop::sample::select(vec!["and", "or", "not", "gt", "gte", "lt", "lte", "match"]),
            prop::collection::vec(inner, 1..4),
        )
            .prop_map(|(keyword, children)| format!("{}({})", keyword, children.join(",")))
    })
}

proptest! {
    #[test]
    fn prop_render_then_parse_is_stable(search in search_text()) {
        let tree = parse(&search).unwrap();
        let rendered = tree.to_string();
        let reparsed = parse(&rendered).unwrap();
        prop_assert_eq!(reparsed, tree);
    }
}

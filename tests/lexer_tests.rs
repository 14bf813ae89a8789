// tests/lexer_tests.rs

use tagql::ast::TokenKind;
use tagql::lexer::{QUOTED_QUESTION, QUOTED_SLASH, QUOTED_STAR, ScanOptions, Scanner};

fn tokens(input: &str) -> Vec<(TokenKind, String)> {
    Scanner::new(input).map(|t| (t.kind, t.literal)).collect()
}

fn tokens_with(input: &str, options: ScanOptions) -> Vec<(TokenKind, String)> {
    Scanner::with_options(input, options)
        .map(|t| (t.kind, t.literal))
        .collect()
}

fn single_value(input: &str) -> (TokenKind, String) {
    let mut all = tokens(input);
    assert_eq!(all.len(), 1, "expected one token for {:?}, got {:?}", input, all);
    all.remove(0)
}

// ============================================================================
// Punctuation and keywords
// ============================================================================

#[test]
fn test_group_with_tag() {
    assert_eq!(
        tokens("and(id:test)"),
        vec![
            (TokenKind::Keyword, "and".to_string()),
            (TokenKind::LParen, "(".to_string()),
            (TokenKind::TagCategory, "id".to_string()),
            (TokenKind::TagValue, "test".to_string()),
            (TokenKind::RParen, ")".to_string()),
        ]
    );
}

#[test]
fn test_all_keywords() {
    for word in ["and", "or", "not", "gt", "gte", "lt", "lte", "match"] {
        let input = format!("{}(x)", word);
        let first = Scanner::new(&input).next().unwrap();
        assert_eq!(first.kind, TokenKind::Keyword, "{}", word);
        assert_eq!(first.literal, word);
    }
}

#[test]
fn test_keyword_without_paren_is_a_tag() {
    assert_eq!(single_value("and"), (TokenKind::TagValue, "and".to_string()));
    assert_eq!(single_value("order"), (TokenKind::TagValue, "order".to_string()));
    assert_eq!(
        tokens("gte (x)")[0],
        (TokenKind::TagValue, "gte".to_string())
    );
}

#[test]
fn test_comma_and_whitespace() {
    assert_eq!(
        tokens("a, b"),
        vec![
            (TokenKind::TagValue, "a".to_string()),
            (TokenKind::Comma, ",".to_string()),
            (TokenKind::Whitespace, " ".to_string()),
            (TokenKind::TagValue, "b".to_string()),
        ]
    );
}

#[test]
fn test_offsets() {
    let offsets: Vec<usize> = Scanner::new("or(a:1,b)").map(|t| t.offset).collect();
    assert_eq!(offsets, vec![0, 2, 3, 5, 6, 7, 8]);
}

#[test]
fn test_eof_repeats() {
    let mut scanner = Scanner::new("x");
    assert_eq!(scanner.next_token().kind, TokenKind::TagValue);
    assert_eq!(scanner.next_token().kind, TokenKind::Eof);
    assert_eq!(scanner.next_token().kind, TokenKind::Eof);
}

// ============================================================================
// Quoting
// ============================================================================

#[test]
fn test_quoted_value() {
    assert_eq!(
        single_value("\"two words, (really)\""),
        (TokenKind::TagValue, "two words, (really)".to_string())
    );
}

#[test]
fn test_partial_quotes() {
    assert_eq!(
        single_value("acme\" inc\"*"),
        (TokenKind::TagValue, "acme inc*".to_string())
    );
}

#[test]
fn test_quoted_wildcards_become_placeholders() {
    let (_, literal) = single_value("\"why?*\"");
    assert_eq!(literal, format!("why{}{}", QUOTED_QUESTION, QUOTED_STAR));
}

#[test]
fn test_only_quote_escapes() {
    assert_eq!(
        single_value(r#""say \"hi\"""#).1,
        "say \"hi\""
    );
    assert_eq!(single_value(r#""a\nb""#).1, r"a\nb");
}

#[test]
fn test_unterminated_quote_is_illegal() {
    let (kind, _) = single_value("\"open");
    assert_eq!(kind, TokenKind::Illegal);
}

#[test]
fn test_quoted_colon_stays_in_category() {
    assert_eq!(
        tokens("\"a:b\":c"),
        vec![
            (TokenKind::TagCategory, "a:b".to_string()),
            (TokenKind::TagValue, "c".to_string()),
        ]
    );
}

// ============================================================================
// Patterns
// ============================================================================

#[test]
fn test_slash_pattern_keeps_delimiters() {
    assert_eq!(
        single_value("/a,b (c)/"),
        (TokenKind::TagValue, "/a,b (c)/".to_string())
    );
}

#[test]
fn test_unclosed_slash_is_plain_text() {
    assert_eq!(single_value("/usr"), (TokenKind::TagValue, "/usr".to_string()));
}

#[test]
fn test_quoted_slashes_are_placeholders() {
    assert_eq!(
        single_value("\"/a/\"").1,
        format!("{}a{}", QUOTED_SLASH, QUOTED_SLASH)
    );
}

#[test]
fn test_pattern_category() {
    assert_eq!(
        tokens("/^tag_/:red"),
        vec![
            (TokenKind::TagCategory, "/^tag_/".to_string()),
            (TokenKind::TagValue, "red".to_string()),
        ]
    );
}

// ============================================================================
// Base64 literals
// ============================================================================

#[test]
fn test_base64_quoted() {
    assert_eq!(single_value("b\"aGVsbG8=\"").1, "hello");
}

#[test]
fn test_base64_without_padding() {
    assert_eq!(single_value("b\"aGVsbG8\"").1, "hello");
}

#[test]
fn test_base64_between_wildcards() {
    assert_eq!(
        single_value("*b\"Lw==\"*").1,
        format!("*{}*", QUOTED_SLASH)
    );
}

#[test]
fn test_base64_quoted_slashes_are_placeholders() {
    assert_eq!(
        single_value("b\"L2Ev\"").1,
        format!("{}a{}", QUOTED_SLASH, QUOTED_SLASH)
    );
}

#[test]
fn test_base64_slash_form_is_a_pattern() {
    assert_eq!(single_value("b/XmEuKiQ=/").1, "/^a.*$/");
}

#[test]
fn test_base64_decoded_wildcards_are_literal() {
    assert_eq!(single_value("b\"Kg==\"").1, QUOTED_STAR.to_string());
    assert_eq!(
        single_value("b\"eD95\"").1,
        format!("x{}y", QUOTED_QUESTION)
    );
}

#[test]
fn test_base64_decoded_delimiters_stay_in_token() {
    assert_eq!(
        tokens("b\"YSxi\",c"),
        vec![
            (TokenKind::TagValue, "a,b".to_string()),
            (TokenKind::Comma, ",".to_string()),
            (TokenKind::TagValue, "c".to_string()),
        ]
    );
}

#[test]
fn test_base64_url_annotation() {
    assert_eq!(single_value("b[url]\"fn5-\"").1, "~~~");
    assert_eq!(single_value("b\"fn5+\"").1, "~~~");
    assert_eq!(single_value("b\"fn5-\"").0, TokenKind::Illegal);
}

#[test]
fn test_base64_other_annotations_are_labels() {
    assert_eq!(single_value("b[name]\"aGVsbG8=\"").1, "hello");
}

#[test]
fn test_base64_invalid_is_illegal() {
    assert_eq!(single_value("b\"!!!\"").0, TokenKind::Illegal);
    assert_eq!(single_value("b\"aGVs").0, TokenKind::Illegal);
}

#[test]
fn test_base64_decoding_disabled() {
    let options = ScanOptions {
        decode_base64: false,
        ..ScanOptions::default()
    };
    assert_eq!(
        tokens_with("b\"aGVsbG8=\"", options),
        vec![(TokenKind::TagValue, "b\"aGVsbG8=\"".to_string())]
    );
}

#[test]
fn test_b_inside_a_word_is_plain() {
    assert_eq!(single_value("ab\"c\"").1, "abc");
}

// ============================================================================
// Category mode
// ============================================================================

#[test]
fn test_categories_option() {
    let options = ScanOptions {
        categories: true,
        ..ScanOptions::default()
    };
    assert_eq!(
        tokens_with("-created,name", options),
        vec![
            (TokenKind::TagCategory, "-created".to_string()),
            (TokenKind::Comma, ",".to_string()),
            (TokenKind::TagCategory, "name".to_string()),
        ]
    );
}

#[test]
fn test_value_mode_keeps_colons() {
    let mut scanner = Scanner::new("at:10:30:00");
    assert_eq!(scanner.next_token().kind, TokenKind::TagCategory);
    scanner.expect_value();
    let value = scanner.next_token();
    assert_eq!(value.kind, TokenKind::TagValue);
    assert_eq!(value.literal, "10:30:00");
}

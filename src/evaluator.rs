use std::cmp::Ordering;

use regex::Regex;

use crate::{
    ast::{Op, QueryNode, QueryTree, Term},
    error::{Error, Result},
    lexer::{QUOTED_QUESTION, QUOTED_STAR, has_wildcard, restore_quoted},
    path::Path,
    value::{parse_decimal, parse_time},
};

/// Evaluates a tree with a caller supplied leaf predicate.
///
/// Groups fold their children left to right and stop early: `and` and the
/// comparison groups fail on the first false child, `or` succeeds on the first
/// true one, `not` negates its single child. An empty tree is true.
///
/// # Examples
///
/// ```
/// use tagql::{evaluator::eval, parser::parse};
///
/// let tree = parse("and(id:test1,not(id:test2))").unwrap();
/// let result = eval(&tree, |leaf| {
///     Ok(leaf.category_text() == "id" && leaf.value_text() == "test1")
/// });
/// assert!(result.unwrap());
/// ```
pub fn eval<F>(tree: &QueryTree, mut predicate: F) -> Result<bool>
where
    F: FnMut(&QueryNode) -> Result<bool>,
{
    eval_node(&tree.root, &mut predicate)
}

fn eval_node<F>(node: &QueryNode, predicate: &mut F) -> Result<bool>
where
    F: FnMut(&QueryNode) -> Result<bool>,
{
    if node.is_leaf() {
        return predicate(node);
    }

    match node.op {
        Op::Or => {
            for child in &node.children {
                if eval_node(child, predicate)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Op::Not => match node.children.as_slice() {
            [only] => Ok(!eval_node(only, predicate)?),
            _ => Err(not_arity(node)),
        },
        Op::And | Op::Match | Op::Gt | Op::Gte | Op::Lt | Op::Lte => {
            for child in &node.children {
                if !eval_node(child, predicate)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

pub(crate) fn not_arity(node: &QueryNode) -> Error {
    Error::InvalidRequest(format!(
        "not() takes exactly one condition, got {}",
        node.children.len()
    ))
}

/// Tests a tree against an in-memory JSON document.
///
/// Categories are paths into the document (`data.items[0].name`), values are
/// compared as text, as decimals when both sides are numeric, and as
/// timestamps when both sides are times. Array values match when any element
/// does.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tagql::{evaluator::matches, parser::parse};
///
/// let doc = json!({"status": "done", "attempts": 3, "data": {"tags": ["a", "b"]}});
/// let tree = parse("and(status:done,gte(attempts:3),data.tags:b)").unwrap();
/// assert!(matches(&tree, &doc).unwrap());
/// ```
pub fn matches(tree: &QueryTree, doc: &serde_json::Value) -> Result<bool> {
    eval(tree, |leaf| match_leaf(leaf, doc))
}

fn match_leaf(leaf: &QueryNode, doc: &serde_json::Value) -> Result<bool> {
    let Some(category) = &leaf.category else {
        return Ok(false);
    };

    let test = ValueTest::new(leaf)?;
    match category {
        Term::Literal(name) => {
            let path = Path::parse(name)?;
            Ok(test.check(path.resolve(doc)))
        }
        Term::Pattern(p) => {
            let re = compile_regex(p)?;
            let Some(object) = doc.as_object() else {
                return Ok(false);
            };
            Ok(object
                .iter()
                .filter(|(key, _)| re.is_match(key))
                .any(|(_, value)| test.check(Some(value))))
        }
    }
}

enum ValueTest {
    Present,
    Null,
    Equals(String),
    Like(Regex),
    Pattern(Regex),
    Compare(Op, String),
}

impl ValueTest {
    fn new(leaf: &QueryNode) -> Result<Self> {
        Ok(match &leaf.value {
            None => ValueTest::Present,
            Some(Term::Pattern(_)) if leaf.comp != Op::Match => {
                return Err(Error::InvalidRequest(format!(
                    "{} cannot be applied to a pattern",
                    leaf.comp.keyword()
                )));
            }
            Some(Term::Pattern(p)) => ValueTest::Pattern(compile_regex(p)?),
            Some(Term::Literal(v)) if v.is_empty() || v == "null" => ValueTest::Null,
            Some(Term::Literal(v)) if leaf.comp != Op::Match => {
                ValueTest::Compare(leaf.comp, restore_quoted(v))
            }
            Some(Term::Literal(v)) if has_wildcard(v) => ValueTest::Like(glob_regex(v)?),
            Some(Term::Literal(v)) => ValueTest::Equals(restore_quoted(v)),
        })
    }

    fn check(&self, found: Option<&serde_json::Value>) -> bool {
        let found = found.filter(|v| !v.is_null());
        match (self, found) {
            (ValueTest::Present, found) => found.is_some(),
            (ValueTest::Null, found) => found.is_none(),
            (_, None) => false,
            (_, Some(serde_json::Value::Array(items))) => {
                items.iter().any(|item| self.check_scalar(item))
            }
            (_, Some(value)) => self.check_scalar(value),
        }
    }

    fn check_scalar(&self, value: &serde_json::Value) -> bool {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => return false,
            other => other.to_string(),
        };

        match self {
            ValueTest::Present => true,
            ValueTest::Null => false,
            ValueTest::Equals(expected) => match (parse_decimal(&text), parse_decimal(expected)) {
                (Some(a), Some(b)) if !value.is_string() => a == b,
                _ => &text == expected,
            },
            ValueTest::Like(re) | ValueTest::Pattern(re) => re.is_match(&text),
            ValueTest::Compare(op, expected) => {
                let ordering = compare_text(&text, expected);
                match op {
                    Op::Gt => ordering == Ordering::Greater,
                    Op::Gte => ordering != Ordering::Less,
                    Op::Lt => ordering == Ordering::Less,
                    Op::Lte => ordering != Ordering::Greater,
                    _ => ordering == Ordering::Equal,
                }
            }
        }
    }
}

/// Orders two values numerically, then chronologically, then as text.
fn compare_text(a: &str, b: &str) -> Ordering {
    if let (Some(a), Some(b)) = (parse_decimal(a), parse_decimal(b)) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (parse_time(a), parse_time(b)) {
        return a.cmp(&b);
    }
    a.cmp(b)
}

pub(crate) fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::InvalidRequest(format!("invalid pattern /{}/: {}", pattern, e)))
}

/// Anchored regex for a wildcard value; quoted wildcards match themselves.
fn glob_regex(value: &str) -> Result<Regex> {
    let mut re = String::from("^");
    for ch in value.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            QUOTED_STAR => re.push_str(r"\*"),
            QUOTED_QUESTION => re.push_str(r"\?"),
            ch => re.push_str(&regex::escape(&ch.to_string())),
        }
    }
    re.push('$');
    compile_regex(&re)
}

use crate::{
    ast::{Op, QueryNode, Term},
    error::{Error, Result},
    evaluator::{compile_regex, not_arity},
    field::{Field, FieldType},
    lexer::{QUOTED_QUESTION, QUOTED_STAR, has_wildcard, restore_quoted},
    path::{Path, PathSegment},
    value::{Param, Value, parse_decimal},
};

use super::{Frame, join_parts};

impl Frame<'_> {
    /// Compiles a node into a boolean SQL expression.
    ///
    /// `None` for a group with no children, i.e. the root of an empty search.
    pub(super) fn predicate(&mut self, node: &QueryNode) -> Result<Option<String>> {
        if node.is_leaf() {
            return self.leaf(node).map(Some);
        }
        if node.op == Op::Not && node.children.len() != 1 {
            return Err(not_arity(node));
        }

        let mut parts = Vec::with_capacity(node.children.len());
        for child in &node.children {
            if let Some(sql) = self.predicate(child)? {
                parts.push(sql);
            }
        }

        Ok(match node.op {
            Op::Not => parts.pop().map(|inner| format!("NOT ({})", inner)),
            Op::Or => join_parts(parts, " OR "),
            _ => join_parts(parts, " AND "),
        })
    }

    fn leaf(&mut self, leaf: &QueryNode) -> Result<String> {
        match &leaf.category {
            Some(Term::Literal(name)) => self.leaf_on(name, leaf),
            Some(Term::Pattern(pattern)) => self.leaf_on_matching(pattern, leaf),
            None => Err(Error::InvalidRequest("condition without a field".to_string())),
        }
    }

    /// `/regex/` categories test every field whose name matches.
    fn leaf_on_matching(&mut self, pattern: &str, leaf: &QueryNode) -> Result<String> {
        let re = compile_regex(pattern)?;
        let schema = self.schema;

        let mut parts = Vec::new();
        for field in schema.fields.iter().filter(|f| re.is_match(&f.name)) {
            parts.push(self.leaf_on(&field.name, leaf)?);
        }
        join_parts(parts, " OR ").ok_or_else(|| {
            Error::InvalidRequest(format!("/{}/ matches no field of {}", pattern, schema.table))
        })
    }

    fn leaf_on(&mut self, category: &str, leaf: &QueryNode) -> Result<String> {
        let path = Path::parse(category)?;
        let schema = self.schema;
        let field = schema.require(&path.field)?;
        let column = self.column(field)?;

        match field.kind {
            FieldType::Json if path.is_nested() => {
                let expr = self.json_path(&column, &path);
                self.text_leaf(&expr, leaf)
            }
            _ if path.is_nested() => Err(Error::InvalidRequest(format!(
                "{:?} is not a json field, {:?} has no path",
                field.name, category
            ))),
            FieldType::Json => self.text_leaf(&format!("{}::text", column), leaf),
            FieldType::Array => self.array_leaf(field, &column, leaf),
            _ => self.scalar_leaf(field, &column, leaf),
        }
    }

    /// `data->$1::text->2->>$2::text`: keys are bound, indices are inlined
    /// integers, and the last hop extracts text.
    fn json_path(&mut self, column: &str, path: &Path) -> String {
        let mut expr = column.to_string();
        let last = path.segments.len().saturating_sub(1);

        for (i, segment) in path.segments.iter().enumerate() {
            let arrow = if i == last { "->>" } else { "->" };
            match segment {
                PathSegment::Field(name) => {
                    let key = self.bind(Param::Text(name.clone()));
                    expr = format!("{}{}{}::text", expr, arrow, key);
                }
                PathSegment::Index(index) if *index < 0 => {
                    expr = format!("{}{}({})", expr, arrow, index);
                }
                PathSegment::Index(index) => {
                    expr = format!("{}{}{}", expr, arrow, index);
                }
            }
        }
        expr
    }

    /// Leaves over text extracted from JSON.
    fn text_leaf(&mut self, expr: &str, leaf: &QueryNode) -> Result<String> {
        let Some(value) = &leaf.value else {
            return Ok(format!("{} IS NOT NULL", expr));
        };

        match value {
            Term::Pattern(_) if leaf.comp != Op::Match => Err(compare_pattern(leaf)),
            Term::Pattern(pattern) => self.regex_match(expr, pattern),
            Term::Literal(v) if is_null(v) => Ok(format!("{} IS NULL", expr)),
            Term::Literal(v) if leaf.comp != Op::Match => {
                let v = restore_quoted(v);
                Ok(match parse_decimal(&v) {
                    Some(number) => {
                        let p = self.bind(Param::Numeric(number));
                        format!("({})::numeric {} {}", expr, leaf.comp.sql(), p)
                    }
                    None => {
                        let p = self.bind(Param::Text(v));
                        format!("{} {} {}", expr, leaf.comp.sql(), p)
                    }
                })
            }
            Term::Literal(v) if has_wildcard(v) => {
                let p = self.bind(Param::Text(like_pattern(v)));
                Ok(format!("{} LIKE {}", expr, p))
            }
            Term::Literal(v) => {
                let p = self.bind(Param::Text(restore_quoted(v)));
                Ok(format!("{} = {}", expr, p))
            }
        }
    }

    fn array_leaf(&mut self, field: &Field, column: &str, leaf: &QueryNode) -> Result<String> {
        let Some(value) = &leaf.value else {
            return Ok(format!("{} IS NOT NULL", column));
        };

        match value {
            Term::Literal(v) if is_null(v) => Ok(format!("{} IS NULL", column)),
            _ if leaf.comp != Op::Match => Err(Error::InvalidRequest(format!(
                "{} cannot be applied to array field {:?}",
                leaf.comp.keyword(),
                field.name
            ))),
            Term::Pattern(pattern) => {
                let test = self.regex_match("elem", pattern)?;
                Ok(any_element(column, &test))
            }
            Term::Literal(v) if has_wildcard(v) => {
                let p = self.bind(Param::Text(like_pattern(v)));
                Ok(any_element(column, &format!("elem LIKE {}", p)))
            }
            Term::Literal(v) => {
                let p = self.bind(Param::Text(restore_quoted(v)));
                Ok(format!("{} = ANY({})", p, column))
            }
        }
    }

    fn scalar_leaf(&mut self, field: &Field, column: &str, leaf: &QueryNode) -> Result<String> {
        let Some(value) = &leaf.value else {
            return Ok(format!("{} IS NOT NULL", column));
        };

        match value {
            Term::Pattern(_) if leaf.comp != Op::Match => Err(compare_pattern(leaf)),
            Term::Pattern(pattern) => self.regex_match(&as_text(field, column), pattern),
            Term::Literal(v) if is_null(v) => Ok(format!("{} IS NULL", column)),
            Term::Literal(v) if leaf.comp == Op::Match && has_wildcard(v) => {
                let p = self.bind(Param::Text(like_pattern(v)));
                Ok(format!("{} LIKE {}", as_text(field, column), p))
            }
            Term::Literal(v) => {
                let param = Value::parse(field.kind, &restore_quoted(v))?.to_param();
                let p = self.bind(param);
                Ok(format!("{} {} {}", column, leaf.comp.sql(), p))
            }
        }
    }

    /// Validates the pattern locally before handing it to the store as `~`.
    fn regex_match(&mut self, expr: &str, pattern: &str) -> Result<String> {
        compile_regex(pattern)?;
        let p = self.bind(Param::Text(pattern.to_string()));
        Ok(format!("{} ~ {}", expr, p))
    }
}

fn compare_pattern(leaf: &QueryNode) -> Error {
    Error::InvalidRequest(format!(
        "{} cannot be applied to a pattern",
        leaf.comp.keyword()
    ))
}

fn is_null(value: &str) -> bool {
    value.is_empty() || value == "null"
}

fn any_element(column: &str, test: &str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM unnest({}) AS elem WHERE {})",
        column, test
    )
}

fn as_text(field: &Field, column: &str) -> String {
    match field.kind {
        FieldType::String => column.to_string(),
        _ => format!("{}::text", column),
    }
}

/// Translates wildcards to `LIKE` syntax.
///
/// Bare `*`/`?` become `%`/`_`; the `LIKE` metacharacters `%`, `_` and `\`
/// found in the value are escaped, and quoted wildcards match themselves.
pub(crate) fn like_pattern(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for ch in value.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '*' => out.push('%'),
            '?' => out.push('_'),
            QUOTED_STAR => out.push('*'),
            QUOTED_QUESTION => out.push('?'),
            ch => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("50%_off*"), r"50\%\_off%");
        assert_eq!(like_pattern(r"a\b?"), r"a\\b_");
        assert_eq!(like_pattern("lit\u{E000}*"), "lit*%");
    }
}

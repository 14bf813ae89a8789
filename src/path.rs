use crate::error::{Error, Result};

/// One hop of a category path such as `data.a.b[2].c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object member by name
    ///
    /// # Examples
    /// - `data.owner` → `[Field("owner")]`
    /// - `data.owner.name` → `[Field("owner"), Field("name")]`
    Field(String),

    /// Array element by position
    ///
    /// # Examples
    /// - `data.items[0]` → `[Field("items"), Index(0)]`
    /// - `data.items[-1]` → `[Field("items"), Index(-1)]` (counts from the end)
    Index(i64),
}

/// A category split into the field it names and the path below it.
///
/// For `data.a.b[2].c` the field is `data` and the segments are
/// `Field("a")`, `Field("b")`, `Index(2)`, `Field("c")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub field: String,
    pub segments: Vec<PathSegment>,
}

impl Path {
    pub fn parse(category: &str) -> Result<Path> {
        let head_end = category.find(['.', '[']).unwrap_or(category.len());
        let field = &category[..head_end];
        if field.is_empty() || field.contains(']') {
            return Err(invalid(category));
        }

        let mut segments = Vec::new();
        let mut rest = &category[head_end..];

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']').ok_or_else(|| invalid(category))?;
                let index = after[..close]
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| invalid(category))?;
                segments.push(PathSegment::Index(index));
                rest = &after[close + 1..];
            } else if let Some(after) = rest.strip_prefix('.') {
                let end = after.find(['.', '[']).unwrap_or(after.len());
                if end == 0 || after[..end].contains(']') {
                    return Err(invalid(category));
                }
                segments.push(PathSegment::Field(after[..end].to_string()));
                rest = &after[end..];
            } else {
                return Err(invalid(category));
            }
        }

        Ok(Path {
            field: field.to_string(),
            segments,
        })
    }

    pub fn is_nested(&self) -> bool {
        !self.segments.is_empty()
    }

    /// Follows the segments through a JSON document.
    ///
    /// Negative indices count from the end of an array. Missing members and
    /// out-of-range indices yield `None`.
    pub fn resolve<'a>(&self, root: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        let mut current = root.get(&self.field)?;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Field(name), serde_json::Value::Object(map)) => map.get(name)?,
                (PathSegment::Index(i), serde_json::Value::Array(items)) => {
                    let len = items.len() as i64;
                    let idx = if *i < 0 { len + i } else { *i };
                    if idx < 0 || idx >= len {
                        return None;
                    }
                    &items[idx as usize]
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

fn invalid(category: &str) -> Error {
    Error::InvalidRequest(format!("malformed path {:?}", category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_path() {
        let path = Path::parse("data.a.b[2].c").unwrap();
        assert_eq!(path.field, "data");
        assert_eq!(
            path.segments,
            vec![
                PathSegment::Field("a".into()),
                PathSegment::Field("b".into()),
                PathSegment::Index(2),
                PathSegment::Field("c".into()),
            ]
        );
    }

    #[test]
    fn test_parse_plain_field() {
        let path = Path::parse("status").unwrap();
        assert_eq!(path.field, "status");
        assert!(!path.is_nested());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", ".a", "data..a", "data[x]", "data[1", "data.a]"] {
            assert!(Path::parse(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_resolve() {
        let doc = json!({"data": {"items": [{"id": 1}, {"id": 2}, {"id": 3}]}});
        let last = Path::parse("data.items[-1].id").unwrap();
        assert_eq!(last.resolve(&doc), Some(&json!(3)));
        let missing = Path::parse("data.items[5].id").unwrap();
        assert_eq!(missing.resolve(&doc), None);
    }
}

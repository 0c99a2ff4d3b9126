use serde_json::Value;
use std::fmt;

/// A pre-compiled path into a JSON document.
///
/// Paths are written as whitespace-separated tokens, for example
/// `"results 0 geometry location"`. A token made up entirely of ASCII digits
/// indexes into an array; every other token is an object key.
///
/// The path is parsed once and can then be applied to any number of
/// documents. Lookups never fail loudly: a missing key, an index out of
/// bounds, or a value of the wrong shape all produce `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

/// One step of a [`KeyPath`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Look up a member of a JSON object.
    Key(String),
    /// Look up an element of a JSON array.
    Index(usize),
}

impl Segment {
    /// Parse a single path token.
    ///
    /// Digit-only tokens too large for `usize` become an index that can
    /// never be in bounds.
    pub fn parse(token: &str) -> Segment {
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            Segment::Index(token.parse().unwrap_or(usize::MAX))
        } else {
            Segment::Key(token.to_string())
        }
    }

    /// Descend one level into `value`.
    #[inline]
    pub fn get<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match (self, value) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Index(idx), Value::Array(items)) => items.get(*idx),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

impl KeyPath {
    /// Compile a path expression.
    pub fn compile(expr: &str) -> KeyPath {
        KeyPath {
            segments: expr.split_whitespace().map(Segment::parse).collect(),
        }
    }

    /// Follow the path from `document`, returning the value at its end.
    ///
    /// An empty path returns the document itself.
    #[inline]
    pub fn lookup<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(document, |current, segment| segment.get(current))
    }

    /// The parsed segments, in traversal order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Extract the value at `path` from `document`.
///
/// Convenience wrapper around [`KeyPath::compile`] and [`KeyPath::lookup`]
/// for one-off lookups.
pub fn extract<'v>(document: &'v Value, path: &str) -> Option<&'v Value> {
    KeyPath::compile(path).lookup(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_object_and_array() {
        let doc = json!({"results": [{"geometry": {"location": {"lat": 1, "lon": 2}}}]});
        assert_eq!(
            extract(&doc, "results 0 geometry location"),
            Some(&json!({"lat": 1, "lon": 2}))
        );
    }

    #[test]
    fn empty_array_is_not_found() {
        let doc = json!({"results": []});
        assert_eq!(extract(&doc, "results 0 geometry location"), None);
    }

    #[test]
    fn missing_key() {
        let doc = json!({"status": "OK"});
        assert_eq!(extract(&doc, "info statuscode"), None);
    }

    #[test]
    fn type_mismatch_mid_path() {
        let doc = json!({"results": "not a list"});
        assert_eq!(extract(&doc, "results 0"), None);
        assert_eq!(extract(&doc, "results name"), None);

        let doc = json!({"a": 5});
        assert_eq!(extract(&doc, "a b c"), None);

        let doc = json!([null, true]);
        assert_eq!(extract(&doc, "0 x"), None);
        assert_eq!(extract(&doc, "1 0"), None);
    }

    #[test]
    fn digits_never_match_object_keys() {
        let doc = json!({"0": "zero"});
        assert_eq!(extract(&doc, "0"), None);
    }

    #[test]
    fn index_out_of_bounds() {
        let doc = json!({"items": [1, 2, 3]});
        assert_eq!(extract(&doc, "items 2"), Some(&json!(3)));
        assert_eq!(extract(&doc, "items 3"), None);
    }

    #[test]
    fn huge_index_is_not_found() {
        let doc = json!([1]);
        assert_eq!(extract(&doc, "99999999999999999999999999"), None);
    }

    #[test]
    fn empty_documents() {
        assert_eq!(extract(&json!({}), "a"), None);
        assert_eq!(extract(&json!([]), "0"), None);
        assert_eq!(extract(&json!(null), "a 0"), None);
    }

    #[test]
    fn empty_path_returns_document() {
        let doc = json!({"a": 1});
        assert_eq!(extract(&doc, ""), Some(&doc));
        assert_eq!(extract(&doc, "   "), Some(&doc));
    }

    #[test]
    fn mixed_whitespace_separators() {
        let doc = json!({"info": {"statuscode": 0}});
        assert_eq!(extract(&doc, "  info\t statuscode\n"), Some(&json!(0)));
    }

    #[test]
    fn compile_segments() {
        let path = KeyPath::compile("results 0 geometry");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("results".to_string()),
                Segment::Index(0),
                Segment::Key("geometry".to_string()),
            ]
        );
        assert!(!path.is_empty());
        assert!(KeyPath::compile("").is_empty());
    }

    #[test]
    fn display_normalizes_whitespace() {
        let path = KeyPath::compile("results  0\tgeometry");
        assert_eq!(path.to_string(), "results 0 geometry");
    }

    #[test]
    fn compiled_path_is_reusable() {
        let path = KeyPath::compile("status");
        assert_eq!(path.lookup(&json!({"status": "OK"})), Some(&json!("OK")));
        assert_eq!(path.lookup(&json!({"status": 200})), Some(&json!(200)));
        assert_eq!(path.lookup(&json!({})), None);
    }
}

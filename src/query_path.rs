//! Response paths.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// One step of a response path: an object key or a list index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field response key.
    Field(String),
    /// An index into a list.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Field(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Field(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// The response path of the position currently being resolved.
///
/// Append-only during descent: a child position extends its parent's path by
/// exactly one segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QueryPath(Vec<PathSegment>);

impl QueryPath {
    pub fn empty() -> Self {
        QueryPath(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The path extended by one segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut path = self.0.clone();
        path.push(segment.into());
        QueryPath(path)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathSegment> {
        self.0.iter()
    }
}

impl From<QueryPath> for Vec<PathSegment> {
    fn from(path: QueryPath) -> Self {
        path.0
    }
}

impl IntoIterator for QueryPath {
    type Item = PathSegment;
    type IntoIter = std::vec::IntoIter<PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Display for QueryPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(".")?;
            }
            segment.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_extends_by_one_segment() {
        let path = QueryPath::empty().child("cheese").child(0).child("flavor");
        assert_eq!(
            Vec::from(path.clone()),
            vec![
                PathSegment::Field("cheese".into()),
                PathSegment::Index(0),
                PathSegment::Field("flavor".into()),
            ]
        );
        assert_eq!(path.to_string(), "cheese.0.flavor");
    }

    #[test]
    fn segments_serialize_as_bare_values() {
        let path = QueryPath::empty().child("cheeses").child(1);
        assert_eq!(
            serde_json::to_value(&path).unwrap(),
            serde_json::json!(["cheeses", 1])
        );
    }
}

//! Wrapping-type strings and their structured view.

use serde::{Deserialize, Serialize};

/// A field or argument type as written in SDL, wrappers included
/// (e.g. `[Cheese!]!`).
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetaFieldType(String);

impl std::fmt::Display for MetaFieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl MetaFieldType {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name with every list and non-null wrapper stripped.
    pub fn named_type(&self) -> &str {
        MetaTypeName::concrete_typename(&self.0)
    }

    pub fn is_non_null(&self) -> bool {
        MetaTypeName::create(&self.0).is_non_null()
    }

    pub fn is_nullable(&self) -> bool {
        !self.is_non_null()
    }

    pub fn is_list(&self) -> bool {
        MetaTypeName::create(&self.0).is_list()
    }
}

impl From<&str> for MetaFieldType {
    fn from(value: &str) -> MetaFieldType {
        MetaFieldType(value.to_string())
    }
}

impl From<String> for MetaFieldType {
    fn from(value: String) -> MetaFieldType {
        MetaFieldType(value)
    }
}

fn strip_brackets(type_name: &str) -> Option<&str> {
    type_name.strip_prefix('[').map(|rest| &rest[..rest.len() - 1])
}

/// The outermost wrapper of a type string.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MetaTypeName<'a> {
    List(&'a str),
    NonNull(&'a str),
    Named(&'a str),
}

impl<'a> std::fmt::Display for MetaTypeName<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaTypeName::Named(name) => write!(f, "{name}"),
            MetaTypeName::NonNull(name) => write!(f, "{name}!"),
            MetaTypeName::List(name) => write!(f, "[{name}]"),
        }
    }
}

impl<'a> MetaTypeName<'a> {
    #[inline]
    pub fn create(type_name: &str) -> MetaTypeName {
        if let Some(type_name) = type_name.strip_suffix('!') {
            MetaTypeName::NonNull(type_name)
        } else if let Some(type_name) = strip_brackets(type_name) {
            MetaTypeName::List(type_name)
        } else {
            MetaTypeName::Named(type_name)
        }
    }

    #[inline]
    pub fn concrete_typename(type_name: &str) -> &str {
        match MetaTypeName::create(type_name) {
            MetaTypeName::List(type_name) => Self::concrete_typename(type_name),
            MetaTypeName::NonNull(type_name) => Self::concrete_typename(type_name),
            MetaTypeName::Named(type_name) => type_name,
        }
    }

    #[inline]
    pub fn is_non_null(&self) -> bool {
        matches!(self, MetaTypeName::NonNull(_))
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        match self {
            MetaTypeName::List(_) => true,
            MetaTypeName::NonNull(inner) => MetaTypeName::create(inner).is_list(),
            MetaTypeName::Named(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_peels_one_wrapper_at_a_time() {
        assert_eq!(MetaTypeName::create("Cheese"), MetaTypeName::Named("Cheese"));
        assert_eq!(MetaTypeName::create("Cheese!"), MetaTypeName::NonNull("Cheese"));
        assert_eq!(MetaTypeName::create("[Cheese!]"), MetaTypeName::List("Cheese!"));
        assert_eq!(MetaTypeName::create("[Cheese!]!"), MetaTypeName::NonNull("[Cheese!]"));
        assert_eq!(
            MetaTypeName::create("[[Cheese]!]"),
            MetaTypeName::List("[Cheese]!")
        );
    }

    #[test]
    fn concrete_typename_strips_all_wrappers() {
        assert_eq!(MetaTypeName::concrete_typename("[[Cheese!]]!"), "Cheese");
        assert_eq!(MetaFieldType::from("[Cheese!]!").named_type(), "Cheese");
    }

    #[test]
    fn nullability_and_listness() {
        assert!(MetaFieldType::from("Cheese!").is_non_null());
        assert!(MetaFieldType::from("[Cheese!]").is_nullable());
        assert!(MetaFieldType::from("[Cheese]!").is_list());
        assert!(!MetaFieldType::from("Cheese!").is_list());
    }
}

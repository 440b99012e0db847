//! Deciding whether fragments apply to runtime values, and resolving
//! abstract types to concrete object types.

use serde_json::Value;

use crate::registry::{MetaType, Registry, TypeResolver};

/// The concrete type selected by a fragment with type condition `inner` at a
/// position statically typed `outer`, for the given runtime value.
///
/// Returns `None` when the fragment does not apply and its selections must
/// be discarded for this value. First match wins:
///
/// 1. the surrounding type is a union: its own runtime resolution decides;
/// 2. the condition is a union that includes the surrounding type;
/// 3. the condition is an interface: its runtime resolution decides;
/// 4. the condition names the surrounding type itself.
pub(crate) fn resolve<'a>(
    registry: &'a Registry,
    value: &Value,
    inner: &'a MetaType,
    outer: &'a MetaType,
) -> Option<&'a MetaType> {
    if let MetaType::Union(_) = outer {
        return runtime_type(registry, outer, value);
    }
    if let MetaType::Union(union_type) = inner {
        if union_type.possible_types.contains(outer.name()) {
            return Some(outer);
        }
    }
    if let MetaType::Interface(_) = inner {
        return runtime_type(registry, inner, value);
    }
    if inner.name() == outer.name() {
        return Some(outer);
    }
    None
}

/// The concrete type of a value sitting at an abstract (interface or union)
/// position.
///
/// Uses the type's registered resolver when it has one, otherwise the
/// value's `"__typename"` property. The result must be one of the abstract
/// type's possible types.
pub(crate) fn runtime_type<'a>(
    registry: &'a Registry,
    abstract_type: &'a MetaType,
    value: &Value,
) -> Option<&'a MetaType> {
    let name = match abstract_type.type_resolver() {
        Some(resolver) => resolver.resolve(value)?,
        None => value.get("__typename")?.as_str()?.to_string(),
    };
    let possible = abstract_type.possible_types()?;
    if !possible.contains(&name) {
        return None;
    }
    registry.lookup_type(&name)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::{InterfaceType, MetaField, ObjectType, UnionType};

    fn registry() -> Registry {
        let mut registry = Registry::new("Query");
        registry.insert_type(crate::registry::ScalarType::new("String"));
        registry.insert_type(
            ObjectType::new("Cheese", [MetaField::new("origin", "String!")]).implement("Edible"),
        );
        registry.insert_type(
            ObjectType::new("Milk", [MetaField::new("origin", "String!")]).implement("Edible"),
        );
        registry.insert_type(ObjectType::new("Query", []));
        registry.insert_type(
            InterfaceType::new("Edible", [MetaField::new("origin", "String!")])
                .with_possible_types(["Cheese", "Milk"]),
        );
        registry.insert_type(UnionType::new("DairyProduct", ["Cheese", "Milk"]));
        registry
    }

    #[test]
    fn union_position_resolves_through_the_union() {
        let registry = registry();
        let outer = registry.lookup_type("DairyProduct").unwrap();
        let inner = registry.lookup_type("Cheese").unwrap();
        let concrete = resolve(&registry, &json!({"__typename": "Milk"}), inner, outer).unwrap();
        assert_eq!(concrete.name(), "Milk");
    }

    #[test]
    fn union_condition_includes_the_outer_object() {
        let registry = registry();
        let outer = registry.lookup_type("Cheese").unwrap();
        let inner = registry.lookup_type("DairyProduct").unwrap();
        let concrete = resolve(&registry, &json!({}), inner, outer).unwrap();
        assert_eq!(concrete.name(), "Cheese");
    }

    #[test]
    fn interface_condition_resolves_at_runtime() {
        let registry = registry();
        let outer = registry.lookup_type("Cheese").unwrap();
        let inner = registry.lookup_type("Edible").unwrap();
        let concrete = resolve(&registry, &json!({"__typename": "Cheese"}), inner, outer).unwrap();
        assert_eq!(concrete.name(), "Cheese");
    }

    #[test]
    fn unrelated_condition_does_not_apply() {
        let registry = registry();
        let outer = registry.lookup_type("Cheese").unwrap();
        let inner = registry.lookup_type("Milk").unwrap();
        assert!(resolve(&registry, &json!({}), inner, outer).is_none());
    }

    #[test]
    fn runtime_type_rejects_names_outside_the_possible_set() {
        let registry = registry();
        let edible = registry.lookup_type("Edible").unwrap();
        assert!(runtime_type(&registry, edible, &json!({"__typename": "Query"})).is_none());
        assert!(runtime_type(&registry, edible, &json!({"__typename": "Milk"})).is_some());
    }
}

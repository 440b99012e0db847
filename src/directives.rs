//! Directive definitions and the checks applied during traversal.

use async_graphql_parser::types::Directive;
use async_graphql_parser::Positioned;
use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use crate::context::ContextExt;
use crate::error::{ValueError, ValueResult};
use crate::registry::{MetaInputValue, ResolverArguments};
use crate::resolver_utils::from_arguments;

/// A directive's inclusion predicate over its materialized arguments.
///
/// Returning false excludes the annotated node from the response.
pub type IncludeFn = fn(&ResolverArguments) -> bool;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
}

impl DirectiveLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveLocation::Query => "QUERY",
            DirectiveLocation::Mutation => "MUTATION",
            DirectiveLocation::Field => "FIELD",
            DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
            DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
            DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
        }
    }
}

/// A directive registered in the schema.
#[derive(Debug)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<DirectiveLocation>,
    pub args: IndexMap<String, MetaInputValue>,
    /// Evaluated during selection flattening; most directives include
    /// unconditionally.
    pub include: IncludeFn,
}

fn if_argument(args: &ResolverArguments) -> bool {
    matches!(args.get("if"), Some(ConstValue::Boolean(true)))
}

pub(crate) fn builtin_directives() -> IndexMap<String, DirectiveDefinition> {
    use DirectiveLocation::{Field, FragmentSpread, InlineFragment};

    let definitions = [
        DirectiveDefinition {
            name: "skip".to_string(),
            description: Some("Directs the executor to skip this field or fragment when the `if` argument is true.".to_string()),
            locations: vec![Field, FragmentSpread, InlineFragment],
            args: [("if".to_string(), MetaInputValue::new("if", "Boolean!"))].into(),
            include: |args| !if_argument(args),
        },
        DirectiveDefinition {
            name: "include".to_string(),
            description: Some("Directs the executor to include this field or fragment only when the `if` argument is true.".to_string()),
            locations: vec![Field, FragmentSpread, InlineFragment],
            args: [("if".to_string(), MetaInputValue::new("if", "Boolean!"))].into(),
            include: |args| if_argument(args),
        },
        DirectiveDefinition {
            name: "defer".to_string(),
            description: Some("Excludes this field from the initial response; its value arrives later as a patch.".to_string()),
            locations: vec![Field],
            args: IndexMap::new(),
            include: |_| true,
        },
    ];

    definitions
        .into_iter()
        .map(|definition| (definition.name.clone(), definition))
        .collect()
}

/// True iff a directive on the node excludes it from the response.
///
/// Walks the node's directives in source order and short-circuits on the
/// first whose inclusion predicate returns false. Unknown directive names
/// are ignored; validation happens upstream.
pub(crate) fn should_skip<'a>(
    ctx: &impl ContextExt<'a>,
    directives: &[Positioned<Directive>],
) -> ValueResult<bool> {
    for directive in directives {
        let Some(definition) = ctx
            .registry()
            .directives
            .get(directive.node.name.node.as_str())
        else {
            continue;
        };
        let args = from_arguments(ctx, directive.pos, &directive.node.arguments, &definition.args)
            .map_err(ValueError::Fatal)?;
        if !(definition.include)(&args) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Pure AST check for `@defer`. No argument evaluation happens here; the
/// directive's semantics live in the execution strategy.
pub(crate) fn is_deferred(directives: &[Positioned<Directive>]) -> bool {
    directives
        .iter()
        .any(|directive| directive.node.name.node.as_str() == "defer")
}

#[cfg(test)]
mod tests {
    use async_graphql_value::Name;

    use super::*;

    fn args(value: bool) -> ResolverArguments {
        [(Name::new("if"), ConstValue::Boolean(value))].into_iter().collect()
    }

    #[test]
    fn builtin_predicates() {
        let directives = builtin_directives();
        assert!(!(directives["skip"].include)(&args(true)));
        assert!((directives["skip"].include)(&args(false)));
        assert!((directives["include"].include)(&args(true)));
        assert!(!(directives["include"].include)(&args(false)));
        assert!((directives["defer"].include)(&ResolverArguments::new()));
    }
}

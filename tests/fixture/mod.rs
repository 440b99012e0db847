//! A cheese-flavored schema exercising every part of the executor.
#![allow(dead_code)]

use serde_json::{json, Value};
use trickle::{
    patch_channel, ConstValue, EnumType, Error, InterfaceType, MetaField, MetaInputValue,
    ObjectType, Registry, Request, Resolver, ResolverError, Response, ResponsePatch, ScalarType,
    Schema, ServerError, UnionType,
};

fn cheeses() -> Vec<Value> {
    vec![
        json!({ "__typename": "Cheese", "id": 1, "flavor": "Brie", "origin": "France", "source": "COW" }),
        json!({ "__typename": "Cheese", "id": 2, "flavor": "Gouda", "origin": "Netherlands", "source": "COW" }),
        json!({ "__typename": "Cheese", "id": 3, "flavor": "Manchego", "origin": "Spain", "source": "SHEEP" }),
    ]
}

fn cheese_by_id(id: i64) -> Value {
    cheeses()
        .into_iter()
        .find(|cheese| cheese["id"] == json!(id))
        .unwrap_or(Value::Null)
}

fn milk() -> Value {
    json!({ "__typename": "Milk", "id": 12, "origin": "Antiquity", "flavors": ["Natural", "Chocolate"] })
}

fn int_arg(value: Option<&ConstValue>) -> Option<i64> {
    match value {
        Some(ConstValue::Number(number)) => number.as_i64(),
        _ => None,
    }
}

fn enum_args(value: Option<&ConstValue>) -> Vec<String> {
    match value {
        Some(ConstValue::List(items)) => items
            .iter()
            .filter_map(|item| match item {
                ConstValue::Enum(name) => Some(name.to_string()),
                ConstValue::String(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub fn registry() -> Registry {
    let mut registry = Registry::new("Query").with_mutation_type("Mutation");

    registry.insert_type(ScalarType::new("Int").with_validator(Value::is_number));
    registry.insert_type(ScalarType::new("String").with_validator(Value::is_string));
    registry.insert_type(ScalarType::new("Boolean").with_validator(Value::is_boolean));
    registry.insert_type(EnumType::new("Source", ["COW", "SHEEP", "GOAT"]));

    registry.insert_type(
        InterfaceType::new("Edible", [MetaField::new("origin", "String!")])
            .with_possible_types(["Cheese", "Milk"]),
    );
    registry.insert_type(UnionType::new("DairyProduct", ["Cheese", "Milk"]));

    registry.insert_type(
        ObjectType::new(
            "Cheese",
            [
                MetaField::new("id", "Int!"),
                MetaField::new("flavor", "String!"),
                MetaField::new("origin", "String!"),
                MetaField::new("source", "Source!"),
                MetaField::new("similarCheese", "Cheese")
                    .with_argument(MetaInputValue::new("source", "[Source!]!"))
                    .with_resolver(Resolver::new(|ctx| {
                        let sources = enum_args(ctx.arg("source"));
                        Ok(cheeses()
                            .into_iter()
                            .find(|cheese| {
                                sources.iter().any(|source| cheese["source"] == json!(source))
                            })
                            .unwrap_or(Value::Null))
                    })),
            ],
        )
        .implement("Edible"),
    );

    registry.insert_type(
        ObjectType::new(
            "Milk",
            [
                MetaField::new("id", "Int!"),
                MetaField::new("origin", "String!"),
                MetaField::new("flavors", "[String!]"),
            ],
        )
        .implement("Edible"),
    );

    registry.insert_type(ObjectType::new(
        "Query",
        [
            MetaField::new("cheese", "Cheese")
                .with_argument(MetaInputValue::new("id", "Int!"))
                .with_resolver(Resolver::new(|ctx| {
                    Ok(int_arg(ctx.arg("id")).map(cheese_by_id).unwrap_or(Value::Null))
                })),
            MetaField::new("cheeses", "[Cheese!]")
                .with_resolver(Resolver::new(|_| Ok(Value::Array(cheeses())))),
            MetaField::new("brokenCheese", "Cheese").with_resolver(Resolver::new(|_| {
                Ok(json!({
                    "__typename": "Cheese",
                    "id": 99,
                    "flavor": null,
                    "origin": "Atlantis",
                    "source": "COW",
                }))
            })),
            MetaField::new("flavors", "[String!]")
                .with_resolver(Resolver::new(|_| Ok(json!(["Brie", null, "Manchego"])))),
            MetaField::new("maybeFlavors", "[String]")
                .with_resolver(Resolver::new(|_| Ok(json!(["Brie", null, "Manchego"])))),
            MetaField::new("favoriteEdible", "Edible").with_resolver(Resolver::new(|_| Ok(milk()))),
            MetaField::new("searchDairy", "DairyProduct")
                .with_resolver(Resolver::new(|_| Ok(cheese_by_id(1)))),
            MetaField::new("executionError", "String").with_resolver(Resolver::new(|_| {
                Err(Error::new("There was an execution error").into())
            })),
            MetaField::new("error", "String").with_resolver(Resolver::new(|_| {
                Err(ResolverError::fatal("This error was raised on purpose"))
            })),
            MetaField::new("rootNotes", "String"),
        ],
    ));

    registry.insert_type(ObjectType::new(
        "Mutation",
        [MetaField::new("pushValue", "Int!")
            .with_argument(MetaInputValue::new("value", "Int!"))
            .with_resolver(Resolver::new(|ctx| {
                Ok(int_arg(ctx.arg("value")).map(|value| json!(value)).unwrap_or(Value::Null))
            }))],
    ));

    registry
}

pub fn schema() -> Schema {
    Schema::build(registry()).finish().expect("the fixture registry is valid")
}

pub fn execute(query: &str) -> Response {
    schema().execute(Request::new(query))
}

/// Run a query with incremental delivery and collect every emitted patch.
pub fn execute_patches(query: &str) -> Result<Vec<ResponsePatch>, ServerError> {
    let (sender, mut receiver) = patch_channel();
    schema().execute_incremental(Request::new(query), &sender)?;
    Ok(receiver.drain())
}

/// Reassemble a patch stream into the response tree it describes.
pub fn reassemble(patches: &[ResponsePatch]) -> Value {
    let mut tree = Value::Null;
    for patch in patches {
        patch.apply_to(&mut tree);
    }
    tree
}

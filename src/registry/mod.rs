//! The schema registry: everything the executor can look up at runtime.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::directives::{builtin_directives, DirectiveDefinition};

mod resolvers;
mod type_names;

pub use resolvers::{Resolver, ResolverArguments, ResolverContext, TypeResolver};
pub use type_names::{MetaFieldType, MetaTypeName};

/// The registry of types and directives a schema executes against.
#[derive(Debug)]
pub struct Registry {
    pub types: IndexMap<String, MetaType>,
    pub directives: IndexMap<String, DirectiveDefinition>,
    pub query_type: String,
    pub mutation_type: Option<String>,
}

impl Registry {
    /// An empty registry with the built-in directives registered.
    pub fn new(query_type: impl Into<String>) -> Self {
        Registry {
            types: IndexMap::new(),
            directives: builtin_directives(),
            query_type: query_type.into(),
            mutation_type: None,
        }
    }

    #[must_use]
    pub fn with_mutation_type(mut self, mutation_type: impl Into<String>) -> Self {
        self.mutation_type = Some(mutation_type.into());
        self
    }

    pub fn insert_type(&mut self, ty: impl Into<MetaType>) {
        let ty = ty.into();
        self.types.insert(ty.name().to_string(), ty);
    }

    pub fn insert_directive(&mut self, directive: DirectiveDefinition) {
        self.directives.insert(directive.name.clone(), directive);
    }

    pub fn lookup_type(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    /// Check the registry is internally consistent.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut roots = vec![&self.query_type];
        roots.extend(self.mutation_type.as_ref());
        for root in roots {
            match self.lookup_type(root) {
                Some(MetaType::Object(_)) => {}
                Some(_) => return Err(SchemaError::NotAnObject(root.clone())),
                None => return Err(SchemaError::UnknownType(root.clone())),
            }
        }

        for ty in self.types.values() {
            for field in ty.fields().into_iter().flat_map(|fields| fields.values()) {
                self.check_known(ty.name(), field.ty.named_type())?;
                for arg in field.args.values() {
                    self.check_known(ty.name(), arg.ty.named_type())?;
                }
            }
            for member in ty.possible_types().into_iter().flatten() {
                match self.lookup_type(member) {
                    Some(MetaType::Object(_)) => {}
                    _ => {
                        return Err(SchemaError::BadMember {
                            ty: ty.name().to_string(),
                            member: member.clone(),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    fn check_known(&self, referrer: &str, name: &str) -> Result<(), SchemaError> {
        if self.types.contains_key(name) {
            Ok(())
        } else {
            Err(SchemaError::UnknownTypeReference {
                referrer: referrer.to_string(),
                name: name.to_string(),
            })
        }
    }
}

/// A problem detected while building a schema from a registry.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("`{0}` is not an object type")]
    NotAnObject(String),
    #[error("`{referrer}` references unknown type `{name}`")]
    UnknownTypeReference { referrer: String, name: String },
    #[error("`{ty}` lists `{member}` as a possible type, but it is not an object type")]
    BadMember { ty: String, member: String },
}

/// A type registered in the schema.
#[derive(Debug)]
pub enum MetaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
}

impl MetaType {
    pub fn name(&self) -> &str {
        match self {
            MetaType::Scalar(inner) => &inner.name,
            MetaType::Object(inner) => &inner.name,
            MetaType::Interface(inner) => &inner.name,
            MetaType::Union(inner) => &inner.name,
            MetaType::Enum(inner) => &inner.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            MetaType::Scalar(inner) => inner.description.as_deref(),
            MetaType::Object(inner) => inner.description.as_deref(),
            MetaType::Interface(inner) => inner.description.as_deref(),
            MetaType::Union(inner) => inner.description.as_deref(),
            MetaType::Enum(inner) => inner.description.as_deref(),
        }
    }

    /// The introspection kind of this type.
    pub fn kind(&self) -> &'static str {
        match self {
            MetaType::Scalar(_) => "SCALAR",
            MetaType::Object(_) => "OBJECT",
            MetaType::Interface(_) => "INTERFACE",
            MetaType::Union(_) => "UNION",
            MetaType::Enum(_) => "ENUM",
        }
    }

    pub fn object(&self) -> Option<&ObjectType> {
        match self {
            MetaType::Object(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, MetaType::Object(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, MetaType::Interface(_) | MetaType::Union(_))
    }

    /// Field definition lookup, for the kinds that carry fields.
    pub fn field(&self, name: &str) -> Option<&MetaField> {
        self.fields().and_then(|fields| fields.get(name))
    }

    pub fn fields(&self) -> Option<&IndexMap<String, MetaField>> {
        match self {
            MetaType::Object(inner) => Some(&inner.fields),
            MetaType::Interface(inner) => Some(&inner.fields),
            _ => None,
        }
    }

    pub fn possible_types(&self) -> Option<&IndexSet<String>> {
        match self {
            MetaType::Interface(inner) => Some(&inner.possible_types),
            MetaType::Union(inner) => Some(&inner.possible_types),
            _ => None,
        }
    }

    pub(crate) fn type_resolver(&self) -> Option<&TypeResolver> {
        match self {
            MetaType::Interface(inner) => inner.resolve_type.as_ref(),
            MetaType::Union(inner) => inner.resolve_type.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    /// Optional check applied to resolved values before they reach the
    /// response.
    pub is_valid: Option<fn(&Value) -> bool>,
}

impl ScalarType {
    pub fn new(name: impl Into<String>) -> Self {
        ScalarType {
            name: name.into(),
            description: None,
            is_valid: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_validator(mut self, is_valid: fn(&Value) -> bool) -> Self {
        self.is_valid = Some(is_valid);
        self
    }

    /// Whether a resolved value is acceptable for this scalar.
    pub fn coerce_result(&self, value: &Value) -> bool {
        match self.is_valid {
            Some(is_valid) => is_valid(value),
            None => true,
        }
    }
}

#[derive(Debug)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, MetaField>,
    /// Names of the interfaces this object implements.
    pub implements: IndexSet<String>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = MetaField>) -> Self {
        ObjectType {
            name: name.into(),
            description: None,
            fields: fields
                .into_iter()
                .map(|field| (field.name.clone(), field))
                .collect(),
            implements: IndexSet::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn implement(mut self, interface: impl Into<String>) -> Self {
        self.implements.insert(interface.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&MetaField> {
        self.fields.get(name)
    }
}

#[derive(Debug)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, MetaField>,
    pub possible_types: IndexSet<String>,
    pub resolve_type: Option<TypeResolver>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = MetaField>) -> Self {
        InterfaceType {
            name: name.into(),
            description: None,
            fields: fields
                .into_iter()
                .map(|field| (field.name.clone(), field))
                .collect(),
            possible_types: IndexSet::new(),
            resolve_type: None,
        }
    }

    #[must_use]
    pub fn with_possible_types<T: Into<String>>(mut self, types: impl IntoIterator<Item = T>) -> Self {
        self.possible_types.extend(types.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_type_resolver(mut self, resolve_type: TypeResolver) -> Self {
        self.resolve_type = Some(resolve_type);
        self
    }
}

#[derive(Debug)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: IndexSet<String>,
    pub resolve_type: Option<TypeResolver>,
}

impl UnionType {
    pub fn new<T: Into<String>>(name: impl Into<String>, possible_types: impl IntoIterator<Item = T>) -> Self {
        UnionType {
            name: name.into(),
            description: None,
            possible_types: possible_types.into_iter().map(Into::into).collect(),
            resolve_type: None,
        }
    }

    #[must_use]
    pub fn with_type_resolver(mut self, resolve_type: TypeResolver) -> Self {
        self.resolve_type = Some(resolve_type);
        self
    }
}

#[derive(Debug)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexMap<String, MetaEnumValue>,
}

impl EnumType {
    pub fn new<T: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = T>) -> Self {
        EnumType {
            name: name.into(),
            description: None,
            values: values
                .into_iter()
                .map(|value| {
                    let value = MetaEnumValue::new(value.into());
                    (value.name.clone(), value)
                })
                .collect(),
        }
    }

    /// Map a resolved value onto one of the enum's members.
    pub fn coerce_result(&self, value: &Value) -> Option<Value> {
        let name = value.as_str()?;
        self.values
            .contains_key(name)
            .then(|| Value::String(name.to_string()))
    }

    /// Whether an input value names one of the enum's members.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

#[derive(Debug, Clone)]
pub struct MetaEnumValue {
    pub name: String,
    pub description: Option<String>,
}

impl MetaEnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        MetaEnumValue {
            name: name.into(),
            description: None,
        }
    }
}

/// One field of an object or interface type.
#[derive(Debug)]
pub struct MetaField {
    pub name: String,
    pub description: Option<String>,
    pub args: IndexMap<String, MetaInputValue>,
    pub ty: MetaFieldType,
    /// `None` falls back to a property lookup on the parent value.
    pub resolver: Option<Resolver>,
}

impl MetaField {
    pub fn new(name: impl Into<String>, ty: impl Into<MetaFieldType>) -> Self {
        MetaField {
            name: name.into(),
            description: None,
            args: IndexMap::new(),
            ty: ty.into(),
            resolver: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_argument(mut self, argument: MetaInputValue) -> Self {
        self.args.insert(argument.name.clone(), argument);
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

/// One argument of a field or directive.
#[derive(Debug, Clone)]
pub struct MetaInputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: MetaFieldType,
    pub default_value: Option<async_graphql_value::ConstValue>,
}

impl MetaInputValue {
    pub fn new(name: impl Into<String>, ty: impl Into<MetaFieldType>) -> Self {
        MetaInputValue {
            name: name.into(),
            description: None,
            ty: ty.into(),
            default_value: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default_value: async_graphql_value::ConstValue) -> Self {
        self.default_value = Some(default_value);
        self
    }
}

macro_rules! meta_type_from {
    ($($variant:ident => $ty:ident),+ $(,)?) => {
        $(
            impl From<$ty> for MetaType {
                fn from(val: $ty) -> Self {
                    MetaType::$variant(val)
                }
            }
        )+
    };
}

meta_type_from! {
    Scalar => ScalarType,
    Object => ObjectType,
    Interface => InterfaceType,
    Union => UnionType,
    Enum => EnumType,
}

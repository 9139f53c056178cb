//! The object "value/type provider" boundary contract (spec §6 "Boundary
//! contracts consumed from external collaborators"). The core only defines
//! the interface; a real embedding supplies a provider backed by its own
//! schema/message-descriptor registry — out of scope here (spec §1). A small
//! in-memory implementation is included for tests and the `cel-cli` smoke
//! test, not as a production registry.

use indexmap::IndexMap;

use crate::error::{CelError, CelResult};
use crate::types::Type;
use crate::value::{ObjectValue, Value};

/// Given a qualified type name, reports whether it names a known object
/// type, the declared type of one of its fields, and constructs an instance
/// from a field-name -> value map.
pub trait TypeProvider {
    fn is_object_type(&self, name: &str) -> bool;
    fn field_type(&self, name: &str, field: &str) -> Option<Type>;
    fn construct(&self, name: &str, fields: IndexMap<String, Value, ahash::RandomState>) -> CelResult<Value>;
}

/// One object type's field schema, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub fields: Vec<(String, Type)>,
}

/// A minimal provider backed by an in-memory schema table. Good enough for
/// tests and the CLI; a real embedding (protobuf descriptors, etc.) supplies
/// its own [`TypeProvider`] instead.
#[derive(Debug, Clone, Default)]
pub struct SimpleTypeProvider {
    schemas: std::collections::HashMap<String, ObjectSchema>,
}

impl SimpleTypeProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_name: impl Into<String>, fields: Vec<(String, Type)>) {
        self.schemas.insert(type_name.into(), ObjectSchema { fields });
    }
}

impl TypeProvider for SimpleTypeProvider {
    fn is_object_type(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    fn field_type(&self, name: &str, field: &str) -> Option<Type> {
        self.schemas.get(name)?.fields.iter().find(|(n, _)| n == field).map(|(_, t)| t.clone())
    }

    fn construct(&self, name: &str, fields: IndexMap<String, Value, ahash::RandomState>) -> CelResult<Value> {
        let schema = self
            .schemas
            .get(name)
            .ok_or_else(|| CelError::type_error(format!("unknown object type: {name}")))?;
        let mut out = IndexMap::with_hasher(ahash::RandomState::new());
        for (field_name, field_type) in &schema.fields {
            let value = fields.get(field_name).cloned().unwrap_or_else(|| default_value(field_type));
            out.insert(field_name.clone(), value);
        }
        Ok(Value::Object(std::rc::Rc::new(ObjectValue {
            type_name: name.into(),
            fields: out,
        })))
    }
}

/// The "empty default" value for an unset field of the given declared type
/// (spec §8 conformance scenario: `has(msg.f)` is `false` when `f` is
/// present-but-default).
fn default_value(ty: &Type) -> Value {
    match ty {
        Type::Bool => Value::Bool(false),
        Type::Int => Value::Int(0),
        Type::Uint => Value::Uint(0),
        Type::Double => Value::Double(0.0),
        Type::String => Value::string(""),
        Type::Bytes => Value::bytes(Vec::new()),
        Type::List(_) => Value::list(Vec::new()),
        Type::Map(_, _) => Value::map(indexmap::IndexMap::with_hasher(ahash::RandomState::new())),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_fills_unset_fields_with_type_default() {
        let mut provider = SimpleTypeProvider::new();
        provider.register("pkg.Msg", vec![("f".to_string(), Type::String)]);
        let value = provider.construct("pkg.Msg", IndexMap::with_hasher(ahash::RandomState::new())).unwrap();
        match value {
            Value::Object(obj) => assert_eq!(obj.fields["f"].to_string(), ""),
            _ => panic!("expected object"),
        }
    }
}

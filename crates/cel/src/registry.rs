//! Declaration registry: variable declarations and function overload sets
//! (spec §4.3 "Function registry").

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{CelError, CelResult};
use crate::provider::TypeProvider;
use crate::types::Type;
use crate::value::{TraitFlags, Value};

/// One concrete signature of a declared function (spec GLOSSARY "Overload").
#[derive(Clone)]
pub struct Overload {
    pub id: String,
    pub arg_types: Vec<Type>,
    pub is_member: bool,
    pub result_type: Type,
    pub type_params: Vec<String>,
    /// Operand trait the first argument must satisfy, if any.
    pub required_trait: Option<TraitFlags>,
    /// Non-strict overloads accept error/unknown arguments instead of
    /// propagating them (spec §4.4 "Dispatch").
    pub non_strict: bool,
    pub implementation: Implementation,
}

/// How an overload is actually executed. Arity mirrors the teacher's
/// `Function` binding shapes (unary/binary/variadic), collapsed to one enum
/// since the core has no bytecode to compile to.
#[derive(Clone)]
pub enum Implementation {
    Unary(Rc<dyn Fn(&Value) -> CelResult<Value>>),
    Binary(Rc<dyn Fn(&Value, &Value) -> CelResult<Value>>),
    Variadic(Rc<dyn Fn(&[Value]) -> CelResult<Value>>),
}

impl Implementation {
    pub fn call(&self, args: &[Value]) -> CelResult<Value> {
        match (self, args) {
            (Self::Unary(f), [a]) => f(a),
            (Self::Binary(f), [a, b]) => f(a, b),
            (Self::Variadic(f), args) => f(args),
            _ => Err(CelError::type_error("bad arity for overload implementation")),
        }
    }
}

/// A function name's full set of overloads.
#[derive(Clone, Default)]
pub struct FunctionDecl {
    pub name: String,
    pub overloads: Vec<Overload>,
}

/// Variable declarations (name -> type) and function declarations (name ->
/// ordered overload set), shared read-only across evaluations once built
/// (spec §5 "Shared-resource policy").
#[derive(Clone, Default)]
pub struct Registry {
    variables: HashMap<String, Type>,
    functions: HashMap<String, FunctionDecl>,
    type_provider: Option<Rc<dyn TypeProvider>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: impl Into<String>, ty: Type) {
        self.variables.insert(name.into(), ty);
    }

    #[must_use]
    pub fn lookup_variable(&self, name: &str) -> Option<&Type> {
        self.variables.get(name)
    }

    pub fn set_type_provider(&mut self, provider: Rc<dyn TypeProvider>) {
        self.type_provider = Some(provider);
    }

    #[must_use]
    pub fn lookup_object_type(&self, name: &str) -> bool {
        self.type_provider.as_ref().is_some_and(|p| p.is_object_type(name))
    }

    #[must_use]
    pub fn object_field_type(&self, name: &str, field: &str) -> Option<Type> {
        self.type_provider.as_ref().and_then(|p| p.field_type(name, field))
    }

    pub fn construct_object(&self, name: &str, fields: IndexMap<String, Value, ahash::RandomState>) -> CelResult<Value> {
        self.type_provider
            .as_ref()
            .ok_or_else(|| CelError::type_error(format!("no type provider registered for: {name}")))?
            .construct(name, fields)
    }

    /// Merges `decl`'s overloads into the registry. Collisions on
    /// overlapping signatures (one assignable to the other) with different
    /// ids are errors; identical signatures with identical ids may be
    /// redefined (spec §4.3).
    pub fn add_function(&mut self, decl: FunctionDecl) -> CelResult<()> {
        let entry = self.functions.entry(decl.name.clone()).or_insert_with(|| FunctionDecl {
            name: decl.name.clone(),
            overloads: Vec::new(),
        });
        for incoming in decl.overloads {
            if let Some(existing) = entry.overloads.iter().position(|o| o.id == incoming.id) {
                entry.overloads[existing] = incoming;
                continue;
            }
            for existing in &entry.overloads {
                if overlapping(existing, &incoming) {
                    return Err(CelError::type_error(format!(
                        "overload collision: {} and {} have overlapping signatures",
                        existing.id, incoming.id
                    )));
                }
            }
            entry.overloads.push(incoming);
        }
        Ok(())
    }

    #[must_use]
    pub fn lookup_function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.get(name)
    }

    /// Keeps only the named overload ids for `name` (spec §4.3 "Subset
    /// operations include overloads by id").
    pub fn subset_include(&mut self, name: &str, ids: &[&str]) {
        if let Some(decl) = self.functions.get_mut(name) {
            decl.overloads.retain(|o| ids.contains(&o.id.as_str()));
        }
    }

    pub fn subset_exclude(&mut self, name: &str, ids: &[&str]) {
        if let Some(decl) = self.functions.get_mut(name) {
            decl.overloads.retain(|o| !ids.contains(&o.id.as_str()));
        }
    }
}

fn overlapping(a: &Overload, b: &Overload) -> bool {
    if a.arg_types.len() != b.arg_types.len() || a.is_member != b.is_member {
        return false;
    }
    a.arg_types.iter().zip(&b.arg_types).all(|(x, y)| {
        crate::types::assignable_closed(x, y) || crate::types::assignable_closed(y, x)
    })
}

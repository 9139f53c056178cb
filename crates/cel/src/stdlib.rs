//! Standard-library overloads: the built-in operators spec §4.3/§4.4 describe
//! ("Operators check traits before dispatching"), registered into a
//! [`Registry`] as ordinary overloads rather than baked into the interpreter,
//! so checking and runtime dispatch both go through the one overload-matching
//! path spec §4.2/§4.4 specify. `&&`, `||`, `?:`, and the comparison family
//! are the exceptions — the interpreter special-cases them (lazy evaluation,
//! and config-dependent cross-type numeric semantics respectively) but still
//! register their signatures here so the checker can resolve them uniformly.

use std::rc::Rc;

use crate::error::CelError;
use crate::registry::{FunctionDecl, Implementation, Overload, Registry};
use crate::types::Type;
use crate::value::{self, TraitFlags, Value};

fn binary(
    id: &str,
    args: [Type; 2],
    result: Type,
    type_params: &[&str],
    required_trait: Option<TraitFlags>,
    non_strict: bool,
    f: Rc<dyn Fn(&Value, &Value) -> Result<Value, CelError>>,
) -> Overload {
    Overload {
        id: id.to_string(),
        arg_types: args.to_vec(),
        is_member: false,
        result_type: result,
        type_params: type_params.iter().map(|s| (*s).to_string()).collect(),
        required_trait,
        non_strict,
        implementation: Implementation::Binary(f),
    }
}

fn unary(id: &str, arg: Type, result: Type, is_member: bool, required_trait: Option<TraitFlags>, f: Rc<dyn Fn(&Value) -> Result<Value, CelError>>) -> Overload {
    Overload {
        id: id.to_string(),
        arg_types: vec![arg],
        is_member,
        result_type: result,
        type_params: vec![],
        required_trait,
        non_strict: false,
        implementation: Implementation::Unary(f),
    }
}

/// Installs every built-in operator overload into `registry`.
pub fn install(registry: &mut Registry) {
    for decl in [
        plus(),
        minus(),
        star(),
        slash(),
        percent(),
        unary_neg(),
        unary_not(),
        equality(),
        inequality(),
        less_than(),
        less_equal(),
        greater_than(),
        greater_equal(),
        logical_and(),
        logical_or(),
        conditional(),
        index(),
        membership(),
        size(),
    ] {
        registry.add_function(decl).expect("standard library overloads must not collide");
    }
}

fn plus() -> FunctionDecl {
    FunctionDecl {
        name: "_+_".to_string(),
        overloads: vec![
            binary("add_int64", [Type::Int, Type::Int], Type::Int, &[], Some(TraitFlags::ADDER), false, Rc::new(value::checked_add)),
            binary("add_uint64", [Type::Uint, Type::Uint], Type::Uint, &[], Some(TraitFlags::ADDER), false, Rc::new(value::checked_add)),
            binary("add_double", [Type::Double, Type::Double], Type::Double, &[], Some(TraitFlags::ADDER), false, Rc::new(value::checked_add)),
            binary("add_string", [Type::String, Type::String], Type::String, &[], Some(TraitFlags::ADDER), false, Rc::new(value::checked_add)),
            binary("add_bytes", [Type::Bytes, Type::Bytes], Type::Bytes, &[], Some(TraitFlags::ADDER), false, Rc::new(value::checked_add)),
            binary(
                "add_list",
                [Type::list(Type::TypeParam("T".into())), Type::list(Type::TypeParam("T".into()))],
                Type::list(Type::TypeParam("T".into())),
                &["T"],
                Some(TraitFlags::ADDER),
                false,
                Rc::new(value::checked_add),
            ),
            binary("add_timestamp_duration", [Type::Timestamp, Type::Duration], Type::Timestamp, &[], Some(TraitFlags::ADDER), false, Rc::new(value::checked_add)),
            binary("add_duration_timestamp", [Type::Duration, Type::Timestamp], Type::Timestamp, &[], Some(TraitFlags::ADDER), false, Rc::new(value::checked_add)),
            binary("add_duration_duration", [Type::Duration, Type::Duration], Type::Duration, &[], Some(TraitFlags::ADDER), false, Rc::new(value::checked_add)),
        ],
    }
}

fn minus() -> FunctionDecl {
    FunctionDecl {
        name: "_-_".to_string(),
        overloads: vec![
            binary("sub_int64", [Type::Int, Type::Int], Type::Int, &[], Some(TraitFlags::SUBTRACTOR), false, Rc::new(value::checked_sub_dispatch)),
            binary("sub_uint64", [Type::Uint, Type::Uint], Type::Uint, &[], Some(TraitFlags::SUBTRACTOR), false, Rc::new(value::checked_sub_dispatch)),
            binary("sub_double", [Type::Double, Type::Double], Type::Double, &[], Some(TraitFlags::SUBTRACTOR), false, Rc::new(value::checked_sub_dispatch)),
            binary("sub_timestamp_duration", [Type::Timestamp, Type::Duration], Type::Timestamp, &[], Some(TraitFlags::SUBTRACTOR), false, Rc::new(value::checked_sub_dispatch)),
            binary("sub_timestamp_timestamp", [Type::Timestamp, Type::Timestamp], Type::Duration, &[], Some(TraitFlags::SUBTRACTOR), false, Rc::new(value::checked_sub_dispatch)),
            binary("sub_duration_duration", [Type::Duration, Type::Duration], Type::Duration, &[], Some(TraitFlags::SUBTRACTOR), false, Rc::new(value::checked_sub_dispatch)),
        ],
    }
}

fn star() -> FunctionDecl {
    FunctionDecl {
        name: "_*_".to_string(),
        overloads: vec![
            binary("mul_int64", [Type::Int, Type::Int], Type::Int, &[], Some(TraitFlags::MULTIPLIER), false, Rc::new(value::checked_mul)),
            binary("mul_uint64", [Type::Uint, Type::Uint], Type::Uint, &[], Some(TraitFlags::MULTIPLIER), false, Rc::new(value::checked_mul)),
            binary("mul_double", [Type::Double, Type::Double], Type::Double, &[], Some(TraitFlags::MULTIPLIER), false, Rc::new(value::checked_mul)),
        ],
    }
}

fn slash() -> FunctionDecl {
    FunctionDecl {
        name: "_/_".to_string(),
        overloads: vec![
            binary("div_int64", [Type::Int, Type::Int], Type::Int, &[], Some(TraitFlags::DIVIDER), false, Rc::new(value::checked_div)),
            binary("div_uint64", [Type::Uint, Type::Uint], Type::Uint, &[], Some(TraitFlags::DIVIDER), false, Rc::new(value::checked_div)),
            binary("div_double", [Type::Double, Type::Double], Type::Double, &[], Some(TraitFlags::DIVIDER), false, Rc::new(value::checked_div)),
        ],
    }
}

fn percent() -> FunctionDecl {
    FunctionDecl {
        name: "_%_".to_string(),
        overloads: vec![
            binary("mod_int64", [Type::Int, Type::Int], Type::Int, &[], Some(TraitFlags::MODDER), false, Rc::new(value::checked_rem)),
            binary("mod_uint64", [Type::Uint, Type::Uint], Type::Uint, &[], Some(TraitFlags::MODDER), false, Rc::new(value::checked_rem)),
        ],
    }
}

fn unary_neg() -> FunctionDecl {
    FunctionDecl {
        name: "-_".to_string(),
        overloads: vec![
            unary("neg_int64", Type::Int, Type::Int, false, Some(TraitFlags::NEGATER), Rc::new(value::checked_neg)),
            unary("neg_double", Type::Double, Type::Double, false, Some(TraitFlags::NEGATER), Rc::new(value::checked_neg)),
        ],
    }
}

fn unary_not() -> FunctionDecl {
    FunctionDecl {
        name: "!_".to_string(),
        overloads: vec![unary(
            "logical_not",
            Type::Bool,
            Type::Bool,
            false,
            None,
            Rc::new(|a| match a {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(CelError::no_such_overload("!_", &[other.type_of().to_string()])),
            }),
        )],
    }
}

/// Registered so the checker can resolve `dyn, dyn -> bool` for every
/// comparison operator. The interpreter never calls this implementation — it
/// special-cases equality/ordering so `cross_type_numeric_comparisons` is
/// honored — but it still reproduces that config-off behavior exactly rather
/// than being a dead stub.
fn comparison(name: &str, id: &str, eval: fn(&Value, &Value) -> bool) -> FunctionDecl {
    FunctionDecl {
        name: name.to_string(),
        overloads: vec![binary(id, [Type::Dyn, Type::Dyn], Type::Bool, &[], Some(TraitFlags::COMPARER), false, Rc::new(move |a, b| Ok(Value::Bool(eval(a, b)))))],
    }
}

fn equality() -> FunctionDecl {
    comparison("_==_", "equals", |a, b| value::values_equal(a, b, false))
}

fn inequality() -> FunctionDecl {
    comparison("_!=_", "not_equals", |a, b| !value::values_equal(a, b, false))
}

fn less_than() -> FunctionDecl {
    comparison("_<_", "less_than", |a, b| value::values_compare(a, b, false) == Some(std::cmp::Ordering::Less))
}

fn less_equal() -> FunctionDecl {
    comparison("_<=_", "less_equals", |a, b| {
        matches!(value::values_compare(a, b, false), Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal))
    })
}

fn greater_than() -> FunctionDecl {
    comparison("_>_", "greater_than", |a, b| value::values_compare(a, b, false) == Some(std::cmp::Ordering::Greater))
}

fn greater_equal() -> FunctionDecl {
    comparison("_>=_", "greater_equals", |a, b| {
        matches!(value::values_compare(a, b, false), Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal))
    })
}

/// Registered only so the checker can resolve `bool, bool -> bool`; the
/// interpreter always special-cases `&&`/`||` for short-circuit evaluation
/// and never invokes this implementation.
fn logical_and() -> FunctionDecl {
    FunctionDecl {
        name: "_&&_".to_string(),
        overloads: vec![binary(
            "logical_and",
            [Type::Bool, Type::Bool],
            Type::Bool,
            &[],
            None,
            true,
            Rc::new(|a, b| match (a, b) {
                (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(*x && *y)),
                _ => Err(CelError::type_error("_&&_ on non-bool")),
            }),
        )],
    }
}

fn logical_or() -> FunctionDecl {
    FunctionDecl {
        name: "_||_".to_string(),
        overloads: vec![binary(
            "logical_or",
            [Type::Bool, Type::Bool],
            Type::Bool,
            &[],
            None,
            true,
            Rc::new(|a, b| match (a, b) {
                (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(*x || *y)),
                _ => Err(CelError::type_error("_||_ on non-bool")),
            }),
        )],
    }
}

/// Registered only so the checker can resolve the ternary's shape; the
/// interpreter always special-cases `_?_:_` to avoid evaluating the branch
/// that isn't taken.
fn conditional() -> FunctionDecl {
    FunctionDecl {
        name: "_?_:_".to_string(),
        overloads: vec![Overload {
            id: "conditional".to_string(),
            arg_types: vec![Type::Bool, Type::TypeParam("T".into()), Type::TypeParam("T".into())],
            is_member: false,
            result_type: Type::TypeParam("T".into()),
            type_params: vec!["T".to_string()],
            required_trait: None,
            non_strict: true,
            implementation: Implementation::Variadic(Rc::new(|args| match args {
                [Value::Bool(true), a, _] => Ok(a.clone()),
                [Value::Bool(false), _, b] => Ok(b.clone()),
                _ => Err(CelError::type_error("ternary condition must be bool")),
            })),
        }],
    }
}

fn index() -> FunctionDecl {
    FunctionDecl {
        name: "_[_]".to_string(),
        overloads: vec![
            binary(
                "index_list",
                [Type::list(Type::TypeParam("T".into())), Type::Int],
                Type::TypeParam("T".into()),
                &["T"],
                Some(TraitFlags::INDEXER),
                false,
                Rc::new(|a, b| match (a, b) {
                    (Value::List(items), Value::Int(i)) => {
                        let idx = usize::try_from(*i).map_err(|_| CelError::access(format!("index out of range: {i}")))?;
                        items.get(idx).cloned().ok_or_else(|| CelError::access(format!("index out of range: {i}")))
                    }
                    _ => Err(CelError::no_such_overload("_[_]", &[a.type_of().to_string(), b.type_of().to_string()])),
                }),
            ),
            binary(
                "index_map",
                [Type::map(Type::TypeParam("K".into()), Type::TypeParam("V".into())), Type::TypeParam("K".into())],
                Type::TypeParam("V".into()),
                &["K", "V"],
                Some(TraitFlags::INDEXER),
                false,
                Rc::new(|a, b| match a {
                    Value::Map(m) => {
                        let key = value::value_to_map_key(b)?;
                        m.get(&key).cloned().ok_or_else(|| CelError::access(format!("no such key: {key}")))
                    }
                    _ => Err(CelError::no_such_overload("_[_]", &[a.type_of().to_string(), b.type_of().to_string()])),
                }),
            ),
        ],
    }
}

fn membership() -> FunctionDecl {
    FunctionDecl {
        name: "@in".to_string(),
        overloads: vec![
            binary(
                "in_list",
                [Type::TypeParam("T".into()), Type::list(Type::TypeParam("T".into()))],
                Type::Bool,
                &["T"],
                Some(TraitFlags::CONTAINER),
                false,
                Rc::new(|elem, container| match container {
                    Value::List(items) => Ok(Value::Bool(items.iter().any(|v| value::values_equal(v, elem, false)))),
                    _ => Err(CelError::no_such_overload("@in", &[elem.type_of().to_string(), container.type_of().to_string()])),
                }),
            ),
            binary(
                "in_map",
                [Type::TypeParam("K".into()), Type::map(Type::TypeParam("K".into()), Type::TypeParam("V".into()))],
                Type::Bool,
                &["K", "V"],
                Some(TraitFlags::CONTAINER),
                false,
                Rc::new(|key, container| match container {
                    Value::Map(m) => {
                        let k = value::value_to_map_key(key)?;
                        Ok(Value::Bool(m.contains_key(&k)))
                    }
                    _ => Err(CelError::no_such_overload("@in", &[key.type_of().to_string(), container.type_of().to_string()])),
                }),
            ),
        ],
    }
}

fn size() -> FunctionDecl {
    fn impl_size(a: &Value) -> Result<Value, CelError> {
        let n = match a {
            Value::String(s) => s.chars().count() as i64,
            Value::Bytes(b) => b.len() as i64,
            Value::List(items) => items.len() as i64,
            Value::Map(m) => m.len() as i64,
            other => return Err(CelError::no_such_overload("size", &[other.type_of().to_string()])),
        };
        Ok(Value::Int(n))
    }
    fn variants(is_member: bool, suffix: &str) -> Vec<Overload> {
        vec![
            unary(&format!("size_string{suffix}"), Type::String, Type::Int, is_member, Some(TraitFlags::SIZER), Rc::new(impl_size)),
            unary(&format!("size_bytes{suffix}"), Type::Bytes, Type::Int, is_member, Some(TraitFlags::SIZER), Rc::new(impl_size)),
            Overload {
                id: format!("size_list{suffix}"),
                arg_types: vec![Type::list(Type::TypeParam("T".into()))],
                is_member,
                result_type: Type::Int,
                type_params: vec!["T".to_string()],
                required_trait: Some(TraitFlags::SIZER),
                non_strict: false,
                implementation: Implementation::Unary(Rc::new(impl_size)),
            },
            Overload {
                id: format!("size_map{suffix}"),
                arg_types: vec![Type::map(Type::TypeParam("K".into()), Type::TypeParam("V".into()))],
                is_member,
                result_type: Type::Int,
                type_params: vec!["K".to_string(), "V".to_string()],
                required_trait: Some(TraitFlags::SIZER),
                non_strict: false,
                implementation: Implementation::Unary(Rc::new(impl_size)),
            },
        ]
    }

    // `size(x)` (global call) and `x.size()` (member call) are both
    // conformant CEL call shapes; register distinct overload ids for each.
    let mut overloads = variants(false, "");
    overloads.extend(variants(true, "_member"));
    FunctionDecl {
        name: "size".to_string(),
        overloads,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_without_overload_collisions() {
        let mut registry = Registry::new();
        install(&mut registry);
        assert!(registry.lookup_function("_+_").is_some());
        assert!(registry.lookup_function("size").is_some());
        assert_eq!(registry.lookup_function("_+_").unwrap().overloads.len(), 9);
    }

    #[test]
    fn list_index_returns_element() {
        let mut registry = Registry::new();
        install(&mut registry);
        let decl = registry.lookup_function("_[_]").unwrap();
        let overload = decl.overloads.iter().find(|o| o.id == "index_list").unwrap();
        let list = Value::list(vec![Value::Int(10), Value::Int(20)]);
        let result = overload.implementation.call(&[list, Value::Int(1)]).unwrap();
        assert!(matches!(result, Value::Int(20)));
    }
}

//! The abstract type descriptor and the assignability/unification rules that
//! drive overload resolution (spec §3 "Type descriptor", §4.2).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A recursive type descriptor. Two descriptors are equal under a structural
/// definition honoring equality of all sub-parts (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Dyn,
    Null,
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    Duration,
    Timestamp,
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
    /// Reifies a type as a value of kind `type(T)`.
    TypeValue(Box<Type>),
    /// A nullable wrapper around a primitive payload type.
    Wrapper(Box<Type>),
    /// A nominal "message" object, named by its fully-qualified type name.
    Object(String),
    /// An unbound type parameter, e.g. the `T` in `list(T)` before unification.
    TypeParam(String),
    /// An opaque parametric type not otherwise representable, e.g. vendor extensions.
    Opaque(String, Vec<Type>),
    /// The sentinel result of a failed check; propagates without blocking the walk.
    Error,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dyn => write!(f, "dyn"),
            Self::Null => write!(f, "null"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Uint => write!(f, "uint"),
            Self::Double => write!(f, "double"),
            Self::String => write!(f, "string"),
            Self::Bytes => write!(f, "bytes"),
            Self::Duration => write!(f, "duration"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::List(t) => write!(f, "list({t})"),
            Self::Map(k, v) => write!(f, "map({k}, {v})"),
            Self::TypeValue(t) => write!(f, "type({t})"),
            Self::Wrapper(t) => write!(f, "wrapper({t})"),
            Self::Object(name) => write!(f, "{name}"),
            Self::TypeParam(name) => write!(f, "{name}"),
            Self::Opaque(name, args) => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Self::Error => write!(f, "error"),
        }
    }
}

impl Type {
    #[must_use]
    pub fn list(elem: Type) -> Self {
        Self::List(Box::new(elem))
    }

    #[must_use]
    pub fn map(key: Type, value: Type) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Wrapper(_))
            || matches!(
                self,
                Self::Duration | Self::Timestamp | Self::Bytes | Self::String | Self::List(_) | Self::Map(_, _)
            )
    }
}

/// A mapping from type-parameter name to bound type, accumulated during
/// checking (spec GLOSSARY "Substitution"). Copy-on-write across overload
/// trials: callers `clone()` before attempting a trial and discard the clone
/// on failure, so a failed trial leaves no residue (spec §9).
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    bindings: BTreeMap<String, Type>,
}

impl Substitution {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Type> {
        self.bindings.get(name)
    }

    /// Resolves type parameters through the substitution, recursively.
    #[must_use]
    pub fn resolve(&self, ty: &Type) -> Type {
        match ty {
            Type::TypeParam(name) => match self.bindings.get(name) {
                Some(bound) if bound != ty => self.resolve(bound),
                _ => ty.clone(),
            },
            Type::List(t) => Type::list(self.resolve(t)),
            Type::Map(k, v) => Type::map(self.resolve(k), self.resolve(v)),
            Type::Wrapper(t) => Type::Wrapper(Box::new(self.resolve(t))),
            Type::TypeValue(t) => Type::TypeValue(Box::new(self.resolve(t))),
            Type::Opaque(name, args) => Type::Opaque(name.clone(), args.iter().map(|a| self.resolve(a)).collect()),
            other => other.clone(),
        }
    }

    /// Binds `name` to `ty`, widening to the most-general type consistent
    /// with any prior binding (spec §4.2 "Type parameters").
    ///
    /// Returns `Err` if doing so would create a cycle (`T := list(T)`),
    /// guarded by an occurs check (spec §9).
    pub fn bind(&mut self, name: &str, ty: Type) -> Result<(), String> {
        if occurs(name, &ty) {
            return Err(format!("circular type-parameter binding: {name} := {ty}"));
        }
        match self.bindings.get(name).cloned() {
            Some(existing) => {
                let widened = most_general(&existing, &ty);
                self.bindings.insert(name.to_string(), widened);
            }
            None => {
                self.bindings.insert(name.to_string(), ty);
            }
        }
        Ok(())
    }
}

fn occurs(name: &str, ty: &Type) -> bool {
    match ty {
        Type::TypeParam(other) => other == name,
        Type::List(t) | Type::Wrapper(t) | Type::TypeValue(t) => occurs(name, t),
        Type::Map(k, v) => occurs(name, k) || occurs(name, v),
        Type::Opaque(_, args) => args.iter().any(|a| occurs(name, a)),
        _ => false,
    }
}

/// Returns the less-specific of two unifiable types; `dyn` always wins,
/// otherwise the structure widens recursively (spec §4.2 "Most-general").
#[must_use]
pub fn most_general(a: &Type, b: &Type) -> Type {
    match (a, b) {
        (Type::Dyn, _) | (_, Type::Dyn) => Type::Dyn,
        (Type::TypeParam(_), other) | (other, Type::TypeParam(_)) => other.clone(),
        (Type::List(x), Type::List(y)) => Type::list(most_general(x, y)),
        (Type::Map(xk, xv), Type::Map(yk, yv)) => Type::map(most_general(xk, yk), most_general(xv, yv)),
        (Type::Wrapper(x), Type::Wrapper(y)) => Type::Wrapper(Box::new(most_general(x, y))),
        _ if a == b => a.clone(),
        _ => Type::Dyn,
    }
}

/// Assignability: is a value of type `from` usable where `to` is expected?
/// (spec §4.2 "Assignability", written `to <- from`).
///
/// `subst` accumulates type-parameter bindings discovered along the way;
/// pass a fresh [`Substitution`] per top-level assignability query and
/// `clone()` it before trying alternatives (e.g. overload candidates).
pub fn assignable(to: &Type, from: &Type, subst: &mut Substitution) -> bool {
    match (to, from) {
        (Type::Dyn, _) | (_, Type::Dyn) => true,
        (Type::Error, _) | (_, Type::Error) => true,
        (Type::TypeParam(name), other) => subst.bind(name, other.clone()).is_ok(),
        (other, Type::TypeParam(name)) => subst.bind(name, other.clone()).is_ok(),
        (Type::Null, other) => other.is_nullable() || matches!(other, Type::Null),
        (Type::Wrapper(p), other) => assignable(p, other, subst) || matches!(other, Type::Null),
        (Type::List(a), Type::List(b)) => assignable(a, b, subst),
        (Type::Map(ak, av), Type::Map(bk, bv)) => assignable(ak, bk, subst) && assignable(av, bv, subst),
        (Type::TypeValue(a), Type::TypeValue(b)) => assignable(a, b, subst),
        (Type::Opaque(an, aargs), Type::Opaque(bn, bargs)) => {
            an == bn
                && aargs.len() == bargs.len()
                && aargs.iter().zip(bargs).all(|(a, b)| assignable(a, b, subst))
        }
        _ => to == from,
    }
}

/// Assignability without tracking a substitution — convenient at call sites
/// that only need a yes/no answer over closed (non-parametric) types.
#[must_use]
pub fn assignable_closed(to: &Type, from: &Type) -> bool {
    let mut subst = Substitution::new();
    assignable(to, from, &mut subst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dyn_matches_anything() {
        assert!(assignable_closed(&Type::Dyn, &Type::Int));
        assert!(assignable_closed(&Type::Int, &Type::Dyn));
    }

    #[test]
    fn null_assignable_to_nullable_kinds_only() {
        assert!(assignable_closed(&Type::Null, &Type::Object("Msg".into())));
        assert!(!assignable_closed(&Type::Null, &Type::Int));
    }

    #[test]
    fn type_param_widens_to_dyn_on_conflicting_reencounter() {
        let mut subst = Substitution::new();
        assert!(assignable(&Type::TypeParam("T".into()), &Type::Int, &mut subst));
        assert!(assignable(&Type::TypeParam("T".into()), &Type::String, &mut subst));
        assert_eq!(subst.get("T"), Some(&Type::Dyn));
    }

    #[test]
    fn occurs_check_rejects_cycle() {
        let mut subst = Substitution::new();
        let cyclic = Type::list(Type::TypeParam("T".into()));
        assert!(subst.bind("T", cyclic).is_err());
    }

    #[test]
    fn list_assignability_is_elementwise() {
        assert!(assignable_closed(&Type::list(Type::Int), &Type::list(Type::Int)));
        assert!(!assignable_closed(&Type::list(Type::Int), &Type::list(Type::String)));
        assert!(assignable_closed(&Type::list(Type::Dyn), &Type::list(Type::String)));
    }
}

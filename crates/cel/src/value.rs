//! The runtime value model: a tagged enum with trait-bit dispatch, grounded
//! on the teacher's `Value` design (small immediates inline, larger payloads
//! behind a cheap handle) but without the teacher's heap arena — CEL values
//! are immutable and reference-counted instead of refcounted-and-mutable, so
//! a tracing GC has no role here.
//!
//! Operators check [`TraitFlags`] before dispatching, exactly as spec §4.3
//! describes ("Operators check traits before dispatching"), rather than
//! relying on open-ended subclassing (spec §9 "Design notes").

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexMap;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::ast::NodeId;
use crate::error::CelError;
use crate::types::Type;

bitflags! {
    /// Capability bits a value's type declares (spec §4.3 "Trait flags").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TraitFlags: u16 {
        const ADDER       = 1 << 0;
        const SUBTRACTOR  = 1 << 1;
        const MULTIPLIER  = 1 << 2;
        const DIVIDER     = 1 << 3;
        const MODDER      = 1 << 4;
        const NEGATER     = 1 << 5;
        const COMPARER    = 1 << 6;
        const INDEXER     = 1 << 7;
        const FIELD_TESTER = 1 << 8;
        const SIZER       = 1 << 9;
        const ITERATOR    = 1 << 10;
        const CONTAINER   = 1 << 11;
        const MATCHER     = 1 << 12;
    }
}

/// Seconds+nanoseconds since the Unix epoch, range-checked against the CEL
/// valid timestamp window (spec §4.3 "Numeric semantics").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

/// `0001-01-01T00:00:00Z` expressed as seconds since the Unix epoch.
pub const TIMESTAMP_MIN_SECONDS: i64 = -62_135_596_800;
/// `9999-12-31T23:59:59Z` expressed as seconds since the Unix epoch.
pub const TIMESTAMP_MAX_SECONDS: i64 = 253_402_300_799;

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> Result<Self, CelError> {
        if !(TIMESTAMP_MIN_SECONDS..=TIMESTAMP_MAX_SECONDS).contains(&seconds) || nanos > 999_999_999 {
            return Err(CelError::arithmetic("timestamp out of range"));
        }
        Ok(Self { seconds, nanos })
    }

    #[must_use]
    pub fn add_duration(&self, d: Duration) -> Result<Self, CelError> {
        let total_nanos = i128::from(self.nanos) + i128::from(d.nanos);
        let extra_secs = total_nanos.div_euclid(1_000_000_000);
        let nanos = total_nanos.rem_euclid(1_000_000_000) as u32;
        let seconds = self
            .seconds
            .checked_add(d.seconds)
            .and_then(|s| s.checked_add(i64::try_from(extra_secs).ok()?))
            .ok_or_else(|| CelError::arithmetic("timestamp overflow"))?;
        Self::new(seconds, nanos)
    }

    #[must_use]
    pub fn sub_duration(&self, d: Duration) -> Result<Self, CelError> {
        self.add_duration(Duration {
            seconds: d.seconds.checked_neg().unwrap_or(i64::MAX),
            nanos: -d.nanos,
        })
    }

    pub fn diff(&self, other: &Self) -> Result<Duration, CelError> {
        let secs = self
            .seconds
            .checked_sub(other.seconds)
            .ok_or_else(|| CelError::arithmetic("duration overflow"))?;
        let nanos = i64::from(self.nanos) - i64::from(other.nanos);
        Duration::from_seconds_nanos(secs, nanos)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use chrono::{DateTime, Utc};
        let dt = DateTime::<Utc>::from_timestamp(self.seconds, self.nanos).unwrap_or_default();
        write!(f, "{}", dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true))
    }
}

/// A signed duration of seconds+nanoseconds; both fields share the overall sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duration {
    pub seconds: i64,
    pub nanos: i32,
}

impl Duration {
    pub fn from_seconds_nanos(seconds: i64, nanos: i64) -> Result<Self, CelError> {
        let total_nanos = i128::from(seconds) * 1_000_000_000 + i128::from(nanos);
        let secs = i64::try_from(total_nanos.div_euclid(1_000_000_000))
            .map_err(|_| CelError::arithmetic("duration overflow"))?;
        let rem = (total_nanos.rem_euclid(1_000_000_000)) as i64;
        let (secs, nanos) = if rem > 500_000_000 && secs < 0 {
            (secs + 1, (rem - 1_000_000_000) as i32)
        } else {
            (secs, rem as i32)
        };
        Ok(Self { seconds: secs, nanos })
    }

    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        Self::from_seconds_nanos(
            self.seconds.checked_add(other.seconds)?,
            i64::from(self.nanos) + i64::from(other.nanos),
        )
        .ok()
    }

    #[must_use]
    pub fn checked_neg(&self) -> Option<Self> {
        Some(Self {
            seconds: self.seconds.checked_neg()?,
            nanos: self.nanos.checked_neg()?,
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.seconds as f64 + f64::from(self.nanos) / 1e9;
        write!(f, "{total}s")
    }
}

/// A primitive-typed map key. CEL map keys are restricted to bool/int/uint/string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(Rc<str>),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Uint(u) => write!(f, "{u}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Ordered map storage. Iteration order is stable within one value but
/// otherwise implementation-defined (spec §5 "Ordering").
pub type ValueMap = IndexMap<MapKey, Value, ahash::RandomState>;

/// A nominal object instance: a type name plus its named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectValue {
    pub type_name: Rc<str>,
    pub fields: IndexMap<String, Value, ahash::RandomState>,
}

/// An ordered, deduplicated set of attribute node ids that could not be
/// resolved under partial evaluation (spec GLOSSARY "Unknown").
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnknownSet(pub Vec<NodeId>);

impl UnknownSet {
    #[must_use]
    pub fn single(id: NodeId) -> Self {
        Self(vec![id])
    }

    /// Ordered-set union, preserving first-seen order (spec §9 "Unknowns").
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.0.clone();
        for id in &other.0 {
            if !out.contains(id) {
                out.push(*id);
            }
        }
        Self(out)
    }
}

/// A runtime value. Heap-ish payloads (`String`, `Bytes`, `List`, `Map`,
/// `Object`) are `Rc`-shared so cloning a `Value` is cheap and values can be
/// captured by comprehension accumulators without deep copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(Rc<str>),
    Bytes(Rc<[u8]>),
    Timestamp(Timestamp),
    Duration(Duration),
    List(Rc<Vec<Value>>),
    Map(Rc<ValueMap>),
    TypeValue(Type),
    Object(Rc<ObjectValue>),
    /// Produced by partial evaluation; propagates like a value, not an exception.
    Unknown(UnknownSet),
    /// A failed operation. Propagates like a value under strict operators and
    /// is absorbed like a value under short-circuit operators (spec §7).
    Error(Rc<CelError>),
}

impl Value {
    #[must_use]
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Self::String(s.into())
    }

    #[must_use]
    pub fn bytes(b: impl Into<Rc<[u8]>>) -> Self {
        Self::Bytes(b.into())
    }

    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Rc::new(items))
    }

    #[must_use]
    pub fn map(entries: ValueMap) -> Self {
        Self::Map(Rc::new(entries))
    }

    #[must_use]
    pub fn error(err: CelError) -> Self {
        Self::Error(Rc::new(err))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// True when this value is an error or unknown — the two variants that
    /// propagate specially through strict/non-strict operators (spec §7).
    #[must_use]
    pub fn is_exceptional(&self) -> bool {
        self.is_error() || self.is_unknown()
    }

    #[must_use]
    pub fn type_of(&self) -> Type {
        match self {
            Self::Null => Type::Null,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Uint(_) => Type::Uint,
            Self::Double(_) => Type::Double,
            Self::String(_) => Type::String,
            Self::Bytes(_) => Type::Bytes,
            Self::Timestamp(_) => Type::Timestamp,
            Self::Duration(_) => Type::Duration,
            Self::List(items) => Type::list(items.first().map_or(Type::Dyn, Value::type_of)),
            Self::Map(entries) => entries.iter().next().map_or(Type::map(Type::Dyn, Type::Dyn), |(k, v)| {
                Type::map(map_key_type(k), v.type_of())
            }),
            Self::TypeValue(t) => Type::TypeValue(Box::new(t.clone())),
            Self::Object(obj) => Type::Object(obj.type_name.to_string()),
            Self::Unknown(_) | Self::Error(_) => Type::Dyn,
        }
    }

    #[must_use]
    pub fn traits(&self) -> TraitFlags {
        match self {
            Self::Int(_) | Self::Uint(_) | Self::Double(_) => {
                TraitFlags::ADDER
                    | TraitFlags::SUBTRACTOR
                    | TraitFlags::MULTIPLIER
                    | TraitFlags::DIVIDER
                    | TraitFlags::NEGATER
                    | TraitFlags::COMPARER
                    | if matches!(self, Self::Double(_)) {
                        TraitFlags::empty()
                    } else {
                        TraitFlags::MODDER
                    }
            }
            Self::String(_) => TraitFlags::ADDER | TraitFlags::COMPARER | TraitFlags::SIZER | TraitFlags::INDEXER,
            Self::Bytes(_) => TraitFlags::ADDER | TraitFlags::COMPARER | TraitFlags::SIZER | TraitFlags::INDEXER,
            Self::List(_) => {
                TraitFlags::ADDER
                    | TraitFlags::SIZER
                    | TraitFlags::INDEXER
                    | TraitFlags::ITERATOR
                    | TraitFlags::CONTAINER
            }
            Self::Map(_) => {
                TraitFlags::SIZER
                    | TraitFlags::INDEXER
                    | TraitFlags::ITERATOR
                    | TraitFlags::CONTAINER
                    | TraitFlags::FIELD_TESTER
            }
            Self::Object(_) => TraitFlags::FIELD_TESTER,
            Self::Duration(_) => TraitFlags::ADDER | TraitFlags::SUBTRACTOR | TraitFlags::COMPARER,
            Self::Timestamp(_) => TraitFlags::SUBTRACTOR | TraitFlags::COMPARER,
            Self::Bool(_) | Self::Null | Self::TypeValue(_) | Self::Unknown(_) | Self::Error(_) => TraitFlags::empty(),
        }
    }

    #[must_use]
    pub fn is_truthy(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

fn map_key_type(k: &MapKey) -> Type {
    match k {
        MapKey::Bool(_) => Type::Bool,
        MapKey::Int(_) => Type::Int,
        MapKey::Uint(_) => Type::Uint,
        MapKey::String(_) => Type::String,
    }
}

/// Converts a `Value` used as a map key into a [`MapKey`], failing with an
/// `Access`-kind error for non-hashable/non-primitive keys.
pub fn value_to_map_key(v: &Value) -> Result<MapKey, CelError> {
    match v {
        Value::Bool(b) => Ok(MapKey::Bool(*b)),
        Value::Int(i) => Ok(MapKey::Int(*i)),
        Value::Uint(u) => Ok(MapKey::Uint(*u)),
        Value::String(s) => Ok(MapKey::String(s.clone())),
        other => Err(CelError::type_error(format!("unsupported map key type: {}", other.type_of()))),
    }
}

/// Whether `v` equals its type's zero/default value — used by `has()` on
/// object fields, since [`ObjectValue`] carries no separate presence bitmap
/// (spec §8 conformance scenario: `has(msg.f)` is `false` for a present but
/// default-valued field).
#[must_use]
pub fn is_zero_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Int(i) => *i == 0,
        Value::Uint(u) => *u == 0,
        Value::Double(d) => *d == 0.0,
        Value::String(s) => s.is_empty(),
        Value::Bytes(b) => b.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(m) => m.is_empty(),
        Value::Timestamp(_) | Value::Duration(_) | Value::TypeValue(_) | Value::Object(_) | Value::Unknown(_) | Value::Error(_) => false,
    }
}

// ---- numeric operators -----------------------------------------------------

macro_rules! checked_numeric_op {
    ($name:ident, $int_op:ident, $uint_op:ident, $float_op:tt, $label:literal) => {
        pub fn $name(a: &Value, b: &Value) -> Result<Value, CelError> {
            match (a, b) {
                (Value::Int(x), Value::Int(y)) => x
                    .$int_op(*y)
                    .map(Value::Int)
                    .ok_or_else(|| CelError::arithmetic(concat!($label, ": int overflow"))),
                (Value::Uint(x), Value::Uint(y)) => x
                    .$uint_op(*y)
                    .map(Value::Uint)
                    .ok_or_else(|| CelError::arithmetic(concat!($label, ": uint overflow"))),
                (Value::Double(x), Value::Double(y)) => Ok(Value::Double(x $float_op y)),
                _ => Err(CelError::no_such_overload($label, &[a.type_of().to_string(), b.type_of().to_string()])),
            }
        }
    };
}

checked_numeric_op!(checked_sub, checked_sub, checked_sub, -, "_-_");
checked_numeric_op!(checked_mul, checked_mul, checked_mul, *, "_*_");

/// `+` over numerics, strings, bytes, and lists (spec §4.3 "Adder").
pub fn checked_add(a: &Value, b: &Value) -> Result<Value, CelError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.checked_add(*y).map(Value::Int).ok_or_else(|| CelError::arithmetic("_+_: int overflow")),
        (Value::Uint(x), Value::Uint(y)) => x.checked_add(*y).map(Value::Uint).ok_or_else(|| CelError::arithmetic("_+_: uint overflow")),
        (Value::Double(x), Value::Double(y)) => Ok(Value::Double(x + y)),
        (Value::String(x), Value::String(y)) => Ok(Value::string(format!("{x}{y}"))),
        (Value::Bytes(x), Value::Bytes(y)) => {
            let mut out = Vec::with_capacity(x.len() + y.len());
            out.extend_from_slice(x);
            out.extend_from_slice(y);
            Ok(Value::bytes(out))
        }
        (Value::List(x), Value::List(y)) => {
            let mut out = Vec::with_capacity(x.len() + y.len());
            out.extend(x.iter().cloned());
            out.extend(y.iter().cloned());
            Ok(Value::list(out))
        }
        (Value::Timestamp(t), Value::Duration(d)) => t.add_duration(*d).map(Value::Timestamp),
        (Value::Duration(d), Value::Timestamp(t)) => t.add_duration(*d).map(Value::Timestamp),
        (Value::Duration(x), Value::Duration(y)) => x
            .checked_add(y)
            .map(Value::Duration)
            .ok_or_else(|| CelError::arithmetic("_+_: duration overflow")),
        _ => Err(CelError::no_such_overload("_+_", &[a.type_of().to_string(), b.type_of().to_string()])),
    }
}

/// `-` also covers `timestamp - duration` and `timestamp - timestamp`.
pub fn checked_sub_dispatch(a: &Value, b: &Value) -> Result<Value, CelError> {
    match (a, b) {
        (Value::Timestamp(t), Value::Duration(d)) => t.sub_duration(*d).map(Value::Timestamp),
        (Value::Timestamp(t1), Value::Timestamp(t2)) => t1.diff(t2).map(Value::Duration),
        (Value::Duration(x), Value::Duration(y)) => x
            .checked_add(&y.checked_neg().ok_or_else(|| CelError::arithmetic("_-_: duration overflow"))?)
            .map(Value::Duration)
            .ok_or_else(|| CelError::arithmetic("_-_: duration overflow")),
        _ => checked_sub(a, b),
    }
}

pub fn checked_div(a: &Value, b: &Value) -> Result<Value, CelError> {
    match (a, b) {
        (Value::Int(_), Value::Int(0)) | (Value::Uint(_), Value::Uint(0)) => {
            Err(CelError::arithmetic("division by zero"))
        }
        (Value::Int(x), Value::Int(y)) => {
            if *x == i64::MIN && *y == -1 {
                return Err(CelError::arithmetic("_/_: int overflow"));
            }
            Ok(Value::Int(x / y))
        }
        (Value::Uint(x), Value::Uint(y)) => Ok(Value::Uint(x / y)),
        (Value::Double(x), Value::Double(y)) => {
            if *y == 0.0 {
                return Err(CelError::arithmetic("division by zero"));
            }
            Ok(Value::Double(x / y))
        }
        _ => Err(CelError::no_such_overload("_/_", &[a.type_of().to_string(), b.type_of().to_string()])),
    }
}

pub fn checked_rem(a: &Value, b: &Value) -> Result<Value, CelError> {
    match (a, b) {
        (Value::Int(_), Value::Int(0)) | (Value::Uint(_), Value::Uint(0)) => {
            Err(CelError::arithmetic("modulo by zero"))
        }
        (Value::Int(x), Value::Int(y)) => {
            if *x == i64::MIN && *y == -1 {
                return Err(CelError::arithmetic("_%_: int overflow"));
            }
            Ok(Value::Int(x % y))
        }
        (Value::Uint(x), Value::Uint(y)) => Ok(Value::Uint(x % y)),
        _ => Err(CelError::no_such_overload("_%_", &[a.type_of().to_string(), b.type_of().to_string()])),
    }
}

pub fn checked_neg(a: &Value) -> Result<Value, CelError> {
    match a {
        Value::Int(x) => x.checked_neg().map(Value::Int).ok_or_else(|| CelError::arithmetic("-_: int overflow")),
        Value::Double(x) => Ok(Value::Double(-x)),
        _ => Err(CelError::no_such_overload("-_", &[a.type_of().to_string()])),
    }
}

// ---- comparisons ------------------------------------------------------------

/// Exact equality: byte-for-byte/case-sensitive for strings and bytes, IEEE
/// 754 for doubles (`NaN != NaN`, `-0.0 == 0.0`), and deep structural
/// equality for lists/maps/objects.
#[must_use]
pub fn values_equal(a: &Value, b: &Value, cross_type_numeric: bool) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Uint(x), Value::Uint(y)) => x == y,
        (Value::Double(x), Value::Double(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::Timestamp(x), Value::Timestamp(y)) => x == y,
        (Value::Duration(x), Value::Duration(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| values_equal(a, b, cross_type_numeric))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|v2| values_equal(v, v2, cross_type_numeric)))
        }
        (Value::Object(x), Value::Object(y)) => x == y,
        (Value::TypeValue(x), Value::TypeValue(y)) => x == y,
        _ if cross_type_numeric => numeric_cross_compare(a, b).is_some_and(|o| o == Ordering::Equal),
        _ => false,
    }
}

/// Cross-type numeric ordering for int/uint/double, honored only when
/// `cross_type_numeric_comparisons` is enabled (spec §6). `NaN` never
/// compares equal or ordered to anything, matching IEEE 754.
#[must_use]
pub fn numeric_cross_compare(a: &Value, b: &Value) -> Option<Ordering> {
    let to_f64 = |v: &Value| -> Option<f64> {
        match v {
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    };
    let (x, y) = (to_f64(a)?, to_f64(b)?);
    if x.is_nan() || y.is_nan() {
        return None;
    }
    x.partial_cmp(&y)
}

/// Ordered comparison (`<`, `<=`, `>`, `>=`). Returns `None` when the pair has
/// no defined order (e.g. `NaN`, or mismatched non-numeric types), which
/// callers surface as a `Type` error.
#[must_use]
pub fn values_compare(a: &Value, b: &Value, cross_type_numeric: bool) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Uint(x), Value::Uint(y)) => Some(x.cmp(y)),
        (Value::Double(x), Value::Double(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        (Value::Bytes(x), Value::Bytes(y)) => Some(x.cmp(y)),
        (Value::Duration(x), Value::Duration(y)) => Some(x.cmp(y)),
        (Value::Timestamp(x), Value::Timestamp(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ if cross_type_numeric => numeric_cross_compare(a, b),
        _ => None,
    }
}

/// `string(bytes)`/`bytes(string)` and friends (spec §4.4 "String and bytes").
pub fn bytes_to_string(b: &[u8]) -> Result<Value, CelError> {
    std::str::from_utf8(b)
        .map(|s| Value::string(s.to_string()))
        .map_err(|_| CelError::conversion("invalid UTF-8"))
}

pub fn double_to_int(d: f64) -> Result<i64, CelError> {
    if d.is_nan() || d < i64::MIN as f64 || d > i64::MAX as f64 {
        return Err(CelError::conversion("double to int: out of range or NaN"));
    }
    d.to_i64().ok_or_else(|| CelError::conversion("double to int: out of range"))
}

pub fn int_to_uint(i: i64) -> Result<u64, CelError> {
    u64::try_from(i).map_err(|_| CelError::conversion("int to uint: negative value"))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Uint(u) => write!(f, "{u}u"),
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "b{b:?}"),
            Self::Timestamp(t) => write!(f, "{t}"),
            Self::Duration(d) => write!(f, "{d}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::TypeValue(t) => write!(f, "type({t})"),
            Self::Object(obj) => write!(f, "{}{{...}}", obj.type_name),
            Self::Unknown(ids) => write!(f, "unknown{:?}", ids.0),
            Self::Error(e) => write!(f, "error({e})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_add_overflow_boundaries() {
        assert!(checked_add(&Value::Int(i64::MAX), &Value::Int(1)).is_err());
        assert!(checked_add(&Value::Int(i64::MIN), &Value::Int(-1)).is_err());
        assert!(checked_sub(&Value::Int(i64::MIN), &Value::Int(1)).is_err());
        assert!(checked_mul(&Value::Int(i64::MIN), &Value::Int(-1)).is_err());
        assert!(checked_div(&Value::Int(i64::MIN), &Value::Int(-1)).is_err());
    }

    #[test]
    fn uint_boundaries() {
        assert!(checked_add(&Value::Uint(u64::MAX), &Value::Uint(1)).is_err());
        assert!(checked_sub(&Value::Uint(0), &Value::Uint(1)).is_err());
    }

    #[test]
    fn division_and_modulo_by_zero_are_errors() {
        assert!(checked_div(&Value::Int(1), &Value::Int(0)).is_err());
        assert!(checked_rem(&Value::Int(1), &Value::Int(0)).is_err());
        assert!(checked_div(&Value::Uint(1), &Value::Uint(0)).is_err());
    }

    #[test]
    fn nan_never_compares_equal_or_ordered() {
        let nan = Value::Double(f64::NAN);
        assert!(!values_equal(&nan, &nan, true));
        assert_eq!(values_compare(&nan, &Value::Double(1.0), true), None);
    }

    #[test]
    fn negative_zero_equals_zero() {
        assert!(values_equal(&Value::Double(-0.0), &Value::Double(0.0), false));
    }

    #[test]
    fn string_equality_is_case_sensitive_and_exact() {
        assert!(!values_equal(&Value::string("Hello"), &Value::string("hello"), false));
    }
}

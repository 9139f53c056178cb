//! The tree-walking evaluator (spec §4.4 "Interpretation"). Generic over a
//! [`CostTracker`] and an [`EvalTracer`] the same way the teacher's VM is
//! generic over its resource tracker and `VmTracer` — the no-op
//! instantiations (`NoLimitTracker`, `NoopTracer`) cost nothing at the call
//! site.
//!
//! Most operators dispatch uniformly through [`Registry`] overload matching
//! (spec §4.2/§4.4: checking and evaluation share one resolution path).
//! `&&`, `||`, and `?:` are special-cased for short-circuit/lazy evaluation,
//! and the comparison family is special-cased so
//! [`Config::cross_type_numeric_comparisons`] — a per-evaluation flag a
//! registry closure built once can't see — is honored.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::activation::Activation;
use crate::ast::{Comprehension, Expr, ExprNode, Literal, MapEntry, ObjectField};
use crate::attribute::{self, Attribute, Qualifier};
use crate::checker::{CheckResult, Reference};
use crate::config::Config;
use crate::container::Container;
use crate::error::{CelError, CelResult};
use crate::registry::Registry;
use crate::resource::{CancellationToken, CostTracker};
use crate::tracer::EvalTracer;
use crate::types::{assignable, Substitution, Type};
use crate::value::{self, MapKey, UnknownSet, Value, ValueMap};

/// Evaluates one parsed (and optionally checked) expression against an
/// [`Activation`], honoring the shared [`Registry`]/[`Container`]/[`Config`]
/// a [`crate::program::Program`] binds it to.
pub struct Interpreter<'a, C: CostTracker, T: EvalTracer> {
    registry: &'a Registry,
    container: &'a Container,
    config: &'a Config,
    checked: Option<&'a CheckResult>,
    activation: &'a mut Activation,
    cost: C,
    tracer: T,
    cancellation: Option<CancellationToken>,
    operations: u32,
}

impl<'a, C: CostTracker, T: EvalTracer> Interpreter<'a, C, T> {
    pub fn new(
        registry: &'a Registry,
        container: &'a Container,
        config: &'a Config,
        checked: Option<&'a CheckResult>,
        activation: &'a mut Activation,
        cost: C,
        tracer: T,
    ) -> Self {
        Self {
            registry,
            container,
            config,
            checked,
            activation,
            cost,
            tracer,
            cancellation: None,
            operations: 0,
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn eval(&mut self, node: &ExprNode) -> CelResult<Value> {
        self.eval_node(node)
    }

    /// Counts one basic operation against the cost tracker and, every
    /// `interrupt_check_frequency` operations, polls the cancellation token
    /// (spec §4.4 "State tracking", §5 "Cancellation / timeouts"). A tripped
    /// budget or token aborts the whole evaluation — this is the one place
    /// `Result::Err` leaves the interpreter, rather than an in-band
    /// `Value::Error` (spec §7).
    fn poll(&mut self, node: &ExprNode) -> CelResult<()> {
        self.cost.on_operation()?;
        self.operations = self.operations.wrapping_add(1);
        if self.operations % self.config.interrupt_check_frequency.get() == 0
            && self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
        {
            self.tracer.on_interrupt(node.id);
            return Err(CelError::interrupted());
        }
        Ok(())
    }

    fn resolve_variable_name(&self, node: &ExprNode, name: &str) -> String {
        if let Some(Reference::Variable(resolved)) = self.checked.and_then(|c| c.references.get(&node.id)) {
            return resolved.clone();
        }
        name.to_string()
    }

    /// Pure syntactic walk recognizing the attribute-chain shapes spec §4.4
    /// describes: a bare variable, a field select, or an index call
    /// (`_[_]` is parsed as a free call, not a receiver call — spec §4.1).
    /// Index qualifiers are only attached when the index sub-expression is
    /// itself a literal, since building one would otherwise require
    /// evaluating it.
    fn try_build_attribute(&self, node: &ExprNode) -> Option<Attribute> {
        match &node.expr {
            Expr::Ident(name) => Some(Attribute::root(node.id, self.resolve_variable_name(node, name))),
            Expr::Select { target, field, test_only: false } => {
                let base = self.try_build_attribute(target)?;
                Some(base.with_qualifier(node.id, Qualifier::Field(field.clone())))
            }
            Expr::Call { target: None, function, args } if function == "_[_]" && args.len() == 2 => {
                let base = self.try_build_attribute(&args[0])?;
                let key = match &args[1].expr {
                    Expr::Literal(Literal::Int(i)) => crate::attribute::QualifierKey::Int(*i),
                    Expr::Literal(Literal::Uint(u)) => crate::attribute::QualifierKey::Uint(*u),
                    Expr::Literal(Literal::Bool(b)) => crate::attribute::QualifierKey::Bool(*b),
                    Expr::Literal(Literal::String(s)) => crate::attribute::QualifierKey::String(s.clone()),
                    _ => return None,
                };
                Some(base.with_qualifier(node.id, Qualifier::Index(key)))
            }
            _ => None,
        }
    }

    fn eval_node(&mut self, node: &ExprNode) -> CelResult<Value> {
        self.poll(node)?;
        let value = match &node.expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),
            Expr::Ident(name) => self.eval_ident(node, name),
            Expr::Select { target, field, test_only } => self.eval_select(node, target, field, *test_only),
            Expr::Call { target, function, args } => self.eval_call(node, target.as_deref(), function, args),
            Expr::CreateList(elements) => self.eval_create_list(elements),
            Expr::CreateMap(entries) => self.eval_create_map(entries),
            Expr::CreateObject { type_name, fields } => self.eval_create_object(node, type_name, fields),
            Expr::Comprehension(c) => self.eval_comprehension(node, c),
        }?;
        self.tracer.on_node(node.id, &value);
        Ok(value)
    }

    fn eval_ident(&mut self, node: &ExprNode, name: &str) -> CelResult<Value> {
        if self.activation.is_frame_local(name) {
            return Ok(self.activation.lookup(name).cloned().unwrap_or(Value::Null));
        }

        let resolved = self.resolve_variable_name(node, name);

        if self.config.partial_eval {
            let attr = Attribute::root(node.id, resolved.clone());
            if let Some(unknown_id) = attribute::first_match(&attr, self.activation.patterns()) {
                return Ok(Value::Unknown(UnknownSet::single(unknown_id)));
            }
        }

        if let Some(v) = self.activation.lookup(&resolved) {
            return Ok(v.clone());
        }
        if self.registry.lookup_object_type(&resolved) {
            return Ok(Value::TypeValue(Type::Object(resolved)));
        }
        for candidate in self.container.candidates(name) {
            if let Some(v) = self.activation.lookup(&candidate) {
                return Ok(v.clone());
            }
            if self.registry.lookup_object_type(&candidate) {
                return Ok(Value::TypeValue(Type::Object(candidate)));
            }
        }
        Ok(Value::error(CelError::name(format!("undeclared reference to '{name}'"))))
    }

    fn eval_select(&mut self, node: &ExprNode, target: &ExprNode, field: &str, test_only: bool) -> CelResult<Value> {
        if self.config.partial_eval {
            if let Some(base) = self.try_build_attribute(target) {
                let attr = base.with_qualifier(node.id, Qualifier::Field(field.to_string()));
                if let Some(unknown_id) = attribute::first_match(&attr, self.activation.patterns()) {
                    return Ok(Value::Unknown(UnknownSet::single(unknown_id)));
                }
            }
        }

        let target_val = self.eval_node(target)?;
        if target_val.is_exceptional() {
            return Ok(target_val);
        }

        match &target_val {
            Value::Map(m) => {
                let key = MapKey::String(field.into());
                if test_only {
                    Ok(Value::Bool(m.contains_key(&key)))
                } else {
                    match m.get(&key) {
                        Some(v) => Ok(v.clone()),
                        None => Ok(Value::error(CelError::access(format!("no such key: {field}")))),
                    }
                }
            }
            Value::Object(obj) => match obj.fields.get(field) {
                Some(v) if test_only => Ok(Value::Bool(!value::is_zero_value(v))),
                Some(v) => Ok(v.clone()),
                None if test_only => Ok(Value::Bool(false)),
                None => Ok(Value::error(CelError::access(format!("no such field: {field}")))),
            },
            Value::Null if test_only => Ok(Value::Bool(false)),
            Value::Null => Ok(Value::error(CelError::access(format!("cannot select field '{field}' on null")))),
            other => Ok(Value::error(CelError::type_error(format!(
                "cannot select field '{field}' on {}",
                other.type_of()
            )))),
        }
    }

    fn eval_call(&mut self, node: &ExprNode, target: Option<&ExprNode>, function: &str, args: &[ExprNode]) -> CelResult<Value> {
        match function {
            "_&&_" => return self.eval_and(node, &args[0], &args[1]),
            "_||_" => return self.eval_or(node, &args[0], &args[1]),
            "_?_:_" => return self.eval_conditional(&args[0], &args[1], &args[2]),
            _ => {}
        }

        // Most calls are unary/binary operators; inline storage avoids a heap
        // allocation per dispatch on that hot path.
        let mut values: SmallVec<[Value; 4]> = SmallVec::with_capacity(args.len() + usize::from(target.is_some()));
        if let Some(t) = target {
            values.push(self.eval_node(t)?);
        }
        for a in args {
            values.push(self.eval_node(a)?);
        }

        self.dispatch(node, target.is_some(), function, values)
    }

    fn eval_and(&mut self, node: &ExprNode, lhs: &ExprNode, rhs: &ExprNode) -> CelResult<Value> {
        let left = self.eval_node(lhs)?;
        if matches!(left, Value::Bool(false)) {
            if self.config.exhaustive_eval {
                let _ = self.eval_node(rhs)?;
            }
            self.tracer.on_absorb(node.id, "rhs");
            return Ok(Value::Bool(false));
        }
        let right = self.eval_node(rhs)?;
        if matches!(right, Value::Bool(false)) {
            self.tracer.on_absorb(node.id, "lhs");
            return Ok(Value::Bool(false));
        }
        if let (Value::Bool(l), Value::Bool(r)) = (&left, &right) {
            return Ok(Value::Bool(*l && *r));
        }
        if left.is_error() {
            return Ok(left);
        }
        if right.is_error() {
            return Ok(right);
        }
        if left.is_unknown() || right.is_unknown() {
            return Ok(union2(&left, &right));
        }
        Ok(Value::error(CelError::type_error("_&&_ operands must be bool")))
    }

    fn eval_or(&mut self, node: &ExprNode, lhs: &ExprNode, rhs: &ExprNode) -> CelResult<Value> {
        let left = self.eval_node(lhs)?;
        if matches!(left, Value::Bool(true)) {
            if self.config.exhaustive_eval {
                let _ = self.eval_node(rhs)?;
            }
            self.tracer.on_absorb(node.id, "rhs");
            return Ok(Value::Bool(true));
        }
        let right = self.eval_node(rhs)?;
        if matches!(right, Value::Bool(true)) {
            self.tracer.on_absorb(node.id, "lhs");
            return Ok(Value::Bool(true));
        }
        if let (Value::Bool(l), Value::Bool(r)) = (&left, &right) {
            return Ok(Value::Bool(*l || *r));
        }
        if left.is_error() {
            return Ok(left);
        }
        if right.is_error() {
            return Ok(right);
        }
        if left.is_unknown() || right.is_unknown() {
            return Ok(union2(&left, &right));
        }
        Ok(Value::error(CelError::type_error("_||_ operands must be bool")))
    }

    fn eval_conditional(&mut self, cond: &ExprNode, then_branch: &ExprNode, else_branch: &ExprNode) -> CelResult<Value> {
        let c = self.eval_node(cond)?;
        match c {
            Value::Bool(true) => {
                if self.config.exhaustive_eval {
                    let _ = self.eval_node(else_branch)?;
                }
                self.eval_node(then_branch)
            }
            Value::Bool(false) => {
                if self.config.exhaustive_eval {
                    let _ = self.eval_node(then_branch)?;
                }
                self.eval_node(else_branch)
            }
            other if other.is_exceptional() => Ok(other),
            other => Ok(Value::error(CelError::type_error(format!(
                "ternary condition must be bool, got {}",
                other.type_of()
            )))),
        }
    }

    /// Dispatches every ordinary (non-short-circuit) call through the
    /// registry's overload set (spec §4.4 "Dispatch"): errors propagate,
    /// unknowns union, and the first overload whose runtime argument types
    /// are assignable wins — narrowed to the checker's recorded candidate
    /// ids when a [`CheckResult`] is available.
    fn dispatch(&mut self, node: &ExprNode, has_target: bool, function: &str, values: SmallVec<[Value; 4]>) -> CelResult<Value> {
        let Some(decl) = self.registry.lookup_function(function) else {
            return Ok(Value::error(CelError::name(format!("undeclared function: {function}"))));
        };

        if let Some(err) = values.iter().find(|v| v.is_error()) {
            return Ok(err.clone());
        }
        if values.iter().any(Value::is_unknown) {
            return Ok(Value::Unknown(union_all(&values)));
        }

        let candidate_ids = self.checked.and_then(|c| match c.references.get(&node.id) {
            Some(Reference::Function(ids)) => Some(ids.clone()),
            _ => None,
        });
        let runtime_types: Vec<Type> = values.iter().map(Value::type_of).collect();

        for overload in &decl.overloads {
            if overload.is_member != has_target || overload.arg_types.len() != values.len() {
                continue;
            }
            if let Some(ids) = &candidate_ids {
                if !ids.contains(&overload.id) {
                    continue;
                }
            }
            if let Some(req) = overload.required_trait {
                if !values.first().is_some_and(|v| v.traits().contains(req)) {
                    continue;
                }
            }
            let mut subst = Substitution::new();
            if overload.arg_types.iter().zip(&runtime_types).all(|(param, arg)| assignable(param, arg, &mut subst)) {
                self.tracer.on_call(node.id, function, &overload.id);
                return overload.implementation.call(&values);
            }
        }
        Ok(Value::error(CelError::no_such_overload(
            function,
            &runtime_types.iter().map(ToString::to_string).collect::<Vec<_>>(),
        )))
    }

    fn eval_create_list(&mut self, elements: &[ExprNode]) -> CelResult<Value> {
        let mut values = Vec::with_capacity(elements.len());
        for e in elements {
            values.push(self.eval_node(e)?);
        }
        if let Some(err) = values.iter().find(|v| v.is_error()) {
            return Ok(err.clone());
        }
        if values.iter().any(Value::is_unknown) {
            return Ok(Value::Unknown(union_all(&values)));
        }
        Ok(Value::list(values))
    }

    fn eval_create_map(&mut self, entries: &[MapEntry]) -> CelResult<Value> {
        let mut pairs = Vec::with_capacity(entries.len());
        for e in entries {
            let k = self.eval_node(&e.key)?;
            let v = self.eval_node(&e.value)?;
            pairs.push((k, v));
        }
        if let Some((k, v)) = pairs.iter().find(|(k, v)| k.is_error() || v.is_error()) {
            return Ok(if k.is_error() { k.clone() } else { v.clone() });
        }
        let flat: Vec<Value> = pairs.iter().flat_map(|(k, v)| [k.clone(), v.clone()]).collect();
        if flat.iter().any(Value::is_unknown) {
            return Ok(Value::Unknown(union_all(&flat)));
        }
        let mut map = ValueMap::with_hasher(ahash::RandomState::new());
        for (k, v) in pairs {
            let key = match value::value_to_map_key(&k) {
                Ok(key) => key,
                Err(e) => return Ok(Value::error(e)),
            };
            map.insert(key, v);
        }
        Ok(Value::map(map))
    }

    fn eval_create_object(&mut self, node: &ExprNode, type_name: &str, fields: &[ObjectField]) -> CelResult<Value> {
        let resolved = match self.checked.and_then(|c| c.references.get(&node.id)) {
            Some(Reference::ObjectType(name)) => name.clone(),
            _ => self
                .container
                .candidates(type_name)
                .into_iter()
                .find(|c| self.registry.lookup_object_type(c))
                .unwrap_or_else(|| type_name.to_string()),
        };

        let mut computed = Vec::with_capacity(fields.len());
        for field in fields {
            computed.push((field.name.clone(), self.eval_node(&field.value)?));
        }
        if let Some((_, err)) = computed.iter().find(|(_, v)| v.is_error()) {
            return Ok(err.clone());
        }
        if computed.iter().any(|(_, v)| v.is_unknown()) {
            let values: Vec<Value> = computed.iter().map(|(_, v)| v.clone()).collect();
            return Ok(Value::Unknown(union_all(&values)));
        }

        let mut values = IndexMap::with_hasher(ahash::RandomState::new());
        for (name, v) in computed {
            values.insert(name, v);
        }
        match self.registry.construct_object(&resolved, values) {
            Ok(v) => Ok(v),
            Err(e) => Ok(Value::error(e)),
        }
    }

    /// Runs the generic loop every macro desugars to (spec §3, §4.1): `init`
    /// is evaluated outside the loop's own frame, then each iteration binds
    /// `iter_var`, checks `loop_condition`, and — unless it's `false` —
    /// rebinds `accu_var` to `loop_step`'s result. An exceptional condition
    /// or step value short-circuits the whole comprehension to that value,
    /// matching how every other strict position propagates (spec §7).
    fn eval_comprehension(&mut self, node: &ExprNode, c: &Comprehension) -> CelResult<Value> {
        let range = self.eval_node(&c.iter_range)?;
        if range.is_exceptional() {
            return Ok(range);
        }
        let iter_values: Vec<Value> = match &range {
            Value::List(items) => items.as_ref().clone(),
            Value::Map(entries) => entries.keys().map(map_key_to_value).collect(),
            other => return Ok(Value::error(CelError::type_error(format!("cannot iterate over {}", other.type_of())))),
        };

        let init = self.eval_node(&c.init)?;
        if init.is_exceptional() {
            return Ok(init);
        }

        self.activation.push_frame();
        self.activation.bind_local(c.accu_var.clone(), init);

        let mut early_exit: Option<CelResult<Value>> = None;
        for (idx, item) in iter_values.into_iter().enumerate() {
            self.activation.bind_local(c.iter_var.clone(), item);
            let cond = match self.eval_node(&c.loop_condition) {
                Ok(v) => v,
                Err(e) => {
                    early_exit = Some(Err(e));
                    break;
                }
            };
            if matches!(cond, Value::Bool(false)) {
                break;
            }
            if cond.is_exceptional() {
                early_exit = Some(Ok(cond));
                break;
            }
            self.tracer.on_loop_step(node.id, idx as u64);
            match self.eval_node(&c.loop_step) {
                Err(e) => {
                    early_exit = Some(Err(e));
                    break;
                }
                Ok(step) if step.is_exceptional() => {
                    early_exit = Some(Ok(step));
                    break;
                }
                Ok(step) => self.activation.bind_local(c.accu_var.clone(), step),
            }
        }

        let result = match early_exit {
            Some(outcome) => outcome,
            None => self.eval_node(&c.result),
        };
        self.activation.pop_frame();
        result
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Int(i) => Value::Int(*i),
        Literal::Uint(u) => Value::Uint(*u),
        Literal::Double(d) => Value::Double(*d),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::String(s) => Value::string(s.clone()),
        Literal::Bytes(b) => Value::bytes(b.clone()),
        Literal::Null => Value::Null,
    }
}

fn map_key_to_value(k: &MapKey) -> Value {
    match k {
        MapKey::Bool(b) => Value::Bool(*b),
        MapKey::Int(i) => Value::Int(*i),
        MapKey::Uint(u) => Value::Uint(*u),
        MapKey::String(s) => Value::string(s.clone()),
    }
}

fn union2(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Unknown(x), Value::Unknown(y)) => Value::Unknown(x.union(y)),
        (Value::Unknown(x), _) => Value::Unknown(x.clone()),
        (_, Value::Unknown(y)) => Value::Unknown(y.clone()),
        _ => a.clone(),
    }
}

fn union_all(values: &[Value]) -> UnknownSet {
    values
        .iter()
        .filter_map(|v| match v {
            Value::Unknown(u) => Some(u.clone()),
            _ => None,
        })
        .fold(UnknownSet::default(), |acc, u| acc.union(&u))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributePattern, QualifierPattern};
    use crate::checker::check;
    use crate::parser::parse;
    use crate::resource::{BudgetedTracker, NoLimitTracker};
    use crate::tracer::NoopTracer;

    fn eval_str(src: &str, registry: &Registry, activation: &mut Activation) -> Value {
        let parsed = parse(src, false).unwrap();
        let container = Container::root();
        let config = Config::default();
        let checked = check(&parsed.root, registry, &container, &config);
        let mut interp = Interpreter::new(registry, &container, &config, Some(&checked), activation, NoLimitTracker, NoopTracer);
        interp.eval(&parsed.root).unwrap()
    }

    fn stdlib_registry() -> Registry {
        let mut registry = Registry::new();
        crate::stdlib::install(&mut registry);
        registry
    }

    #[test]
    fn arithmetic_dispatches_through_registry() {
        let registry = stdlib_registry();
        let mut activation = Activation::new();
        let result = eval_str("1 + 2 * 3", &registry, &mut activation);
        assert!(matches!(result, Value::Int(7)));
    }

    #[test]
    fn overflow_is_an_in_band_error_value() {
        let registry = stdlib_registry();
        let mut activation = Activation::new();
        let result = eval_str(&format!("{} + 1", i64::MAX), &registry, &mut activation);
        assert!(result.is_error());
    }

    #[test]
    fn and_short_circuits_without_evaluating_rhs() {
        let registry = stdlib_registry();
        let mut activation = Activation::new();
        // undefined / 0 would error if evaluated; false && ... must absorb it.
        let result = eval_str("false && (1 / 0 == 1)", &registry, &mut activation);
        assert!(matches!(result, Value::Bool(false)));
    }

    #[test]
    fn or_absorbs_error_on_true_left_side() {
        let registry = stdlib_registry();
        let mut activation = Activation::new();
        let result = eval_str("true || (1 / 0 == 1)", &registry, &mut activation);
        assert!(matches!(result, Value::Bool(true)));
    }

    #[test]
    fn ternary_only_evaluates_taken_branch() {
        let registry = stdlib_registry();
        let mut activation = Activation::new();
        let result = eval_str("true ? 1 : (1 / 0)", &registry, &mut activation);
        assert!(matches!(result, Value::Int(1)));
    }

    #[test]
    fn all_macro_evaluates_to_true_for_all_positive() {
        let registry = stdlib_registry();
        let mut activation = Activation::new();
        let result = eval_str("[1, 2, 3].all(x, x > 0)", &registry, &mut activation);
        assert!(matches!(result, Value::Bool(true)));
    }

    #[test]
    fn exists_macro_short_circuits_on_first_match() {
        let registry = stdlib_registry();
        let mut activation = Activation::new();
        let result = eval_str("[1, 2, 3].exists(x, x == 2)", &registry, &mut activation);
        assert!(matches!(result, Value::Bool(true)));
    }

    #[test]
    fn map_macro_transforms_each_element() {
        let registry = stdlib_registry();
        let mut activation = Activation::new();
        let result = eval_str("[1, 2, 3].map(x, x * 2)", &registry, &mut activation);
        match result {
            Value::List(items) => assert_eq!(items.as_ref(), &[Value::Int(2), Value::Int(4), Value::Int(6)]),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn filter_macro_keeps_matching_elements() {
        let registry = stdlib_registry();
        let mut activation = Activation::new();
        let result = eval_str("[1, 2, 3, 4].filter(x, x % 2 == 0)", &registry, &mut activation);
        match result {
            Value::List(items) => assert_eq!(items.as_ref(), &[Value::Int(2), Value::Int(4)]),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn has_macro_is_false_for_default_valued_field() {
        use crate::provider::SimpleTypeProvider;
        use std::rc::Rc;

        let mut registry = stdlib_registry();
        let mut provider = SimpleTypeProvider::new();
        provider.register("pkg.Msg", vec![("f".to_string(), Type::String)]);
        registry.set_type_provider(Rc::new(provider));
        registry.add_variable("msg", Type::Object("pkg.Msg".to_string()));

        let mut activation = Activation::new();
        let obj = registry.construct_object("pkg.Msg", IndexMap::with_hasher(ahash::RandomState::new())).unwrap();
        activation.bind("msg", obj);

        let result = eval_str("has(msg.f)", &registry, &mut activation);
        assert!(matches!(result, Value::Bool(false)));
    }

    #[test]
    fn has_macro_on_map_is_plain_key_presence() {
        let registry = stdlib_registry();
        let mut activation = Activation::new();
        let mut map = ValueMap::with_hasher(ahash::RandomState::new());
        map.insert(MapKey::String("f".into()), Value::Int(0));
        activation.bind("m", Value::map(map));
        let result = eval_str("has(m.f)", &registry, &mut activation);
        assert!(matches!(result, Value::Bool(true)));
    }

    #[test]
    fn unresolved_attribute_pattern_yields_unknown() {
        let registry = stdlib_registry();
        let container = Container::root();
        let config = Config::default().with_partial_eval(true);
        let mut activation = Activation::with_patterns(vec![AttributePattern::new("x", vec![QualifierPattern::Wildcard])]);
        activation.bind("x", Value::map({
            let mut m = ValueMap::with_hasher(ahash::RandomState::new());
            m.insert(MapKey::String("f".into()), Value::Int(1));
            m
        }));
        let parsed = parse("x.f", false).unwrap();
        let checked = check(&parsed.root, &registry, &container, &config);
        let mut interp = Interpreter::new(&registry, &container, &config, Some(&checked), &mut activation, NoLimitTracker, NoopTracer);
        let result = interp.eval(&parsed.root).unwrap();
        assert!(result.is_unknown());
    }

    #[test]
    fn exceeding_cost_budget_aborts_with_interrupted_error() {
        let registry = stdlib_registry();
        let container = Container::root();
        let config = Config::default();
        let mut activation = Activation::new();
        let parsed = parse("[1, 2, 3, 4, 5].all(x, x > 0)", false).unwrap();
        let checked = check(&parsed.root, &registry, &container, &config);
        let mut interp = Interpreter::new(&registry, &container, &config, Some(&checked), &mut activation, BudgetedTracker::new(1), NoopTracer);
        let err = interp.eval(&parsed.root).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Interrupted);
    }

    #[test]
    fn container_resolution_finds_declared_parent_identifier() {
        let mut registry = Registry::new();
        registry.add_variable("p.a", Type::Int);
        let container = Container::new("p.q.r");
        let config = Config::default();
        let mut activation = Activation::new();
        activation.bind("p.a", Value::Int(42));
        let parsed = parse("a", false).unwrap();
        let checked = check(&parsed.root, &registry, &container, &config);
        let mut interp = Interpreter::new(&registry, &container, &config, Some(&checked), &mut activation, NoLimitTracker, NoopTracer);
        assert!(matches!(interp.eval(&parsed.root).unwrap(), Value::Int(42)));
    }
}

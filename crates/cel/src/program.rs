//! The public compile-then-evaluate surface (spec §5 "Public API"):
//! [`Program::compile`] runs parse → declare → check once, and the
//! resulting [`Program`] can be evaluated repeatedly against different
//! [`Activation`]s without re-parsing or re-checking.

use std::cell::RefCell;
use std::rc::Rc;

use crate::activation::Activation;
use crate::ast::{ExprNode, NodeId};
use crate::checker::{self, CheckResult};
use crate::config::Config;
use crate::container::Container;
use crate::error::{CelError, CelResult, Diagnostic};
use crate::interpreter::Interpreter;
use crate::parser;
use crate::registry::Registry;
use crate::residual::{self, NodeValues};
use crate::resource::{CostTracker, NoLimitTracker};
use crate::tracer::{EvalTracer, NoopTracer};
use crate::types::Type;
use crate::value::Value;

/// Per-node values captured by a [`Program::eval_partial`] run, retained
/// only so a later [`Program::residual`] call can fold known sub-expressions
/// without re-evaluating.
#[derive(Debug, Default, Clone)]
pub struct EvalDetails {
    values: NodeValues,
}

impl EvalDetails {
    #[must_use]
    pub fn value_of(&self, id: NodeId) -> Option<&Value> {
        self.values.get(&id)
    }
}

/// Shares a `NodeValues` map between an [`Interpreter`] (which only sees it
/// through the [`EvalTracer`] hooks) and the caller who needs it back after
/// evaluation returns.
#[derive(Clone, Default)]
struct ValueRecorder(Rc<RefCell<NodeValues>>);

impl EvalTracer for ValueRecorder {
    fn on_node(&self, id: NodeId, result: &Value) {
        self.0.borrow_mut().insert(id, result.clone());
    }
}

/// A parsed and type-checked expression bundled with the registry,
/// container, and config it was checked against (spec §5: "a compiled
/// program is immutable and may be evaluated concurrently against distinct
/// activations").
#[derive(Clone)]
pub struct Program {
    root: ExprNode,
    registry: Registry,
    container: Container,
    config: Config,
    checked: CheckResult,
}

impl Program {
    /// Parses `source`, installs the standard library plus whatever
    /// `declare` adds (custom variables, functions, a [`crate::provider::TypeProvider`]),
    /// builds a [`Container`] from `namespace`/`abbrevs`, and type-checks the
    /// result. Parse failures abort with `Err`; check diagnostics (unknown
    /// identifiers, type mismatches) are returned alongside a still-usable
    /// program, since an unchecked-but-parseable expression can still be run
    /// dynamically (spec §6 "Diagnostics are advisory, not fatal").
    pub fn compile(
        source: &str,
        namespace: &str,
        abbrevs: &[(&str, &str)],
        config: Config,
        declare: impl FnOnce(&mut Registry),
    ) -> Result<(Self, Vec<Diagnostic>), CelError> {
        let parsed = parser::parse(source, config.enable_macro_call_tracking)?;

        let mut registry = Registry::new();
        crate::stdlib::install(&mut registry);
        declare(&mut registry);

        let mut container = Container::new(namespace);
        for (short, full) in abbrevs {
            container.add_abbrev(*short, *full);
        }

        let checked = checker::check(&parsed.root, &registry, &container, &config);
        let diagnostics = checked.diagnostics.clone();
        let program = Self {
            root: parsed.root,
            registry,
            container,
            config,
            checked,
        };
        Ok((program, diagnostics))
    }

    #[must_use]
    pub fn is_well_typed(&self) -> bool {
        self.checked.is_ok()
    }

    #[must_use]
    pub fn type_of(&self, id: NodeId) -> Option<&Type> {
        self.checked.types.get(&id)
    }

    /// Evaluates with an unbounded cost tracker and no tracing — the common
    /// case.
    pub fn eval(&self, activation: &mut Activation) -> CelResult<Value> {
        self.eval_with(activation, NoLimitTracker, NoopTracer)
    }

    /// Evaluates with caller-supplied cost tracking and tracing (spec §5
    /// "Resource limits", "State tracking").
    pub fn eval_with<C: CostTracker, T: EvalTracer>(&self, activation: &mut Activation, cost: C, tracer: T) -> CelResult<Value> {
        let mut interp = Interpreter::new(&self.registry, &self.container, &self.config, Some(&self.checked), activation, cost, tracer);
        interp.eval(&self.root)
    }

    /// Evaluates under partial evaluation: `activation`'s attribute patterns
    /// mark the regions of the input considered unresolved, and the result
    /// carries per-node detail a later [`Program::residual`] call needs
    /// (spec §6 "Partial evaluation / residuals").
    pub fn eval_partial(&self, activation: &mut Activation) -> CelResult<(Value, EvalDetails)> {
        let partial_config = Config {
            partial_eval: true,
            ..self.config.clone()
        };
        let recorder = ValueRecorder::default();
        let mut interp = Interpreter::new(
            &self.registry,
            &self.container,
            &partial_config,
            Some(&self.checked),
            activation,
            NoLimitTracker,
            recorder.clone(),
        );
        let value = interp.eval(&self.root)?;
        Ok((value, EvalDetails { values: recorder.0.borrow().clone() }))
    }

    /// Builds a simplified residual program from a prior [`Program::eval_partial`]
    /// run: sub-expressions with a known value collapse to literals, and
    /// sub-expressions that stayed unknown are preserved (spec §6). The
    /// residual is re-checked against the same registry/container/config,
    /// since folding changes which overloads apply.
    #[must_use]
    pub fn residual(&self, details: &EvalDetails) -> Self {
        let root = residual::residual(&self.root, &details.values);
        let checked = checker::check(&root, &self.registry, &self.container, &self.config);
        Self {
            root,
            registry: self.registry.clone(),
            container: self.container.clone(),
            config: self.config.clone(),
            checked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributePattern, QualifierPattern};
    use crate::value::{MapKey, ValueMap};

    #[test]
    fn compile_and_eval_simple_arithmetic() {
        let (program, diagnostics) = Program::compile("1 + 2 * 3", "", &[], Config::default(), |_| {}).unwrap();
        assert!(diagnostics.is_empty());
        assert!(program.is_well_typed());
        let mut activation = Activation::new();
        assert!(matches!(program.eval(&mut activation).unwrap(), Value::Int(7)));
    }

    #[test]
    fn compile_reports_undeclared_variable_as_diagnostic_not_error() {
        let (program, diagnostics) = Program::compile("undeclared_var + 1", "", &[], Config::default(), |_| {}).unwrap();
        assert!(!diagnostics.is_empty());
        assert!(!program.is_well_typed());
    }

    #[test]
    fn eval_partial_then_residual_folds_known_side_of_and() {
        let (program, _) = Program::compile("x && y", "", &[], Config::default().with_partial_eval(true), |registry| {
            registry.add_variable("x", Type::Bool);
            registry.add_variable("y", Type::Bool);
        })
        .unwrap();

        let mut activation = Activation::with_patterns(vec![AttributePattern::new("y", vec![])]);
        activation.bind("x", Value::Bool(true));

        let (value, details) = program.eval_partial(&mut activation).unwrap();
        assert!(value.is_unknown());

        let residual_program = program.residual(&details);
        let mut fresh = Activation::with_patterns(vec![AttributePattern::new("y", vec![])]);
        fresh.bind("y", Value::Bool(false));
        let result = residual_program.eval(&mut fresh).unwrap();
        assert!(matches!(result, Value::Bool(false)));
    }

    #[test]
    fn eval_with_custom_type_provider_constructs_objects() {
        use crate::provider::SimpleTypeProvider;

        let (program, _) = Program::compile("pkg.Msg{f: 'hi'}.f", "", &[], Config::default(), |registry| {
            let mut provider = SimpleTypeProvider::new();
            provider.register("pkg.Msg", vec![("f".to_string(), Type::String)]);
            registry.set_type_provider(Rc::new(provider));
        })
        .unwrap();
        let mut activation = Activation::new();
        let result = program.eval(&mut activation).unwrap();
        assert!(matches!(result, Value::String(s) if &*s == "hi"));
    }

    #[test]
    fn map_index_via_compiled_program() {
        let (program, _) = Program::compile("m['k']", "", &[], Config::default(), |registry| {
            registry.add_variable("m", Type::map(Type::String, Type::Int));
        })
        .unwrap();
        let mut map = ValueMap::with_hasher(ahash::RandomState::new());
        map.insert(MapKey::String("k".into()), Value::Int(5));
        let mut activation = Activation::new();
        activation.bind("m", Value::map(map));
        assert!(matches!(program.eval(&mut activation).unwrap(), Value::Int(5)));
    }
}

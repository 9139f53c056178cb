//! Partial evaluation: attribute patterns mark regions of the activation as
//! unknown, and the interpreter must propagate `Value::Unknown` through
//! arithmetic/select/index/comprehension the same way it propagates errors.

use cel_core::activation::Activation;
use cel_core::attribute::{AttributePattern, QualifierPattern};
use cel_core::config::Config;
use cel_core::program::Program;
use cel_core::types::Type;
use cel_core::value::Value;

fn compile(source: &str, declare: impl FnOnce(&mut cel_core::registry::Registry)) -> Program {
    let (program, diagnostics) = Program::compile(source, "", &[], Config::default().with_partial_eval(true), declare).unwrap();
    assert!(diagnostics.is_empty(), "unexpected diagnostics for `{source}`: {diagnostics:?}");
    program
}

#[test]
fn bare_unknown_variable_evaluates_to_unknown() {
    let program = compile("y", |registry| registry.add_variable("y", Type::Int));
    let mut activation = Activation::with_patterns(vec![AttributePattern::new("y", vec![])]);
    let (value, _) = program.eval_partial(&mut activation).unwrap();
    assert!(value.is_unknown());
}

#[test]
fn unknown_propagates_through_arithmetic() {
    let program = compile("y + 1", |registry| registry.add_variable("y", Type::Int));
    let mut activation = Activation::with_patterns(vec![AttributePattern::new("y", vec![])]);
    let (value, _) = program.eval_partial(&mut activation).unwrap();
    assert!(value.is_unknown());
}

#[test]
fn field_qualifier_wildcard_marks_selected_field_unknown() {
    let program = compile("msg.f", |registry| {
        let mut provider = cel_core::provider::SimpleTypeProvider::new();
        provider.register("Msg", vec![("f".to_string(), Type::Int)]);
        registry.set_type_provider(std::rc::Rc::new(provider));
        registry.add_variable("msg", Type::Object("Msg".to_string()));
    });
    let mut activation = Activation::with_patterns(vec![AttributePattern::new("msg", vec![QualifierPattern::Wildcard])]);
    let (value, _) = program.eval_partial(&mut activation).unwrap();
    assert!(value.is_unknown());
}

#[test]
fn literal_index_qualifier_marks_specific_list_element_unknown() {
    let program = compile("xs[0] + xs[1]", |registry| registry.add_variable("xs", Type::list(Type::Int)));
    let mut activation = Activation::with_patterns(vec![AttributePattern::new(
        "xs",
        vec![QualifierPattern::Literal(cel_core::attribute::QualifierKey::Int(0))],
    )]);
    activation.bind("xs", Value::list(vec![Value::Int(10), Value::Int(20)]));
    let (value, _) = program.eval_partial(&mut activation).unwrap();
    // `xs[0]` is unknown, `xs[1]` resolves concretely to 20; the sum is
    // unknown but must not be a plain arithmetic error.
    assert!(value.is_unknown());
}

#[test]
fn unrelated_qualifier_pattern_does_not_mark_other_fields_unknown() {
    let program = compile("msg.f", |registry| {
        let mut provider = cel_core::provider::SimpleTypeProvider::new();
        provider.register("Msg", vec![("f".to_string(), Type::Int), ("g".to_string(), Type::Int)]);
        registry.set_type_provider(std::rc::Rc::new(provider));
        registry.add_variable("msg", Type::Object("Msg".to_string()));
    });
    let mut activation = Activation::with_patterns(vec![AttributePattern::new(
        "msg",
        vec![QualifierPattern::Literal(cel_core::attribute::QualifierKey::String("g".to_string()))],
    )]);
    let mut object = cel_core::value::ObjectValue {
        type_name: "Msg".into(),
        fields: indexmap::IndexMap::default(),
    };
    object.fields.insert("f".to_string(), Value::Int(5));
    activation.bind("msg", Value::Object(std::rc::Rc::new(object)));
    let (value, _) = program.eval_partial(&mut activation).unwrap();
    assert!(matches!(value, Value::Int(5)));
}

#[test]
fn short_circuit_and_does_not_require_unknown_rhs_to_resolve() {
    let program = compile("false && y", |registry| registry.add_variable("y", Type::Int));
    let mut activation = Activation::with_patterns(vec![AttributePattern::new("y", vec![])]);
    let (value, _) = program.eval_partial(&mut activation).unwrap();
    assert!(matches!(value, Value::Bool(false)));
}

#[test]
fn known_true_disjunct_folds_away_the_whole_conjunct_leaving_only_the_unknown_side() {
    // x < 10 && (y == 0 || 'hello' != 'goodbye'): the right conjunct is
    // known-true regardless of y, so the residual must be exactly `x < 10`,
    // not `x < 10 && true`.
    let program = compile("x < 10 && (y == 0 || 'hello' != 'goodbye')", |registry| {
        registry.add_variable("x", Type::Int);
        registry.add_variable("y", Type::Int);
    });
    let mut activation = Activation::with_patterns(vec![AttributePattern::new("x", vec![])]);
    activation.bind("y", Value::Int(7));

    let (value, details) = program.eval_partial(&mut activation).unwrap();
    assert!(value.is_unknown());

    let residual_program = program.residual(&details);

    // the residual no longer mentions `y` at all: it evaluates cleanly
    // against an activation that only binds `x`.
    let mut with_small_x = Activation::new();
    with_small_x.bind("x", Value::Int(5));
    assert!(matches!(residual_program.eval(&mut with_small_x).unwrap(), Value::Bool(true)));

    let mut with_large_x = Activation::new();
    with_large_x.bind("x", Value::Int(20));
    assert!(matches!(residual_program.eval(&mut with_large_x).unwrap(), Value::Bool(false)));
}

#[test]
fn residual_of_fully_concrete_activation_is_a_plain_literal() {
    let program = compile("x + 1", |registry| registry.add_variable("x", Type::Int));
    let mut activation = Activation::new();
    activation.bind("x", Value::Int(4));
    let (value, details) = program.eval_partial(&mut activation).unwrap();
    assert!(matches!(value, Value::Int(5)));
    let residual_program = program.residual(&details);
    let mut empty = Activation::new();
    assert!(matches!(residual_program.eval(&mut empty).unwrap(), Value::Int(5)));
}

//! The concrete end-to-end scenarios transcribed from the expression
//! language's conformance table: literal source in, expected runtime value
//! or error kind out, exercised through the public `Program` API.

use cel_core::activation::Activation;
use cel_core::attribute::{AttributePattern, QualifierPattern};
use cel_core::config::Config;
use cel_core::error::ErrorKind;
use cel_core::program::Program;
use cel_core::provider::SimpleTypeProvider;
use cel_core::types::Type;
use cel_core::value::Value;
use std::rc::Rc;

fn eval(source: &str, declare: impl FnOnce(&mut cel_core::registry::Registry), bind: impl FnOnce(&mut Activation)) -> Value {
    let (program, diagnostics) = Program::compile(source, "", &[], Config::default(), declare).unwrap();
    assert!(diagnostics.is_empty(), "unexpected diagnostics for `{source}`: {diagnostics:?}");
    let mut activation = Activation::new();
    bind(&mut activation);
    program.eval(&mut activation).unwrap()
}

#[test]
fn string_concatenation_with_bound_variable() {
    let result = eval(
        "\"Hello \" + name + \"!\"",
        |registry| registry.add_variable("name", Type::String),
        |activation| activation.bind("name", Value::string("CEL")),
    );
    assert!(matches!(result, Value::String(s) if &*s == "Hello CEL!"));
}

#[test]
fn map_then_filter_then_size() {
    let result = eval("[1,2,3].map(x, x*2).filter(x, x >= 4).size()", |_| {}, |_| {});
    assert!(matches!(result, Value::Int(2)));
}

#[test]
fn map_index_plus_constant() {
    let result = eval("{\"a\":1, \"b\":2}[\"a\"] + 10", |_| {}, |_| {});
    assert!(matches!(result, Value::Int(11)));
}

fn declare_msg(registry: &mut cel_core::registry::Registry) {
    let mut provider = SimpleTypeProvider::new();
    provider.register("Msg", vec![("f".to_string(), Type::String)]);
    registry.set_type_provider(Rc::new(provider));
}

#[test]
fn has_is_false_for_missing_field_on_empty_object() {
    let result = eval("has(Msg{}.f)", declare_msg, |_| {});
    assert!(matches!(result, Value::Bool(false)));
}

#[test]
fn has_is_false_for_explicit_empty_string_and_true_once_set() {
    let empty = eval("has(Msg{f: ''}.f)", declare_msg, |_| {});
    assert!(matches!(empty, Value::Bool(false)));

    let non_empty = eval("has(Msg{f: 'x'}.f)", declare_msg, |_| {});
    assert!(matches!(non_empty, Value::Bool(true)));
}

#[test]
fn division_by_zero_is_an_arithmetic_error() {
    let result = eval("1 / 0", |_| {}, |_| {});
    match result {
        Value::Error(err) => {
            assert_eq!(err.kind, ErrorKind::Arithmetic);
            assert!(err.message.contains("division by zero"));
        }
        other => panic!("expected an error value, got {other:?}"),
    }
}

#[test]
fn partial_activation_with_known_x_and_unknown_y_residualizes() {
    let (program, _) = Program::compile(
        "x < 10 && y == 0",
        "",
        &[],
        Config::default().with_partial_eval(true),
        |registry| {
            registry.add_variable("x", Type::Int);
            registry.add_variable("y", Type::Int);
        },
    )
    .unwrap();

    let mut activation = Activation::with_patterns(vec![AttributePattern::new("y", vec![QualifierPattern::Wildcard])]);
    activation.bind("x", Value::Int(5));

    let (value, details) = program.eval_partial(&mut activation).unwrap();
    assert!(value.is_unknown());

    let residual_program = program.residual(&details);
    let mut fresh = Activation::new();
    fresh.bind("y", Value::Int(0));
    assert!(matches!(residual_program.eval(&mut fresh).unwrap(), Value::Bool(true)));
}

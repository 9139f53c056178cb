//! End-to-end container-relative name resolution: a reference compiled
//! inside a namespace must resolve against the declared/bound name at the
//! first matching candidate, preferring the most deeply qualified one.

use cel_core::activation::Activation;
use cel_core::config::Config;
use cel_core::program::Program;
use cel_core::provider::SimpleTypeProvider;
use cel_core::types::Type;
use cel_core::value::Value;
use std::rc::Rc;

#[test]
fn declared_parent_identifier_wins_over_bare_reference() {
    // namespace p.q.r, reference `a`, only `p.a` declared and bound: the
    // identifier must resolve through the container's candidate list to
    // `p.a`, never falling through to a bare, undeclared `a`.
    let (program, diagnostics) = Program::compile("a", "p.q.r", &[], Config::default(), |registry| {
        registry.add_variable("p.a", Type::Int);
    })
    .unwrap();
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");

    let mut activation = Activation::new();
    activation.bind("p.a", Value::Int(42));
    assert!(matches!(program.eval(&mut activation).unwrap(), Value::Int(42)));
}

#[test]
fn leading_dot_forces_absolute_reference() {
    let (program, diagnostics) = Program::compile(".a", "p.q.r", &[], Config::default(), |registry| {
        registry.add_variable("a", Type::Int);
    })
    .unwrap();
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");

    let mut activation = Activation::new();
    activation.bind("a", Value::Int(7));
    assert!(matches!(program.eval(&mut activation).unwrap(), Value::Int(7)));
}

#[test]
fn abbreviation_short_circuits_object_type_resolution() {
    // object-literal type names go through the same container/abbreviation
    // candidate search as variable identifiers (spec §4.1 "CreateObject").
    let (program, diagnostics) = Program::compile("pb.Foo{}", "p.q.r", &[("pb", "google.protobuf")], Config::default(), |registry| {
        let mut provider = SimpleTypeProvider::new();
        provider.register("google.protobuf.Foo", vec![]);
        registry.set_type_provider(Rc::new(provider));
    })
    .unwrap();
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");

    let mut activation = Activation::new();
    match program.eval(&mut activation).unwrap() {
        Value::Object(obj) => assert_eq!(&*obj.type_name, "google.protobuf.Foo"),
        other => panic!("expected an object value, got {other:?}"),
    }
}

#[test]
fn deepest_namespace_candidate_is_preferred_when_multiple_are_bound() {
    // both `p.q.r.a` and `p.a` are bound; resolution must pick the most
    // deeply qualified candidate (`p.q.r.a`), matching the container's
    // enclosing-namespace-first search order.
    let (program, diagnostics) = Program::compile("a", "p.q.r", &[], Config::default(), |registry| {
        registry.add_variable("p.q.r.a", Type::Int);
        registry.add_variable("p.a", Type::Int);
    })
    .unwrap();
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");

    let mut activation = Activation::new();
    activation.bind("p.q.r.a", Value::Int(1));
    activation.bind("p.a", Value::Int(2));
    assert!(matches!(program.eval(&mut activation).unwrap(), Value::Int(1)));
}

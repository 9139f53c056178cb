//! Checking is a pure, read-only pass over the AST: running it twice against
//! the same registry/container/config produces byte-for-byte identical
//! results, and the input tree itself is left untouched.

use cel_core::checker::check;
use cel_core::config::Config;
use cel_core::container::Container;
use cel_core::parser::parse;
use cel_core::registry::Registry;
use cel_core::stdlib;
use cel_core::types::Type;

fn fresh_registry() -> Registry {
    let mut registry = Registry::default();
    stdlib::install(&mut registry);
    registry
}

fn assert_idempotent(source: &str, declare: impl FnOnce(&mut Registry)) {
    let mut registry = fresh_registry();
    declare(&mut registry);
    let container = Container::new("");
    let config = Config::default();

    let parsed = parse(source, false).unwrap();

    let first = check(&parsed.root, &registry, &container, &config);
    let second = check(&parsed.root, &registry, &container, &config);

    assert_eq!(first.types, second.types, "type table differs between check runs for `{source}`");
    assert_eq!(first.references, second.references, "reference table differs between check runs for `{source}`");
    assert_eq!(first.diagnostics.len(), second.diagnostics.len(), "diagnostic count differs between check runs for `{source}`");
}

#[test]
fn well_typed_arithmetic_expression_checks_idempotently() {
    assert_idempotent("1 + 2 * 3", |_| {});
}

#[test]
fn expression_with_undeclared_reference_checks_idempotently() {
    assert_idempotent("undeclared_name + 1", |_| {});
}

#[test]
fn expression_with_macros_and_generics_checks_idempotently() {
    assert_idempotent("[1,2,3].map(x, x * 2).filter(x, x > 2)", |_| {});
}

#[test]
fn expression_over_declared_variables_checks_idempotently() {
    assert_idempotent("x < 10 && y == 0", |registry| {
        registry.add_variable("x", Type::Int);
        registry.add_variable("y", Type::Int);
    });
}

#[test]
fn checking_does_not_mutate_the_input_tree() {
    let registry = fresh_registry();
    let container = Container::new("");
    let config = Config::default();
    let parsed = parse("1 + 2", false).unwrap();
    let before = parsed.root.clone();
    let _ = check(&parsed.root, &registry, &container, &config);
    assert_eq!(parsed.root, before);
}

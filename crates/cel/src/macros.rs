//! The fixed macro table and its desugaring into [`Comprehension`] nodes
//! (spec §4.1 "Macro expansion"). Structured as pure AST-to-AST functions
//! taking an id generator and the call's original subexpressions, per
//! spec §9's design note — expansion does not depend on any source-language
//! reflection, only on the already-parsed receiver/argument nodes.

use crate::ast::{ACCUMULATOR_VAR, Comprehension, Expr, ExprNode, IdGenerator, SourceLocation};

/// Synthesizes a new leaf/branch node, drawing its id from the shared
/// generator so macro-expanded nodes stay unique alongside parsed ones.
fn node(gen: &mut IdGenerator, loc: SourceLocation, expr: Expr) -> ExprNode {
    ExprNode::new(gen.next_id(), loc, expr)
}

fn accumulator(gen: &mut IdGenerator, loc: SourceLocation) -> ExprNode {
    node(gen, loc, Expr::Ident(ACCUMULATOR_VAR.to_string()))
}

fn bool_lit(gen: &mut IdGenerator, loc: SourceLocation, b: bool) -> ExprNode {
    node(gen, loc, Expr::Literal(crate::ast::Literal::Bool(b)))
}

fn int_lit(gen: &mut IdGenerator, loc: SourceLocation, i: i64) -> ExprNode {
    node(gen, loc, Expr::Literal(crate::ast::Literal::Int(i)))
}

fn call(gen: &mut IdGenerator, loc: SourceLocation, function: &str, args: Vec<ExprNode>) -> ExprNode {
    node(
        gen,
        loc,
        Expr::Call {
            target: None,
            function: function.to_string(),
            args,
        },
    )
}

/// `has(e.f)` => `Select(e, f, test_only=true)`. Only valid when the macro's
/// sole argument is itself a select expression; checked by the parser before
/// calling this (spec §4.1 table, §3 "TestOnly" invariant).
#[must_use]
pub fn expand_has(target: ExprNode, field: String) -> Expr {
    Expr::Select {
        target: Box::new(target),
        field,
        test_only: true,
    }
}

/// `r.all(x, p)`: init=`true`, cond=`@result`, step=`@result && p`, result=`@result`.
#[must_use]
pub fn expand_all(gen: &mut IdGenerator, loc: SourceLocation, iter_var: String, range: ExprNode, pred: ExprNode) -> Comprehension {
    Comprehension {
        iter_var,
        iter_range: Box::new(range),
        accu_var: ACCUMULATOR_VAR.to_string(),
        init: Box::new(bool_lit(gen, loc, true)),
        loop_condition: Box::new(accumulator(gen, loc)),
        loop_step: Box::new(node(
            gen,
            loc,
            Expr::Call {
                target: None,
                function: "_&&_".to_string(),
                args: vec![accumulator(gen, loc), pred],
            },
        )),
        result: Box::new(accumulator(gen, loc)),
    }
}

/// `r.exists(x, p)`: init=`false`, cond=`!@result`, step=`@result || p`, result=`@result`.
#[must_use]
pub fn expand_exists(gen: &mut IdGenerator, loc: SourceLocation, iter_var: String, range: ExprNode, pred: ExprNode) -> Comprehension {
    Comprehension {
        iter_var,
        iter_range: Box::new(range),
        accu_var: ACCUMULATOR_VAR.to_string(),
        init: Box::new(bool_lit(gen, loc, false)),
        loop_condition: Box::new(call(gen, loc, "!_", vec![accumulator(gen, loc)])),
        loop_step: Box::new(node(
            gen,
            loc,
            Expr::Call {
                target: None,
                function: "_||_".to_string(),
                args: vec![accumulator(gen, loc), pred],
            },
        )),
        result: Box::new(accumulator(gen, loc)),
    }
}

/// `r.exists_one(x, p)`: init=`0`, cond=`true`, step=`@result + (p ? 1 : 0)`, result=`@result == 1`.
#[must_use]
pub fn expand_exists_one(
    gen: &mut IdGenerator,
    loc: SourceLocation,
    iter_var: String,
    range: ExprNode,
    pred: ExprNode,
) -> Comprehension {
    let ternary = node(
        gen,
        loc,
        Expr::Call {
            target: None,
            function: "_?_:_".to_string(),
            args: vec![pred, int_lit(gen, loc, 1), int_lit(gen, loc, 0)],
        },
    );
    Comprehension {
        iter_var,
        iter_range: Box::new(range),
        accu_var: ACCUMULATOR_VAR.to_string(),
        init: Box::new(int_lit(gen, loc, 0)),
        loop_condition: Box::new(bool_lit(gen, loc, true)),
        loop_step: Box::new(call(gen, loc, "_+_", vec![accumulator(gen, loc), ternary])),
        result: Box::new(call(gen, loc, "_==_", vec![accumulator(gen, loc), int_lit(gen, loc, 1)])),
    }
}

/// `r.map(x, p)`: init=`[]`, cond=`true`, step=`@result + [p]`, result=`@result`.
#[must_use]
pub fn expand_map(gen: &mut IdGenerator, loc: SourceLocation, iter_var: String, range: ExprNode, body: ExprNode) -> Comprehension {
    let wrapped = node(gen, loc, Expr::CreateList(vec![body]));
    Comprehension {
        iter_var,
        iter_range: Box::new(range),
        accu_var: ACCUMULATOR_VAR.to_string(),
        init: Box::new(node(gen, loc, Expr::CreateList(vec![]))),
        loop_condition: Box::new(bool_lit(gen, loc, true)),
        loop_step: Box::new(call(gen, loc, "_+_", vec![accumulator(gen, loc), wrapped])),
        result: Box::new(accumulator(gen, loc)),
    }
}

/// `r.map(x, f, t)`: init=`[]`, cond=`true`, step=`f ? @result + [t] : @result`, result=`@result`.
#[must_use]
pub fn expand_map_filter(
    gen: &mut IdGenerator,
    loc: SourceLocation,
    iter_var: String,
    range: ExprNode,
    filter: ExprNode,
    transform: ExprNode,
) -> Comprehension {
    let wrapped = node(gen, loc, Expr::CreateList(vec![transform]));
    let appended = call(gen, loc, "_+_", vec![accumulator(gen, loc), wrapped]);
    let ternary = node(
        gen,
        loc,
        Expr::Call {
            target: None,
            function: "_?_:_".to_string(),
            args: vec![filter, appended, accumulator(gen, loc)],
        },
    );
    Comprehension {
        iter_var,
        iter_range: Box::new(range),
        accu_var: ACCUMULATOR_VAR.to_string(),
        init: Box::new(node(gen, loc, Expr::CreateList(vec![]))),
        loop_condition: Box::new(bool_lit(gen, loc, true)),
        loop_step: Box::new(ternary),
        result: Box::new(accumulator(gen, loc)),
    }
}

/// `r.filter(x, p)`: init=`[]`, cond=`true`, step=`p ? @result + [x] : @result`, result=`@result`.
#[must_use]
pub fn expand_filter(gen: &mut IdGenerator, loc: SourceLocation, iter_var: String, range: ExprNode, pred: ExprNode) -> Comprehension {
    let elem = node(gen, loc, Expr::Ident(iter_var.clone()));
    let wrapped = node(gen, loc, Expr::CreateList(vec![elem]));
    let appended = call(gen, loc, "_+_", vec![accumulator(gen, loc), wrapped]);
    let ternary = node(
        gen,
        loc,
        Expr::Call {
            target: None,
            function: "_?_:_".to_string(),
            args: vec![pred, appended, accumulator(gen, loc)],
        },
    );
    Comprehension {
        iter_var,
        iter_range: Box::new(range),
        accu_var: ACCUMULATOR_VAR.to_string(),
        init: Box::new(node(gen, loc, Expr::CreateList(vec![]))),
        loop_condition: Box::new(bool_lit(gen, loc, true)),
        loop_step: Box::new(ternary),
        result: Box::new(accumulator(gen, loc)),
    }
}

/// The receiver-name/arity pairs the parser checks a call shape against
/// before falling back to ordinary call resolution (spec §4.1 table).
#[must_use]
pub fn is_macro(receiver_present: bool, name: &str, arity: usize) -> bool {
    match (receiver_present, name, arity) {
        (false, "has", 1) => true,
        (true, "all" | "exists" | "exists_one" | "filter", 2) => true,
        (true, "map", 2 | 3) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;

    fn loc() -> SourceLocation {
        SourceLocation::default()
    }

    fn placeholder(gen: &mut IdGenerator) -> ExprNode {
        node(gen, loc(), Expr::Literal(Literal::Bool(true)))
    }

    #[test]
    fn all_desugars_to_spec_shape() {
        let mut gen = IdGenerator::new();
        let range = placeholder(&mut gen);
        let pred = placeholder(&mut gen);
        let comp = expand_all(&mut gen, loc(), "x".into(), range, pred);
        assert!(matches!(comp.init.expr, Expr::Literal(Literal::Bool(true))));
        assert!(matches!(&comp.loop_condition.expr, Expr::Ident(n) if n == ACCUMULATOR_VAR));
        assert!(matches!(&comp.result.expr, Expr::Ident(n) if n == ACCUMULATOR_VAR));
        assert!(matches!(&comp.loop_step.expr, Expr::Call { function, .. } if function == "_&&_"));
    }

    #[test]
    fn is_macro_recognizes_table() {
        assert!(is_macro(false, "has", 1));
        assert!(is_macro(true, "all", 2));
        assert!(is_macro(true, "map", 2));
        assert!(is_macro(true, "map", 3));
        assert!(!is_macro(false, "all", 2));
        assert!(!is_macro(true, "has", 1));
    }
}

//! Builds a residual program from a partially evaluated tree (spec §6
//! "Partial evaluation / residuals"): sub-expressions whose value was fully
//! known collapse to literals, sub-expressions that touched an unresolved
//! attribute are left as-is, and the three short-circuit operators keep only
//! the operand that still matters rather than folding to a call node.

use std::collections::HashMap;

use crate::ast::{Comprehension, Expr, ExprNode, Literal, MapEntry, NodeId, ObjectField};
use crate::value::Value;

/// Per-node result of a prior evaluation pass, keyed by [`crate::ast::NodeId`]
/// — gathered via a tracer that records a [`Value`] per dispatched node (see
/// [`crate::program::Program::eval_partial`]).
pub type NodeValues = HashMap<NodeId, Value>;

/// Rewrites `node` into its residual form given the per-node values recorded
/// during a partial evaluation. A node with a known, literal-representable
/// value becomes that literal; a node that never resolved (missing from
/// `values`, or recorded as [`Value::Unknown`]) is kept, with its children
/// residualized recursively.
#[must_use]
pub fn residual(node: &ExprNode, values: &NodeValues) -> ExprNode {
    if let Some(lit) = values.get(&node.id).and_then(literal_of) {
        return ExprNode::new(node.id, node.location, Expr::Literal(lit));
    }

    match &node.expr {
        Expr::Literal(_) | Expr::Ident(_) => node.clone(),
        Expr::Select { target, field, test_only } => ExprNode::new(
            node.id,
            node.location,
            Expr::Select {
                target: Box::new(residual(target, values)),
                field: field.clone(),
                test_only: *test_only,
            },
        ),
        Expr::Call { function, args, .. } if function == "_&&_" && args.len() == 2 => {
            and_residual(node, &args[0], &args[1], values)
        }
        Expr::Call { function, args, .. } if function == "_||_" && args.len() == 2 => {
            or_residual(node, &args[0], &args[1], values)
        }
        Expr::Call { function, args, .. } if function == "_?_:_" && args.len() == 3 => {
            conditional_residual(node, &args[0], &args[1], &args[2], values)
        }
        Expr::Call { target, function, args } => ExprNode::new(
            node.id,
            node.location,
            Expr::Call {
                target: target.as_ref().map(|t| Box::new(residual(t, values))),
                function: function.clone(),
                args: args.iter().map(|a| residual(a, values)).collect(),
            },
        ),
        Expr::CreateList(items) => {
            ExprNode::new(node.id, node.location, Expr::CreateList(items.iter().map(|e| residual(e, values)).collect()))
        }
        Expr::CreateMap(entries) => ExprNode::new(
            node.id,
            node.location,
            Expr::CreateMap(
                entries
                    .iter()
                    .map(|e| MapEntry { key: residual(&e.key, values), value: residual(&e.value, values) })
                    .collect(),
            ),
        ),
        Expr::CreateObject { type_name, fields } => ExprNode::new(
            node.id,
            node.location,
            Expr::CreateObject {
                type_name: type_name.clone(),
                fields: fields
                    .iter()
                    .map(|f| ObjectField { name: f.name.clone(), value: residual(&f.value, values) })
                    .collect(),
            },
        ),
        Expr::Comprehension(c) => ExprNode::new(
            node.id,
            node.location,
            Expr::Comprehension(Comprehension {
                iter_var: c.iter_var.clone(),
                iter_range: Box::new(residual(&c.iter_range, values)),
                accu_var: c.accu_var.clone(),
                init: Box::new(residual(&c.init, values)),
                loop_condition: Box::new(residual(&c.loop_condition, values)),
                loop_step: Box::new(residual(&c.loop_step, values)),
                result: Box::new(residual(&c.result, values)),
            }),
        ),
    }
}

fn and_residual(node: &ExprNode, lhs: &ExprNode, rhs: &ExprNode, values: &NodeValues) -> ExprNode {
    match (values.get(&lhs.id), values.get(&rhs.id)) {
        (Some(Value::Bool(true)), _) => residual(rhs, values),
        (Some(Value::Bool(false)), _) => ExprNode::new(node.id, node.location, Expr::Literal(Literal::Bool(false))),
        (_, Some(Value::Bool(true))) => residual(lhs, values),
        (_, Some(Value::Bool(false))) => ExprNode::new(node.id, node.location, Expr::Literal(Literal::Bool(false))),
        _ => call_node(node, "_&&_", vec![residual(lhs, values), residual(rhs, values)]),
    }
}

fn or_residual(node: &ExprNode, lhs: &ExprNode, rhs: &ExprNode, values: &NodeValues) -> ExprNode {
    match (values.get(&lhs.id), values.get(&rhs.id)) {
        (Some(Value::Bool(false)), _) => residual(rhs, values),
        (Some(Value::Bool(true)), _) => ExprNode::new(node.id, node.location, Expr::Literal(Literal::Bool(true))),
        (_, Some(Value::Bool(false))) => residual(lhs, values),
        (_, Some(Value::Bool(true))) => ExprNode::new(node.id, node.location, Expr::Literal(Literal::Bool(true))),
        _ => call_node(node, "_||_", vec![residual(lhs, values), residual(rhs, values)]),
    }
}

fn conditional_residual(node: &ExprNode, cond: &ExprNode, then_b: &ExprNode, else_b: &ExprNode, values: &NodeValues) -> ExprNode {
    match values.get(&cond.id) {
        Some(Value::Bool(true)) => residual(then_b, values),
        Some(Value::Bool(false)) => residual(else_b, values),
        _ => call_node(node, "_?_:_", vec![residual(cond, values), residual(then_b, values), residual(else_b, values)]),
    }
}

fn call_node(node: &ExprNode, function: &str, args: Vec<ExprNode>) -> ExprNode {
    ExprNode::new(node.id, node.location, Expr::Call { target: None, function: function.to_string(), args })
}

/// `None` for anything not representable as a source literal (lists, maps,
/// objects, timestamps, durations, type values) — those nodes keep their
/// original structure instead, since re-evaluating it reproduces the same
/// value.
fn literal_of(v: &Value) -> Option<Literal> {
    match v {
        Value::Null => Some(Literal::Null),
        Value::Bool(b) => Some(Literal::Bool(*b)),
        Value::Int(i) => Some(Literal::Int(*i)),
        Value::Uint(u) => Some(Literal::Uint(*u)),
        Value::Double(d) => Some(Literal::Double(*d)),
        Value::String(s) => Some(Literal::String(s.to_string())),
        Value::Bytes(b) => Some(Literal::Bytes(b.to_vec())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceLocation;

    fn int_lit(id: u64, i: i64) -> ExprNode {
        ExprNode::new(NodeId(id), SourceLocation::default(), Expr::Literal(Literal::Int(i)))
    }

    /// A call node standing in for an unfolded subexpression (e.g. `y == 0`)
    /// whose recorded runtime value is supplied separately via `NodeValues`.
    fn opaque_bool_expr(id: u64) -> ExprNode {
        ExprNode::new(NodeId(id), SourceLocation::default(), Expr::Ident(format!("@opaque{id}")))
    }

    fn ident(id: u64, name: &str) -> ExprNode {
        ExprNode::new(NodeId(id), SourceLocation::default(), Expr::Ident(name.to_string()))
    }

    #[test]
    fn known_node_collapses_to_literal() {
        let node = call_node(&ident(1, "placeholder"), "_+_", vec![int_lit(2, 1), int_lit(3, 2)]);
        let mut values = NodeValues::new();
        values.insert(node.id, Value::Int(3));
        let r = residual(&node, &values);
        assert!(matches!(r.expr, Expr::Literal(Literal::Int(3))));
    }

    #[test]
    fn true_and_x_residualizes_to_x() {
        let left = int_lit(1, 1);
        let right = ident(2, "x");
        let and_node = call_node(&ident(3, "_"), "_&&_", vec![left.clone(), right.clone()]);
        let mut values = NodeValues::new();
        values.insert(left.id, Value::Bool(true));
        let r = residual(&and_node, &values);
        assert!(matches!(&r.expr, Expr::Ident(n) if n == "x"));
        assert_eq!(r.id, right.id);
    }

    #[test]
    fn false_and_x_residualizes_to_false_without_inspecting_x() {
        let left = ident(1, "l");
        let right = ident(2, "unresolved");
        let and_node = call_node(&ident(3, "_"), "_&&_", vec![left.clone(), right]);
        let mut values = NodeValues::new();
        values.insert(left.id, Value::Bool(false));
        let r = residual(&and_node, &values);
        assert!(matches!(r.expr, Expr::Literal(Literal::Bool(false))));
    }

    #[test]
    fn x_and_true_residualizes_to_x_when_only_rhs_is_known() {
        let left = ident(1, "x");
        let right = opaque_bool_expr(2);
        let and_node = call_node(&ident(3, "_"), "_&&_", vec![left.clone(), right.clone()]);
        let mut values = NodeValues::new();
        values.insert(right.id, Value::Bool(true));
        let r = residual(&and_node, &values);
        assert!(matches!(&r.expr, Expr::Ident(n) if n == "x"));
        assert_eq!(r.id, left.id);
    }

    #[test]
    fn x_and_false_residualizes_to_false_when_only_rhs_is_known() {
        let left = ident(1, "x");
        let right = opaque_bool_expr(2);
        let and_node = call_node(&ident(3, "_"), "_&&_", vec![left, right.clone()]);
        let mut values = NodeValues::new();
        values.insert(right.id, Value::Bool(false));
        let r = residual(&and_node, &values);
        assert!(matches!(r.expr, Expr::Literal(Literal::Bool(false))));
    }

    #[test]
    fn x_or_false_residualizes_to_x_when_only_rhs_is_known() {
        let left = ident(1, "x");
        let right = opaque_bool_expr(2);
        let or_node = call_node(&ident(3, "_"), "_||_", vec![left.clone(), right.clone()]);
        let mut values = NodeValues::new();
        values.insert(right.id, Value::Bool(false));
        let r = residual(&or_node, &values);
        assert!(matches!(&r.expr, Expr::Ident(n) if n == "x"));
        assert_eq!(r.id, left.id);
    }

    #[test]
    fn x_or_true_residualizes_to_true_when_only_rhs_is_known() {
        let left = ident(1, "x");
        let right = opaque_bool_expr(2);
        let or_node = call_node(&ident(3, "_"), "_||_", vec![left, right.clone()]);
        let mut values = NodeValues::new();
        values.insert(right.id, Value::Bool(true));
        let r = residual(&or_node, &values);
        assert!(matches!(r.expr, Expr::Literal(Literal::Bool(true))));
    }

    #[test]
    fn false_or_x_residualizes_to_x() {
        let left = ident(1, "l");
        let right = ident(2, "x");
        let or_node = call_node(&ident(3, "_"), "_||_", vec![left.clone(), right.clone()]);
        let mut values = NodeValues::new();
        values.insert(left.id, Value::Bool(false));
        let r = residual(&or_node, &values);
        assert!(matches!(&r.expr, Expr::Ident(n) if n == "x"));
        assert_eq!(r.id, right.id);
    }

    #[test]
    fn conditional_with_known_condition_keeps_only_taken_branch() {
        let cond = ident(1, "c");
        let then_b = ident(2, "a");
        let else_b = ident(3, "b");
        let ternary = call_node(&ident(4, "_"), "_?_:_", vec![cond.clone(), then_b.clone(), else_b]);
        let mut values = NodeValues::new();
        values.insert(cond.id, Value::Bool(true));
        let r = residual(&ternary, &values);
        assert!(matches!(&r.expr, Expr::Ident(n) if n == "a"));
    }

    #[test]
    fn unresolved_subtree_is_kept_recursively() {
        let select = ExprNode::new(
            NodeId(2),
            SourceLocation::default(),
            Expr::Select { target: Box::new(ident(1, "x")), field: "f".to_string(), test_only: false },
        );
        let values = NodeValues::new();
        let r = residual(&select, &values);
        assert!(matches!(r.expr, Expr::Select { .. }));
    }
}

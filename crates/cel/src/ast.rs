//! The checked-AST data model: nodes, ids, and source locations.
//!
//! Every [`Expr`] is wrapped in an [`ExprNode`] carrying a stable [`NodeId`]
//! assigned by a monotonically increasing counter ([`IdGenerator`]) and a
//! [`SourceLocation`]. IDs are the sole key shared by the checker's
//! annotation tables and the interpreter's per-node state; they survive
//! checking and evaluation unchanged (spec §3 "Invariants").

use std::fmt;

use serde::{Deserialize, Serialize};

/// A dense, unique-within-one-parse node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A position in the source text: 1-based line, 1-based column, 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

/// Monotonic id counter shared by the parser and by macro expansion.
///
/// Macro-expanded nodes draw ids from the same counter as parsed nodes, so
/// uniqueness holds across the whole tree regardless of whether a node was
/// written by the user or synthesized by a macro (spec §4.1 "Id assignment").
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// A literal constant, tagged by kind as spec §4.1 requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Uint(u64),
    Double(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Null,
}

/// One `(key, value)` entry in a map literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: ExprNode,
    pub value: ExprNode,
}

/// One `(name, value)` field in an object literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectField {
    pub name: String,
    pub value: ExprNode,
}

/// The generic iteration primitive that every built-in macro desugars to
/// (spec §3, §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comprehension {
    pub iter_var: String,
    pub iter_range: Box<ExprNode>,
    pub accu_var: String,
    pub init: Box<ExprNode>,
    pub loop_condition: Box<ExprNode>,
    pub loop_step: Box<ExprNode>,
    pub result: Box<ExprNode>,
}

/// The accumulator name synthesized by macro expansion. Non-shadowable: the
/// parser never produces an identifier with this spelling from source text.
pub const ACCUMULATOR_VAR: &str = "@result";

/// One AST node's payload, exactly the variants listed in spec §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    /// `test_only` is `true` only when produced by the `has(...)` macro.
    Select {
        target: Box<ExprNode>,
        field: String,
        test_only: bool,
    },
    /// `target` present indicates a receiver-style (member) call.
    Call {
        target: Option<Box<ExprNode>>,
        function: String,
        args: Vec<ExprNode>,
    },
    CreateList(Vec<ExprNode>),
    CreateMap(Vec<MapEntry>),
    CreateObject { type_name: String, fields: Vec<ObjectField> },
    Comprehension(Comprehension),
}

/// An [`Expr`] together with its stable identity and source position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprNode {
    pub id: NodeId,
    pub location: SourceLocation,
    pub expr: Expr,
}

impl ExprNode {
    #[must_use]
    pub fn new(id: NodeId, location: SourceLocation, expr: Expr) -> Self {
        Self { id, location, expr }
    }

    /// Collects every node id in this subtree, depth-first. Used by the id
    /// uniqueness test (spec §8.1) and by annotation-table sanity checks.
    pub fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.id);
        match &self.expr {
            Expr::Literal(_) | Expr::Ident(_) => {}
            Expr::Select { target, .. } => target.collect_ids(out),
            Expr::Call { target, args, .. } => {
                if let Some(target) = target {
                    target.collect_ids(out);
                }
                for a in args {
                    a.collect_ids(out);
                }
            }
            Expr::CreateList(elements) => {
                for e in elements {
                    e.collect_ids(out);
                }
            }
            Expr::CreateMap(entries) => {
                for e in entries {
                    e.key.collect_ids(out);
                    e.value.collect_ids(out);
                }
            }
            Expr::CreateObject { fields, .. } => {
                for f in fields {
                    f.value.collect_ids(out);
                }
            }
            Expr::Comprehension(c) => {
                c.iter_range.collect_ids(out);
                c.init.collect_ids(out);
                c.loop_condition.collect_ids(out);
                c.loop_step.collect_ids(out);
                c.result.collect_ids(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_generator_is_monotonic_and_starts_at_one() {
        let mut gen = IdGenerator::new();
        assert_eq!(gen.next_id(), NodeId(1));
        assert_eq!(gen.next_id(), NodeId(2));
        assert_eq!(gen.next_id(), NodeId(3));
    }
}

//! Recursive-descent parser producing an [`ExprNode`] tree from source text,
//! expanding macro calls inline as they're recognized (spec §4.1 "Parsing").
//!
//! The grammar follows the precedence ladder in spec §4.1: ternary, `||`,
//! `&&`, a single relational comparison, additive, multiplicative, unary,
//! then postfix select/index/call chains over primaries.

use std::collections::HashMap;

use crate::ast::{Expr, ExprNode, IdGenerator, Literal, MapEntry, NodeId, ObjectField, SourceLocation};
use crate::error::{CelError, Diagnostic};
use crate::lexer::{self, Tok, Token};
use crate::macros;

/// Parser output: the root expression, any diagnostics collected along the
/// way (parsing continues past small errors where it can), and — when
/// requested — the pre-expansion call node for every macro invocation,
/// keyed by the [`NodeId`] of the expanded node replacing it (spec §4.1
/// "Macro call tracking", needed for source-mapped error messages in tools
/// built on top of this crate).
pub struct ParseResult {
    pub root: ExprNode,
    pub diagnostics: Vec<Diagnostic>,
    pub macro_calls: HashMap<NodeId, ExprNode>,
}

/// Parses `source` into an expression tree. `track_macro_calls` controls
/// whether the pre-expansion call shape is retained per macro-expanded node.
pub fn parse(source: &str, track_macro_calls: bool) -> Result<ParseResult, CelError> {
    let tokens = lexer::lex(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        id_gen: IdGenerator::new(),
        diagnostics: Vec::new(),
        macro_calls: HashMap::new(),
        track_macro_calls,
    };
    let root = parser.parse_expr()?;
    parser.expect(&Tok::Eof)?;
    Ok(ParseResult {
        root,
        diagnostics: parser.diagnostics,
        macro_calls: parser.macro_calls,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    id_gen: IdGenerator,
    diagnostics: Vec<Diagnostic>,
    macro_calls: HashMap<NodeId, ExprNode>,
    track_macro_calls: bool,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn loc(&self) -> SourceLocation {
        self.tokens[self.pos].location
    }

    fn advance(&mut self) -> Tok {
        let tok = self.tokens[self.pos].tok.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: &Tok) -> Result<(), CelError> {
        if self.peek() == want {
            self.advance();
            Ok(())
        } else {
            Err(CelError::syntax(format!("expected {want:?}, found {:?}", self.peek())).at(self.loc()))
        }
    }

    fn node(&mut self, loc: SourceLocation, expr: Expr) -> ExprNode {
        ExprNode::new(self.id_gen.next_id(), loc, expr)
    }

    // expr := conditionalOr ('?' conditionalOr ':' expr)?
    fn parse_expr(&mut self) -> Result<ExprNode, CelError> {
        let loc = self.loc();
        let cond = self.parse_conditional_or()?;
        if *self.peek() == Tok::Question {
            self.advance();
            let then_branch = self.parse_conditional_or()?;
            self.expect(&Tok::Colon)?;
            let else_branch = self.parse_expr()?;
            return Ok(self.node(
                loc,
                Expr::Call {
                    target: None,
                    function: "_?_:_".to_string(),
                    args: vec![cond, then_branch, else_branch],
                },
            ));
        }
        Ok(cond)
    }

    fn parse_conditional_or(&mut self) -> Result<ExprNode, CelError> {
        let loc = self.loc();
        let mut lhs = self.parse_conditional_and()?;
        while *self.peek() == Tok::OrOr {
            self.advance();
            let rhs = self.parse_conditional_and()?;
            lhs = self.node(
                loc,
                Expr::Call {
                    target: None,
                    function: "_||_".to_string(),
                    args: vec![lhs, rhs],
                },
            );
        }
        Ok(lhs)
    }

    fn parse_conditional_and(&mut self) -> Result<ExprNode, CelError> {
        let loc = self.loc();
        let mut lhs = self.parse_relation()?;
        while *self.peek() == Tok::AndAnd {
            self.advance();
            let rhs = self.parse_relation()?;
            lhs = self.node(
                loc,
                Expr::Call {
                    target: None,
                    function: "_&&_".to_string(),
                    args: vec![lhs, rhs],
                },
            );
        }
        Ok(lhs)
    }

    fn parse_relation(&mut self) -> Result<ExprNode, CelError> {
        let loc = self.loc();
        let mut lhs = self.parse_addition()?;
        loop {
            let function = match self.peek() {
                Tok::Lt => "_<_",
                Tok::Le => "_<=_",
                Tok::Gt => "_>_",
                Tok::Ge => "_>=_",
                Tok::Eq => "_==_",
                Tok::Ne => "_!=_",
                Tok::In => "@in",
                _ => break,
            };
            self.advance();
            let rhs = self.parse_addition()?;
            lhs = self.node(
                loc,
                Expr::Call {
                    target: None,
                    function: function.to_string(),
                    args: vec![lhs, rhs],
                },
            );
        }
        Ok(lhs)
    }

    fn parse_addition(&mut self) -> Result<ExprNode, CelError> {
        let loc = self.loc();
        let mut lhs = self.parse_multiplication()?;
        loop {
            let function = match self.peek() {
                Tok::Plus => "_+_",
                Tok::Minus => "_-_",
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplication()?;
            lhs = self.node(
                loc,
                Expr::Call {
                    target: None,
                    function: function.to_string(),
                    args: vec![lhs, rhs],
                },
            );
        }
        Ok(lhs)
    }

    fn parse_multiplication(&mut self) -> Result<ExprNode, CelError> {
        let loc = self.loc();
        let mut lhs = self.parse_unary()?;
        loop {
            let function = match self.peek() {
                Tok::Star => "_*_",
                Tok::Slash => "_/_",
                Tok::Percent => "_%_",
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.node(
                loc,
                Expr::Call {
                    target: None,
                    function: function.to_string(),
                    args: vec![lhs, rhs],
                },
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<ExprNode, CelError> {
        let loc = self.loc();
        match self.peek() {
            Tok::Bang => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.node(
                    loc,
                    Expr::Call {
                        target: None,
                        function: "!_".to_string(),
                        args: vec![operand],
                    },
                ))
            }
            Tok::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.node(
                    loc,
                    Expr::Call {
                        target: None,
                        function: "-_".to_string(),
                        args: vec![operand],
                    },
                ))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<ExprNode, CelError> {
        let mut node = self.parse_primary()?;
        loop {
            match self.peek() {
                Tok::Dot => {
                    self.advance();
                    let loc = self.loc();
                    let field = self.expect_ident()?;
                    if *self.peek() == Tok::LParen {
                        self.advance();
                        let args = self.parse_call_args()?;
                        node = self.finish_call(loc, Some(node), field, args)?;
                    } else {
                        node = self.node(
                            loc,
                            Expr::Select {
                                target: Box::new(node),
                                field,
                                test_only: false,
                            },
                        );
                    }
                }
                Tok::LBracket => {
                    let loc = self.loc();
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&Tok::RBracket)?;
                    node = self.node(
                        loc,
                        Expr::Call {
                            target: None,
                            function: "_[_]".to_string(),
                            args: vec![node, index],
                        },
                    );
                }
                Tok::LBrace if matches!(node.expr, Expr::Ident(_) | Expr::Select { .. }) => {
                    let loc = self.loc();
                    let type_name = object_type_name(&node);
                    let Some(type_name) = type_name else { break };
                    self.advance();
                    let fields = self.parse_object_fields()?;
                    node = self.node(loc, Expr::CreateObject { type_name, fields });
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_call_args(&mut self) -> Result<Vec<ExprNode>, CelError> {
        let mut args = Vec::new();
        if *self.peek() != Tok::RParen {
            loop {
                args.push(self.parse_expr()?);
                if *self.peek() == Tok::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Tok::RParen)?;
        Ok(args)
    }

    /// Builds a call node, expanding it in place if its shape matches the
    /// fixed macro table (spec §4.1 "Macro expansion").
    fn finish_call(&mut self, loc: SourceLocation, target: Option<ExprNode>, function: String, mut args: Vec<ExprNode>) -> Result<ExprNode, CelError> {
        let has_target = target.is_some();
        if macros::is_macro(has_target, &function, args.len()) {
            let original_target = target.clone();
            let original_args = args.clone();
            let expanded = match (has_target, function.as_str(), args.len()) {
                (false, "has", 1) => {
                    let arg = args.remove(0);
                    match arg.expr {
                        Expr::Select { target, field, .. } => Some(macros::expand_has(*target, field)),
                        _ => {
                            self.diagnostics.push(Diagnostic::new("has() requires a field selection argument", loc));
                            args.insert(0, arg);
                            None
                        }
                    }
                }
                (true, "all", 2) => self.expand_iteration(&mut args, target.clone().unwrap(), loc, |g, l, v, r, p| {
                    Expr::Comprehension(macros::expand_all(g, l, v, r, p))
                })?,
                (true, "exists", 2) => self.expand_iteration(&mut args, target.clone().unwrap(), loc, |g, l, v, r, p| {
                    Expr::Comprehension(macros::expand_exists(g, l, v, r, p))
                })?,
                (true, "exists_one", 2) => self.expand_iteration(&mut args, target.clone().unwrap(), loc, |g, l, v, r, p| {
                    Expr::Comprehension(macros::expand_exists_one(g, l, v, r, p))
                })?,
                (true, "filter", 2) => self.expand_iteration(&mut args, target.clone().unwrap(), loc, |g, l, v, r, p| {
                    Expr::Comprehension(macros::expand_filter(g, l, v, r, p))
                })?,
                (true, "map", 2) => self.expand_iteration(&mut args, target.clone().unwrap(), loc, |g, l, v, r, p| {
                    Expr::Comprehension(macros::expand_map(g, l, v, r, p))
                })?,
                (true, "map", 3) => {
                    if let Expr::Ident(iter_var) = args[0].expr.clone() {
                        let filter = args.remove(1);
                        let transform = args.remove(1);
                        Some(Expr::Comprehension(macros::expand_map_filter(
                            &mut self.id_gen,
                            loc,
                            iter_var,
                            target.clone().unwrap(),
                            filter,
                            transform,
                        )))
                    } else {
                        self.diagnostics.push(Diagnostic::new("map() requires an identifier loop variable", loc));
                        None
                    }
                }
                _ => None,
            };
            if let Some(expr) = expanded {
                let expanded_node = self.node(loc, expr);
                if self.track_macro_calls {
                    let original = self.node(
                        loc,
                        Expr::Call {
                            target: original_target.map(Box::new),
                            function,
                            args: original_args,
                        },
                    );
                    self.macro_calls.insert(expanded_node.id, original);
                }
                return Ok(expanded_node);
            }
        }
        Ok(self.node(
            loc,
            Expr::Call {
                target: target.map(Box::new),
                function,
                args,
            },
        ))
    }

    fn expand_iteration(
        &mut self,
        args: &mut Vec<ExprNode>,
        target: ExprNode,
        loc: SourceLocation,
        build: impl FnOnce(&mut IdGenerator, SourceLocation, String, ExprNode, ExprNode) -> Expr,
    ) -> Result<Option<Expr>, CelError> {
        let iter_var_expr = args.remove(0);
        let pred = args.remove(0);
        match iter_var_expr.expr {
            Expr::Ident(iter_var) => Ok(Some(build(&mut self.id_gen, loc, iter_var, target, pred))),
            _ => {
                self.diagnostics.push(Diagnostic::new("comprehension macros require an identifier loop variable", loc));
                Ok(None)
            }
        }
    }

    fn parse_object_fields(&mut self) -> Result<Vec<ObjectField>, CelError> {
        let mut fields = Vec::new();
        if *self.peek() != Tok::RBrace {
            loop {
                let name = self.expect_ident()?;
                self.expect(&Tok::Colon)?;
                let value = self.parse_expr()?;
                fields.push(ObjectField { name, value });
                if *self.peek() == Tok::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Tok::RBrace)?;
        Ok(fields)
    }

    fn parse_primary(&mut self) -> Result<ExprNode, CelError> {
        let loc = self.loc();
        match self.peek().clone() {
            Tok::Int(v) => {
                self.advance();
                Ok(self.node(loc, Expr::Literal(Literal::Int(v))))
            }
            Tok::Uint(v) => {
                self.advance();
                Ok(self.node(loc, Expr::Literal(Literal::Uint(v))))
            }
            Tok::Double(v) => {
                self.advance();
                Ok(self.node(loc, Expr::Literal(Literal::Double(v))))
            }
            Tok::Str(v) => {
                self.advance();
                Ok(self.node(loc, Expr::Literal(Literal::String(v))))
            }
            Tok::Bytes(v) => {
                self.advance();
                Ok(self.node(loc, Expr::Literal(Literal::Bytes(v))))
            }
            Tok::Bool(v) => {
                self.advance();
                Ok(self.node(loc, Expr::Literal(Literal::Bool(v))))
            }
            Tok::Null => {
                self.advance();
                Ok(self.node(loc, Expr::Literal(Literal::Null)))
            }
            Tok::Dot => {
                self.advance();
                let name = self.expect_ident()?;
                self.parse_ident_or_call(loc, format!(".{name}"))
            }
            Tok::Ident(name) => {
                self.advance();
                self.parse_ident_or_call(loc, name)
            }
            Tok::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&Tok::RParen)?;
                Ok(inner)
            }
            Tok::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if *self.peek() != Tok::RBracket {
                    loop {
                        elements.push(self.parse_expr()?);
                        if *self.peek() == Tok::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(&Tok::RBracket)?;
                Ok(self.node(loc, Expr::CreateList(elements)))
            }
            Tok::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                if *self.peek() != Tok::RBrace {
                    loop {
                        let key = self.parse_expr()?;
                        self.expect(&Tok::Colon)?;
                        let value = self.parse_expr()?;
                        entries.push(MapEntry { key, value });
                        if *self.peek() == Tok::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(&Tok::RBrace)?;
                Ok(self.node(loc, Expr::CreateMap(entries)))
            }
            other => Err(CelError::syntax(format!("unexpected token {other:?}")).at(loc)),
        }
    }

    /// An identifier not immediately followed by `(` is a variable/namespace
    /// reference; followed by `(` it's a global function call.
    fn parse_ident_or_call(&mut self, loc: SourceLocation, name: String) -> Result<ExprNode, CelError> {
        if *self.peek() == Tok::LParen {
            self.advance();
            let args = self.parse_call_args()?;
            self.finish_call(loc, None, name, args)
        } else {
            Ok(self.node(loc, Expr::Ident(name)))
        }
    }

    fn expect_ident(&mut self) -> Result<String, CelError> {
        match self.peek().clone() {
            Tok::Ident(name) => {
                self.advance();
                Ok(name)
            }
            // contextual keywords are valid field/function names after `.`
            Tok::In => {
                self.advance();
                Ok("in".to_string())
            }
            Tok::Bool(b) => {
                self.advance();
                Ok(b.to_string())
            }
            Tok::Null => {
                self.advance();
                Ok("null".to_string())
            }
            other => Err(CelError::syntax(format!("expected identifier, found {other:?}")).at(self.loc())),
        }
    }
}

/// Collapses a select/ident chain into a dotted type name for object-literal
/// construction (`pkg.Msg{...}`), spec §4.1 "CreateObject".
fn object_type_name(node: &ExprNode) -> Option<String> {
    match &node.expr {
        Expr::Ident(name) => Some(name.clone()),
        Expr::Select { target, field, test_only: false } => object_type_name(target).map(|base| format!("{base}.{field}")),
        _ => None,
    }
}

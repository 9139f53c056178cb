//! Type checker (spec §4.2): resolves identifiers, overloads, and parametric
//! types via unification, producing a per-node-id type table and reference
//! annotations. Never mutates the AST; check errors are accumulated and the
//! walk continues with the node assigned the `error` type (spec §4.2
//! "Failure semantics").

use std::collections::HashMap;

use crate::ast::{Expr, ExprNode, Literal, NodeId};
use crate::config::Config;
use crate::container::Container;
use crate::error::Diagnostic;
use crate::registry::Registry;
use crate::types::{assignable, most_general, Substitution, Type};

/// What an identifier/select/call node resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// A variable or loop-local binding, named by its resolved qualified name
    /// (or the bare local name for comprehension variables).
    Variable(String),
    /// A qualified object type name resolved via container/abbreviation rules.
    ObjectType(String),
    /// The ids of every overload that matched this call (spec §4.2 "If
    /// multiple overloads match, all are recorded").
    Function(Vec<String>),
}

/// The checker's output: per-node-id resolved types and reference
/// annotations, plus accumulated diagnostics.
#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    pub types: HashMap<NodeId, Type>,
    pub references: HashMap<NodeId, Reference>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Checks `root` against `registry`'s declarations, resolving references
/// relative to `container`.
#[must_use]
pub fn check(root: &ExprNode, registry: &Registry, container: &Container, config: &Config) -> CheckResult {
    let mut checker = Checker {
        registry,
        container,
        config,
        result: CheckResult::default(),
        scopes: Vec::new(),
    };
    let mut subst = Substitution::new();
    checker.check_expr(root, &mut subst);
    checker.result
}

struct Checker<'a> {
    registry: &'a Registry,
    container: &'a Container,
    config: &'a Config,
    result: CheckResult,
    /// Comprehension-local bindings, innermost scope last (spec §3
    /// "Comprehension loop variables shadow outer bindings").
    scopes: Vec<HashMap<String, Type>>,
}

impl<'a> Checker<'a> {
    fn error(&mut self, node: &ExprNode, message: impl Into<String>) -> Type {
        self.result.diagnostics.push(Diagnostic::new(message, node.location));
        self.result.types.insert(node.id, Type::Error);
        Type::Error
    }

    fn set_type(&mut self, node: &ExprNode, ty: Type) -> Type {
        self.result.types.insert(node.id, ty.clone());
        ty
    }

    fn local_lookup(&self, name: &str) -> Option<Type> {
        self.scopes.iter().rev().find_map(|s| s.get(name).cloned())
    }

    fn check_expr(&mut self, node: &ExprNode, subst: &mut Substitution) -> Type {
        let ty = match &node.expr {
            Expr::Literal(lit) => literal_type(lit),
            Expr::Ident(name) => self.check_ident(node, name),
            Expr::Select { target, field, test_only } => self.check_select(node, target, field, *test_only, subst),
            Expr::Call { target, function, args } => self.check_call(node, target.as_deref(), function, args, subst),
            Expr::CreateList(elements) => self.check_create_list(node, elements, subst),
            Expr::CreateMap(entries) => self.check_create_map(node, entries, subst),
            Expr::CreateObject { type_name, fields } => self.check_create_object(node, type_name, fields, subst),
            Expr::Comprehension(c) => self.check_comprehension(node, c, subst),
        };
        self.set_type(node, ty)
    }

    fn check_ident(&mut self, node: &ExprNode, name: &str) -> Type {
        if let Some(ty) = self.local_lookup(name) {
            self.result.references.insert(node.id, Reference::Variable(name.to_string()));
            return ty;
        }
        for candidate in self.container.candidates(name) {
            if let Some(ty) = self.registry.lookup_variable(&candidate) {
                self.result.references.insert(node.id, Reference::Variable(candidate));
                return ty.clone();
            }
            if self.registry.lookup_object_type(&candidate) {
                self.result.references.insert(node.id, Reference::ObjectType(candidate.clone()));
                return Type::TypeValue(Box::new(Type::Object(candidate)));
            }
        }
        self.error(node, format!("undeclared reference to '{name}'"))
    }

    fn check_select(&mut self, node: &ExprNode, target: &ExprNode, field: &str, test_only: bool, subst: &mut Substitution) -> Type {
        let target_ty = self.check_expr(target, subst);
        let result = match &target_ty {
            Type::Dyn | Type::Error => Type::Dyn,
            Type::Map(_, v) => (**v).clone(),
            Type::Object(name) => match self.registry.object_field_type(name, field) {
                Some(field_ty) => field_ty,
                None => return self.error(node, format!("undefined field '{field}' on type {name}")),
            },
            other => return self.error(node, format!("cannot select field '{field}' on non-selectable type {other}")),
        };
        if test_only {
            Type::Bool
        } else {
            result
        }
    }

    fn check_create_list(&mut self, node: &ExprNode, elements: &[ExprNode], subst: &mut Substitution) -> Type {
        let mut elem_ty = Type::Dyn;
        let mut first = true;
        for e in elements {
            let t = self.check_expr(e, subst);
            if first {
                elem_ty = t;
                first = false;
            } else if self.config.homogeneous_aggregate_literals {
                if !assignable(&elem_ty, &t, subst) && !assignable(&t, &elem_ty, subst) {
                    self.error(node, "list literal elements must share one type");
                }
            } else {
                elem_ty = most_general(&elem_ty, &t);
            }
        }
        Type::list(elem_ty)
    }

    fn check_create_map(&mut self, node: &ExprNode, entries: &[crate::ast::MapEntry], subst: &mut Substitution) -> Type {
        let mut key_ty = Type::Dyn;
        let mut val_ty = Type::Dyn;
        let mut first = true;
        for e in entries {
            let k = self.check_expr(&e.key, subst);
            let v = self.check_expr(&e.value, subst);
            if first {
                key_ty = k;
                val_ty = v;
                first = false;
            } else if self.config.homogeneous_aggregate_literals {
                if !assignable(&key_ty, &k, subst) && !assignable(&k, &key_ty, subst) {
                    self.error(node, "map literal keys must share one type");
                }
                if !assignable(&val_ty, &v, subst) && !assignable(&v, &val_ty, subst) {
                    self.error(node, "map literal values must share one type");
                }
            } else {
                key_ty = most_general(&key_ty, &k);
                val_ty = most_general(&val_ty, &v);
            }
        }
        Type::map(key_ty, val_ty)
    }

    fn check_create_object(&mut self, node: &ExprNode, type_name: &str, fields: &[crate::ast::ObjectField], subst: &mut Substitution) -> Type {
        let resolved = self
            .container
            .candidates(type_name)
            .into_iter()
            .find(|c| self.registry.lookup_object_type(c));
        let Some(resolved) = resolved else {
            return self.error(node, format!("unknown object type: {type_name}"));
        };
        for field in fields {
            let field_ty = self.check_expr(&field.value, subst);
            match self.registry.object_field_type(&resolved, &field.name) {
                Some(declared) if !assignable(&declared, &field_ty, subst) => {
                    self.error(node, format!("field '{}' of {resolved} expects {declared}, got {field_ty}", field.name));
                }
                None => {
                    self.error(node, format!("unknown field '{}' on type {resolved}", field.name));
                }
                _ => {}
            }
        }
        self.result.references.insert(node.id, Reference::ObjectType(resolved.clone()));
        Type::Object(resolved)
    }

    fn check_comprehension(&mut self, _node: &ExprNode, c: &crate::ast::Comprehension, subst: &mut Substitution) -> Type {
        let range_ty = self.check_expr(&c.iter_range, subst);
        let iter_var_ty = match &range_ty {
            Type::List(elem) => (**elem).clone(),
            Type::Map(key, _) => (**key).clone(),
            Type::Dyn | Type::Error => Type::Dyn,
            other => {
                self.result
                    .diagnostics
                    .push(Diagnostic::new(format!("comprehension range must be list, map, or dyn, got {other}"), c.iter_range.location));
                Type::Error
            }
        };
        let init_ty = self.check_expr(&c.init, subst);

        self.scopes.push(HashMap::from([(c.iter_var.clone(), iter_var_ty), (c.accu_var.clone(), init_ty.clone())]));

        let cond_ty = self.check_expr(&c.loop_condition, subst);
        if !matches!(cond_ty, Type::Bool | Type::Dyn | Type::Error) {
            self.result
                .diagnostics
                .push(Diagnostic::new(format!("loop condition must be bool or dyn, got {cond_ty}"), c.loop_condition.location));
        }
        let step_ty = self.check_expr(&c.loop_step, subst);
        if !assignable(&init_ty, &step_ty, subst) {
            self.result.diagnostics.push(Diagnostic::new(
                format!("loop step type {step_ty} not assignable to accumulator type {init_ty}"),
                c.loop_step.location,
            ));
        }
        let result_ty = self.check_expr(&c.result, subst);
        self.scopes.pop();
        result_ty
    }

    fn check_call(&mut self, node: &ExprNode, target: Option<&ExprNode>, function: &str, args: &[ExprNode], subst: &mut Substitution) -> Type {
        let target_ty = target.map(|t| self.check_expr(t, subst));
        let arg_tys: Vec<Type> = args.iter().map(|a| self.check_expr(a, subst)).collect();

        let Some(decl) = self.registry.lookup_function(function) else {
            return self.error(node, format!("undeclared function: {function}"));
        };

        let mut full_args: Vec<Type> = target_ty.into_iter().collect();
        full_args.extend(arg_tys.iter().cloned());

        let mut matched_ids = Vec::new();
        let mut result_ty = None;
        for overload in &decl.overloads {
            if overload.is_member != target.is_some() {
                continue;
            }
            if overload.arg_types.len() != full_args.len() {
                continue;
            }
            let mut trial = subst.clone();
            let ok = overload
                .arg_types
                .iter()
                .zip(&full_args)
                .all(|(param, arg)| assignable(param, arg, &mut trial));
            if ok {
                matched_ids.push(overload.id.clone());
                if result_ty.is_none() {
                    result_ty = Some(trial.resolve(&overload.result_type));
                    *subst = trial;
                }
            }
        }

        if matched_ids.is_empty() {
            let arg_strings: Vec<String> = full_args.iter().map(ToString::to_string).collect();
            return self.error(node, format!("no such overload: {function}({})", arg_strings.join(", ")));
        }
        self.result.references.insert(node.id, Reference::Function(matched_ids));
        result_ty.unwrap_or(Type::Dyn)
    }
}

fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Int(_) => Type::Int,
        Literal::Uint(_) => Type::Uint,
        Literal::Double(_) => Type::Double,
        Literal::Bool(_) => Type::Bool,
        Literal::String(_) => Type::String,
        Literal::Bytes(_) => Type::Bytes,
        Literal::Null => Type::Null,
    }
}

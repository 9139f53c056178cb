//! A CEL-like expression language: parser, type checker, and tree-walking
//! interpreter over a typed value model (spec §1 "Overview").
//!
//! The pipeline is the same three stages throughout the module layout:
//! [`parser`] produces an [`ast::ExprNode`] tree (expanding [`macros`] as it
//! goes), [`checker`] annotates that tree with resolved types and
//! references, and [`interpreter`] walks it against an [`activation::Activation`].
//! [`program`] wires the three stages into one `compile`-then-`eval` surface
//! for callers who don't need the stages separately.

pub mod activation;
pub mod ast;
pub mod attribute;
pub mod checker;
pub mod config;
pub mod container;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod program;
pub mod provider;
pub mod registry;
pub mod residual;
pub mod resource;
pub mod stdlib;
pub mod tracer;
pub mod types;
pub mod value;

pub use activation::Activation;
pub use config::Config;
pub use container::Container;
pub use error::{CelError, CelResult, ErrorKind};
pub use program::{EvalDetails, Program};
pub use value::Value;

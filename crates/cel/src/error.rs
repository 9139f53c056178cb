//! Error and diagnostic types shared by the parser, checker, and interpreter.
//!
//! Mirrors the shape of a typical tree-walking embeddable interpreter: a flat,
//! `strum`-derived enum of error *kinds* (not Rust types) plus one carrier
//! struct, rather than a `thiserror` hierarchy of distinct error types per
//! stage.

use std::fmt;

use strum::{Display, EnumString};

use crate::ast::SourceLocation;

/// Broad classification of why an operation failed.
///
/// Matches the kinds enumerated in the specification exactly. `Unknown` is
/// deliberately absent: an unresolved attribute under partial evaluation is a
/// [`crate::value::Value::Unknown`] value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ErrorKind {
    /// Parser-level failure, surfaced with a source position.
    Syntax,
    /// Unresolved identifier, unknown function, or undeclared type.
    Name,
    /// Assignability failure, unknown field, no matching overload, bad arity.
    Type,
    /// Overflow, divide-by-zero, range violation.
    Arithmetic,
    /// Bad numeric narrowing, invalid UTF-8, malformed timestamp/duration string.
    Conversion,
    /// No such key, index out of range.
    Access,
    /// Evaluation was cancelled via the interpreter's polling point.
    Interrupted,
}

/// A single error produced while compiling or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CelError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl CelError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    #[must_use]
    pub fn name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name, message)
    }

    #[must_use]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    #[must_use]
    pub fn arithmetic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arithmetic, message)
    }

    #[must_use]
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conversion, message)
    }

    #[must_use]
    pub fn access(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Access, message)
    }

    #[must_use]
    pub fn interrupted() -> Self {
        Self::new(ErrorKind::Interrupted, "operation interrupted")
    }

    #[must_use]
    pub fn no_such_overload(name: &str, arg_types: &[String]) -> Self {
        Self::type_error(format!("no such overload: {name}({})", arg_types.join(", ")))
    }
}

impl fmt::Display for CelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{}: {} ({}:{})", self.kind, self.message, loc.line, loc.column)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for CelError {}

pub type CelResult<T> = Result<T, CelError>;

/// One non-fatal parse or check diagnostic, with enough positional
/// information to render the `ERROR: <file>:<line>:<col>: <message>` format
/// described in spec §6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    #[must_use]
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }

    /// Renders this diagnostic against a source string, producing the
    /// `ERROR: <file>:<line>:<col>: <message>` block plus the offending line
    /// and a `^` underline, per spec §6.
    #[must_use]
    pub fn render(&self, file: &str, source: &str) -> String {
        let offending_line = source.lines().nth(self.location.line.saturating_sub(1)).unwrap_or("");
        let caret_pad = " ".repeat(self.location.column.saturating_sub(1));
        format!(
            "ERROR: {file}:{}:{}: {}\n{offending_line}\n{caret_pad}^",
            self.location.line, self.location.column, self.message
        )
    }
}

/// Renders a full diagnostic list, concatenated in source order, per spec §6.
#[must_use]
pub fn render_diagnostics(file: &str, source: &str, diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.render(file, source))
        .collect::<Vec<_>>()
        .join("\n")
}

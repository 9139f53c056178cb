//! The variable-binding store the interpreter consults, plus the stacked
//! frames a running comprehension pushes (spec §9 "Activation as a frame
//! stack", GLOSSARY "Activation").

use std::collections::HashMap;

use crate::attribute::AttributePattern;
use crate::value::Value;

/// One comprehension's local bindings (`iter_var`, `accu_var`). Frames are
/// pushed on loop entry and popped on loop exit; lookup walks innermost-first
/// so a loop variable shadows any outer binding of the same name for the
/// loop body only (spec §3 "Comprehension loop variables shadow...").
#[derive(Debug, Default)]
struct Frame {
    bindings: HashMap<String, Value>,
}

/// A value store consulted by the interpreter for variable bindings, with an
/// optional set of attribute patterns for partial evaluation (spec GLOSSARY
/// "Activation").
#[derive(Debug, Default)]
pub struct Activation {
    root: HashMap<String, Value>,
    frames: Vec<Frame>,
    patterns: Vec<AttributePattern>,
}

impl Activation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_patterns(patterns: Vec<AttributePattern>) -> Self {
        Self {
            patterns,
            ..Self::default()
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.root.insert(name.into(), value);
    }

    #[must_use]
    pub fn patterns(&self) -> &[AttributePattern] {
        &self.patterns
    }

    pub fn add_pattern(&mut self, pattern: AttributePattern) {
        self.patterns.push(pattern);
    }

    pub(crate) fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Binds `name` in the innermost (current) frame. Panics if called with
    /// no frame pushed — only the interpreter's comprehension handling calls
    /// this, always inside a push/pop pair.
    pub(crate) fn bind_local(&mut self, name: impl Into<String>, value: Value) {
        self.frames.last_mut().expect("bind_local called outside a frame").bindings.insert(name.into(), value);
    }

    /// Looks up `name`, innermost frame first, falling back to the root
    /// bindings (spec §9: "lookup walks innermost-first").
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        for frame in self.frames.iter().rev() {
            if let Some(v) = frame.bindings.get(name) {
                return Some(v);
            }
        }
        self.root.get(name)
    }

    /// Whether `name` is bound by a comprehension frame — used to decide
    /// whether a reference should skip container-based qualified-name
    /// resolution entirely (a loop variable is never qualified).
    #[must_use]
    pub fn is_frame_local(&self, name: &str) -> bool {
        self.frames.iter().any(|f| f.bindings.contains_key(name))
    }
}

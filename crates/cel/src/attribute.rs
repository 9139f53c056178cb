//! Attributes: variable references plus ordered qualifier chains, and the
//! patterns partial evaluation matches them against (spec §4.4 "Attribute
//! resolution", "Partial evaluation").

use crate::ast::NodeId;
use crate::value::{MapKey, Value};

/// One qualifier in an attribute chain: a field name, or a literal key/index.
#[derive(Debug, Clone, PartialEq)]
pub enum Qualifier {
    Field(String),
    Index(QualifierKey),
}

/// The literal key forms a qualifier may carry (spec §4.4: "string qualifier
/// on a map", "integer qualifier on a list", "bool/uint/int qualifiers on
/// maps").
#[derive(Debug, Clone, PartialEq)]
pub enum QualifierKey {
    Int(i64),
    Uint(u64),
    Bool(bool),
    String(String),
}

impl QualifierKey {
    #[must_use]
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Int(i) => Some(Self::Int(*i)),
            Value::Uint(u) => Some(Self::Uint(*u)),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::String(s) => Some(Self::String(s.to_string())),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_map_key(&self) -> Option<MapKey> {
        match self {
            Self::Int(i) => Some(MapKey::Int(*i)),
            Self::Uint(u) => Some(MapKey::Uint(*u)),
            Self::Bool(b) => Some(MapKey::Bool(*b)),
            Self::String(s) => Some(MapKey::String(s.as_str().into())),
        }
    }
}

/// A resolved-or-resolving attribute: the root variable (with its node id, so
/// "the pattern matches the bare variable" can name a concrete id) and the
/// ordered qualifiers applied to it, each tagged with the node id of the
/// select/index expression that produced it.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub var_node_id: NodeId,
    pub var_name: String,
    pub qualifiers: Vec<(NodeId, Qualifier)>,
}

impl Attribute {
    #[must_use]
    pub fn root(var_node_id: NodeId, var_name: impl Into<String>) -> Self {
        Self {
            var_node_id,
            var_name: var_name.into(),
            qualifiers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_qualifier(mut self, node_id: NodeId, qualifier: Qualifier) -> Self {
        self.qualifiers.push((node_id, qualifier));
        self
    }
}

/// One qualifier slot in a pattern: either a literal to match exactly, or a
/// wildcard matching any qualifier in that position.
#[derive(Debug, Clone, PartialEq)]
pub enum QualifierPattern {
    Literal(QualifierKey),
    Wildcard,
}

impl QualifierPattern {
    fn matches(&self, qualifier: &Qualifier) -> bool {
        match (self, qualifier) {
            (Self::Wildcard, _) => true,
            (Self::Literal(QualifierKey::String(s)), Qualifier::Field(f)) => s == f,
            (Self::Literal(key), Qualifier::Index(other)) => key == other,
            _ => false,
        }
    }
}

/// A declared unknown region of the attribute space: a variable name plus an
/// ordered sequence of qualifier patterns (spec §4.4 "Partial evaluation").
#[derive(Debug, Clone)]
pub struct AttributePattern {
    pub var_name: String,
    pub qualifiers: Vec<QualifierPattern>,
}

impl AttributePattern {
    #[must_use]
    pub fn new(var_name: impl Into<String>, qualifiers: Vec<QualifierPattern>) -> Self {
        Self {
            var_name: var_name.into(),
            qualifiers,
        }
    }

    /// If `attribute`'s prefix matches this pattern, returns the node id of
    /// the first qualifier after the match point (or the variable's own node
    /// id when the pattern matches the bare variable, i.e. has zero
    /// qualifiers).
    #[must_use]
    pub fn matching_unknown_id(&self, attribute: &Attribute) -> Option<NodeId> {
        if self.var_name != attribute.var_name {
            return None;
        }
        if self.qualifiers.len() > attribute.qualifiers.len() {
            return None;
        }
        for (pattern, (_, qualifier)) in self.qualifiers.iter().zip(&attribute.qualifiers) {
            if !pattern.matches(qualifier) {
                return None;
            }
        }
        Some(
            attribute
                .qualifiers
                .get(self.qualifiers.len())
                .map_or(attribute.var_node_id, |(id, _)| *id),
        )
    }
}

/// Tests `attribute` against every pattern, returning the first match's
/// unknown-root id, if any.
#[must_use]
pub fn first_match<'a>(attribute: &Attribute, patterns: impl IntoIterator<Item = &'a AttributePattern>) -> Option<NodeId> {
    patterns.into_iter().find_map(|p| p.matching_unknown_id(attribute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_variable_pattern_matches_variable_itself() {
        let attr = Attribute::root(NodeId(1), "y");
        let pattern = AttributePattern::new("y", vec![]);
        assert_eq!(pattern.matching_unknown_id(&attr), Some(NodeId(1)));
    }

    #[test]
    fn wildcard_matches_any_qualifier_and_points_past_match() {
        let attr = Attribute::root(NodeId(1), "msg").with_qualifier(NodeId(2), Qualifier::Field("f".into()));
        let pattern = AttributePattern::new("msg", vec![QualifierPattern::Wildcard]);
        assert_eq!(pattern.matching_unknown_id(&attr), Some(NodeId(2)));
    }

    #[test]
    fn mismatched_variable_name_does_not_match() {
        let attr = Attribute::root(NodeId(1), "x");
        let pattern = AttributePattern::new("y", vec![]);
        assert_eq!(pattern.matching_unknown_id(&attr), None);
    }

    #[test]
    fn pattern_longer_than_attribute_does_not_match() {
        let attr = Attribute::root(NodeId(1), "msg");
        let pattern = AttributePattern::new("msg", vec![QualifierPattern::Wildcard]);
        assert_eq!(pattern.matching_unknown_id(&attr), None);
    }
}

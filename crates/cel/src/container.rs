//! Container-relative name resolution (spec §4.2 "Name resolution", GLOSSARY
//! "Container").

use std::collections::HashMap;

/// A dotted namespace plus an optional abbreviation table (short name ->
/// qualified name), used to turn a textual reference into an ordered list of
/// candidate fully-qualified names.
#[derive(Debug, Clone, Default)]
pub struct Container {
    namespace: String,
    abbrevs: HashMap<String, String>,
}

impl Container {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            abbrevs: HashMap::new(),
        }
    }

    #[must_use]
    pub fn root() -> Self {
        Self::new("")
    }

    pub fn add_abbrev(&mut self, short: impl Into<String>, qualified: impl Into<String>) {
        self.abbrevs.insert(short.into(), qualified.into());
    }

    /// Produces the ordered candidate list for `reference` (spec §4.2):
    /// enclosing-namespace-first, dropping one trailing segment of the
    /// container at a time, then the bare reference. A leading dot forces
    /// the reference to be absolute (only the bare reference is tried). An
    /// abbreviation match on the reference's head segment short-circuits to
    /// a single candidate.
    #[must_use]
    pub fn candidates(&self, reference: &str) -> Vec<String> {
        if let Some(rest) = reference.strip_prefix('.') {
            return vec![rest.to_string()];
        }

        let head = reference.split('.').next().unwrap_or(reference);
        if let Some(expansion) = self.abbrevs.get(head) {
            let tail = &reference[head.len()..];
            return vec![format!("{expansion}{tail}")];
        }

        let mut candidates = Vec::new();
        if self.namespace.is_empty() {
            candidates.push(reference.to_string());
            return candidates;
        }
        let segments: Vec<&str> = self.namespace.split('.').collect();
        for i in (0..=segments.len()).rev() {
            let prefix = segments[..i].join(".");
            if prefix.is_empty() {
                candidates.push(reference.to_string());
            } else {
                candidates.push(format!("{prefix}.{reference}"));
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_order_matches_spec_example() {
        let container = Container::new("p.q.r");
        assert_eq!(
            container.candidates("a.b.c"),
            vec!["p.q.r.a.b.c", "p.q.a.b.c", "p.a.b.c", "a.b.c"]
        );
    }

    #[test]
    fn leading_dot_is_absolute_only() {
        let container = Container::new("p.q.r");
        assert_eq!(container.candidates(".a.b"), vec!["a.b"]);
    }

    #[test]
    fn abbreviation_short_circuits_to_one_candidate() {
        let mut container = Container::new("p.q.r");
        container.add_abbrev("pb", "google.protobuf");
        assert_eq!(container.candidates("pb.Duration"), vec!["google.protobuf.Duration"]);
    }

    #[test]
    fn declared_parent_identifier_wins_over_deeper_candidate() {
        // container p.q.r with declared `p.a` — reference `a` must resolve to
        // `p.a`, not a hypothetical `p.q.r.a` (spec §8.6).
        let container = Container::new("p.q.r");
        let candidates = container.candidates("a");
        assert_eq!(candidates, vec!["p.q.r.a", "p.q.a", "p.a", "a"]);
        let declared = ["p.a"];
        let resolved = candidates.iter().find(|c| declared.contains(&c.as_str()));
        assert_eq!(resolved, Some(&"p.a".to_string()));
    }
}

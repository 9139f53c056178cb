//! Every node in a parsed (and macro-expanded) tree carries a distinct id,
//! monotonically assigned, including ids synthesized by macro desugaring.

use cel_core::parser::parse;

fn ids_are_unique_and_ascending(source: &str) {
    let parsed = parse(source, false).unwrap();
    let mut ids = Vec::new();
    parsed.root.collect_ids(&mut ids);

    let mut seen = std::collections::HashSet::new();
    for id in &ids {
        assert!(seen.insert(*id), "duplicate node id {id} in `{source}`");
    }

    // ids are handed out depth-first in parse order, so a BFS/DFS collection
    // need not be sorted overall, but every id collected must be >= 1 and
    // within the range the id generator could have produced.
    assert!(ids.iter().all(|id| id.0 >= 1), "id <= 0 found in `{source}`");
    assert!(ids.iter().all(|id| id.0 as usize <= ids.len() + 64), "implausibly large id in `{source}`");
}

#[test]
fn plain_arithmetic_expression_has_unique_ids() {
    ids_are_unique_and_ascending("1 + 2 * (3 - 4) / 5");
}

#[test]
fn nested_select_and_index_chain_has_unique_ids() {
    ids_are_unique_and_ascending("a.b.c[0].d[\"k\"]");
}

#[test]
fn macro_expanded_comprehension_has_unique_ids_including_synthesized_ones() {
    for source in [
        "[1,2,3].all(x, x > 0)",
        "[1,2,3].exists(x, x > 2)",
        "[1,2,3].exists_one(x, x == 2)",
        "[1,2,3].map(x, x * 2)",
        "[1,2,3].map(x, x > 1, x * 2)",
        "[1,2,3].filter(x, x > 1)",
        "has(a.b)",
    ] {
        ids_are_unique_and_ascending(source);
    }
}

#[test]
fn nested_macros_each_get_distinct_synthesized_ids() {
    ids_are_unique_and_ascending("[1,2].all(x, [3,4].exists(y, y == x))");
}

#[test]
fn object_and_map_literals_have_unique_ids_across_all_entries() {
    ids_are_unique_and_ascending("{'a': 1, 'b': 2}['a'] + Msg{f: 1, g: 2}.f");
}

#[test]
fn macro_call_original_node_ids_are_tracked_separately_from_expansion_ids() {
    let parsed = parse("[1].map(x, x + 1)", true).unwrap();
    let mut expanded_ids = Vec::new();
    parsed.root.collect_ids(&mut expanded_ids);

    for (expanded_root_id, original) in &parsed.macro_calls {
        assert!(expanded_ids.contains(expanded_root_id));
        let mut original_ids = Vec::new();
        original.collect_ids(&mut original_ids);
        assert!(!original_ids.is_empty());
    }
}

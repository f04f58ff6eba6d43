//! AST fingerprinter (§4.3): recursive SHA-256 subtree hashing with
//! sorted child hashes, plus structural metrics computed in the same pass.

use crate::hash_token;
use common::{is_trivial_kind, SubtreeInfo, UirNode};
use std::collections::{HashMap, HashSet};

/// Node kinds that count as a decision point for cyclomatic complexity.
const DECISION_KINDS: &[&str] = &[
    "If",
    "For",
    "While",
    "BoolOp",
    "LogicalExpression",
    "ExceptHandler",
    "ConditionalExpression",
    "MatchCase",
    "SwitchCase",
];

const FUNC_KINDS: &[&str] = &["FunctionDef", "FunctionDeclaration", "MethodDefinition"];
const LOOP_KINDS: &[&str] = &["For", "ForStatement", "While", "WhileStatement"];
const IF_KINDS: &[&str] = &["If", "IfStatement"];

/// Computes `h(node) = SHA256(type | sorted(child_hashes))` bottom-up,
/// recording a [`SubtreeInfo`] for every non-trivial node except the tree
/// root itself — the whole-file `Module`/`Program` node is never an
/// independent structural unit (matching the reference implementation,
/// which skips it via its line-0 `ast.Module`; our adapters are 1-indexed,
/// so the root is excluded by position in the walk instead of by line).
pub fn fingerprint_ast(
    root: &UirNode,
) -> (
    Vec<SubtreeInfo>,
    HashSet<String>,
    HashMap<String, Vec<[u32; 2]>>,
) {
    let mut infos = Vec::new();
    let mut hash_to_lines: HashMap<String, Vec<[u32; 2]>> = HashMap::new();
    walk(root, &mut infos, &mut hash_to_lines, true);
    let hash_set = infos.iter().map(|i| i.hash.clone()).collect();
    (infos, hash_set, hash_to_lines)
}

fn walk(
    node: &UirNode,
    infos: &mut Vec<SubtreeInfo>,
    hash_to_lines: &mut HashMap<String, Vec<[u32; 2]>>,
    is_root: bool,
) -> String {
    let mut child_hashes: Vec<String> = node
        .children
        .iter()
        .map(|c| walk(c, infos, hash_to_lines, false))
        .collect();
    child_hashes.sort();

    let payload = format!("{}|{}", node.kind, child_hashes.join("|"));
    let hash = hash_token(&payload);

    if !is_root && !is_trivial_kind(&node.kind) {
        infos.push(SubtreeInfo {
            hash: hash.clone(),
            start_line: node.start_line,
            end_line: node.end_line,
        });
        hash_to_lines
            .entry(hash.clone())
            .or_default()
            .push([node.start_line, node.end_line]);
    }

    hash
}

/// Structural metrics computed alongside the AST hash pass: depth, function
/// count, loop count, `if` count, and a basic cyclomatic complexity.
pub fn compute_ast_metrics(root: &UirNode) -> HashMap<String, i64> {
    let mut metrics = HashMap::new();
    let mut function_count = 0i64;
    let mut loop_count = 0i64;
    let mut if_count = 0i64;
    let mut decision_count = 0i64;

    let depth = visit(
        root,
        &mut function_count,
        &mut loop_count,
        &mut if_count,
        &mut decision_count,
    );

    metrics.insert("depth".to_string(), depth);
    metrics.insert("function_count".to_string(), function_count);
    metrics.insert("loop_count".to_string(), loop_count);
    metrics.insert("if_count".to_string(), if_count);
    metrics.insert("cyclomatic_complexity".to_string(), 1 + decision_count);
    metrics
}

fn visit(
    node: &UirNode,
    function_count: &mut i64,
    loop_count: &mut i64,
    if_count: &mut i64,
    decision_count: &mut i64,
) -> i64 {
    if FUNC_KINDS.contains(&node.kind.as_str()) {
        *function_count += 1;
    }
    if LOOP_KINDS.contains(&node.kind.as_str()) {
        *loop_count += 1;
    }
    if IF_KINDS.contains(&node.kind.as_str()) {
        *if_count += 1;
    }
    if DECISION_KINDS.contains(&node.kind.as_str()) {
        *decision_count += 1;
    }

    let child_depth = node
        .children
        .iter()
        .map(|c| visit(c, function_count, loop_count, if_count, decision_count))
        .max()
        .unwrap_or(0);
    child_depth + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UirNode;

    #[test]
    fn identical_trees_hash_identically() {
        let a = UirNode::with_children(
            "FunctionDef",
            1,
            2,
            vec![UirNode::leaf("Return", 2, 2)],
        );
        let b = a.clone();
        let (infos_a, set_a, _) = fingerprint_ast(&a);
        let (infos_b, set_b, _) = fingerprint_ast(&b);
        assert_eq!(set_a, set_b);
        assert_eq!(infos_a.len(), infos_b.len());
    }

    #[test]
    fn child_order_is_hash_insensitive() {
        let a = UirNode::with_children(
            "DictLiteral",
            1,
            1,
            vec![UirNode::leaf("Property", 1, 1), UirNode::leaf("Property", 2, 2)],
        );
        let b = UirNode::with_children(
            "DictLiteral",
            1,
            1,
            vec![UirNode::leaf("Property", 2, 2), UirNode::leaf("Property", 1, 1)],
        );
        let (_, set_a, _) = fingerprint_ast(&a);
        let (_, set_b, _) = fingerprint_ast(&b);
        assert_eq!(set_a, set_b);
    }

    #[test]
    fn trivial_nodes_are_not_recorded_standalone() {
        let ident = UirNode::leaf("Identifier", 1, 1).with_name("x");
        let (infos, _, _) = fingerprint_ast(&ident);
        assert!(infos.is_empty());
    }

    #[test]
    fn metrics_count_decision_points() {
        let tree = UirNode::with_children(
            "FunctionDef",
            1,
            4,
            vec![
                UirNode::with_children("If", 2, 3, vec![UirNode::leaf("Return", 3, 3)]),
                UirNode::leaf("Return", 4, 4),
            ],
        );
        let metrics = compute_ast_metrics(&tree);
        assert_eq!(metrics["function_count"], 1);
        assert_eq!(metrics["if_count"], 1);
        assert_eq!(metrics["cyclomatic_complexity"], 2);
    }
}

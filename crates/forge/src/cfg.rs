//! CFG fingerprinter (§4.4): function-local control-flow edges, hashed with
//! a distinct token prefix per edge, plus a module-level pass over top-level
//! statements outside any function/class body.

use crate::hash_token;
use common::UirNode;
use std::collections::HashSet;

const FUNC_KINDS: &[&str] = &["FunctionDef", "FunctionDeclaration", "MethodDefinition"];
const CLASS_KINDS: &[&str] = &["ClassDef", "ClassDeclaration"];

/// Node kinds that introduce a new CFG block: branches, loops, exception
/// handling, context-manager scopes, and pattern-match arms.
const SCOPE_STARTING_KINDS: &[&str] = &[
    "If",
    "IfStatement",
    "For",
    "ForStatement",
    "While",
    "WhileStatement",
    "DoStatement",
    "Try",
    "TryStatement",
    "ExceptHandler",
    "CatchClause",
    "With",
    "WithItem",
    "Match",
    "MatchCase",
    "SwitchStatement",
    "SwitchCase",
];

pub fn fingerprint_cfg(root: &UirNode) -> (HashSet<String>, u32) {
    let mut edges = HashSet::new();
    let mut total_nodes = 0u32;

    let mut module_raw = Vec::new();
    let mut module_counter = 1u32;
    walk_scope(root, 0, &mut module_counter, &mut module_raw, true);
    for (src, dst) in &module_raw {
        edges.insert(hash_token(&format!("CFG_MODULE_EDGE:{src}->{dst}")));
    }
    total_nodes += module_counter;

    let mut functions = Vec::new();
    collect_functions(root, &mut functions);
    for func in functions {
        let mut raw = Vec::new();
        let mut counter = 1u32;
        walk_scope(func, 0, &mut counter, &mut raw, false);
        for (src, dst) in &raw {
            edges.insert(hash_token(&format!("CFG_EDGE:{src}->{dst}")));
        }
        total_nodes += counter;
    }

    (edges, total_nodes)
}

/// Walks `node`'s descendants, assigning a fresh local id (and recording an
/// edge from the current block) whenever a scope-starting node is reached.
/// When `module_level` is set, function and class bodies are treated as
/// opaque — they're covered by their own per-function pass instead.
fn walk_scope(
    node: &UirNode,
    current_id: u32,
    counter: &mut u32,
    edges: &mut Vec<(u32, u32)>,
    module_level: bool,
) {
    for child in &node.children {
        if module_level && (FUNC_KINDS.contains(&child.kind.as_str()) || CLASS_KINDS.contains(&child.kind.as_str())) {
            continue;
        }
        if !module_level && FUNC_KINDS.contains(&child.kind.as_str()) {
            // Nested function: gets its own independent CFG pass.
            continue;
        }
        if SCOPE_STARTING_KINDS.contains(&child.kind.as_str()) {
            let new_id = *counter;
            *counter += 1;
            edges.push((current_id, new_id));
            walk_scope(child, new_id, counter, edges, module_level);
        } else {
            walk_scope(child, current_id, counter, edges, module_level);
        }
    }
}

fn collect_functions<'a>(node: &'a UirNode, out: &mut Vec<&'a UirNode>) {
    for child in &node.children {
        if FUNC_KINDS.contains(&child.kind.as_str()) {
            out.push(child);
        }
        collect_functions(child, out);
    }
}

//! DFG fingerprinter (§4.5): per-function data-dependency edges over a
//! locally re-normalised copy of the function (fresh `lv_k` names, reset at
//! each function boundary), so intra-function variable identity never
//! depends on where the function sits in the file.

use crate::hash_token;
use common::UirNode;
use std::collections::{HashMap, HashSet};

const FUNC_KINDS: &[&str] = &["FunctionDef", "FunctionDeclaration", "MethodDefinition"];
const ASSIGN_KINDS: &[&str] = &["Assign", "AugAssign", "VariableDeclarator", "AssignmentExpression"];
const LOOP_KINDS: &[&str] = &["For", "ForStatement"];
const RETURN_KINDS: &[&str] = &["Return", "ReturnStatement"];
const PARAMS_KINDS: &[&str] = &["Parameters"];
const RETURN_SINK: &str = "__return__";

pub fn fingerprint_dfg(root: &UirNode) -> HashSet<String> {
    let mut functions = Vec::new();
    collect_functions(root, &mut functions);

    let mut hashes = HashSet::new();
    for func in functions {
        let renamed = local_renumber(func);
        let mut defined = HashSet::new();
        seed_parameters(&renamed, &mut defined);
        let mut edges = HashSet::new();
        walk_statements(&renamed, &mut defined, &mut edges);
        for (src, dst) in edges {
            hashes.insert(hash_token(&format!("DFG_EDGE:{src}->{dst}")));
        }
    }
    hashes
}

fn collect_functions<'a>(node: &'a UirNode, out: &mut Vec<&'a UirNode>) {
    for child in &node.children {
        if FUNC_KINDS.contains(&child.kind.as_str()) {
            out.push(child);
        }
        collect_functions(child, out);
    }
}

/// Re-normalises identifier names within a single function, fresh from
/// `lv_0`, keyed by first occurrence — insulating the function from its
/// position (and therefore its siblings' canonical counters) in the file.
fn local_renumber(func: &UirNode) -> UirNode {
    let mut map: HashMap<String, String> = HashMap::new();
    let mut counter = 0u32;
    rename_walk(func, &mut map, &mut counter)
}

fn rename_walk(node: &UirNode, map: &mut HashMap<String, String>, counter: &mut u32) -> UirNode {
    let mut new_node = node.clone();
    if node.kind == "Identifier" {
        if let Some(old) = &node.name {
            let new_name = map.entry(old.clone()).or_insert_with(|| {
                let n = format!("lv_{counter}");
                *counter += 1;
                n
            });
            new_node.name = Some(new_name.clone());
        }
    }
    new_node.children = node
        .children
        .iter()
        .map(|c| rename_walk(c, map, counter))
        .collect();
    new_node
}

fn seed_parameters(func: &UirNode, defined: &mut HashSet<String>) {
    for child in &func.children {
        if PARAMS_KINDS.contains(&child.kind.as_str()) {
            for name in idents_in(child) {
                defined.insert(name);
            }
        }
    }
}

/// Collects every `Identifier` name within a subtree (post-renumbering), not
/// descending into nested function definitions.
fn idents_in(node: &UirNode) -> Vec<String> {
    let mut out = Vec::new();
    idents_in_rec(node, &mut out);
    out
}

fn idents_in_rec(node: &UirNode, out: &mut Vec<String>) {
    if FUNC_KINDS.contains(&node.kind.as_str()) {
        return;
    }
    if node.kind == "Identifier" {
        if let Some(name) = &node.name {
            out.push(name.clone());
        }
    }
    for child in &node.children {
        idents_in_rec(child, out);
    }
}

/// Walks statements in document order, tracking the set of names defined so
/// far in scope and emitting a `(use, def)` edge for every RHS identifier
/// that was already defined.
fn walk_statements(node: &UirNode, defined: &mut HashSet<String>, edges: &mut HashSet<(String, String)>) {
    for child in &node.children {
        if FUNC_KINDS.contains(&child.kind.as_str()) {
            continue; // nested function: own independent DFG pass
        }

        if ASSIGN_KINDS.contains(&child.kind.as_str()) {
            handle_assignment(child, defined, edges);
        } else if LOOP_KINDS.contains(&child.kind.as_str()) {
            handle_for_loop(child, defined, edges);
        } else if RETURN_KINDS.contains(&child.kind.as_str()) {
            handle_return(child, defined, edges);
        } else {
            walk_statements(child, defined, edges);
        }
    }
}

fn handle_assignment(node: &UirNode, defined: &mut HashSet<String>, edges: &mut HashSet<(String, String)>) {
    let Some((target, rhs)) = node.children.split_first() else {
        return;
    };
    let defs = idents_in(target);
    let mut uses: Vec<String> = rhs.iter().flat_map(idents_in).collect();
    if node.kind == "AugAssign" {
        uses.extend(idents_in(target));
    }

    for d in &defs {
        for u in &uses {
            if u != d && defined.contains(u) {
                edges.insert((u.clone(), d.clone()));
            }
        }
    }
    for d in defs {
        defined.insert(d);
    }
}

fn handle_for_loop(node: &UirNode, defined: &mut HashSet<String>, edges: &mut HashSet<(String, String)>) {
    let Some((loop_var, rest)) = node.children.split_first() else {
        return;
    };
    let defs = idents_in(loop_var);
    let block: Option<&UirNode> = rest.iter().find(|c| c.kind == "Block");
    let uses: Vec<String> = rest
        .iter()
        .filter(|c| c.kind != "Block")
        .flat_map(|c| idents_in(c))
        .collect();

    for d in &defs {
        for u in &uses {
            if u != d && defined.contains(u) {
                edges.insert((u.clone(), d.clone()));
            }
        }
    }
    for d in defs {
        defined.insert(d);
    }

    if let Some(block) = block {
        walk_statements(block, defined, edges);
    }
}

fn handle_return(node: &UirNode, defined: &HashSet<String>, edges: &mut HashSet<(String, String)>) {
    for u in idents_in(node) {
        if defined.contains(&u) {
            edges.insert((u, RETURN_SINK.to_string()));
        }
    }
}

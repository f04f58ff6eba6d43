//! Normaliser (§4.2): rewrites a UIR tree into canonical form — identifiers
//! and literals replaced with placeholders, alternate function syntaxes
//! unified, documentation nodes stripped, markup attribute order fixed.
//!
//! The canonical-name counters are a short-lived, single-threaded local
//! struct threaded through the recursion (no global state), mirroring how
//! the rest of this codebase keeps per-call state local to the call.

use common::UirNode;

const FUNC_LIKE_KINDS: &[&str] = &[
    "FunctionDef",
    "FunctionDeclaration",
    "ArrowFunction",
    "MethodDefinition",
    "Lambda",
];
const CLASS_LIKE_KINDS: &[&str] = &["ClassDef", "ClassDeclaration"];
const JSX_COMPONENT_KINDS: &[&str] = &["JSXElement", "JSXOpeningElement", "JSXClosingElement"];
const CALL_KINDS: &[&str] = &["Call", "CallExpression", "NewExpression"];
const IMPORT_KINDS: &[&str] = &[
    "Import",
    "ImportFrom",
    "ImportDeclaration",
    "ImportSpecifier",
    "ExportDeclaration",
];

/// Closed enumeration of framework-hook callee names (§4.2 rule 4). Calls to
/// these get their own `hook_k` canonical pool so hook/non-hook call sites
/// remain distinguishable after normalisation.
const FRAMEWORK_HOOKS: &[&str] = &[
    "useState",
    "useEffect",
    "useContext",
    "useReducer",
    "useCallback",
    "useMemo",
    "useRef",
    "useImperativeHandle",
    "useLayoutEffect",
    "useDebugValue",
    "useTransition",
    "useDeferredValue",
    "useId",
    "useSyncExternalStore",
    "useInsertionEffect",
];

#[derive(Default)]
struct Counters {
    var: u32,
    func: u32,
    class: u32,
    hook: u32,
}

impl Counters {
    fn next_var(&mut self) -> String {
        let n = self.var;
        self.var += 1;
        format!("var_{n}")
    }
    fn next_func(&mut self) -> String {
        let n = self.func;
        self.func += 1;
        format!("func_{n}")
    }
    fn next_class(&mut self) -> String {
        let n = self.class;
        self.class += 1;
        format!("class_{n}")
    }
    fn next_hook(&mut self) -> String {
        let n = self.hook;
        self.hook += 1;
        format!("hook_{n}")
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Ctx {
    Default,
    /// Inside an import/export specifier: identifiers are part of the
    /// module contract and left untouched (§9 open question).
    NoRename,
}

/// Runs the full normalisation pass over `root`, returning a canonical deep
/// copy. Line numbers are preserved. Import/export specifier names are left
/// untouched (§9 open question, resolved in favour of treating them as
/// structural — use [`normalize_with_options`] to override).
pub fn normalize(root: &UirNode) -> UirNode {
    normalize_with_options(root, true)
}

/// Same as [`normalize`], but with the §9 open-question toggle exposed: when
/// `treat_imports_as_structural` is `false`, import/export specifier names
/// are canonicalised into the `var_k` pool like any other identifier, so
/// cross-file comparisons no longer treat which APIs a file imports as a
/// structural feature.
pub fn normalize_with_options(root: &UirNode, treat_imports_as_structural: bool) -> UirNode {
    let mut counters = Counters::default();
    normalize_node(root, &mut counters, Ctx::Default, treat_imports_as_structural)
}

fn normalize_node(
    node: &UirNode,
    counters: &mut Counters,
    ctx: Ctx,
    treat_imports_as_structural: bool,
) -> UirNode {
    let is_func_like = FUNC_LIKE_KINDS.contains(&node.kind.as_str());
    let is_class_like = CLASS_LIKE_KINDS.contains(&node.kind.as_str());
    let is_jsx_component = JSX_COMPONENT_KINDS.contains(&node.kind.as_str())
        && node
            .name
            .as_deref()
            .and_then(|n| n.chars().next())
            .is_some_and(|c| c.is_ascii_uppercase());
    let is_call = CALL_KINDS.contains(&node.kind.as_str());
    let is_import_like = IMPORT_KINDS.contains(&node.kind.as_str());

    let mut new_kind = node.kind.clone();
    // Rule 7: unify arrow functions into the single function-declaration form.
    if new_kind == "ArrowFunction" {
        new_kind = "FunctionDeclaration".to_string();
    }

    let mut new_name = node.name.clone();
    if is_func_like {
        new_name = Some(counters.next_func()); // rule 1
    } else if is_class_like {
        new_name = Some(counters.next_class()); // rule 2
    } else if is_jsx_component {
        new_name = Some(counters.next_func()); // rule 3: components share the function pool
    } else if node.kind == "Identifier" && ctx == Ctx::Default {
        new_name = Some(counters.next_var()); // rule 5
    }

    // Rule 6: literal values become the sentinel "CONST".
    let new_value = node.value.as_ref().map(|_| "CONST".to_string());

    let child_ctx = if is_import_like && treat_imports_as_structural {
        Ctx::NoRename
    } else {
        Ctx::Default
    };

    let new_children = if is_call {
        normalize_call_children(&node.children, counters, treat_imports_as_structural)
    } else {
        node.children
            .iter()
            .map(|c| normalize_node(c, counters, child_ctx, treat_imports_as_structural))
            .collect()
    };

    let mut result = UirNode {
        kind: new_kind,
        children: new_children,
        start_line: node.start_line,
        end_line: node.end_line,
        name: new_name,
        value: new_value,
    };

    if is_func_like || is_class_like || result.kind == "Module" {
        strip_leading_docstring(&mut result); // rule 8
    }
    if result.kind == "JSXOpeningElement" || result.kind == "JSXElement" {
        sort_jsx_attributes(&mut result); // rule 9
    }

    result
}

/// Rule 4: the callee (first child of a call expression) is canonicalised
/// into the hook pool if it names a framework hook, otherwise into the
/// function pool — overriding the generic identifier rule for that one
/// node. Remaining children (the argument list) normalise as usual.
fn normalize_call_children(
    children: &[UirNode],
    counters: &mut Counters,
    treat_imports_as_structural: bool,
) -> Vec<UirNode> {
    let mut out = Vec::with_capacity(children.len());
    let mut iter = children.iter();
    if let Some(callee) = iter.next() {
        if callee.kind == "Identifier" {
            let callee_name = callee.name.as_deref().unwrap_or("");
            let new_name = if FRAMEWORK_HOOKS.contains(&callee_name) {
                counters.next_hook()
            } else {
                counters.next_func()
            };
            out.push(UirNode {
                kind: callee.kind.clone(),
                children: Vec::new(),
                start_line: callee.start_line,
                end_line: callee.end_line,
                name: Some(new_name),
                value: None,
            });
        } else {
            out.push(normalize_node(callee, counters, Ctx::Default, treat_imports_as_structural));
        }
    }
    for child in iter {
        out.push(normalize_node(child, counters, Ctx::Default, treat_imports_as_structural));
    }
    out
}

/// Rule 8: drop a leading string-literal expression statement from a
/// module/function/class body — a documentation node with no structural
/// meaning.
fn strip_leading_docstring(node: &mut UirNode) {
    let body: &mut Vec<UirNode> = if node.kind == "Module" {
        &mut node.children
    } else {
        match node.children.iter_mut().find(|c| c.kind == "Block") {
            Some(block) => &mut block.children,
            None => return,
        }
    };

    let is_docstring = body.first().is_some_and(|first| {
        first.kind == "ExprStatement"
            && first.children.len() == 1
            && first.children[0].kind == "Constant"
            && first.children[0].value.is_some()
    });
    if is_docstring {
        body.remove(0);
    }
}

/// Rule 9: attributes are sorted ascending by name; non-attribute children
/// (text, expression containers, nested elements) keep their relative order
/// and precede the sorted attributes.
fn sort_jsx_attributes(node: &mut UirNode) {
    let (mut attrs, rest): (Vec<UirNode>, Vec<UirNode>) = std::mem::take(&mut node.children)
        .into_iter()
        .partition(|c| c.kind == "JSXAttribute");
    attrs.sort_by(|a, b| a.name.cmp(&b.name));
    node.children = rest;
    node.children.extend(attrs);
}

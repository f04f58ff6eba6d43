//! Curly-brace family adapter: `tree-sitter-javascript`/`tree-sitter-typescript`
//! CST → UIR, covering JavaScript, JSX, TypeScript and TSX.
//!
//! Unlike the scripting family, a parse error here degrades to a partial
//! tree rather than failing outright (§4.1) — the grammar is explicitly
//! error-tolerant and a best-effort fingerprint is still useful.

use common::{Language, PipelineError, UirNode};
use tree_sitter::{Node, Parser};

fn map_kind(ts_kind: &str) -> &'static str {
    match ts_kind {
        "program" => "Program",
        "function_declaration" => "FunctionDeclaration",
        "function_expression" | "function" => "FunctionDeclaration",
        "arrow_function" => "ArrowFunction",
        "generator_function_declaration" => "FunctionDeclaration",
        "method_definition" => "MethodDefinition",
        "class_declaration" | "class" => "ClassDeclaration",
        "if_statement" => "IfStatement",
        "else_clause" => "ElseClause",
        "for_statement" | "for_in_statement" => "ForStatement",
        "while_statement" => "WhileStatement",
        "do_statement" => "DoStatement",
        "try_statement" => "TryStatement",
        "catch_clause" => "CatchClause",
        "finally_clause" => "FinallyClause",
        "switch_statement" => "SwitchStatement",
        "switch_case" | "switch_default" => "SwitchCase",
        "return_statement" => "ReturnStatement",
        "throw_statement" => "ThrowStatement",
        "break_statement" => "BreakStatement",
        "continue_statement" => "ContinueStatement",
        "variable_declaration" | "lexical_declaration" => "VariableDeclaration",
        "variable_declarator" => "VariableDeclarator",
        "assignment_expression" => "AssignmentExpression",
        "augmented_assignment_expression" => "AssignmentExpression",
        "call_expression" => "CallExpression",
        "new_expression" => "NewExpression",
        "identifier" | "property_identifier" | "shorthand_property_identifier" => "Identifier",
        "this" => "ThisExpression",
        "member_expression" => "MemberExpression",
        "subscript_expression" => "MemberExpression",
        "binary_expression" => "BinaryExpression",
        "unary_expression" => "UnaryExpression",
        "logical_expression" => "LogicalExpression",
        "ternary_expression" => "ConditionalExpression",
        "array" => "ArrayExpression",
        "object" => "ObjectExpression",
        "pair" => "Property",
        "string" | "template_string" | "number" | "true" | "false" | "null" | "undefined" => {
            "Literal"
        }
        "import_statement" => "ImportDeclaration",
        "export_statement" => "ExportDeclaration",
        "import_specifier" | "namespace_import" | "named_imports" => "ImportSpecifier",
        "formal_parameters" => "Parameters",
        "arguments" => "Arguments",
        "statement_block" => "Block",
        "jsx_element" | "jsx_fragment" => "JSXElement",
        "jsx_self_closing_element" => "JSXElement",
        "jsx_opening_element" => "JSXOpeningElement",
        "jsx_closing_element" => "JSXClosingElement",
        "jsx_attribute" => "JSXAttribute",
        "jsx_expression_container" => "JSXExpressionContainer",
        "jsx_text" => "JSXText",
        _ => "",
    }
}

fn to_pascal_case(ts_kind: &str) -> String {
    ts_kind
        .split('_')
        .map(|part| {
            let mut c = part.chars();
            match c.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + c.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn parse(source: &str, filename: &str, language: Language) -> Result<UirNode, PipelineError> {
    let mut parser = Parser::new();
    let ts_language = match (language, filename.rsplit('.').next()) {
        (Language::JavaScript, _) => tree_sitter_javascript::LANGUAGE.into(),
        (Language::TypeScript, Some("tsx")) => {
            tree_sitter_typescript::LANGUAGE_TSX.into()
        }
        (Language::TypeScript, _) => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        _ => unreachable!("curly::parse only handles JavaScript/TypeScript"),
    };
    parser
        .set_language(&ts_language)
        .expect("tree-sitter grammar failed to load");

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| PipelineError::ParseError {
            filename: filename.to_string(),
            line: 1,
            message: "tree-sitter returned no tree".to_string(),
        })?;

    // Non-fatal: a partial tree is still fingerprinted (§4.1).
    Ok(node_to_uir(tree.root_node(), source.as_bytes()))
}

fn node_to_uir(node: Node<'_>, source: &[u8]) -> UirNode {
    let start_line = node.start_position().row as u32 + 1;
    let end_line = node.end_position().row as u32 + 1;
    let ts_kind = node.kind();

    let mapped = map_kind(ts_kind);
    let kind = if !mapped.is_empty() {
        mapped.to_string()
    } else if node.is_named() {
        to_pascal_case(ts_kind)
    } else {
        ts_kind.to_string()
    };

    let lifts_name_field = matches!(
        ts_kind,
        "function_declaration"
            | "class_declaration"
            | "method_definition"
            | "jsx_opening_element"
            | "jsx_self_closing_element"
    );
    let name_field_id = if lifts_name_field {
        node.child_by_field_name("name").map(|n| n.id())
    } else {
        None
    };

    let mut cursor = node.walk();
    let children: Vec<UirNode> = node
        .children(&mut cursor)
        .filter(|c| c.kind() != "comment" && Some(c.id()) != name_field_id)
        .map(|c| node_to_uir(c, source))
        .collect();

    let mut uir = UirNode::with_children(kind, start_line, end_line, children);

    if matches!(
        ts_kind,
        "identifier" | "property_identifier" | "shorthand_property_identifier"
    ) {
        if let Ok(text) = node.utf8_text(source) {
            uir = uir.with_name(text);
        }
    }
    if matches!(
        ts_kind,
        "string" | "template_string" | "number" | "true" | "false" | "null" | "undefined"
    ) {
        if let Ok(text) = node.utf8_text(source) {
            uir = uir.with_value(text);
        }
    }
    if lifts_name_field {
        if let Some(name_node) = node.child_by_field_name("name") {
            if let Ok(text) = name_node.utf8_text(source) {
                uir.name = Some(text.to_string());
            }
        }
    }

    uir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_declaration_parses() {
        let uir = parse("function f(x) { return x; }", "a.js", Language::JavaScript).unwrap();
        assert!(uir.children.iter().any(|c| c.kind == "FunctionDeclaration"));
    }

    #[test]
    fn arrow_function_is_distinct_from_declaration_pre_normalisation() {
        let uir = parse("const f = (x) => x;", "a.js", Language::JavaScript).unwrap();
        let has_arrow = uir
            .children
            .iter()
            .any(|c| format!("{c:?}").contains("ArrowFunction"));
        assert!(has_arrow);
    }

    #[test]
    fn syntax_error_is_tolerated() {
        assert!(parse("function f( {", "a.js", Language::JavaScript).is_ok());
    }

    #[test]
    fn tsx_file_parses_jsx() {
        let uir = parse(
            "const C = () => <div className=\"x\" />;",
            "a.tsx",
            Language::TypeScript,
        )
        .unwrap();
        let has_jsx = uir.children.iter().any(|c| format!("{c:?}").contains("JSX"));
        assert!(has_jsx);
    }
}

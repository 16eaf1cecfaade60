//! Java AST front-end (C1).
//!
//! Parses one Java compilation unit with `tree-sitter-java` into a small
//! typed tree sufficient for C3 to walk. Unsupported constructs degrade to
//! opaque statement blocks rather than failing the whole file; a hard
//! syntactic failure produces a [`crate::error::ParseError`] and the caller
//! skips the file.

use std::collections::BTreeMap;
use std::path::Path;

use tree_sitter::{Node, Parser, Query, QueryCursor};

use crate::error::ParseError;
use crate::model::ClassKind;

#[derive(Debug, Clone)]
pub struct JavaAnnotation {
    pub name: String,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct JavaFieldDecl {
    pub name: String,
    pub field_type: String,
    pub modifiers: Vec<String>,
    pub annotations: Vec<JavaAnnotation>,
    pub initializer_text: Option<String>,
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct JavaParam {
    pub name: String,
    pub param_type: String,
}

#[derive(Debug, Clone)]
pub struct JavaMethodDecl {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<JavaParam>,
    pub modifiers: Vec<String>,
    pub annotations: Vec<JavaAnnotation>,
    pub is_constructor: bool,
    /// Names of methods invoked in this method's body (statement-opaque
    /// tolerant — best effort, not a full call graph).
    pub invoked_method_names: Vec<String>,
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct JavaTypeDecl {
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Vec<String>,
    pub annotations: Vec<JavaAnnotation>,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub fields: Vec<JavaFieldDecl>,
    pub methods: Vec<JavaMethodDecl>,
    pub nested: Vec<JavaTypeDecl>,
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct JavaCompilationUnit {
    pub package_name: Option<String>,
    pub imports: Vec<String>,
    pub types: Vec<JavaTypeDecl>,
}

pub struct JavaFrontend {
    language: tree_sitter::Language,
}

impl Default for JavaFrontend {
    fn default() -> Self {
        JavaFrontend {
            language: tree_sitter_java::language(),
        }
    }
}

impl JavaFrontend {
    pub fn parse(&self, path: &Path, source: &str) -> Result<JavaCompilationUnit, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(self.language)
            .map_err(|e| ParseError::new(path, format!("failed to load java grammar: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::new(path, "tree-sitter returned no tree"))?;

        let root = tree.root_node();
        if root.has_error() && root.child_count() == 0 {
            return Err(ParseError::new(path, "hard syntactic failure").with_excerpt(excerpt(source, 0)));
        }

        let bytes = source.as_bytes();
        let package_name = extract_package_name(&self.language, root, bytes);
        let imports = extract_imports(&self.language, root, bytes);

        let mut types = Vec::new();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if let Some(decl) = self.parse_type_decl(&child, bytes) {
                types.push(decl);
            }
        }

        Ok(JavaCompilationUnit {
            package_name,
            imports,
            types,
        })
    }

    fn parse_type_decl(&self, node: &Node, source: &[u8]) -> Option<JavaTypeDecl> {
        let kind = match node.kind() {
            "class_declaration" => ClassKind::Class,
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            "annotation_type_declaration" => ClassKind::Annotation,
            "record_declaration" => ClassKind::Class,
            _ => return None,
        };

        let name = node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
            .unwrap_or_default()
            .to_string();

        let modifiers = modifiers_of(node, source);
        let annotations = annotations_of(node, source);
        let (extends, implements) = superclass_and_interfaces(node, source);

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        let mut nested = Vec::new();

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                match member.kind() {
                    "field_declaration" => fields.extend(parse_field_decl(&member, source)),
                    "method_declaration" => {
                        if let Some(m) = parse_method_decl(&member, source, &name, false) {
                            methods.push(m);
                        }
                    }
                    "constructor_declaration" => {
                        if let Some(m) = parse_method_decl(&member, source, &name, true) {
                            methods.push(m);
                        }
                    }
                    "class_declaration" | "interface_declaration" | "enum_declaration" | "record_declaration" => {
                        if let Some(nested_decl) = self.parse_type_decl(&member, source) {
                            nested.push(nested_decl);
                        }
                    }
                    _ => {}
                }
            }
        }

        let class_kind = if modifiers.iter().any(|m| m == "abstract") && kind == ClassKind::Class {
            ClassKind::Abstract
        } else {
            kind
        };

        Some(JavaTypeDecl {
            name,
            kind: class_kind,
            modifiers,
            annotations,
            extends,
            implements,
            fields,
            methods,
            nested,
            offset: node.start_byte(),
        })
    }
}

fn excerpt(source: &str, offset: usize) -> String {
    let start = offset.saturating_sub(40).min(source.len());
    let end = (offset + 80).min(source.len());
    source.get(start..end).unwrap_or_default().to_string()
}

fn modifiers_of(node: &Node, source: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifiers" {
            let mut mcursor = child.walk();
            for m in child.children(&mut mcursor) {
                if m.kind() != "annotation" && m.kind() != "marker_annotation" {
                    if let Ok(text) = m.utf8_text(source) {
                        out.push(text.to_string());
                    }
                }
            }
        }
    }
    out
}

fn annotations_of(node: &Node, source: &[u8]) -> Vec<JavaAnnotation> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifiers" {
            let mut mcursor = child.walk();
            for m in child.children(&mut mcursor) {
                if let Some(a) = parse_annotation(&m, source) {
                    out.push(a);
                }
            }
        }
    }
    out
}

fn parse_annotation(node: &Node, source: &[u8]) -> Option<JavaAnnotation> {
    match node.kind() {
        "marker_annotation" => {
            let name = node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
                .unwrap_or_default()
                .to_string();
            Some(JavaAnnotation {
                name,
                parameters: BTreeMap::new(),
            })
        }
        "annotation" => {
            let name = node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
                .unwrap_or_default()
                .to_string();
            let mut parameters = BTreeMap::new();
            if let Some(args) = node.child_by_field_name("arguments") {
                let mut cursor = args.walk();
                for arg in args.children(&mut cursor) {
                    if arg.kind() == "element_value_pair" {
                        let key = arg
                            .child_by_field_name("key")
                            .and_then(|n| n.utf8_text(source).ok())
                            .unwrap_or_default()
                            .to_string();
                        let value = arg
                            .child_by_field_name("value")
                            .and_then(|n| n.utf8_text(source).ok())
                            .unwrap_or_default()
                            .trim_matches('"')
                            .to_string();
                        parameters.insert(key, value);
                    } else if arg.kind() != "(" && arg.kind() != ")" && arg.kind() != "," {
                        if let Ok(text) = arg.utf8_text(source) {
                            parameters.insert("value".to_string(), text.trim_matches('"').to_string());
                        }
                    }
                }
            }
            Some(JavaAnnotation { name, parameters })
        }
        _ => None,
    }
}

fn superclass_and_interfaces(node: &Node, source: &[u8]) -> (Option<String>, Vec<String>) {
    let mut extends = None;
    let mut implements = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "superclass" => {
                let mut sc = child.walk();
                for t in child.children(&mut sc) {
                    if t.kind() == "type_identifier" || t.kind() == "generic_type" {
                        if let Ok(text) = t.utf8_text(source) {
                            extends = Some(text.to_string());
                        }
                    }
                }
            }
            "super_interfaces" | "extends_interfaces" => {
                let mut ic = child.walk();
                for type_list in child.children(&mut ic) {
                    if type_list.kind() == "type_list" {
                        let mut tc = type_list.walk();
                        for t in type_list.children(&mut tc) {
                            if t.kind() == "type_identifier" || t.kind() == "generic_type" {
                                if let Ok(text) = t.utf8_text(source) {
                                    implements.push(text.to_string());
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    (extends, implements)
}

fn parse_field_decl(node: &Node, source: &[u8]) -> Vec<JavaFieldDecl> {
    let modifiers = modifiers_of(node, source);
    let annotations = annotations_of(node, source);
    let field_type = node
        .child_by_field_name("type")
        .and_then(|n| n.utf8_text(source).ok())
        .unwrap_or_default()
        .to_string();

    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "variable_declarator" {
            let name = child
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
                .unwrap_or_default()
                .to_string();
            let initializer_text = child
                .child_by_field_name("value")
                .and_then(|n| n.utf8_text(source).ok())
                .map(|s| s.to_string());
            out.push(JavaFieldDecl {
                name,
                field_type: field_type.clone(),
                modifiers: modifiers.clone(),
                annotations: annotations.clone(),
                initializer_text,
                offset: node.start_byte(),
            });
        }
    }
    out
}

fn parse_method_decl(node: &Node, source: &[u8], class_name: &str, is_constructor: bool) -> Option<JavaMethodDecl> {
    let name = if is_constructor {
        class_name.to_string()
    } else {
        node.child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
            .unwrap_or_default()
            .to_string()
    };

    let return_type = node
        .child_by_field_name("type")
        .and_then(|n| n.utf8_text(source).ok())
        .unwrap_or("void")
        .to_string();

    let modifiers = modifiers_of(node, source);
    let annotations = annotations_of(node, source);
    let parameters = node
        .child_by_field_name("parameters")
        .map(|params| parse_parameters(&params, source))
        .unwrap_or_default();

    let invoked_method_names = node
        .child_by_field_name("body")
        .map(|body| find_method_invocations(&body, source))
        .unwrap_or_default();

    Some(JavaMethodDecl {
        name,
        return_type,
        parameters,
        modifiers,
        annotations,
        is_constructor,
        invoked_method_names,
        offset: node.start_byte(),
    })
}

fn parse_parameters(params: &Node, source: &[u8]) -> Vec<JavaParam> {
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for p in params.children(&mut cursor) {
        if p.kind() == "formal_parameter" || p.kind() == "spread_parameter" {
            let name = p
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
                .unwrap_or_default()
                .to_string();
            let param_type = p
                .child_by_field_name("type")
                .and_then(|n| n.utf8_text(source).ok())
                .unwrap_or_default()
                .to_string();
            out.push(JavaParam { name, param_type });
        }
    }
    out
}

fn find_method_invocations(body: &Node, source: &[u8]) -> Vec<String> {
    let query_str = "(method_invocation name: (identifier) @name)";
    let Ok(query) = Query::new(tree_sitter_java::language(), query_str) else {
        return Vec::new();
    };
    let mut cursor = QueryCursor::new();
    let mut out = Vec::new();
    for m in cursor.matches(&query, *body, source) {
        for capture in m.captures {
            if let Ok(text) = capture.node.utf8_text(source) {
                out.push(text.to_string());
            }
        }
    }
    out
}

fn extract_package_name(language: &tree_sitter::Language, root: Node, source: &[u8]) -> Option<String> {
    let query = Query::new(*language, "(package_declaration (scoped_identifier) @name)").ok()?;
    let mut cursor = QueryCursor::new();
    for m in cursor.matches(&query, root, source) {
        for capture in m.captures {
            if let Ok(text) = capture.node.utf8_text(source) {
                return Some(text.to_string());
            }
        }
    }
    None
}

fn extract_imports(language: &tree_sitter::Language, root: Node, source: &[u8]) -> Vec<String> {
    let Ok(query) = Query::new(*language, "(import_declaration (_) @name)") else {
        return Vec::new();
    };
    let mut cursor = QueryCursor::new();
    let mut out = Vec::new();
    for m in cursor.matches(&query, root, source) {
        for capture in m.captures {
            if let Ok(text) = capture.node.utf8_text(source) {
                out.push(text.trim().to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(src: &str) -> JavaCompilationUnit {
        JavaFrontend::default().parse(&PathBuf::from("Test.java"), src).unwrap()
    }

    #[test]
    fn parses_package_and_class_name() {
        let cu = parse("package com.example; class UserService {}");
        assert_eq!(cu.package_name.as_deref(), Some("com.example"));
        assert_eq!(cu.types[0].name, "UserService");
        assert_eq!(cu.types[0].kind, ClassKind::Class);
    }

    #[test]
    fn parses_annotations_with_parameters() {
        let cu = parse(
            r#"
            @RestController
            @RequestMapping("/api/v1/users")
            class UserController {}
            "#,
        );
        let class = &cu.types[0];
        assert!(class.annotations.iter().any(|a| a.name == "RestController"));
        let mapping = class.annotations.iter().find(|a| a.name == "RequestMapping").unwrap();
        assert_eq!(mapping.parameters.get("value").map(String::as_str), Some("/api/v1/users"));
    }

    #[test]
    fn parses_constructor_and_detects_it() {
        let cu = parse(
            r#"
            class UserController {
                UserController(UserService userService) {}
            }
            "#,
        );
        let method = &cu.types[0].methods[0];
        assert!(method.is_constructor);
        assert_eq!(method.parameters[0].param_type, "UserService");
    }

    #[test]
    fn tolerates_unsupported_statement_shapes() {
        let cu = parse(
            r#"
            class Weird {
                void m() {
                    var x = switch (1) { case 1 -> 2; default -> 0; };
                }
            }
            "#,
        );
        assert_eq!(cu.types[0].name, "Weird");
    }
}

//! Scope-tagged tokens for Java source, derived from the tree-sitter syntax tree.
//!
//! Each leaf of the tree becomes a token on the row it starts at. Its scopes
//! are decided by the path from the root: the method part it sits in, whether
//! it belongs to a declaration, and its role inside a type. Qualified type
//! names such as `Map.Entry` are kept as one token.

use std::borrow::Cow;
use tracing::debug;
use tree_sitter::{Node, Parser, TreeCursor};

use crate::completion::tokens::{Token, TokenGrid, Tokenizer, scope};

#[derive(Debug, Default, Clone, Copy)]
pub struct JavaTokenizer;

impl JavaTokenizer {
    pub fn make_parser(&self) -> Parser {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .expect("failed to load java grammar");
        parser
    }
}

impl Tokenizer for JavaTokenizer {
    fn tokenize(&self, source: &str) -> TokenGrid {
        let mut rows = vec![Vec::new(); source.split('\n').count()];
        let Some(tree) = self.make_parser().parse(source, None) else {
            debug!("parser produced no tree");
            return TokenGrid::new(rows);
        };

        let mut cursor = tree.walk();
        walk(&mut cursor, Path::default(), source.as_bytes(), &mut rows);
        TokenGrid::new(rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MethodPart {
    ReturnType,
    Identifier,
    Body,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Plain,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declarator {
    Variable,
    Parameter,
}

/// What the ancestors of a node say about it.
#[derive(Debug, Clone, Copy, Default)]
struct Path {
    method: Option<MethodPart>,
    declaration: bool,
    declarator: Option<Declarator>,
    storage: Option<Storage>,
    generic: bool,
    inherited: bool,
    literal: bool,
    // Set for direct children only.
    definition: bool,
    parameter: bool,
    function_name: bool,
    class_name: bool,
}

impl Path {
    fn in_body(&self) -> bool {
        self.method == Some(MethodPart::Body)
    }

    fn enter(self, parent: Node, child: Node, field: Option<&str>) -> Path {
        let mut path = Path {
            definition: false,
            parameter: false,
            function_name: false,
            class_name: false,
            ..self
        };

        if is_annotation(child.kind()) {
            path.storage = None;
            path.inherited = false;
            return path;
        }

        match parent.kind() {
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                path.declaration = false;
                path.declarator = None;
                path.generic = false;
                path.storage = None;
                path.method = Some(match field {
                    Some("body") => MethodPart::Body,
                    Some("type") => {
                        path.storage = Some(Storage::Plain);
                        MethodPart::ReturnType
                    }
                    Some("dimensions") => MethodPart::ReturnType,
                    Some("name") => {
                        path.function_name = true;
                        MethodPart::Identifier
                    }
                    Some("parameters") => MethodPart::Identifier,
                    _ => MethodPart::Other,
                });
            }
            "field_declaration" | "local_variable_declaration" | "constant_declaration" => {
                path.declaration = field == Some("type");
                path.storage = (field == Some("type")).then_some(Storage::Plain);
                path.declarator = (field == Some("declarator")).then_some(Declarator::Variable);
            }
            "variable_declarator" => {
                let declarator = path.declarator.take();
                match (field, declarator) {
                    (Some("name"), Some(Declarator::Variable)) => {
                        path.declaration = true;
                        path.definition = true;
                    }
                    (Some("name"), Some(Declarator::Parameter)) => {
                        path.declaration = self.in_body();
                        path.parameter = true;
                    }
                    (Some("dimensions"), Some(Declarator::Variable)) => path.declaration = true,
                    _ => path.declaration = false,
                }
            }
            "formal_parameter" | "spread_parameter" => {
                path.declaration = false;
                path.storage = None;
                if field == Some("type") || (field.is_none() && is_type(child.kind())) {
                    path.declaration = self.in_body();
                    path.storage = Some(Storage::Plain);
                } else if field == Some("name") {
                    path.declaration = self.in_body();
                    path.parameter = true;
                } else if child.kind() == "variable_declarator" {
                    path.declarator = Some(Declarator::Parameter);
                }
            }
            "enhanced_for_statement" => {
                path.declaration = matches!(field, Some("type" | "name"));
                path.definition = field == Some("name");
                path.storage = (field == Some("type")).then_some(Storage::Plain);
            }
            "class_declaration" | "interface_declaration" | "enum_declaration" | "record_declaration" => {
                path.class_name = field == Some("name");
            }
            "superclass" => path.inherited = true,
            "generic_type" if child.kind() == "type_arguments" => {
                path.storage = None;
                path.inherited = false;
                path.generic = true;
            }
            "array_type" if path.storage.is_some() => path.storage = Some(Storage::Array),
            "string_literal" | "text_block" | "character_literal" => path.literal = true,
            _ => {}
        }
        path
    }

    fn scopes(&self, node: Node) -> Vec<Cow<'static, str>> {
        let kind = node.kind();
        let mut scopes = vec![Cow::Borrowed(scope::SOURCE)];
        let mut push = |s: &'static str| scopes.push(Cow::Borrowed(s));

        if let Some(part) = self.method {
            push(scope::METHOD);
            match part {
                MethodPart::ReturnType => push(scope::METHOD_RETURN_TYPE),
                MethodPart::Identifier => push(scope::METHOD_IDENTIFIER),
                MethodPart::Body => push(scope::METHOD_BODY),
                MethodPart::Other => {}
            }
        }
        if kind == "line_comment" || kind == "block_comment" {
            push(scope::COMMENT);
            return scopes;
        }
        if self.declaration {
            push(scope::VARIABLE_DECLARATION);
        }
        if self.literal || matches!(kind, "string_literal" | "text_block" | "character_literal") {
            push(scope::STRING);
        }
        if self.function_name {
            push(scope::FUNCTION_NAME);
        }
        if self.class_name {
            push(scope::CLASS_NAME);
        }
        if self.definition {
            push(scope::VARIABLE_DEFINITION);
        }
        if self.parameter {
            push(scope::VARIABLE_PARAMETER);
        }
        if self.generic {
            push(scope::STORAGE_TYPE_GENERIC);
        }

        let is_bracket = matches!(kind, "[" | "]");
        match self.storage {
            Some(_) if is_bracket => push(scope::SQUARE_BRACKET),
            None if is_bracket && self.declaration => push(scope::SQUARE_BRACKET),
            Some(storage) if is_primitive(node) => push(match storage {
                Storage::Plain => scope::STORAGE_TYPE_PRIMITIVE,
                Storage::Array => scope::STORAGE_TYPE_PRIMITIVE_ARRAY,
            }),
            Some(storage) if is_type_name(kind) => push(match storage {
                Storage::Plain => scope::STORAGE_TYPE,
                Storage::Array => scope::STORAGE_TYPE_OBJECT_ARRAY,
            }),
            _ => {}
        }

        if self.inherited && is_type_name(kind) {
            push(scope::INHERITED_CLASS);
        }
        scopes
    }
}

fn walk(cursor: &mut TreeCursor<'_>, path: Path, source: &[u8], rows: &mut [Vec<Token>]) {
    let node = cursor.node();
    if node.child_count() == 0 || node.kind() == "scoped_type_identifier" {
        emit(node, &path, source, rows);
        return;
    }

    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            let child_path = path.enter(node, child, cursor.field_name());
            walk(cursor, child_path, source, rows);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

/// Push a leaf onto its row; leaves spanning lines are split per line.
fn emit(node: Node, path: &Path, source: &[u8], rows: &mut [Vec<Token>]) {
    if node.start_byte() == node.end_byte() {
        return;
    }
    let Ok(text) = node.utf8_text(source) else {
        return;
    };
    let scopes = path.scopes(node);
    let start = node.start_position().row;

    for (i, line) in text.split('\n').enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        if let Some(row) = rows.get_mut(start + i) {
            row.push(Token::new(line, scopes.clone()));
        }
    }
}

fn is_annotation(kind: &str) -> bool {
    matches!(kind, "annotation" | "marker_annotation")
}

fn is_type_name(kind: &str) -> bool {
    matches!(kind, "type_identifier" | "scoped_type_identifier")
}

fn is_primitive(node: Node) -> bool {
    matches!(
        node.kind(),
        "boolean_type" | "void_type" | "integral_type" | "floating_point_type"
    )
        || node
            .parent()
            .is_some_and(|p| matches!(p.kind(), "integral_type" | "floating_point_type"))
}

fn is_type(kind: &str) -> bool {
    is_type_name(kind)
        || matches!(
            kind,
            "generic_type" | "array_type" | "integral_type" | "floating_point_type" | "boolean_type"
        )
}

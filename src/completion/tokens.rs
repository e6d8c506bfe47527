use std::borrow::Cow;
use std::sync::Arc;

use super::context::EditorHandle;

/// Scope tags attached to tokens. Names follow the TextMate Java grammar.
pub mod scope {
    pub const STORAGE_TYPE: &str = "storage.type.java";
    pub const STORAGE_TYPE_PRIMITIVE: &str = "storage.type.primitive.java";
    pub const STORAGE_TYPE_OBJECT_ARRAY: &str = "storage.type.object.array.java";
    pub const STORAGE_TYPE_PRIMITIVE_ARRAY: &str = "storage.type.primitive.array.java";
    pub const STORAGE_TYPE_GENERIC: &str = "storage.type.generic.java";
    pub const SQUARE_BRACKET: &str = "punctuation.bracket.square.java";
    pub const VARIABLE_DEFINITION: &str = "variable.definition.java";
    pub const VARIABLE_PARAMETER: &str = "variable.parameter.java";
    pub const VARIABLE_DECLARATION: &str = "meta.definition.variable.java";
    pub const METHOD: &str = "meta.method.java";
    pub const METHOD_IDENTIFIER: &str = "meta.method.identifier.java";
    pub const METHOD_RETURN_TYPE: &str = "meta.method.return-type.java";
    pub const METHOD_BODY: &str = "meta.method.body.java";
    pub const FUNCTION_NAME: &str = "entity.name.function.java";
    pub const CLASS_NAME: &str = "entity.name.type.class.java";
    pub const INHERITED_CLASS: &str = "entity.other.inherited-class.java";
    pub const STRING: &str = "string.quoted.double.java";
    pub const COMMENT: &str = "comment.java";
    pub const SOURCE: &str = "source.java";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub scopes: Vec<Cow<'static, str>>,
}

impl Token {
    pub fn new(value: impl Into<String>, scopes: Vec<Cow<'static, str>>) -> Self {
        Self {
            value: value.into(),
            scopes,
        }
    }

    pub fn has(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    pub fn is_square_bracket(&self) -> bool {
        self.has(scope::SQUARE_BRACKET)
    }

    /// Declared type name, array element types included, brackets excluded.
    pub fn is_storage_type(&self) -> bool {
        (self.has(scope::STORAGE_TYPE)
            || self.has(scope::STORAGE_TYPE_PRIMITIVE)
            || self.has(scope::STORAGE_TYPE_OBJECT_ARRAY)
            || self.has(scope::STORAGE_TYPE_PRIMITIVE_ARRAY))
            && !self.is_square_bracket()
    }

    pub fn is_variable_name(&self) -> bool {
        self.has(scope::VARIABLE_PARAMETER) || self.has(scope::VARIABLE_DEFINITION)
    }

    /// Name token of a method signature; walks over method locals stop here.
    pub fn is_method_boundary(&self) -> bool {
        self.has(scope::FUNCTION_NAME) && self.has(scope::METHOD_IDENTIFIER)
    }

    /// Part of a variable declaration or a parameter list.
    pub fn is_declaration(&self) -> bool {
        self.has(scope::VARIABLE_DECLARATION) || self.has(scope::METHOD_IDENTIFIER)
    }
}

/// Position of a token inside a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPos {
    pub row: usize,
    pub col: usize,
}

/// Tokens of one buffer, one row per source line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenGrid {
    rows: Vec<Vec<Token>>,
}

impl TokenGrid {
    pub fn new(rows: Vec<Vec<Token>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Token>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, pos: TokenPos) -> Option<&Token> {
        self.rows.get(pos.row)?.get(pos.col)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.rows.iter().flatten()
    }

    /// Last token at or before the end of `row`, searching earlier rows when it is empty.
    pub fn last_in_row(&self, row: usize) -> Option<TokenPos> {
        let row = row.min(self.rows.len().checked_sub(1)?);
        match self.rows[row].len() {
            0 => self.step_back(TokenPos { row, col: 0 }),
            len => Some(TokenPos { row, col: len - 1 }),
        }
    }

    /// Token of `row` whose text covers byte `column` of `line`.
    ///
    /// Tokens carry no columns, so each is located by searching its value in
    /// `line` after the previous one. A stale row that no longer matches the
    /// line yields `None`. A cursor right after a token touches it unless the
    /// token ends with a closing `"`, `'` or `*/`.
    pub fn token_at(&self, row: usize, column: usize, line: &str) -> Option<&Token> {
        let mut from = 0;
        for token in self.rows.get(row)? {
            let start = from + line.get(from..)?.find(token.value.as_str())?;
            let end = start + token.value.len();
            if start >= column {
                return None;
            }
            if column < end || (column == end && !closes_literal_or_comment(&token.value)) {
                return Some(token);
            }
            from = end;
        }
        None
    }

    /// The token before `pos`, skipping empty rows. `None` at the start of the grid.
    pub fn step_back(&self, pos: TokenPos) -> Option<TokenPos> {
        if pos.col > 0 {
            return Some(TokenPos {
                row: pos.row,
                col: pos.col - 1,
            });
        }
        (0..pos.row.min(self.rows.len()))
            .rev()
            .find_map(|row| match self.rows[row].len() {
                0 => None,
                len => Some(TokenPos { row, col: len - 1 }),
            })
    }
}

fn closes_literal_or_comment(value: &str) -> bool {
    value.ends_with('"') || value.ends_with('\'') || value.ends_with("*/")
}

/// Turns source text into a token grid.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, source: &str) -> TokenGrid;
}

/// Supplies the token snapshot of an editor's buffer.
///
/// The snapshot may lag the buffer by one edit. `None` means tokens are not
/// available yet.
pub trait TokenSource: Send + Sync {
    fn tokens(&self, editor: &EditorHandle, source: &str) -> Option<Arc<TokenGrid>>;
}

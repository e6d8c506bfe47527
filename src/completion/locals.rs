//! Declarations recovered from the token grid of the current buffer.
//!
//! Types are returned as written in source; qualifying them against imports
//! is left to the caller.

use super::tokens::{Token, TokenGrid, scope};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalField {
    pub ty: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMethod {
    pub name: String,
    pub arguments: Vec<String>,
    pub return_type: String,
}

/// Pairs a storage type with a variable name, in either order.
#[derive(Debug, Default)]
struct PendingDeclaration {
    ty: Option<String>,
    name: Option<String>,
    brackets: usize,
}

impl PendingDeclaration {
    fn offer(&mut self, token: &Token) -> Option<LocalField> {
        if token.is_square_bracket() {
            // Only brackets adjacent to a half-built declaration belong to its type.
            if self.ty.is_some() != self.name.is_some() {
                self.brackets += 1;
            }
        } else if token.is_storage_type() {
            self.ty = Some(token.value.clone());
        } else if token.is_variable_name() {
            self.name = Some(token.value.clone());
        }
        self.take_complete()
    }

    fn take_complete(&mut self) -> Option<LocalField> {
        if self.ty.is_none() || self.name.is_none() {
            return None;
        }
        let PendingDeclaration { ty, name, brackets } = std::mem::take(self);
        Some(LocalField {
            ty: with_array_suffix(ty?, brackets),
            name: name?,
        })
    }
}

fn with_array_suffix(mut ty: String, brackets: usize) -> String {
    for _ in 0..brackets / 2 {
        ty.push_str("[]");
    }
    ty
}

/// Fields declared in class bodies, excluding anything inside methods.
pub fn class_local_fields(tokens: &TokenGrid) -> Vec<LocalField> {
    let mut pending = PendingDeclaration::default();
    tokens
        .iter()
        .filter(|t| t.has(scope::VARIABLE_DECLARATION) && !t.has(scope::METHOD))
        .filter_map(|t| pending.offer(t))
        .collect()
}

/// Locals and parameters visible from `row`, found by walking backwards to
/// the enclosing method's name.
///
/// Returns nothing when `row` is not inside a method or the walk leaves the
/// grid without meeting a method signature.
pub fn method_local_fields(tokens: &TokenGrid, row: usize) -> Vec<LocalField> {
    let Some(mut pos) = tokens.last_in_row(row) else {
        return vec![];
    };
    if !tokens.get(pos).is_some_and(|t| t.has(scope::METHOD)) {
        return vec![];
    }

    let mut fields = Vec::new();
    let mut pending = PendingDeclaration::default();
    while let Some(token) = tokens.get(pos) {
        if token.is_method_boundary() {
            return fields;
        }
        if token.is_declaration()
            && let Some(field) = pending.offer(token)
        {
            fields.push(field);
        }
        match tokens.step_back(pos) {
            Some(prev) => pos = prev,
            None => break,
        }
    }
    vec![]
}

#[derive(Debug, Default)]
struct MethodDraft {
    name: Option<String>,
    arguments: Vec<String>,
    argument_brackets: usize,
    return_type: Option<String>,
    return_brackets: usize,
}

impl MethodDraft {
    fn is_started(&self) -> bool {
        self.name.is_some()
    }

    fn flush_argument_brackets(&mut self) {
        if let Some(last) = self.arguments.pop() {
            self.arguments
                .push(with_array_suffix(last, self.argument_brackets));
        }
        self.argument_brackets = 0;
    }

    /// Constructors have no return type and are dropped.
    fn finish(mut self) -> Option<LocalMethod> {
        self.flush_argument_brackets();
        Some(LocalMethod {
            name: self.name?,
            arguments: self.arguments,
            return_type: with_array_suffix(self.return_type?, self.return_brackets),
        })
    }
}

/// Methods declared in the buffer, in source order.
pub fn local_methods(tokens: &TokenGrid) -> Vec<LocalMethod> {
    let mut methods = Vec::new();
    let mut draft: Option<MethodDraft> = None;

    for token in tokens.iter() {
        if !token.has(scope::METHOD) {
            methods.extend(draft.take().and_then(MethodDraft::finish));
            continue;
        }

        let is_return_type = token.has(scope::METHOD_RETURN_TYPE);
        let is_name = token.is_method_boundary();
        if (is_return_type || is_name) && draft.as_ref().is_some_and(MethodDraft::is_started) {
            methods.extend(draft.take().and_then(MethodDraft::finish));
        }
        let current = draft.get_or_insert_with(MethodDraft::default);

        if is_return_type {
            if token.is_square_bracket() {
                current.return_brackets += 1;
            } else if token.is_storage_type() {
                current.return_type = Some(token.value.clone());
                current.return_brackets = 0;
            }
        } else if is_name {
            current.name = Some(token.value.clone());
        } else if token.has(scope::METHOD_IDENTIFIER) {
            if token.is_square_bracket() {
                current.argument_brackets += 1;
            } else if token.is_storage_type() {
                current.flush_argument_brackets();
                current.arguments.push(token.value.clone());
            }
        }
    }
    methods.extend(draft.and_then(MethodDraft::finish));
    methods
}

/// Simple or qualified name of the superclass named by the first `extends` clause.
pub fn super_class(tokens: &TokenGrid) -> Option<&str> {
    tokens
        .iter()
        .find(|t| t.has(scope::INHERITED_CLASS))
        .map(|t| t.value.as_str())
}

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use super::imports::{ImportScope, StaticMember};
use super::locals::{self, LocalField, LocalMethod};
use super::tokens::TokenGrid;
use crate::language::rope_utils::line_col_to_offset;
use crate::registry::{ClassEntry, FieldEntry, MethodEntry, SymbolRegistry};

/// Opaque identity of an editor buffer, e.g. a document URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditorHandle(Arc<str>);

impl EditorHandle {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EditorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zero-based row and UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub row: u32,
    pub column: u32,
}

impl CursorPosition {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub editor: EditorHandle,
    pub source: Arc<str>,
    pub position: CursorPosition,
    /// Word typed before the cursor, as reported by the host.
    pub prefix: String,
    pub activated_manually: bool,
}

impl CompletionRequest {
    /// Byte offset of the cursor, clamped to the end of the buffer.
    pub fn offset(&self) -> usize {
        line_col_to_offset(&self.source, self.position.row, self.position.column)
            .unwrap_or(self.source.len())
    }
}

/// Class implicated by a reduced chain and whether it was reached statically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolutionContext {
    pub fully_qualified_class: Option<Arc<str>>,
    pub is_static: bool,
}

impl ResolutionContext {
    pub fn instance(class: impl Into<Arc<str>>) -> Self {
        Self {
            fully_qualified_class: Some(class.into()),
            is_static: false,
        }
    }

    pub fn of_class(class: impl Into<Arc<str>>) -> Self {
        Self {
            fully_qualified_class: Some(class.into()),
            is_static: true,
        }
    }

    /// Nothing resolved.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Everything a request can learn about the buffer around the cursor.
///
/// Token scans are computed on first use and reused for the rest of the request.
pub struct LexicalEnvironment<'a> {
    registry: &'a SymbolRegistry,
    tokens: &'a TokenGrid,
    row: usize,
    imports: ImportScope,
    class_fields: OnceCell<Vec<FieldEntry>>,
    method_locals: OnceCell<Vec<FieldEntry>>,
    local_methods: OnceCell<Vec<MethodEntry>>,
    super_class: OnceCell<Option<Arc<str>>>,
    lineage: OnceCell<Vec<Arc<ClassEntry>>>,
}

impl<'a> LexicalEnvironment<'a> {
    pub fn new(
        registry: &'a SymbolRegistry,
        tokens: &'a TokenGrid,
        source: &str,
        position: CursorPosition,
    ) -> Self {
        Self {
            registry,
            tokens,
            row: position.row as usize,
            imports: ImportScope::from_source(source),
            class_fields: OnceCell::new(),
            method_locals: OnceCell::new(),
            local_methods: OnceCell::new(),
            super_class: OnceCell::new(),
            lineage: OnceCell::new(),
        }
    }

    pub fn registry(&self) -> &'a SymbolRegistry {
        self.registry
    }

    pub fn imports(&self) -> &ImportScope {
        &self.imports
    }

    /// Qualify a class name through the buffer's imports.
    pub fn resolve_class(&self, name: &str) -> Option<Arc<str>> {
        self.imports.resolve(name, self.registry)
    }

    /// Qualify a declared type, keeping array suffixes and leaving unknown names as written.
    pub fn resolve_type(&self, written: &str) -> Arc<str> {
        let base = written.trim_end_matches("[]");
        let suffix = &written[base.len()..];
        match self.resolve_class(base) {
            Some(qualified) if suffix.is_empty() => qualified,
            Some(qualified) => Arc::from(format!("{qualified}{suffix}")),
            None => Arc::from(written),
        }
    }

    pub fn class_fields(&self) -> &[FieldEntry] {
        self.class_fields
            .get_or_init(|| self.qualify_fields(locals::class_local_fields(self.tokens)))
    }

    pub fn method_locals(&self) -> &[FieldEntry] {
        self.method_locals.get_or_init(|| {
            self.qualify_fields(locals::method_local_fields(self.tokens, self.row))
        })
    }

    pub fn local_methods(&self) -> &[MethodEntry] {
        self.local_methods.get_or_init(|| {
            locals::local_methods(self.tokens)
                .into_iter()
                .map(|m| self.qualify_method(m))
                .collect()
        })
    }

    /// Qualified superclass of the buffer's class, when it is registered.
    pub fn super_class(&self) -> Option<&Arc<str>> {
        self.super_class
            .get_or_init(|| locals::super_class(self.tokens).and_then(|s| self.resolve_class(s)))
            .as_ref()
    }

    /// The superclass followed by its registered ancestors.
    fn lineage(&self) -> &[Arc<ClassEntry>] {
        self.lineage.get_or_init(|| {
            let Some(super_class) = self.super_class() else {
                return vec![];
            };
            let Some(entry) = self.registry.get(super_class) else {
                return vec![];
            };
            let mut lineage = vec![entry];
            lineage.extend(self.registry.superclass_chain(super_class));
            lineage
        })
    }

    /// Public and protected fields of the superclass chain; nearer classes shadow by name.
    pub fn inherited_fields(&self) -> Vec<&FieldEntry> {
        let mut seen = rustc_hash::FxHashSet::default();
        self.lineage()
            .iter()
            .flat_map(|class| class.fields.iter())
            .filter(|f| f.modifiers.is_inheritable())
            .filter(|f| seen.insert(Arc::clone(&f.name)))
            .collect()
    }

    /// Public and protected methods of the superclass chain, constructors excluded;
    /// nearer classes shadow by name and arguments.
    pub fn inherited_methods(&self) -> Vec<&MethodEntry> {
        let mut seen = rustc_hash::FxHashSet::default();
        self.lineage()
            .iter()
            .flat_map(|class| class.methods.iter())
            .filter(|m| !m.is_constructor() && m.modifiers.is_inheritable())
            .filter(|m| seen.insert((Arc::clone(&m.name), m.signature.arguments.clone())))
            .collect()
    }

    pub fn static_import(&self, name: &str) -> Option<StaticMember> {
        self.imports.static_member(name, self.registry)
    }

    fn qualify_fields(&self, fields: Vec<LocalField>) -> Vec<FieldEntry> {
        fields
            .into_iter()
            .map(|f| FieldEntry {
                name: Arc::from(f.name),
                ty: self.resolve_type(&f.ty),
                modifiers: Default::default(),
            })
            .collect()
    }

    fn qualify_method(&self, method: LocalMethod) -> MethodEntry {
        MethodEntry {
            name: Arc::from(method.name),
            modifiers: Default::default(),
            signature: crate::registry::MethodSignature {
                arguments: method
                    .arguments
                    .iter()
                    .map(|a| self.resolve_type(a))
                    .collect(),
                return_value: Some(self.resolve_type(&method.return_type)),
            },
        }
    }
}

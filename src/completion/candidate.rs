use std::sync::Arc;

use crate::registry::{ClassEntry, FieldEntry, MethodEntry, leaf_name};

/// What a candidate is offered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryTag {
    Class,
    Field,
    Method,
    Constructor,
}

/// The symbol a candidate was found for.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateEntry {
    Class(Arc<ClassEntry>),
    Field(FieldEntry),
    Method(MethodEntry),
}

impl CandidateEntry {
    pub fn name(&self) -> &str {
        match self {
            CandidateEntry::Class(class) => &class.name,
            CandidateEntry::Field(field) => &field.name,
            CandidateEntry::Method(method) => &method.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub tag: EntryTag,
    pub entry: CandidateEntry,
    /// Reached through a qualifying expression such as `Outer.`; nested
    /// classes are then inserted by their last name component only.
    pub qualified: bool,
    /// Marks which finder produced the candidate (for debugging purposes)
    pub source: &'static str,
}

impl Candidate {
    pub fn new(tag: EntryTag, entry: CandidateEntry, source: &'static str) -> Self {
        Self {
            tag,
            entry,
            qualified: false,
            source,
        }
    }

    pub fn class(entry: Arc<ClassEntry>, source: &'static str) -> Self {
        Self::new(EntryTag::Class, CandidateEntry::Class(entry), source)
    }

    pub fn constructor(entry: Arc<ClassEntry>, source: &'static str) -> Self {
        Self::new(EntryTag::Constructor, CandidateEntry::Class(entry), source)
    }

    pub fn field(entry: FieldEntry, source: &'static str) -> Self {
        Self::new(EntryTag::Field, CandidateEntry::Field(entry), source)
    }

    pub fn method(entry: MethodEntry, source: &'static str) -> Self {
        Self::new(EntryTag::Method, CandidateEntry::Method(entry), source)
    }

    pub fn qualified(mut self) -> Self {
        self.qualified = true;
        self
    }

    /// Name the candidate is ranked by: the last component for classes, the
    /// member name otherwise.
    pub fn sort_name(&self) -> &str {
        match &self.entry {
            CandidateEntry::Class(class) => leaf_name(&class.name),
            other => other.name(),
        }
    }

    /// Ordering key: shorter names first, then by name, then by qualified name.
    pub fn sort_key(&self) -> (usize, &str, &str) {
        let name = self.sort_name();
        (name.chars().count(), name, self.entry.name())
    }
}

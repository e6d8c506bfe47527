//! Turning candidates into what the editor shows and inserts.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::candidate::{Candidate, CandidateEntry, EntryTag};
use crate::registry::{ClassEntry, FieldEntry, MethodEntry, denamespace, dotted, leaf_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionKind {
    Class,
    Method,
    Field,
    Constructor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Insertion {
    Text(String),
    /// Tab-stop snippet: `${1:placeholder}` and `$N`.
    Snippet(String),
}

impl Insertion {
    pub fn as_str(&self) -> &str {
        match self {
            Insertion::Text(text) | Insertion::Snippet(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub insertion: Insertion,
    pub display_text: String,
    /// Shown before the text: return or field type, constructor owner.
    pub left_label: Option<String>,
    /// Shown after the text: package.
    pub right_label: Option<String>,
    /// Class to import when the suggestion is accepted.
    pub class_name: Option<Arc<str>>,
}

/// Map candidates in order; mismatched candidates are dropped.
pub fn map_candidates<'c>(candidates: impl IntoIterator<Item = &'c Candidate>) -> Vec<Suggestion> {
    candidates.into_iter().flat_map(map_candidate).collect()
}

/// One suggestion per candidate, except constructors which yield one per
/// public overload.
pub fn map_candidate(candidate: &Candidate) -> Vec<Suggestion> {
    match (candidate.tag, &candidate.entry) {
        (EntryTag::Class, CandidateEntry::Class(class)) => vec![class_suggestion(class, candidate.qualified)],
        (EntryTag::Constructor, CandidateEntry::Class(class)) => constructor_suggestions(class),
        (EntryTag::Method, CandidateEntry::Method(method)) => vec![method_suggestion(method)],
        (EntryTag::Field, CandidateEntry::Field(field)) => vec![field_suggestion(field)],
        (tag, entry) => {
            warn!(?tag, name = entry.name(), source = candidate.source, "candidate tag does not match its entry");
            vec![]
        }
    }
}

fn class_suggestion(class: &ClassEntry, qualified: bool) -> Suggestion {
    let (text, class_name) = if qualified {
        (leaf_name(&class.name).to_string(), None)
    } else {
        (dotted(class.simple_name()), Some(Arc::clone(&class.name)))
    };
    Suggestion {
        kind: SuggestionKind::Class,
        insertion: Insertion::Snippet(escape_snippet(&text)),
        display_text: text,
        left_label: None,
        right_label: non_empty(class.package()),
        class_name,
    }
}

fn constructor_suggestions(class: &Arc<ClassEntry>) -> Vec<Suggestion> {
    let simple = dotted(class.simple_name());
    let mut constructors: Vec<&MethodEntry> =
        class.constructors().filter(|c| c.modifiers.is_public()).collect();
    constructors.sort_by_key(|c| c.arguments().len());

    constructors
        .into_iter()
        .map(|constructor| Suggestion {
            kind: SuggestionKind::Constructor,
            insertion: Insertion::Snippet(call_snippet(&simple, constructor.arguments())),
            display_text: call_display(&simple, constructor.arguments()),
            left_label: Some(dotted(&class.name)),
            right_label: non_empty(class.package()),
            class_name: Some(Arc::clone(&class.name)),
        })
        .collect()
}

fn method_suggestion(method: &MethodEntry) -> Suggestion {
    Suggestion {
        kind: SuggestionKind::Method,
        insertion: Insertion::Snippet(call_snippet(&method.name, method.arguments())),
        display_text: call_display(&method.name, method.arguments()),
        left_label: Some(method.return_type().map_or("void", |t| t.as_ref()).to_string()),
        right_label: None,
        class_name: None,
    }
}

fn field_suggestion(field: &FieldEntry) -> Suggestion {
    Suggestion {
        kind: SuggestionKind::Field,
        insertion: Insertion::Text(field.name.to_string()),
        display_text: field.name.to_string(),
        left_label: Some(field.ty.to_string()),
        right_label: None,
        class_name: None,
    }
}

/// `name(${1:A}, ${2:B})$3`
fn call_snippet(name: &str, arguments: &[Arc<str>]) -> String {
    let placeholders: Vec<String> = arguments
        .iter()
        .enumerate()
        .map(|(i, arg)| format!("${{{}:{}}}", i + 1, escape_snippet(&simple_type(arg))))
        .collect();
    format!(
        "{}({})${}",
        escape_snippet(name),
        placeholders.join(", "),
        arguments.len() + 1
    )
}

fn call_display(name: &str, arguments: &[Arc<str>]) -> String {
    let arguments: Vec<String> = arguments.iter().map(|a| simple_type(a)).collect();
    format!("{}({})", name, arguments.join(", "))
}

/// `java.util.Map$Entry[]` -> `Map.Entry[]`
fn simple_type(ty: &str) -> String {
    dotted(denamespace(ty))
}

fn escape_snippet(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '$' | '}' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

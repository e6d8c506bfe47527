use tower_lsp::lsp_types::*;

use super::capabilities::DID_INSERT_COMMAND;
use crate::completion::import_utils::{
    extract_package_from_source, find_import_insert_line, import_target, is_import_needed,
    make_import_text,
};
use crate::completion::imports::ImportScope;
use crate::completion::{EditorHandle, Insertion, Suggestion, SuggestionKind};
use crate::language::rope_utils::line_col_to_offset;

/// What the buffer already makes visible; computed once per request.
pub struct ImportSite<'a> {
    source: &'a str,
    imports: ImportScope,
    package: Option<String>,
}

impl<'a> ImportSite<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            imports: ImportScope::from_source(source),
            package: extract_package_from_source(source),
        }
    }

    /// Edit adding the import `class_name` needs, if any.
    fn import_edit(&self, class_name: &str) -> Option<TextEdit> {
        if !is_import_needed(class_name, &self.imports, self.package.as_deref()) {
            return None;
        }
        let line = find_import_insert_line(self.source);
        let at = Position { line, character: 0 };
        Some(TextEdit {
            range: Range { start: at, end: at },
            new_text: make_import_text(import_target(class_name), self.source),
        })
    }
}

/// Convert a suggestion to an LSP CompletionItem
pub fn suggestion_to_lsp(
    suggestion: &Suggestion,
    site: &ImportSite<'_>,
    editor: &EditorHandle,
) -> CompletionItem {
    let (insert_text, insert_text_format) = match &suggestion.insertion {
        Insertion::Text(text) => (text.clone(), InsertTextFormat::PLAIN_TEXT),
        Insertion::Snippet(snippet) => (snippet.clone(), InsertTextFormat::SNIPPET),
    };

    let imports_class = matches!(
        suggestion.kind,
        SuggestionKind::Class | SuggestionKind::Constructor
    );
    let class_name = suggestion.class_name.as_deref().filter(|_| imports_class);
    let additional_text_edits = class_name
        .and_then(|name| site.import_edit(name))
        .map(|edit| vec![edit]);
    let command = class_name.and_then(|_| did_insert_command(editor, suggestion));

    CompletionItem {
        label: suggestion.display_text.clone(),
        label_details: Some(CompletionItemLabelDetails {
            detail: None,
            description: suggestion.right_label.clone(),
        }),
        kind: Some(map_kind(suggestion.kind)),
        detail: suggestion.left_label.clone(),
        insert_text: Some(insert_text),
        insert_text_format: Some(insert_text_format),
        additional_text_edits,
        command,
        ..Default::default()
    }
}

fn did_insert_command(editor: &EditorHandle, suggestion: &Suggestion) -> Option<Command> {
    let suggestion = serde_json::to_value(suggestion).ok()?;
    Some(Command {
        title: "import class".into(),
        command: DID_INSERT_COMMAND.into(),
        arguments: Some(vec![editor.as_str().into(), suggestion]),
    })
}

/// Arguments of a did-insert command, as produced by [`suggestion_to_lsp`].
pub fn parse_did_insert_arguments(
    arguments: Vec<serde_json::Value>,
) -> Option<(EditorHandle, Suggestion)> {
    let mut arguments = arguments.into_iter();
    let editor = arguments.next()?.as_str().map(EditorHandle::new)?;
    let suggestion = serde_json::from_value(arguments.next()?).ok()?;
    Some((editor, suggestion))
}

fn map_kind(kind: SuggestionKind) -> CompletionItemKind {
    match kind {
        SuggestionKind::Class => CompletionItemKind::CLASS,
        SuggestionKind::Method => CompletionItemKind::METHOD,
        SuggestionKind::Field => CompletionItemKind::FIELD,
        SuggestionKind::Constructor => CompletionItemKind::CONSTRUCTOR,
    }
}

/// LSP Position -> Byte Offset within File (UTF-16 columns)
pub fn lsp_pos_to_offset(source: &str, pos: Position) -> Option<usize> {
    line_col_to_offset(source, pos.line, pos.character)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::sync::Arc;

    const SOURCE: &str = indoc! {"
        package org.example;

        import java.util.List;

        class Main {}
    "};

    fn class_suggestion(class_name: &str) -> Suggestion {
        Suggestion {
            kind: SuggestionKind::Class,
            insertion: Insertion::Text("Map.Entry".into()),
            display_text: "Map.Entry".into(),
            left_label: None,
            right_label: Some("java.util".into()),
            class_name: Some(Arc::from(class_name)),
        }
    }

    #[test]
    fn test_class_item_imports_outer_class() {
        let site = ImportSite::new(SOURCE);
        let editor = EditorHandle::new("file:///Main.java");
        let item = suggestion_to_lsp(&class_suggestion("java.util.Map$Entry"), &site, &editor);

        assert_eq!(item.kind, Some(CompletionItemKind::CLASS));
        assert_eq!(item.insert_text_format, Some(InsertTextFormat::PLAIN_TEXT));
        let edits = item.additional_text_edits.unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].range.start, Position::new(3, 0));
        assert_eq!(edits[0].new_text, "import java.util.Map;\n");

        let command = item.command.unwrap();
        assert_eq!(command.command, DID_INSERT_COMMAND);
        let (handle, suggestion) = parse_did_insert_arguments(command.arguments.unwrap()).unwrap();
        assert_eq!(handle, editor);
        assert_eq!(suggestion, class_suggestion("java.util.Map$Entry"));
    }

    #[test]
    fn test_visible_class_needs_no_edit() {
        let site = ImportSite::new(SOURCE);
        let editor = EditorHandle::new("file:///Main.java");
        for visible in ["java.util.List", "java.lang.String", "org.example.Helper"] {
            let item = suggestion_to_lsp(&class_suggestion(visible), &site, &editor);
            assert!(item.additional_text_edits.is_none(), "{visible}");
        }
    }

    #[test]
    fn test_method_snippet_item() {
        let suggestion = Suggestion {
            kind: SuggestionKind::Method,
            insertion: Insertion::Snippet("add(${1:Object})$2".into()),
            display_text: "add(Object)".into(),
            left_label: Some("boolean".into()),
            right_label: None,
            class_name: None,
        };
        let item = suggestion_to_lsp(
            &suggestion,
            &ImportSite::new(SOURCE),
            &EditorHandle::new("file:///Main.java"),
        );
        assert_eq!(item.label, "add(Object)");
        assert_eq!(item.detail.as_deref(), Some("boolean"));
        assert_eq!(item.insert_text_format, Some(InsertTextFormat::SNIPPET));
        assert!(item.additional_text_edits.is_none());
        assert!(item.command.is_none());
    }

    #[test]
    fn test_malformed_command_arguments() {
        assert!(parse_did_insert_arguments(vec![]).is_none());
        assert!(parse_did_insert_arguments(vec![serde_json::json!(1)]).is_none());
    }
}

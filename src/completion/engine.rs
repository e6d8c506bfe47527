use std::sync::Arc;
use tracing::debug;

use super::chain::{DotChain, ends_in_literal_or_comment, extract_trailing_chain};
use super::context::{CompletionRequest, EditorHandle, LexicalEnvironment};
use super::finders::FinderKind;
use super::mapper::{Suggestion, SuggestionKind, map_candidates};
use super::tokens::{TokenGrid, TokenSource, scope};
use crate::registry::SymbolRegistry;

pub const DEFAULT_MAX_SUGGESTIONS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Candidates kept after sorting.
    pub max_suggestions: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

/// Notified with the qualified name of an accepted class or constructor
/// suggestion so the host can add an import.
pub trait ImportHandler: Send + Sync {
    fn import_class(&self, editor: &EditorHandle, class_name: &str);
}

impl<F> ImportHandler for F
where
    F: Fn(&EditorHandle, &str) + Send + Sync,
{
    fn import_class(&self, editor: &EditorHandle, class_name: &str) {
        self(editor, class_name)
    }
}

pub struct CompletionEngine {
    tokens: Arc<dyn TokenSource>,
    import_handler: Option<Arc<dyn ImportHandler>>,
    config: CompletionConfig,
}

impl CompletionEngine {
    pub fn new(tokens: Arc<dyn TokenSource>, config: CompletionConfig) -> Self {
        Self {
            tokens,
            import_handler: None,
            config,
        }
    }

    pub fn with_import_handler(mut self, handler: impl ImportHandler + 'static) -> Self {
        self.import_handler = Some(Arc::new(handler));
        self
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CompletionConfig) {
        self.config = config;
    }

    /// Suggestions for the chain ending at the request's cursor.
    ///
    /// Read-only on the registry and the token snapshot; the same inputs
    /// always give the same ordered list.
    pub fn complete(&self, request: &CompletionRequest, registry: &SymbolRegistry) -> Vec<Suggestion> {
        let chain_text = extract_trailing_chain(&request.source, request.offset());
        let Some(chain) = DotChain::parse(&chain_text) else {
            debug!(chain = %chain_text, "malformed chain");
            return vec![];
        };

        if !chain.is_member_access() && request.prefix.trim().is_empty() && !request.activated_manually {
            return vec![];
        }

        let Some(tokens) = self.tokens.tokens(&request.editor, &request.source) else {
            debug!(editor = %request.editor, "tokens not available yet");
            return vec![];
        };

        if in_comment_or_string(&tokens, request) {
            debug!(editor = %request.editor, "cursor inside a comment or string");
            return vec![];
        }

        let env = LexicalEnvironment::new(registry, &tokens, &request.source, request.position);
        let finder = FinderKind::select(&chain).finder();
        let mut candidates = finder.find(&chain, &env);
        let found = candidates.len();

        candidates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        candidates.truncate(self.config.max_suggestions);

        debug!(
            finder = finder.name(),
            chain = ?chain.segments(),
            found,
            kept = candidates.len(),
            "completion"
        );
        map_candidates(&candidates)
    }

    /// Called by the host once the user accepts `suggestion`.
    pub fn did_insert_suggestion(&self, editor: &EditorHandle, suggestion: &Suggestion) {
        if !matches!(suggestion.kind, SuggestionKind::Class | SuggestionKind::Constructor) {
            return;
        }
        if let (Some(handler), Some(class_name)) = (&self.import_handler, &suggestion.class_name) {
            handler.import_class(editor, class_name);
        }
    }
}

/// Whether the cursor sits in a comment or a string literal.
///
/// The line up to the cursor is scanned first, which catches literals and
/// comments still being typed. Block comments and text blocks spanning rows
/// are recognized through the scope of the token under the cursor.
fn in_comment_or_string(tokens: &TokenGrid, request: &CompletionRequest) -> bool {
    let source = &request.source;
    let offset = request.offset();
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[offset..].find('\n').map_or(source.len(), |i| offset + i);
    let line = &source[line_start..line_end];
    let column = offset - line_start;

    ends_in_literal_or_comment(&line[..column])
        || tokens
            .token_at(request.position.row as usize, column, line)
            .is_some_and(|t| t.has(scope::COMMENT) || t.has(scope::STRING))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::context::CursorPosition;
    use crate::completion::tokens::test_support::{FixedTokens, tok};
    use crate::completion::tokens::{TokenGrid, scope};
    use crate::registry::test_support::*;
    use indoc::indoc;
    use std::sync::Mutex;

    const SOURCE: &str = indoc! {r#"
        import java.util.*;
        class Main {
            ArrayList items;
            void run() {
                items.
            }
        }
    "#};

    fn registry() -> SymbolRegistry {
        let mut list = class("java.util.ArrayList", &["public"]);
        list.methods.push(constructor(&[], &["public"]));
        list.methods.push(constructor(&["int"], &["public"]));
        list.methods.push(method("size", &[], Some("int"), &["public"]));
        list.methods.push(method("add", &["java.lang.Object"], Some("boolean"), &["public"]));
        list.methods.push(method("addAll", &["java.util.Collection"], Some("boolean"), &["public"]));
        list.methods.push(method("get", &["int"], Some("java.lang.Object"), &["public"]));
        list.fields.push(field("modCount", "int", &["public"]));
        let mut map = class("java.util.HashMap", &["public"]);
        map.methods.push(constructor(&[], &["public"]));

        let mut registry = SymbolRegistry::new();
        registry.add_classes([
            list,
            map,
            class("java.util.Arrays", &["public"]),
            class("java.util.AbstractList", &["public"]),
            class("java.lang.String", &["public"]),
        ]);
        registry
    }

    fn tokens() -> TokenGrid {
        let body = &[scope::METHOD, scope::METHOD_BODY];
        TokenGrid::new(vec![
            vec![],
            vec![tok("class", &[]), tok("Main", &[scope::CLASS_NAME]), tok("{", &[])],
            vec![
                tok("ArrayList", &[scope::VARIABLE_DECLARATION, scope::STORAGE_TYPE]),
                tok("items", &[scope::VARIABLE_DECLARATION, scope::VARIABLE_DEFINITION]),
                tok(";", &[]),
            ],
            vec![
                tok("void", &[scope::METHOD, scope::METHOD_RETURN_TYPE, scope::STORAGE_TYPE_PRIMITIVE]),
                tok("run", &[scope::METHOD, scope::METHOD_IDENTIFIER, scope::FUNCTION_NAME]),
                tok("(", &[scope::METHOD, scope::METHOD_IDENTIFIER]),
                tok(")", &[scope::METHOD, scope::METHOD_IDENTIFIER]),
                tok("{", body),
            ],
            vec![tok("items", body), tok(".", body)],
            vec![tok("}", body)],
            vec![tok("}", &[])],
        ])
    }

    fn engine(config: CompletionConfig) -> CompletionEngine {
        CompletionEngine::new(Arc::new(FixedTokens(Some(Arc::new(tokens())))), config)
    }

    /// Request with the cursor placed after `line_text` on `row`.
    fn request(row: u32, line_text: &str, prefix: &str) -> CompletionRequest {
        let mut lines: Vec<&str> = SOURCE.lines().collect();
        lines[row as usize] = line_text;
        CompletionRequest {
            editor: EditorHandle::new("file:///Main.java"),
            source: Arc::from(lines.join("\n")),
            position: CursorPosition::new(row, line_text.encode_utf16().count() as u32),
            prefix: prefix.to_string(),
            activated_manually: false,
        }
    }

    fn render(suggestions: &[Suggestion]) -> String {
        suggestions
            .iter()
            .map(|s| {
                format!(
                    "{:?} {} [{}] {}",
                    s.kind,
                    s.insertion.as_str(),
                    s.left_label.as_deref().unwrap_or(""),
                    s.right_label.as_deref().unwrap_or("")
                )
                .trim_end()
                .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_member_completion() {
        let suggestions = engine(CompletionConfig::default()).complete(&request(4, "        items.", ""), &registry());
        insta::assert_snapshot!(render(&suggestions), @r"
        Method add(${1:Object})$2 [boolean]
        Method get(${1:int})$2 [java.lang.Object]
        Method size()$1 [int]
        Method addAll(${1:Collection})$2 [boolean]
        Field modCount [int]
        ");
    }

    #[test]
    fn test_member_prefix() {
        let suggestions =
            engine(CompletionConfig::default()).complete(&request(4, "        items.ad", "ad"), &registry());
        let names: Vec<&str> = suggestions.iter().map(|s| s.display_text.as_str()).collect();
        assert_eq!(names, vec!["add(Object)", "addAll(Collection)"]);
    }

    #[test]
    fn test_constructor_completion() {
        let suggestions = engine(CompletionConfig::default())
            .complete(&request(4, "        var x = new Ha", "Ha"), &registry());
        insta::assert_snapshot!(render(&suggestions), @"Constructor HashMap()$1 [java.util.HashMap] java.util");
    }

    #[test]
    fn test_plain_completion_is_capped() {
        let suggestions = engine(CompletionConfig { max_suggestions: 2 })
            .complete(&request(4, "        A", "A"), &registry());
        insta::assert_snapshot!(render(&suggestions), @r"
        Class Arrays [] java.util
        Class ArrayList [] java.util
        ");
    }

    #[test]
    fn test_empty_prefix_needs_manual_activation() {
        let engine = engine(CompletionConfig::default());
        let mut request = request(4, "        ", "");
        assert!(engine.complete(&request, &registry()).is_empty());

        request.activated_manually = true;
        let suggestions = engine.complete(&request, &registry());
        assert!(suggestions.iter().any(|s| s.display_text == "items"));
    }

    #[test]
    fn test_missing_tokens_yield_nothing() {
        let engine = CompletionEngine::new(Arc::new(FixedTokens(None)), CompletionConfig::default());
        assert!(engine.complete(&request(4, "        items.", ""), &registry()).is_empty());
    }

    #[test]
    fn test_malformed_chain_yields_nothing() {
        let engine = engine(CompletionConfig::default());
        assert!(engine.complete(&request(4, "        foo(\"a.", ""), &registry()).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let engine = engine(CompletionConfig::default());
        let registry = registry();
        let request = request(4, "        items.", "");
        assert_eq!(engine.complete(&request, &registry), engine.complete(&request, &registry));
    }

    #[test]
    fn test_did_insert_fires_import_handler_for_classes() {
        let imported = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&imported);
        let engine = engine(CompletionConfig::default()).with_import_handler(
            move |editor: &EditorHandle, class: &str| {
                sink.lock().unwrap().push(format!("{editor} {class}"));
            },
        );
        let registry = registry();

        for suggestion in engine.complete(&request(4, "        new Ha", "Ha"), &registry) {
            engine.did_insert_suggestion(&EditorHandle::new("file:///Main.java"), &suggestion);
        }
        for suggestion in engine.complete(&request(4, "        items.si", "si"), &registry) {
            engine.did_insert_suggestion(&EditorHandle::new("file:///Main.java"), &suggestion);
        }

        assert_eq!(
            *imported.lock().unwrap(),
            vec!["file:///Main.java java.util.HashMap".to_string()]
        );
    }

    /// Engine over the tree-sitter tokenizer; fresh cache per engine.
    fn java_engine() -> CompletionEngine {
        use crate::language::{DEFAULT_REFRESH_DELAY, JavaTokenizer, TokenCache};
        let cache = TokenCache::new(Arc::new(JavaTokenizer), DEFAULT_REFRESH_DELAY);
        CompletionEngine::new(Arc::new(cache), CompletionConfig::default())
    }

    /// Request with the cursor at the `|` marker of `marked`.
    fn request_at_marker(marked: &str) -> CompletionRequest {
        let offset = marked.find('|').unwrap();
        let source = marked.replacen('|', "", 1);
        let before = &source[..offset];
        let line = before.rsplit('\n').next().unwrap();
        let prefix: String = line
            .chars()
            .rev()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        CompletionRequest {
            editor: EditorHandle::new("file:///Main.java"),
            position: CursorPosition::new(
                before.matches('\n').count() as u32,
                line.encode_utf16().count() as u32,
            ),
            source: Arc::from(source),
            prefix,
            activated_manually: false,
        }
    }

    fn names(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.display_text.as_str()).collect()
    }

    fn in_method(body: &str) -> String {
        format!(
            "import java.util.*;\nclass Main {{\n    ArrayList items;\n    void run() {{\n{body}\n    }}\n}}\n"
        )
    }

    #[test]
    fn test_code_completes_with_real_tokens() {
        let registry = registry();
        let plain = java_engine().complete(&request_at_marker(&in_method("        Arr|")), &registry);
        assert_eq!(names(&plain), vec!["Arrays", "ArrayList"]);
        let member = java_engine().complete(&request_at_marker(&in_method("        items.si|")), &registry);
        assert_eq!(names(&member), vec!["size()"]);
    }

    #[test]
    fn test_nothing_inside_comments() {
        let registry = registry();
        for body in [
            "        // see Arr|",
            "        // items.si|",
            "        /* see Arr| */",
            "        /* see\n           Arr| */",
        ] {
            let suggestions = java_engine().complete(&request_at_marker(&in_method(body)), &registry);
            assert!(suggestions.is_empty(), "{body:?}: {:?}", names(&suggestions));
        }
    }

    #[test]
    fn test_nothing_inside_strings() {
        let registry = registry();
        for body in [
            "        String s = \"hello Arr|",
            "        String s = \"hello Arr|\";",
            "        String s = \"\"\"\n            items.si|\n            \"\"\";",
        ] {
            let suggestions = java_engine().complete(&request_at_marker(&in_method(body)), &registry);
            assert!(suggestions.is_empty(), "{body:?}: {:?}", names(&suggestions));
        }
    }

    #[test]
    fn test_code_after_closed_comment_and_string_completes() {
        let registry = registry();
        let body = "        String s = \"a.b\"; /* note */ items.si|";
        let suggestions = java_engine().complete(&request_at_marker(&in_method(body)), &registry);
        assert_eq!(names(&suggestions), vec!["size()"]);
    }
}

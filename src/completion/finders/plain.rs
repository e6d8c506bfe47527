use rustc_hash::FxHashSet;
use std::sync::Arc;

use super::EntryFinder;
use crate::completion::candidate::Candidate;
use crate::completion::chain::{DotChain, plain_name};
use crate::completion::context::LexicalEnvironment;
use crate::registry::{KeyProjection, nested_beyond};

/// A bare identifier: variables and methods in scope, then classes.
pub struct PlainEntryFinder;

impl EntryFinder for PlainEntryFinder {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn find(&self, chain: &DotChain, env: &LexicalEnvironment<'_>) -> Vec<Candidate> {
        let prefix = plain_name(chain.leaf());
        let mut candidates = Vec::new();

        // Locals shadow fields of the class, which shadow inherited ones.
        let mut variables = FxHashSet::default();
        let fields = env
            .method_locals()
            .iter()
            .chain(env.class_fields())
            .chain(env.inherited_fields());
        for field in fields {
            if field.name.starts_with(prefix) && variables.insert(Arc::clone(&field.name)) {
                candidates.push(Candidate::field(field.clone(), self.name()));
            }
        }

        let mut methods = FxHashSet::default();
        for method in env.local_methods().iter().chain(env.inherited_methods()) {
            let key = (Arc::clone(&method.name), method.signature.arguments.clone());
            if method.name.starts_with(prefix) && methods.insert(key) {
                candidates.push(Candidate::method(method.clone(), self.name()));
            }
        }

        candidates.extend(
            env.registry()
                .find(prefix, KeyProjection::SimpleName)
                .into_iter()
                .filter(|class| class.modifiers.is_public())
                .filter(|class| !nested_beyond(class.simple_name(), prefix.len()))
                .map(|class| Candidate::class(class, self.name())),
        );
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run;
    use super::*;
    use crate::completion::tokens::test_support::tok;
    use crate::completion::tokens::{TokenGrid, scope};
    use crate::registry::SymbolRegistry;
    use crate::registry::test_support::*;

    const SOURCE: &str = "import app.Base;\n";

    fn registry() -> SymbolRegistry {
        let mut base = class("app.Base", &["public"]);
        base.fields.push(field("counter", "int", &["protected"]));
        base.fields.push(field("count", "long", &["public"]));
        base.methods.push(method("compute", &[], Some("int"), &["public"]));
        base.methods.push(method("cleanup", &[], None, &["private"]));
        let mut registry = SymbolRegistry::new();
        registry.add_classes([
            base,
            class("java.util.Collection", &["public"]),
            class("java.util.Collections", &["public"]),
            class("java.util.Collection$Inner", &["public"]),
            class("app.Cache", &["private"]),
        ]);
        registry
    }

    /// class Main extends Base {
    ///     int count;
    ///     int compute() { ... }
    ///     void run(String cursor) {
    ///         <cursor>
    fn tokens() -> TokenGrid {
        let name = &[scope::METHOD, scope::METHOD_IDENTIFIER, scope::FUNCTION_NAME];
        let body = &[scope::METHOD, scope::METHOD_BODY];
        TokenGrid::new(vec![
            vec![],
            vec![
                tok("class", &[]),
                tok("Main", &[scope::CLASS_NAME]),
                tok("extends", &[]),
                tok("Base", &[scope::INHERITED_CLASS]),
                tok("{", &[]),
            ],
            vec![
                tok("int", &[scope::VARIABLE_DECLARATION, scope::STORAGE_TYPE_PRIMITIVE]),
                tok("count", &[scope::VARIABLE_DECLARATION, scope::VARIABLE_DEFINITION]),
                tok(";", &[]),
            ],
            vec![
                tok("int", &[scope::METHOD, scope::METHOD_RETURN_TYPE, scope::STORAGE_TYPE_PRIMITIVE]),
                tok("compute", name),
                tok("{", body),
                tok("}", body),
            ],
            vec![
                tok("void", &[scope::METHOD, scope::METHOD_RETURN_TYPE, scope::STORAGE_TYPE_PRIMITIVE]),
                tok("run", name),
                tok("String", &[scope::METHOD, scope::METHOD_IDENTIFIER, scope::STORAGE_TYPE]),
                tok("cursor", &[scope::METHOD, scope::METHOD_IDENTIFIER, scope::VARIABLE_PARAMETER]),
                tok("{", body),
            ],
            vec![tok("c", body)],
        ])
    }

    fn find(chain: &str) -> Vec<String> {
        run(&PlainEntryFinder, chain, &registry(), &tokens(), SOURCE, 5)
    }

    #[test]
    fn test_scope_symbols() {
        assert_eq!(
            find("c"),
            vec!["Field count", "Field counter", "Field cursor", "Method compute"]
        );
    }

    #[test]
    fn test_classes_by_simple_name() {
        assert_eq!(
            find("Co"),
            vec!["Class java.util.Collection", "Class java.util.Collections"]
        );
        assert!(find("Ca").is_empty(), "non-public classes are skipped");
    }

    #[test]
    fn test_nested_class_only_past_separator() {
        assert_eq!(find("Collection$"), vec!["Class java.util.Collection$Inner"]);
    }

    #[test]
    fn test_no_match() {
        assert!(find("zz").is_empty());
    }
}

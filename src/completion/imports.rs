use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::registry::{
    FieldEntry, MethodEntry, NESTED_CLASS_SEPARATOR, SymbolRegistry, denamespace, packagify,
};

static IMPORT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"import\s+([^;]+);").expect("import pattern compiles"));

const IMPLICIT_IMPORT: &str = "java.lang.*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Dotted path as written, e.g. `java.util.*` or `java.util.List`.
    pub path: String,
    pub is_static: bool,
}

impl ImportDecl {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix("static") {
            Some(rest) if rest.starts_with(char::is_whitespace) => Self {
                path: compact(rest),
                is_static: true,
            },
            _ => Self {
                path: compact(raw),
                is_static: false,
            },
        }
    }

    pub fn is_wildcard(&self) -> bool {
        denamespace(&self.path) == "*"
    }

    /// Whether this import can name `simple`.
    fn names(&self, simple: &str) -> bool {
        let last = denamespace(&self.path);
        last == simple || last == "*"
    }
}

fn compact(path: &str) -> String {
    path.chars().filter(|c| !c.is_whitespace()).collect()
}

/// A static member reached through `import static`.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticMember {
    Field(FieldEntry),
    Method(MethodEntry),
}

/// The imports of one buffer.
#[derive(Debug, Clone, Default)]
pub struct ImportScope {
    imports: Vec<ImportDecl>,
}

impl ImportScope {
    pub fn from_source(source: &str) -> Self {
        let imports = IMPORT_REGEX
            .captures_iter(source)
            .filter_map(|c| c.get(1))
            .map(|m| ImportDecl::parse(m.as_str()))
            .collect();
        Self { imports }
    }

    pub fn imports(&self) -> &[ImportDecl] {
        &self.imports
    }

    /// Qualify a class name as written in source.
    ///
    /// Candidates are the type imports naming `simple` or ending in `*`,
    /// followed by the implicit `java.lang.*`; the first candidate whose
    /// package holds `simple` in the registry wins. Names containing dots are
    /// tried as qualified names first, then as nested classes of an imported
    /// outer class.
    pub fn resolve(&self, simple: &str, registry: &SymbolRegistry) -> Option<Arc<str>> {
        if simple.is_empty() {
            return None;
        }
        if simple.contains('.') {
            return self.resolve_dotted(simple, registry);
        }

        self.imports
            .iter()
            .filter(|i| !i.is_static && i.names(simple))
            .map(|i| i.path.as_str())
            .chain(std::iter::once(IMPLICIT_IMPORT))
            .find_map(|candidate| {
                let qualified = format!("{}.{}", packagify(candidate), simple);
                registry.get(&qualified).map(|entry| Arc::clone(&entry.name))
            })
    }

    fn resolve_dotted(&self, name: &str, registry: &SymbolRegistry) -> Option<Arc<str>> {
        if let Some(entry) = registry.get(name) {
            return Some(Arc::clone(&entry.name));
        }
        let (outer, nested) = name.split_once('.')?;
        let outer = self.resolve(outer, registry)?;
        let separator = NESTED_CLASS_SEPARATOR.to_string();
        let qualified = format!("{outer}{separator}{}", nested.replace('.', &separator));
        registry.get(&qualified).map(|entry| Arc::clone(&entry.name))
    }

    /// Look `name` up among statically imported members.
    pub fn static_member(&self, name: &str, registry: &SymbolRegistry) -> Option<StaticMember> {
        self.imports
            .iter()
            .filter(|i| i.is_static && i.names(name))
            .find_map(|import| {
                let class = registry.get(packagify(&import.path))?;
                if let Some(field) = class
                    .fields
                    .iter()
                    .find(|f| f.name.as_ref() == name && f.modifiers.is_static())
                {
                    return Some(StaticMember::Field(field.clone()));
                }
                class
                    .methods
                    .iter()
                    .find(|m| {
                        !m.is_constructor() && m.name.as_ref() == name && m.modifiers.is_static()
                    })
                    .map(|m| StaticMember::Method(m.clone()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::*;
    use indoc::indoc;

    const SOURCE: &str = indoc! {r#"
        package org.example;

        import java.util.List;
        import java.io.*;
        import static java.util.Collections.emptyList;
        import static java.lang.Math.*;

        public class Main {}
    "#};

    fn registry() -> SymbolRegistry {
        let mut registry = SymbolRegistry::new();
        let mut collections = class("java.util.Collections", &["public"]);
        collections.methods.push(method(
            "emptyList",
            &[],
            Some("java.util.List"),
            &["public", "static"],
        ));
        let mut math = class("java.lang.Math", &["public"]);
        math.fields.push(field("PI", "double", &["public", "static"]));
        registry.add_classes([
            class("java.util.List", &["public"]),
            class("java.util.Map", &["public"]),
            class("java.util.Map$Entry", &["public"]),
            class("java.io.File", &["public"]),
            class("java.lang.String", &["public"]),
            class("org.example.File", &["public"]),
            collections,
            math,
        ]);
        registry
    }

    #[test]
    fn test_parse_imports() {
        let scope = ImportScope::from_source(SOURCE);
        let imports = scope.imports();
        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].path, "java.util.List");
        assert!(!imports[0].is_static);
        assert!(imports[1].is_wildcard());
        assert_eq!(imports[2].path, "java.util.Collections.emptyList");
        assert!(imports[2].is_static);
    }

    #[test]
    fn test_resolve_exact_wildcard_and_implicit() {
        let scope = ImportScope::from_source(SOURCE);
        let registry = registry();
        assert_eq!(scope.resolve("List", &registry).as_deref(), Some("java.util.List"));
        assert_eq!(scope.resolve("File", &registry).as_deref(), Some("java.io.File"));
        assert_eq!(scope.resolve("String", &registry).as_deref(), Some("java.lang.String"));
        assert_eq!(scope.resolve("Map", &registry), None, "java.util.Map is not imported");
        assert_eq!(scope.resolve("Missing", &registry), None);
    }

    #[test]
    fn test_resolve_dotted_names() {
        let scope = ImportScope::from_source("import java.util.Map;");
        let registry = registry();
        assert_eq!(
            scope.resolve("java.util.List", &registry).as_deref(),
            Some("java.util.List")
        );
        assert_eq!(
            scope.resolve("Map.Entry", &registry).as_deref(),
            Some("java.util.Map$Entry")
        );
    }

    #[test]
    fn test_static_member_lookup() {
        let scope = ImportScope::from_source(SOURCE);
        let registry = registry();
        match scope.static_member("emptyList", &registry) {
            Some(StaticMember::Method(m)) => {
                assert_eq!(m.return_type().map(|t| t.as_ref()), Some("java.util.List"))
            }
            other => panic!("expected static method, got {other:?}"),
        }
        match scope.static_member("PI", &registry) {
            Some(StaticMember::Field(f)) => assert_eq!(f.ty.as_ref(), "double"),
            other => panic!("expected static field, got {other:?}"),
        }
        assert_eq!(scope.static_member("nothing", &registry), None);
    }
}

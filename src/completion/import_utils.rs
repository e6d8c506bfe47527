use super::imports::ImportScope;
use crate::registry::{NESTED_CLASS_SEPARATOR, packagify};

/// Name to put in an import statement for a registry class.
///
/// Nested classes are inserted as `Outer.Inner`, so their outermost class is
/// what gets imported: `java.util.Map$Entry` -> `java.util.Map`.
pub fn import_target(class_name: &str) -> &str {
    match class_name.find(NESTED_CLASS_SEPARATOR) {
        Some(pos) => &class_name[..pos],
        None => class_name,
    }
}

/// Check if accepting `class_name` requires a new import statement
///
/// Cases where imports are not needed:
/// 1. Default package (classes without a package name)
/// 2. java.lang package (auto-import)
/// 3. Exact match with an existing import
/// 4. Wildcard import covering the class's package (not sub-packages)
/// 5. Same package as the buffer
pub fn is_import_needed(class_name: &str, imports: &ImportScope, package: Option<&str>) -> bool {
    let target = import_target(class_name);
    let class_package = packagify(target);

    if class_package.is_empty() || class_package == "java.lang" {
        return false;
    }

    let covered = imports
        .imports()
        .iter()
        .filter(|i| !i.is_static)
        .any(|i| i.path == target || wildcard_covers(&i.path, class_package));
    if covered {
        return false;
    }

    package != Some(class_package)
}

/// "org.example.*" covers classes of "org.example" but not of "org.example.sub"
fn wildcard_covers(wildcard_import: &str, class_package: &str) -> bool {
    wildcard_import.strip_suffix(".*") == Some(class_package)
}

/// Package declared by the buffer, dotted.
pub fn extract_package_from_source(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        line.trim()
            .strip_prefix("package ")
            .map(|rest| rest.trim_end_matches(';').trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Line where a new import goes: after the last import, else after the
/// package declaration, else at the top.
pub fn find_import_insert_line(source: &str) -> u32 {
    let mut last_package_line: Option<u32> = None;
    let mut last_import_line: Option<u32> = None;

    for (i, line) in source.lines().enumerate() {
        let t = line.trim();
        if t.starts_with("package ") {
            last_package_line = Some(i as u32);
        }
        if t.starts_with("import ") {
            last_import_line = Some(i as u32);
        }
    }

    last_import_line
        .or(last_package_line)
        .map_or(0, |line| line + 1)
}

/// Import statement text; the first import after a package is separated by a blank line.
pub fn make_import_text(target: &str, source: &str) -> String {
    let has_existing_imports = source.lines().any(|l| l.trim().starts_with("import "));
    let has_package = extract_package_from_source(source).is_some();
    if !has_existing_imports && has_package {
        format!("\nimport {target};\n")
    } else {
        format!("import {target};\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn needed(class_name: &str, source: &str) -> bool {
        let imports = ImportScope::from_source(source);
        let package = extract_package_from_source(source);
        is_import_needed(class_name, &imports, package.as_deref())
    }

    #[test]
    fn test_java_lang_not_needed() {
        assert!(!needed("java.lang.String", ""));
        assert!(needed("java.lang.reflect.Method", ""));
    }

    #[test]
    fn test_default_package_not_needed() {
        assert!(!needed("MyClass", "package org.example;"));
    }

    #[test]
    fn test_existing_imports() {
        let source = indoc! {"
            package org.example;

            import java.util.List;
            import java.io.*;
            import static java.util.Collections.*;
        "};
        assert!(!needed("java.util.List", source));
        assert!(!needed("java.io.File", source));
        assert!(needed("java.io.channels.FileChannel", source));
        assert!(needed("java.util.Collections", source), "static imports do not import the class");
        assert!(!needed("org.example.Helper", source));
        assert!(needed("org.example.sub.Helper", source));
    }

    #[test]
    fn test_nested_class_imports_outer() {
        assert_eq!(import_target("java.util.Map$Entry"), "java.util.Map");
        assert!(!needed("java.util.Map$Entry", "import java.util.Map;"));
        assert!(needed("java.util.Map$Entry", "import java.util.List;"));
    }

    #[test]
    fn test_import_insert_line() {
        assert_eq!(find_import_insert_line("package a;\n\nclass Main {}\n"), 1);
        assert_eq!(
            find_import_insert_line("package a;\nimport b.C;\nimport b.D;\nclass Main {}\n"),
            3
        );
        assert_eq!(find_import_insert_line("class Main {}\n"), 0);
    }

    #[test]
    fn test_import_text() {
        assert_eq!(
            make_import_text("java.util.List", "package a;\nclass Main {}\n"),
            "\nimport java.util.List;\n"
        );
        assert_eq!(
            make_import_text("java.util.Map", "package a;\nimport java.util.List;\n"),
            "import java.util.Map;\n"
        );
        assert_eq!(
            make_import_text("java.util.Map", "class Main {}\n"),
            "import java.util.Map;\n"
        );
    }
}

//! Helpers for projecting fully-qualified class names.

use super::NESTED_CLASS_SEPARATOR;

/// Simple name of a dotted qualified name: `java.util.Map$Entry` -> `Map$Entry`.
pub fn denamespace(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Package part of a dotted qualified name; empty for the default package.
pub fn packagify(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) => &name[..pos],
        None => "",
    }
}

/// Name part of a chain segment or method identifier: `someMethod(String a)` -> `someMethod`.
pub fn nameify(identifier: &str) -> &str {
    match identifier.find('(') {
        Some(pos) => &identifier[..pos],
        None => identifier,
    }
}

/// True when `name` continues past `prefix_len` bytes into a nested class.
///
/// `Foo$Inner` queried with `Foo` is nested beyond the prefix, while
/// `Outer$In` queried with `Outer$I` is not.
pub fn nested_beyond(name: &str, prefix_len: usize) -> bool {
    name.get(prefix_len..)
        .is_some_and(|rest| rest.contains(NESTED_CLASS_SEPARATOR))
}

/// Display form of a nested name: `Map$Entry` -> `Map.Entry`.
pub fn dotted(name: &str) -> String {
    name.replace(NESTED_CLASS_SEPARATOR, ".")
}

/// Last component of a class name, past both package and nesting separators.
pub fn leaf_name(name: &str) -> &str {
    let simple = denamespace(name);
    match simple.rfind(NESTED_CLASS_SEPARATOR) {
        Some(pos) => &simple[pos + 1..],
        None => simple,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denamespace() {
        assert_eq!(denamespace("java.util.List"), "List");
        assert_eq!(denamespace("java.util.Map$Entry"), "Map$Entry");
        assert_eq!(denamespace("Plain"), "Plain");
    }

    #[test]
    fn test_packagify() {
        assert_eq!(packagify("java.util.List"), "java.util");
        assert_eq!(packagify("Plain"), "");
    }

    #[test]
    fn test_nameify() {
        assert_eq!(nameify("someMethod(String arg1)"), "someMethod");
        assert_eq!(nameify("field"), "field");
        assert_eq!(nameify("call()"), "call");
    }

    #[test]
    fn test_nested_beyond() {
        assert!(nested_beyond("Foo$Inner", 3));
        assert!(!nested_beyond("Foo", 3));
        assert!(!nested_beyond("Outer$In", 7));
        assert!(!nested_beyond("Foo", 10));
    }

    #[test]
    fn test_leaf_and_dotted() {
        assert_eq!(leaf_name("java.util.Map$Entry"), "Entry");
        assert_eq!(leaf_name("java.util.List"), "List");
        assert_eq!(dotted("Map$Entry"), "Map.Entry");
    }
}

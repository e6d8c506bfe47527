use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod collector;
pub mod names;

pub use names::{denamespace, dotted, leaf_name, nameify, nested_beyond, packagify};

/// Separator between an enclosing class and its nested class in qualified names.
pub const NESTED_CLASS_SEPARATOR: char = '$';

/// Method name used for constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Upper bound on superclass links followed from a single class.
pub const MAX_SUPER_DEPTH: usize = 64;

/// Textual modifiers as emitted by the class descriptor dump (`public`, `static`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(Vec<Arc<str>>);

impl Modifiers {
    pub fn new<I, S>(modifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self(modifiers.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, modifier: &str) -> bool {
        self.0.iter().any(|m| m.as_ref() == modifier)
    }

    pub fn is_public(&self) -> bool {
        self.contains("public")
    }

    pub fn is_protected(&self) -> bool {
        self.contains("protected")
    }

    pub fn is_static(&self) -> bool {
        self.contains("static")
    }

    /// Visible to subclasses outside the declaring package.
    pub fn is_inheritable(&self) -> bool {
        self.is_public() || self.is_protected()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: Arc<str>,
    #[serde(rename = "type")]
    pub ty: Arc<str>,
    #[serde(default)]
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodSignature {
    #[serde(default)]
    pub arguments: Vec<Arc<str>>,
    /// `None` for constructors.
    #[serde(rename = "returnValue", default)]
    pub return_value: Option<Arc<str>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodEntry {
    pub name: Arc<str>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub signature: MethodSignature,
}

impl MethodEntry {
    pub fn is_constructor(&self) -> bool {
        self.name.as_ref() == CONSTRUCTOR_NAME
    }

    pub fn return_type(&self) -> Option<&Arc<str>> {
        self.signature.return_value.as_ref()
    }

    pub fn arguments(&self) -> &[Arc<str>] {
        &self.signature.arguments
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub name: Arc<str>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(rename = "super", default)]
    pub super_name: Option<Arc<str>>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
}

impl ClassEntry {
    pub fn simple_name(&self) -> &str {
        denamespace(&self.name)
    }

    pub fn package(&self) -> &str {
        packagify(&self.name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodEntry> {
        self.methods.iter().filter(|m| m.is_constructor())
    }

    pub fn has_public_constructor(&self) -> bool {
        self.constructors().any(|m| m.modifiers.is_public())
    }

    pub fn field(&self, name: &str) -> Option<&FieldEntry> {
        self.fields.iter().find(|f| f.name.as_ref() == name)
    }

    /// First non-constructor method with this name; overloads are not distinguished.
    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.methods
            .iter()
            .find(|m| !m.is_constructor() && m.name.as_ref() == name)
    }
}

/// How `SymbolRegistry::find` projects keys before prefix matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyProjection {
    /// Match against the fully-qualified name.
    Qualified,
    /// Match against the name with its package stripped.
    SimpleName,
}

impl KeyProjection {
    fn project<'a>(&self, key: &'a str) -> &'a str {
        match self {
            Self::Qualified => key,
            Self::SimpleName => denamespace(key),
        }
    }
}

/// Fully-qualified class name -> class entry.
pub struct SymbolRegistry {
    classes: FxHashMap<Arc<str>, Arc<ClassEntry>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self {
            classes: FxHashMap::with_capacity_and_hasher(16_384, FxBuildHasher),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassEntry>> {
        self.classes.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Insert or overwrite. The last writer wins.
    pub fn add(&mut self, name: impl Into<Arc<str>>, entry: ClassEntry) {
        self.classes.insert(name.into(), Arc::new(entry));
    }

    pub fn add_classes(&mut self, entries: impl IntoIterator<Item = ClassEntry>) {
        for entry in entries {
            let name = Arc::clone(&entry.name);
            self.add(name, entry);
        }
    }

    /// Every entry whose projected key starts with `prefix`, in no particular order.
    pub fn find(&self, prefix: &str, projection: KeyProjection) -> Vec<Arc<ClassEntry>> {
        self.classes
            .iter()
            .filter(|(key, _)| projection.project(key).starts_with(prefix))
            .map(|(_, entry)| Arc::clone(entry))
            .collect()
    }

    pub fn clear(&mut self) {
        self.classes.clear();
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Registered superclasses of `name`, nearest first, excluding `name` itself.
    ///
    /// The walk ends at the first class missing from the registry, on a
    /// repeated class, or after `MAX_SUPER_DEPTH` links.
    pub fn superclass_chain(&self, name: &str) -> Vec<Arc<ClassEntry>> {
        let mut chain = Vec::new();
        let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();
        let mut next = self
            .classes
            .get(name)
            .and_then(|entry| entry.super_name.clone());
        seen.insert(Arc::from(name));

        while let Some(super_name) = next.take() {
            if chain.len() >= MAX_SUPER_DEPTH || !seen.insert(Arc::clone(&super_name)) {
                tracing::debug!(class = name, at = %super_name, "superclass walk cut short");
                break;
            }
            let Some(entry) = self.get(&super_name) else {
                break;
            };
            next = entry.super_name.clone();
            chain.push(entry);
        }
        chain
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::debug;

use super::EntryFinder;
use crate::completion::candidate::Candidate;
use crate::completion::chain::{DotChain, plain_name};
use crate::completion::context::{LexicalEnvironment, ResolutionContext};
use crate::completion::reducer::ChainReducer;
use crate::registry::{
    ClassEntry, KeyProjection, Modifiers, NESTED_CLASS_SEPARATOR, SymbolRegistry, nested_beyond,
};

/// Members reachable through `receiver.` for the class the chain reduces to.
pub struct DotEntryFinder;

impl EntryFinder for DotEntryFinder {
    fn name(&self) -> &'static str {
        "dot"
    }

    fn find(&self, chain: &DotChain, env: &LexicalEnvironment<'_>) -> Vec<Candidate> {
        let context = ChainReducer::new(env).reduce(chain);
        let registry = env.registry();
        let Some(class) = context
            .fully_qualified_class
            .as_deref()
            .and_then(|name| registry.get(name))
        else {
            debug!(chain = ?chain.segments(), "receiver did not resolve");
            return vec![];
        };

        let prefix = plain_name(chain.leaf());
        let mut candidates = self.members(registry, &class, &context, prefix);
        if context.is_static {
            candidates.extend(self.nested_classes(registry, &class, prefix));
        }
        candidates
    }
}

impl DotEntryFinder {
    /// Public members of `class` and its superclasses whose staticness matches
    /// the context. A member of a nearer class hides same-named ones further up,
    /// visible or not.
    fn members(
        &self,
        registry: &SymbolRegistry,
        class: &Arc<ClassEntry>,
        context: &ResolutionContext,
        prefix: &str,
    ) -> Vec<Candidate> {
        let wanted = |modifiers: &Modifiers, name: &str| {
            modifiers.is_public()
                && modifiers.is_static() == context.is_static
                && name.starts_with(prefix)
        };

        let mut fields_seen = FxHashSet::default();
        let mut methods_seen = FxHashSet::default();
        let mut candidates = Vec::new();

        for entry in std::iter::once(Arc::clone(class)).chain(registry.superclass_chain(&class.name)) {
            for field in &entry.fields {
                let fresh = fields_seen.insert(Arc::clone(&field.name));
                if fresh && wanted(&field.modifiers, &field.name) {
                    candidates.push(Candidate::field(field.clone(), self.name()));
                }
            }
            for method in entry.methods.iter().filter(|m| !m.is_constructor()) {
                let fresh =
                    methods_seen.insert((Arc::clone(&method.name), method.signature.arguments.clone()));
                if fresh && wanted(&method.modifiers, &method.name) {
                    candidates.push(Candidate::method(method.clone(), self.name()));
                }
            }
        }
        candidates
    }

    /// Public classes nested directly inside `class`.
    fn nested_classes(
        &self,
        registry: &SymbolRegistry,
        class: &ClassEntry,
        prefix: &str,
    ) -> Vec<Candidate> {
        let outer_len = class.name.len() + NESTED_CLASS_SEPARATOR.len_utf8();
        let query = format!("{}{NESTED_CLASS_SEPARATOR}{prefix}", class.name);
        registry
            .find(&query, KeyProjection::Qualified)
            .into_iter()
            .filter(|nested| nested.modifiers.is_public() && !nested_beyond(&nested.name, outer_len))
            .map(|nested| Candidate::class(nested, self.name()).qualified())
            .collect()
    }
}

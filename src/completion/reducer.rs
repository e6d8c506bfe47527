use std::sync::Arc;
use tracing::debug;

use super::chain::{DotChain, plain_name};
use super::context::{LexicalEnvironment, ResolutionContext};
use super::type_guesser::guess_type;
use crate::registry::{ClassEntry, NESTED_CLASS_SEPARATOR, SymbolRegistry};

/// Folds the links of a dot-chain into the class the leaf is typed against.
pub struct ChainReducer<'e, 'a> {
    env: &'e LexicalEnvironment<'a>,
}

impl<'e, 'a> ChainReducer<'e, 'a> {
    pub fn new(env: &'e LexicalEnvironment<'a>) -> Self {
        Self { env }
    }

    /// Resolve every segment but the last.
    ///
    /// The first segment goes through the type guesser. While the context is
    /// static, a segment naming a nested class keeps it static. Otherwise the
    /// segment must name a field or method of the current class (or one it
    /// inherits); its type becomes the new, non-static context. Any miss
    /// yields an empty context.
    pub fn reduce(&self, chain: &DotChain) -> ResolutionContext {
        let links = chain.links();
        let Some((first, rest)) = links.split_first() else {
            return ResolutionContext::empty();
        };

        let mut context = guess_type(plain_name(first), self.env);
        for segment in rest {
            match self.step(&context, segment) {
                Some(next) => context = next,
                None => {
                    debug!(segment = %segment, class = ?context.fully_qualified_class, "chain reduction failed");
                    return ResolutionContext::empty();
                }
            }
        }
        context
    }

    fn step(&self, context: &ResolutionContext, segment: &str) -> Option<ResolutionContext> {
        let registry = self.env.registry();
        let class = context.fully_qualified_class.as_ref()?;
        let name = plain_name(segment);

        if context.is_static {
            let nested = format!("{class}{NESTED_CLASS_SEPARATOR}{name}");
            if let Some(entry) = registry.get(&nested) {
                return Some(ResolutionContext::of_class(Arc::clone(&entry.name)));
            }
        }

        let entry = registry.get(class)?;
        member_type(registry, &entry, name).map(ResolutionContext::instance)
    }
}

/// Type of field `name`, else return type of method `name`, searching the
/// class before its superclasses.
pub fn member_type(registry: &SymbolRegistry, class: &Arc<ClassEntry>, name: &str) -> Option<Arc<str>> {
    std::iter::once(Arc::clone(class))
        .chain(registry.superclass_chain(&class.name))
        .find_map(|entry| own_member_type(&entry, name))
}

fn own_member_type(class: &ClassEntry, name: &str) -> Option<Arc<str>> {
    if let Some(field) = class.field(name) {
        return Some(Arc::clone(&field.ty));
    }
    class.method(name)?.return_type().cloned()
}

use super::EntryFinder;
use crate::completion::candidate::Candidate;
use crate::completion::chain::DotChain;
use crate::completion::context::LexicalEnvironment;
use crate::registry::{KeyProjection, nested_beyond};

/// Classes that can be instantiated after `new`.
pub struct ConstructorEntryFinder;

impl EntryFinder for ConstructorEntryFinder {
    fn name(&self) -> &'static str {
        "constructor"
    }

    fn find(&self, chain: &DotChain, env: &LexicalEnvironment<'_>) -> Vec<Candidate> {
        let Some(prefix) = chain.constructor_prefix() else {
            return vec![];
        };
        env.registry()
            .find(prefix, KeyProjection::SimpleName)
            .into_iter()
            .filter(|class| !nested_beyond(class.simple_name(), prefix.len()))
            .filter(|class| class.has_public_constructor())
            .map(|class| Candidate::constructor(class, self.name()))
            .collect()
    }
}

//! Entry finders: collect the registry and buffer symbols that may complete
//! the chain at the cursor.

use super::candidate::Candidate;
use super::chain::DotChain;
use super::context::LexicalEnvironment;

pub mod constructor;
pub mod dot;
pub mod plain;

pub use constructor::ConstructorEntryFinder;
pub use dot::DotEntryFinder;
pub use plain::PlainEntryFinder;

pub trait EntryFinder: Send + Sync {
    fn find(&self, chain: &DotChain, env: &LexicalEnvironment<'_>) -> Vec<Candidate>;

    fn name(&self) -> &'static str;
}

/// Which finder handles a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderKind {
    Plain,
    Dot,
    Constructor,
}

impl FinderKind {
    /// Member access wins over `new`, which wins over a bare identifier.
    pub fn select(chain: &DotChain) -> Self {
        if chain.is_member_access() {
            FinderKind::Dot
        } else if chain.constructor_prefix().is_some() {
            FinderKind::Constructor
        } else {
            FinderKind::Plain
        }
    }

    pub fn finder(self) -> &'static dyn EntryFinder {
        match self {
            FinderKind::Plain => &PlainEntryFinder,
            FinderKind::Dot => &DotEntryFinder,
            FinderKind::Constructor => &ConstructorEntryFinder,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn select(chain: &str) -> FinderKind {
        FinderKind::select(&DotChain::parse(chain).unwrap())
    }

    #[test]
    fn test_select_precedence() {
        assert_eq!(select("list.si"), FinderKind::Dot);
        assert_eq!(select("new Foo().ba"), FinderKind::Dot);
        assert_eq!(select("new Arr"), FinderKind::Constructor);
        assert_eq!(select("Arr"), FinderKind::Plain);
        assert_eq!(select(""), FinderKind::Plain);
    }

    #[test]
    fn test_finder_names() {
        assert_eq!(FinderKind::Plain.finder().name(), "plain");
        assert_eq!(FinderKind::Dot.finder().name(), "dot");
        assert_eq!(FinderKind::Constructor.finder().name(), "constructor");
    }
}

pub mod candidate;
pub mod chain;
pub mod context;
pub mod engine;
pub mod finders;
pub mod import_utils;
pub mod imports;
pub mod locals;
pub mod mapper;
pub mod reducer;
pub mod tokens;
pub mod type_guesser;

pub use candidate::{Candidate, CandidateEntry, EntryTag};
pub use chain::{DotChain, extract_trailing_chain, split_chain_top_level};
pub use context::{CompletionRequest, CursorPosition, EditorHandle, ResolutionContext};
pub use engine::{CompletionConfig, CompletionEngine, ImportHandler};
pub use finders::{EntryFinder, FinderKind};
pub use mapper::{Insertion, Suggestion, SuggestionKind};
pub use tokens::{Token, TokenGrid, TokenSource, Tokenizer};

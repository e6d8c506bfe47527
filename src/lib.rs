pub mod completion;
pub mod language;
pub mod lsp;
pub mod registry;
pub mod workspace;

pub mod cache;
pub mod java;
pub(crate) mod rope_utils;

pub use cache::{DEFAULT_REFRESH_DELAY, TokenCache};
pub use java::JavaTokenizer;

//! Raw content in, scored chunks out: preprocessor → chunker → scorer.

pub mod chunker;
pub mod preprocessor;
pub mod scorer;

pub use chunker::{chunk_text, ChunkRequest};
pub use preprocessor::{preprocess, ContentKind, Preprocessed, PreprocessedMetadata};
pub use scorer::score_chunk;

pub mod completion;
pub mod embeddings;
pub mod prompt;

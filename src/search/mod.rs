pub mod retriever;
pub mod vector;

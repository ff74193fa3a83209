mod manager;
pub mod similarity;
mod store;
mod vector;

pub use manager::IndexManager;
pub use store::{IndexStatus, IndexStore, INDEX_FORMAT_VERSION};
pub use vector::{IndexEntry, ScoredChunk, VectorIndex};

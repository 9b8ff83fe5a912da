//! carerag-vector
//!
//! In-memory flat L2 index, the `VectorStore` that keeps chunk texts and
//! metadata beside it, and the on-disk snapshot format.

pub mod index;
pub mod snapshot;
pub mod store;

pub use index::FlatL2Index;
pub use store::{similarity_from_distance, VectorStore, DISTANCE_NORMALIZATION};

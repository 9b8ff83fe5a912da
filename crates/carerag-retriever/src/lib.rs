//! carerag-retriever
//!
//! Retrieval engine over the mental-health knowledge corpus: lazy corpus
//! loading, similarity search, crisis-first ordering and context packing.

pub mod context;
pub mod knowledge;
pub mod retriever;

pub use context::{default_context, pack_context, prioritize};
pub use knowledge::{static_documents, Counselor, CounselorEntry, KnowledgeSources};
pub use retriever::Retriever;

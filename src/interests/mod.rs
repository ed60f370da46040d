//! Interest vocabulary, normalization, and selection.

pub mod catalog;
pub mod normalizer;
pub mod vocabulary;

pub use catalog::{Interest, InterestCatalog, InterestState};
pub use normalizer::{normalize, title_case};
pub use vocabulary::{PREDEFINED_INTERESTS, SynonymTable};

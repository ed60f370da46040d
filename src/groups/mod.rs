//! Interest-based local groups.

pub mod matcher;
pub mod model;

pub use matcher::GroupMatcher;
pub use model::{Group, GroupLocation, MessageSummary};

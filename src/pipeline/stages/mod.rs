//! Pipeline stages
//!
//! Each stage is a separate module that can be tested independently.

pub mod extract;
pub mod load;
pub mod normalize;
pub mod partition;
pub mod project;
pub mod summarize;
pub mod write;

pub use extract::ExtractStage;
pub use load::{LoadStage, validate_entries};
pub use normalize::normalize;
pub use partition::PartitionStage;
pub use project::ProjectStage;
pub use summarize::summarize;
pub use write::{load_summaries, remove_stale, write_json_atomic};

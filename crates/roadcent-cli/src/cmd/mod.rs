pub mod completions;
pub mod estimate;
pub mod stats;

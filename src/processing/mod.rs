// src/processing/mod.rs
pub mod denormalize;
pub mod normalize;
pub mod stats;

// Re-export main components
pub use denormalize::{DenormalizeOptions, ValueDenormalizer};
pub use normalize::{Centering, NoDataPolicy, NormalizeOptions, Normalized, ValueNormalizer};
pub use stats::{sample_stats, SampleStats};

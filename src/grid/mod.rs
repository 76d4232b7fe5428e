// src/grid/mod.rs
pub mod extent;
pub mod format;

pub use extent::{extent_from_transform, transform_from_extent, Extent, ExtentConvention};
pub use format::{decode, encode, GridFile, GridHeader, HEADER_LEN};

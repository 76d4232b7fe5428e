// src/lib.rs
pub mod batch;
pub mod cli;
pub mod error;
pub mod grid;
pub mod io;
pub mod pipeline;
pub mod processing;
pub mod utils;

pub use error::{ConvertError, Result};

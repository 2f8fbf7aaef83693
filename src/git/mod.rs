//! Git operations module
//!
//! Handles repository URLs and the sparse checkout build step

pub mod repository;
pub mod sparse_checkout;

pub use repository::*;
pub use sparse_checkout::*;

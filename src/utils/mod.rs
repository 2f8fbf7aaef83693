//! Utility functions for path handling and executable lookup

pub mod path;
pub mod search_path;

pub use path::*;
pub use search_path::*;

// Utility functions
pub mod datetime;
pub mod error;

pub use error::*;

//! Shared types for the donation submission system.

pub mod types;

pub use types::RowId;

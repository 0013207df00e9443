//! Core types for the live ticker board
//!
//! This crate provides shared types used across all components:
//! - The fixed instrument set
//! - Inbound ticker events and normalized snapshots
//! - Board configuration
//! - Error types

pub mod types;
pub mod ticker;
pub mod config;
pub mod errors;

pub use types::*;
pub use ticker::*;
pub use self::config::*;
pub use errors::*;

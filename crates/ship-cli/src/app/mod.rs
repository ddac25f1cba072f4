//! Application-level utilities for the Ship CLI.
//!
//! This module provides:
//! - Store path resolution
//! - The per-invocation context that owns the unlock session

mod context;
mod resolver;

pub use context::AppContext;

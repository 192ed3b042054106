//! Agent catalog.
//!
//! This module provides the fixed, ordered set of analysis agents.

pub mod registry;

pub use registry::{adjudicator, definition, primary_agents};

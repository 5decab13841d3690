//! # Core Module
//!
//! Stateless foundations shared by the rest of the crate.
//!
//! - [`level`] - The three tiers of the hierarchy (atom, residue, segment)
//! - [`error`] - The error taxonomy reported by every structural operation
//! - [`downshift`] - Pure construction of parent → children inverse indices

pub mod downshift;
pub mod error;
pub mod level;

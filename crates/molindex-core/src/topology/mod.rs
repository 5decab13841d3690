//! # Topology Module
//!
//! The facade consumed by attribute storage and group wrappers.
//!
//! - [`model`] - [`model::Topology`], one translation table plus per-level attribute lists
//! - [`registry`] - The [`registry::TopologyAttr`] contract and its append-only registry
//! - [`config`] - Declarative TOML configuration and a fluent builder

pub mod config;
pub mod model;
pub mod registry;

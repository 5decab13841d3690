//! # Engine Module
//!
//! The stateful translation layer. [`trans_table::TransTable`] owns the forward
//! parent maps and is the only component allowed to change them; each inverse
//! index it serves is held in a [`cache::DownshiftCache`] that is marked stale
//! by moves and rebuilt in full on the next read.

pub mod cache;
pub mod trans_table;

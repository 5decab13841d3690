//! # molindex
//!
//! A three-level index-translation engine relating atoms to residues and
//! residues to segments in a molecular structure model.
//!
//! Every atom belongs to exactly one residue and every residue to exactly one
//! segment. The engine answers membership queries in both directions, upward
//! in `O(1)` per index and downward in `O(members)`, and lets atoms and residues
//! be re-parented at runtime while keeping both directions consistent.
//!
//! ## Architecture
//!
//! - **[`core`]: Foundations.** The [`Level`] enum, the [`TopologyError`]
//!   taxonomy, and the pure [`build_downshift`] inverse-index builder.
//!
//! - **[`engine`]: Translation.** [`TransTable`] owns the forward parent maps and
//!   serves every cross-level query. Inverse indices are cached per level,
//!   marked stale by moves, and rebuilt in full on the next read.
//!
//! - **[`topology`]: Facade.** [`Topology`] pairs a translation table with
//!   per-level attribute registries, and can be built from TOML via
//!   [`TopologyConfig`] or fluently via [`TopologyBuilder`].
//!
//! ## Usage
//!
//! ```
//! use molindex::{Topology, TopologyError};
//!
//! # fn main() -> Result<(), TopologyError> {
//! let mut top = Topology::new(
//!     10,
//!     4,
//!     2,
//!     vec![],
//!     Some(vec![0, 0, 2, 2, 1, 1, 3, 3, 1, 2]),
//!     Some(vec![0, 1, 1, 0]),
//! )?;
//!
//! assert_eq!(top.trans_table().residues_to_atoms_flat(&[0, 1])?, vec![0, 1, 4, 5, 8]);
//!
//! top.move_atom(1, 3)?;
//! assert_eq!(top.trans_table().atom_residue(1)?, 3);
//! assert_eq!(top.trans_table().residue_atoms(3)?, vec![1, 6, 7]);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod engine;
pub mod topology;

pub use crate::core::downshift::{Downshift, DownshiftSlot, build_downshift};
pub use crate::core::error::TopologyError;
pub use crate::core::level::{Level, ParseLevelError};
pub use crate::engine::cache::CacheState;
pub use crate::engine::trans_table::{MoveTarget, TransTable};
pub use crate::topology::config::{ConfigError, TopologyBuilder, TopologyConfig};
pub use crate::topology::model::Topology;
pub use crate::topology::registry::TopologyAttr;

use super::registry::{AttributeRegistry, TopologyAttr};
use crate::core::error::TopologyError;
use crate::core::level::Level;
use crate::engine::trans_table::{MoveTarget, TransTable};
use std::sync::Arc;

/// The structural half of a molecular universe.
///
/// Holds one [`TransTable`] for the atom → residue → segment hierarchy and an
/// append-only registry of attributes per level. Attribute contents belong to
/// the external storage layer; the topology only records which attributes
/// exist and serves the level sizes they must agree with.
#[derive(Debug, Clone)]
pub struct Topology {
    tt: TransTable,
    attrs: AttributeRegistry,
}

impl Topology {
    /// Creates a topology, registering `attrs` in order.
    ///
    /// A missing `atom_resindex` places every atom in residue 0, and a missing
    /// `residue_segindex` places every residue in segment 0.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::InvalidTopology` if the maps disagree with the
    /// declared counts, or `TopologyError::DuplicateAttribute` if two of
    /// `attrs` share a name on the same level.
    pub fn new(
        n_atoms: usize,
        n_residues: usize,
        n_segments: usize,
        attrs: Vec<Arc<dyn TopologyAttr>>,
        atom_resindex: Option<Vec<usize>>,
        residue_segindex: Option<Vec<usize>>,
    ) -> Result<Self, TopologyError> {
        let tt = TransTable::new(
            n_atoms,
            n_residues,
            n_segments,
            atom_resindex.unwrap_or_else(|| vec![0; n_atoms]),
            residue_segindex.unwrap_or_else(|| vec![0; n_residues]),
        )?;

        let mut topology = Self {
            tt,
            attrs: AttributeRegistry::default(),
        };
        for attr in attrs {
            topology.add_attribute(attr)?;
        }
        Ok(topology)
    }

    /// Read access to the translation table for structural queries.
    pub fn trans_table(&self) -> &TransTable {
        &self.tt
    }

    pub fn n_atoms(&self) -> usize {
        self.tt.n_atoms()
    }

    pub fn n_residues(&self) -> usize {
        self.tt.n_residues()
    }

    pub fn n_segments(&self) -> usize {
        self.tt.n_segments()
    }

    pub fn size(&self, level: Level) -> usize {
        self.tt.size(level)
    }

    // --- Attribute registry ---

    pub fn add_attribute(&mut self, attr: Arc<dyn TopologyAttr>) -> Result<(), TopologyError> {
        self.attrs.register(attr)
    }

    /// Attributes registered at `level`, in registration order.
    pub fn attributes(&self, level: Level) -> &[Arc<dyn TopologyAttr>] {
        self.attrs.list(level)
    }

    pub fn attribute(&self, level: Level, name: &str) -> Option<&Arc<dyn TopologyAttr>> {
        self.attrs.get(level, name)
    }

    pub fn has_attribute(&self, level: Level, name: &str) -> bool {
        self.attrs.get(level, name).is_some()
    }

    /// Checks every registered attribute's length against its level size.
    ///
    /// Never called implicitly; the attribute layer decides when to check.
    pub fn validate_attributes(&self) -> Result<(), TopologyError> {
        for level in Level::ALL {
            let expected = self.size(level);
            if let Some(attr) = self.attributes(level).iter().find(|a| a.len() != expected) {
                return Err(TopologyError::InvalidTopology(format!(
                    "{} attribute '{}' has {} entries but there are {} {}(s)",
                    level,
                    attr.name(),
                    attr.len(),
                    expected,
                    level
                )));
            }
        }
        Ok(())
    }

    // --- Structural mutation ---

    pub fn move_atom(&mut self, atom: usize, residue: usize) -> Result<(), TopologyError> {
        self.tt.move_atom(atom, residue)
    }

    pub fn move_atoms<'a>(
        &mut self,
        atoms: &[usize],
        residues: impl Into<MoveTarget<'a>>,
    ) -> Result<(), TopologyError> {
        self.tt.move_atoms(atoms, residues)
    }

    pub fn move_residue(&mut self, residue: usize, segment: usize) -> Result<(), TopologyError> {
        self.tt.move_residue(residue, segment)
    }

    pub fn move_residues<'a>(
        &mut self,
        residues: &[usize],
        segments: impl Into<MoveTarget<'a>>,
    ) -> Result<(), TopologyError> {
        self.tt.move_residues(residues, segments)
    }
}

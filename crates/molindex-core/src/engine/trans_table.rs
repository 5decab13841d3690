use super::cache::{CacheState, DownshiftCache};
use crate::core::downshift::Downshift;
use crate::core::error::TopologyError;
use crate::core::level::Level;
use tracing::{debug, instrument};

/// Destination of a bulk move.
///
/// A [`MoveTarget::Broadcast`] sends every source to the same parent, while
/// [`MoveTarget::PerIndex`] pairs each source with its own parent and must be
/// exactly as long as the source list. Conversions let callers pass a plain
/// `usize` or a slice and have the variant chosen at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget<'a> {
    Broadcast(usize),
    PerIndex(&'a [usize]),
}

impl From<usize> for MoveTarget<'_> {
    fn from(target: usize) -> Self {
        MoveTarget::Broadcast(target)
    }
}

impl<'a> From<&'a [usize]> for MoveTarget<'a> {
    fn from(targets: &'a [usize]) -> Self {
        MoveTarget::PerIndex(targets)
    }
}

impl<'a, const N: usize> From<&'a [usize; N]> for MoveTarget<'a> {
    fn from(targets: &'a [usize; N]) -> Self {
        MoveTarget::PerIndex(targets)
    }
}

impl<'a> From<&'a Vec<usize>> for MoveTarget<'a> {
    fn from(targets: &'a Vec<usize>) -> Self {
        MoveTarget::PerIndex(targets)
    }
}

/// Translates indices between the atom, residue and segment levels.
///
/// The table owns two forward arrays (`atom_resindex`, `residue_segindex`) and
/// one inverse cache per parent level. Forward lookups read the arrays
/// directly. Inverse lookups go through the caches, which are rebuilt on the
/// first read after a move touching their level.
///
/// All inverse results list children in ascending index order within each
/// parent, and parents in the order they were requested.
#[derive(Debug, Clone)]
pub struct TransTable {
    n_atoms: usize,
    n_residues: usize,
    n_segments: usize,
    atom_resindex: Vec<usize>,
    residue_segindex: Vec<usize>,
    residue_atoms: DownshiftCache,
    segment_residues: DownshiftCache,
}

impl TransTable {
    /// Creates a table from the two parent maps.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::InvalidTopology` if a map's length disagrees with
    /// its declared count or if a map points outside the level above.
    pub fn new(
        n_atoms: usize,
        n_residues: usize,
        n_segments: usize,
        atom_resindex: Vec<usize>,
        residue_segindex: Vec<usize>,
    ) -> Result<Self, TopologyError> {
        validate_map("atom_resindex", &atom_resindex, n_atoms, n_residues)?;
        validate_map("residue_segindex", &residue_segindex, n_residues, n_segments)?;

        debug!(n_atoms, n_residues, n_segments, "Translation table constructed");

        Ok(Self {
            n_atoms,
            n_residues,
            n_segments,
            atom_resindex,
            residue_segindex,
            residue_atoms: DownshiftCache::stale(Level::Residue),
            segment_residues: DownshiftCache::stale(Level::Segment),
        })
    }

    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    pub fn n_residues(&self) -> usize {
        self.n_residues
    }

    pub fn n_segments(&self) -> usize {
        self.n_segments
    }

    /// Number of items at `level`.
    pub fn size(&self, level: Level) -> usize {
        match level {
            Level::Atom => self.n_atoms,
            Level::Residue => self.n_residues,
            Level::Segment => self.n_segments,
        }
    }

    /// Forward map from atom index to residue index.
    pub fn atom_resindex(&self) -> &[usize] {
        &self.atom_resindex
    }

    /// Forward map from residue index to segment index.
    pub fn residue_segindex(&self) -> &[usize] {
        &self.residue_segindex
    }

    /// Cache state of the inverse index keyed by `level`.
    ///
    /// Atoms own nothing, so `Level::Atom` is always reported fresh.
    pub fn cache_state(&self, level: Level) -> CacheState {
        match level {
            Level::Atom => CacheState::Fresh,
            Level::Residue => self.residue_atoms.state(),
            Level::Segment => self.segment_residues.state(),
        }
    }

    // --- Forward queries ---

    pub fn atom_residue(&self, atom: usize) -> Result<usize, TopologyError> {
        TopologyError::check_index(Level::Atom, atom, self.n_atoms)?;
        Ok(self.atom_resindex[atom])
    }

    pub fn residue_segment(&self, residue: usize) -> Result<usize, TopologyError> {
        TopologyError::check_index(Level::Residue, residue, self.n_residues)?;
        Ok(self.residue_segindex[residue])
    }

    pub fn atom_segment(&self, atom: usize) -> Result<usize, TopologyError> {
        let residue = self.atom_residue(atom)?;
        Ok(self.residue_segindex[residue])
    }

    pub fn atoms_to_residues(&self, atoms: &[usize]) -> Result<Vec<usize>, TopologyError> {
        atoms.iter().map(|&atom| self.atom_residue(atom)).collect()
    }

    pub fn residues_to_segments(&self, residues: &[usize]) -> Result<Vec<usize>, TopologyError> {
        residues
            .iter()
            .map(|&residue| self.residue_segment(residue))
            .collect()
    }

    pub fn atoms_to_segments(&self, atoms: &[usize]) -> Result<Vec<usize>, TopologyError> {
        atoms.iter().map(|&atom| self.atom_segment(atom)).collect()
    }

    // --- Inverse queries ---

    /// Atoms of a single residue, in ascending order.
    pub fn residue_atoms(&self, residue: usize) -> Result<Vec<usize>, TopologyError> {
        self.residues_to_atoms_flat(&[residue])
    }

    /// Residues of a single segment, in ascending order.
    pub fn segment_residues(&self, segment: usize) -> Result<Vec<usize>, TopologyError> {
        self.segments_to_residues_flat(&[segment])
    }

    /// Concatenated atoms of `residues`, residue by residue in the given order.
    ///
    /// Repeated residues contribute their atoms once per occurrence.
    pub fn residues_to_atoms_flat(&self, residues: &[usize]) -> Result<Vec<usize>, TopologyError> {
        check_all(Level::Residue, residues, self.n_residues)?;
        let index = self
            .residue_atoms
            .get_or_rebuild(&self.atom_resindex, self.n_residues)?;
        Ok(residues
            .iter()
            .flat_map(|&residue| members_of(&index, residue).iter().copied())
            .collect())
    }

    /// Atoms of each of `residues`, one list per requested residue.
    pub fn residues_to_atoms_grouped(
        &self,
        residues: &[usize],
    ) -> Result<Vec<Vec<usize>>, TopologyError> {
        check_all(Level::Residue, residues, self.n_residues)?;
        let index = self
            .residue_atoms
            .get_or_rebuild(&self.atom_resindex, self.n_residues)?;
        Ok(residues
            .iter()
            .map(|&residue| members_of(&index, residue).to_vec())
            .collect())
    }

    pub fn segments_to_residues_flat(&self, segments: &[usize]) -> Result<Vec<usize>, TopologyError> {
        check_all(Level::Segment, segments, self.n_segments)?;
        let index = self
            .segment_residues
            .get_or_rebuild(&self.residue_segindex, self.n_segments)?;
        Ok(segments
            .iter()
            .flat_map(|&segment| members_of(&index, segment).iter().copied())
            .collect())
    }

    pub fn segments_to_residues_grouped(
        &self,
        segments: &[usize],
    ) -> Result<Vec<Vec<usize>>, TopologyError> {
        check_all(Level::Segment, segments, self.n_segments)?;
        let index = self
            .segment_residues
            .get_or_rebuild(&self.residue_segindex, self.n_segments)?;
        Ok(segments
            .iter()
            .map(|&segment| members_of(&index, segment).to_vec())
            .collect())
    }

    /// Atoms of `segments`, chained through their residues.
    ///
    /// Within a segment residues appear in ascending order and each residue's
    /// atoms stay contiguous, so the result is not globally sorted.
    pub fn segments_to_atoms_flat(&self, segments: &[usize]) -> Result<Vec<usize>, TopologyError> {
        Ok(self
            .segments_to_atoms_grouped(segments)?
            .into_iter()
            .flatten()
            .collect())
    }

    pub fn segments_to_atoms_grouped(
        &self,
        segments: &[usize],
    ) -> Result<Vec<Vec<usize>>, TopologyError> {
        check_all(Level::Segment, segments, self.n_segments)?;
        // Segment index is always locked before the residue index.
        let residues_of = self
            .segment_residues
            .get_or_rebuild(&self.residue_segindex, self.n_segments)?;
        let atoms_of = self
            .residue_atoms
            .get_or_rebuild(&self.atom_resindex, self.n_residues)?;

        Ok(segments
            .iter()
            .map(|&segment| {
                members_of(&residues_of, segment)
                    .iter()
                    .flat_map(|&residue| members_of(&atoms_of, residue).iter().copied())
                    .collect::<Vec<usize>>()
            })
            .collect())
    }

    // --- Mutation ---

    /// Re-parents one atom into `residue`.
    pub fn move_atom(&mut self, atom: usize, residue: usize) -> Result<(), TopologyError> {
        self.move_atoms(&[atom], residue)
    }

    /// Re-parents one residue into `segment`.
    pub fn move_residue(&mut self, residue: usize, segment: usize) -> Result<(), TopologyError> {
        self.move_residues(&[residue], segment)
    }

    /// Re-parents every atom in `atoms`.
    ///
    /// The whole call is validated before anything is written, so on error no
    /// atom has moved. If `atoms` repeats an index paired with different
    /// residues, the last pairing wins.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::LengthMismatch` if a per-index target differs in
    /// length from `atoms`, or `TopologyError::IndexOutOfRange` for any atom or
    /// residue index outside its level.
    #[instrument(level = "debug", skip_all, fields(count = atoms.len()))]
    pub fn move_atoms<'a>(
        &mut self,
        atoms: &[usize],
        residues: impl Into<MoveTarget<'a>>,
    ) -> Result<(), TopologyError> {
        let changed = apply_moves(
            &mut self.atom_resindex,
            Level::Atom,
            atoms,
            residues.into(),
            Level::Residue,
            self.n_residues,
        )?;
        if changed > 0 {
            self.residue_atoms.invalidate();
        }
        debug!(changed, "Moved atoms between residues");
        Ok(())
    }

    /// Re-parents every residue in `residues`; same contract as [`Self::move_atoms`].
    ///
    /// Only the segment → residue index is invalidated. Atom membership of the
    /// moved residues is untouched, so `atom_segment` reflects the move at once.
    #[instrument(level = "debug", skip_all, fields(count = residues.len()))]
    pub fn move_residues<'a>(
        &mut self,
        residues: &[usize],
        segments: impl Into<MoveTarget<'a>>,
    ) -> Result<(), TopologyError> {
        let changed = apply_moves(
            &mut self.residue_segindex,
            Level::Residue,
            residues,
            segments.into(),
            Level::Segment,
            self.n_segments,
        )?;
        if changed > 0 {
            self.segment_residues.invalidate();
        }
        debug!(changed, "Moved residues between segments");
        Ok(())
    }
}

fn validate_map(
    name: &str,
    map: &[usize],
    n_children: usize,
    n_parents: usize,
) -> Result<(), TopologyError> {
    if map.len() != n_children {
        return Err(TopologyError::InvalidTopology(format!(
            "{} has {} entries but {} were declared",
            name,
            map.len(),
            n_children
        )));
    }
    if let Some((child, &parent)) = map.iter().enumerate().find(|(_, p)| **p >= n_parents) {
        return Err(TopologyError::InvalidTopology(format!(
            "{}[{}] = {} but only {} parent(s) exist",
            name, child, parent, n_parents
        )));
    }
    Ok(())
}

fn check_all(level: Level, indices: &[usize], len: usize) -> Result<(), TopologyError> {
    indices
        .iter()
        .try_for_each(|&index| TopologyError::check_index(level, index, len))
}

fn members_of(index: &Downshift, parent: usize) -> &[usize] {
    debug_assert!(
        parent < index.n_parents(),
        "parent {} reached the downshift lookup unchecked ({} parent(s))",
        parent,
        index.n_parents()
    );
    index.members(parent).unwrap_or(&[])
}

/// Validates and applies a batch of re-parenting writes to `forward`.
///
/// Returns the number of entries whose value actually changed.
fn apply_moves(
    forward: &mut [usize],
    source_level: Level,
    sources: &[usize],
    target: MoveTarget<'_>,
    target_level: Level,
    n_targets: usize,
) -> Result<usize, TopologyError> {
    check_all(source_level, sources, forward.len())?;
    match target {
        MoveTarget::Broadcast(parent) => {
            TopologyError::check_index(target_level, parent, n_targets)?;
        }
        MoveTarget::PerIndex(parents) => {
            if parents.len() != sources.len() {
                return Err(TopologyError::LengthMismatch {
                    expected: sources.len(),
                    found: parents.len(),
                });
            }
            check_all(target_level, parents, n_targets)?;
        }
    }

    let mut changed = 0;
    for (i, &child) in sources.iter().enumerate() {
        let parent = match target {
            MoveTarget::Broadcast(parent) => parent,
            MoveTarget::PerIndex(parents) => parents[i],
        };
        if forward[child] != parent {
            forward[child] = parent;
            changed += 1;
        }
    }
    Ok(changed)
}

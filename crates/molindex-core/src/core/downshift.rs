//! Inverse ("downshift") index construction.
//!
//! Given a forward array that maps every child to its parent, a [`Downshift`]
//! answers the opposite question: which children does a parent own? Parents
//! may own any number of children, including none, so each slot is an
//! independently sized list rather than a row of a rectangular table.

use super::error::TopologyError;

/// A single entry of a [`Downshift`] index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownshiftSlot {
    /// Child indices owned by a real parent, in ascending order. May be empty.
    Members(Vec<usize>),
    /// The trailing sentinel slot at index `n_parents`; no such parent exists.
    Absent,
}

impl DownshiftSlot {
    pub fn members(&self) -> Option<&[usize]> {
        match self {
            DownshiftSlot::Members(members) => Some(members),
            DownshiftSlot::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, DownshiftSlot::Absent)
    }
}

/// Parent → children index produced by [`build_downshift`].
///
/// Holds `n_parents + 1` slots. Slots `0..n_parents` are always
/// [`DownshiftSlot::Members`]; the final slot is always [`DownshiftSlot::Absent`],
/// which lets callers tell "parent 7 has no children" apart from
/// "there is no parent 7".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downshift {
    slots: Vec<DownshiftSlot>,
}

impl Downshift {
    /// Builds the index with the parent count inferred as `max(parents) + 1`.
    ///
    /// An empty input yields zero parents, i.e. a lone sentinel slot.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidTopology`] if the inferred count does not
    /// fit in a `usize` or its slots cannot be allocated.
    pub fn from_parents(parents: &[usize]) -> Result<Self, TopologyError> {
        let n_parents = match parents.iter().max() {
            None => 0,
            Some(&max) => max.checked_add(1).ok_or_else(|| {
                TopologyError::InvalidTopology(format!(
                    "parent index {} leaves no room for the sentinel slot",
                    max
                ))
            })?,
        };
        build_downshift(parents, n_parents)
    }

    /// Number of real parents, excluding the sentinel slot.
    pub fn n_parents(&self) -> usize {
        self.slots.len() - 1
    }

    /// Total slot count, which is always `n_parents() + 1`.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn has_no_parents(&self) -> bool {
        self.n_parents() == 0
    }

    pub fn slots(&self) -> &[DownshiftSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&DownshiftSlot> {
        self.slots.get(index)
    }

    /// Children of `parent`, or `None` if `parent` is the sentinel or beyond it.
    pub fn members(&self, parent: usize) -> Option<&[usize]> {
        self.slots.get(parent).and_then(DownshiftSlot::members)
    }
}

/// Inverts `parents` into a per-parent list of child indices.
///
/// Runs in `O(parents.len() + n_parents)`: one pass counts members per parent,
/// a second scatters child indices into pre-sized slots. Children are visited
/// in ascending order, so every slot comes out sorted without a comparison sort.
///
/// # Errors
///
/// Returns [`TopologyError::InvalidTopology`] if any entry of `parents` is not
/// below `n_parents`, or if `n_parents` slots cannot be allocated.
pub fn build_downshift(parents: &[usize], n_parents: usize) -> Result<Downshift, TopologyError> {
    let mut counts = reserve_slots::<usize>(n_parents)?;
    counts.resize(n_parents, 0);
    for (child, &parent) in parents.iter().enumerate() {
        match counts.get_mut(parent) {
            Some(count) => *count += 1,
            None => {
                return Err(TopologyError::InvalidTopology(format!(
                    "child {} points at parent {} but only {} parent(s) exist",
                    child, parent, n_parents
                )));
            }
        }
    }
    scatter(parents, counts)
}

// Parent counts come from caller data, so allocation failure is an error
// rather than an abort.
fn reserve_slots<T>(n: usize) -> Result<Vec<T>, TopologyError> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(n).map_err(|e| {
        TopologyError::InvalidTopology(format!("cannot allocate {} parent slot(s): {}", n, e))
    })?;
    Ok(slots)
}

fn scatter(parents: &[usize], counts: Vec<usize>) -> Result<Downshift, TopologyError> {
    let mut buckets = reserve_slots::<Vec<usize>>(counts.len())?;
    buckets.extend(counts.into_iter().map(Vec::with_capacity));
    for (child, &parent) in parents.iter().enumerate() {
        buckets[parent].push(child);
    }

    // `counts` was allocated with the same length, so `+ 1` cannot overflow.
    let mut slots = reserve_slots::<DownshiftSlot>(buckets.len() + 1)?;
    slots.extend(buckets.into_iter().map(DownshiftSlot::Members));
    slots.push(DownshiftSlot::Absent);
    Ok(Downshift { slots })
}

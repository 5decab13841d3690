use crate::core::downshift::{Downshift, build_downshift};
use crate::core::error::TopologyError;
use crate::core::level::Level;
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Validity of a [`DownshiftCache`] relative to the forward array it inverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheState {
    Fresh,
    Stale,
}

#[derive(Debug, Clone)]
enum CacheSlot {
    Stale,
    Fresh(Downshift),
}

/// Lazily rebuilt inverse index for one level of the hierarchy.
///
/// Mutations only ever move the cache to [`CacheState::Stale`]; the next read
/// rebuilds it in full and moves it back to [`CacheState::Fresh`]. The rebuild
/// happens under the write lock and is downgraded to a read guard before being
/// handed out, so readers never observe a half-built index.
#[derive(Debug)]
pub struct DownshiftCache {
    parent_level: Level,
    slot: RwLock<CacheSlot>,
}

impl DownshiftCache {
    /// Creates a cache keyed by `parent_level` that has not been built yet.
    pub fn stale(parent_level: Level) -> Self {
        Self {
            parent_level,
            slot: RwLock::new(CacheSlot::Stale),
        }
    }

    pub fn parent_level(&self) -> Level {
        self.parent_level
    }

    pub fn state(&self) -> CacheState {
        match *self.slot.read() {
            CacheSlot::Stale => CacheState::Stale,
            CacheSlot::Fresh(_) => CacheState::Fresh,
        }
    }

    /// Marks the cache stale. Requires exclusive access, so no reader can hold
    /// a guard into the index being discarded.
    pub fn invalidate(&mut self) {
        let slot = self.slot.get_mut();
        if let CacheSlot::Fresh(_) = slot {
            trace!(level = %self.parent_level, "Downshift cache marked stale");
        }
        *slot = CacheSlot::Stale;
    }

    /// Returns the index, rebuilding it from `parents` first if it is stale.
    ///
    /// `parents` must be the forward array whose values index into
    /// `parent_level`, and `n_parents` the size of that level.
    pub fn get_or_rebuild(
        &self,
        parents: &[usize],
        n_parents: usize,
    ) -> Result<MappedRwLockReadGuard<'_, Downshift>, TopologyError> {
        match RwLockReadGuard::try_map(self.slot.read(), |slot| match slot {
            CacheSlot::Fresh(downshift) => Some(downshift),
            CacheSlot::Stale => None,
        }) {
            Ok(guard) => return Ok(guard),
            // The read guard comes back on failure and must be released before
            // taking the write lock.
            Err(stale) => drop(stale),
        }

        let mut slot = self.slot.write();
        // Another reader may have rebuilt while we waited for the write lock.
        if let CacheSlot::Stale = *slot {
            let downshift = build_downshift(parents, n_parents)?;
            trace!(
                level = %self.parent_level,
                n_parents,
                n_children = parents.len(),
                "Downshift cache rebuilt"
            );
            *slot = CacheSlot::Fresh(downshift);
        }

        let slot = RwLockWriteGuard::downgrade(slot);
        Ok(RwLockReadGuard::map(slot, |slot| match slot {
            CacheSlot::Fresh(downshift) => downshift,
            CacheSlot::Stale => unreachable!("downshift cache rebuilt under the write lock"),
        }))
    }
}

impl Clone for DownshiftCache {
    fn clone(&self) -> Self {
        Self {
            parent_level: self.parent_level,
            slot: RwLock::new(self.slot.read().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARENTS: [usize; 5] = [1, 0, 1, 2, 0];

    #[test]
    fn new_cache_starts_stale() {
        let cache = DownshiftCache::stale(Level::Residue);
        assert_eq!(cache.state(), CacheState::Stale);
        assert_eq!(cache.parent_level(), Level::Residue);
    }

    #[test]
    fn read_rebuilds_and_marks_fresh() {
        let cache = DownshiftCache::stale(Level::Residue);
        {
            let index = cache.get_or_rebuild(&PARENTS, 3).unwrap();
            assert_eq!(index.members(0), Some(&[1, 4][..]));
            assert_eq!(index.members(1), Some(&[0, 2][..]));
            assert_eq!(index.members(2), Some(&[3][..]));
        }
        assert_eq!(cache.state(), CacheState::Fresh);
    }

    #[test]
    fn fresh_cache_is_not_rebuilt_from_new_input() {
        let cache = DownshiftCache::stale(Level::Segment);
        cache.get_or_rebuild(&PARENTS, 3).unwrap();

        // A fresh cache ignores the arguments; only invalidation triggers a rebuild.
        let index = cache.get_or_rebuild(&[0, 0, 0], 1).unwrap();
        assert_eq!(index.n_parents(), 3);
    }

    #[test]
    fn invalidate_forces_rebuild_on_next_read() {
        let mut cache = DownshiftCache::stale(Level::Residue);
        cache.get_or_rebuild(&PARENTS, 3).unwrap();

        cache.invalidate();
        assert_eq!(cache.state(), CacheState::Stale);

        let index = cache.get_or_rebuild(&[0, 0, 0], 1).unwrap();
        assert_eq!(index.members(0), Some(&[0, 1, 2][..]));
    }

    #[test]
    fn failed_rebuild_leaves_cache_stale() {
        let cache = DownshiftCache::stale(Level::Residue);
        assert!(cache.get_or_rebuild(&[0, 5], 2).is_err());
        assert_eq!(cache.state(), CacheState::Stale);
    }

    #[test]
    fn clone_copies_current_state() {
        let cache = DownshiftCache::stale(Level::Residue);
        cache.get_or_rebuild(&PARENTS, 3).unwrap();
        let copy = cache.clone();
        assert_eq!(copy.state(), CacheState::Fresh);
        assert_eq!(
            *copy.get_or_rebuild(&PARENTS, 3).unwrap(),
            *cache.get_or_rebuild(&PARENTS, 3).unwrap()
        );
    }

    #[test]
    fn concurrent_readers_see_a_complete_index() {
        let cache = DownshiftCache::stale(Level::Residue);
        let parents: Vec<usize> = (0..1000).map(|i| i % 7).collect();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let index = cache.get_or_rebuild(&parents, 7).unwrap();
                    let total: usize = (0..7).map(|p| index.members(p).unwrap().len()).sum();
                    assert_eq!(total, 1000);
                });
            }
        });
        assert_eq!(cache.state(), CacheState::Fresh);
    }
}

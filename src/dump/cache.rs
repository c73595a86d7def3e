//! Bounded cache of decompressed shader groups.
//!
//! Decompressed group images are large and rebuildable, so they live in a
//! small least-recently-used cache: capacity bounds peak decompressed
//! memory, misses pay one decompression. The cache is hit concurrently by
//! every thread resolving shaders, and is guarded by a single exclusive
//! lock held across lookup, production, insertion, and the caller's
//! copy-out. Hold times are one decompression plus one memcpy, so an
//! adaptive spin lock (`parking_lot::Mutex`) fits the contention profile.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::layout::GroupView;

/// Default number of decompressed groups kept resident.
pub const DEFAULT_GROUP_CACHE_CAPACITY: usize = 32;

// =============================================================================
// Decompressed Group
// =============================================================================

/// An owned, decompressed group image plus its mapped view.
///
/// Constructed only from an image that passed [`GroupView::parse`]; a
/// failed decompression or a malformed image never becomes a cache entry.
#[derive(Debug)]
pub struct DecompressedGroup {
    group_id: u16,
    bytes: Vec<u8>,
}

impl DecompressedGroup {
    /// Validates `bytes` as a group image and takes ownership of it.
    pub fn new(group_id: u16, bytes: Vec<u8>) -> Result<Self> {
        GroupView::parse(&bytes, group_id)?;
        Ok(Self { group_id, bytes })
    }

    /// Returns the id of the group this image belongs to.
    #[inline]
    pub fn group_id(&self) -> u16 {
        self.group_id
    }

    /// Returns the raw image bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the mapped view over this image.
    #[inline]
    pub fn view(&self) -> GroupView<'_> {
        GroupView::over(&self.bytes, self.group_id)
    }

    /// Returns the bytecode bytes of the shader at `index`.
    #[inline]
    pub fn shader_bytes(&self, index: u16) -> Result<&[u8]> {
        self.view().shader_bytes(index)
    }
}

// =============================================================================
// Group Cache
// =============================================================================

/// A bounded LRU cache of decompressed groups, keyed by group id.
pub struct GroupCache {
    entries: Mutex<LruCache<u16, DecompressedGroup>>,
}

impl GroupCache {
    /// Creates a cache holding at most `capacity` decompressed groups.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the cached group, producing and inserting it on a miss.
    ///
    /// A hit marks the entry most recently used. A miss runs `produce`
    /// under the lock (concurrent misses for the same group collapse into
    /// one production) and may evict the least recently used entry. If
    /// `produce` fails the cache is left unchanged.
    ///
    /// The returned guard keeps the cache locked: the reference stays
    /// valid exactly until the guard drops, so callers must finish copying
    /// the bytecode out before releasing it. A concurrent insertion could
    /// otherwise evict and free the entry mid-read.
    pub fn get_or_create<F>(
        &self,
        group_id: u16,
        produce: F,
    ) -> Result<MappedMutexGuard<'_, DecompressedGroup>>
    where
        F: FnOnce() -> Result<DecompressedGroup>,
    {
        let mut entries = self.entries.lock();
        if !entries.contains(&group_id) {
            let group = produce()?;
            entries.put(group_id, group);
        }
        MutexGuard::try_map(entries, |e| e.get_mut(&group_id))
            .map_err(|_| Error::StaleCacheEntry { group_id })
    }

    /// Drops all entries, releasing their buffers.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns the number of resident decompressed groups.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if no decompressed group is resident.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns the fixed capacity chosen at construction.
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Returns true if `group_id` is resident, without touching LRU order.
    pub fn contains(&self, group_id: u16) -> bool {
        self.entries.lock().contains(&group_id)
    }

    /// Returns resident group ids, most recently used first.
    #[cfg(test)]
    pub(crate) fn keys_mru(&self) -> Vec<u16> {
        self.entries.lock().iter().map(|(id, _)| *id).collect()
    }
}

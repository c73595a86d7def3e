//! Process-wide dump registry.
//!
//! A process renders against one "main" shader dump, with a secondary slot
//! for auxiliary/debug dumps loaded alongside it. Both slots are created
//! lazily on first access and torn down with [`clear_all`] at shutdown.
//! Consumers reach them through the free functions here; tests construct
//! private [`DumpOwner`] instances instead.
//!
//! The slot locks also provide the load-vs-lookup exclusion the owner
//! itself does not enforce: `load`/`clear` take the write lock, lookups
//! take the read lock, so a reload can never run concurrently with an
//! in-flight `get_code` on the same slot.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::dump::DumpOwner;

// =============================================================================
// Generation Counter
// =============================================================================

static GENERATION: AtomicU32 = AtomicU32::new(0);

/// Returns the process-wide dump generation.
///
/// The counter increments every time any dump is (re)loaded. Dependents
/// holding state derived from dump contents compare generations to decide
/// when to invalidate.
#[inline]
pub fn get_generation() -> u32 {
    GENERATION.load(Ordering::Acquire)
}

/// Bumps the generation after a successful (re)load.
pub(crate) fn bump_generation() -> u32 {
    GENERATION.fetch_add(1, Ordering::AcqRel) + 1
}

// =============================================================================
// Registry Slots
// =============================================================================

struct Registry {
    main: RwLock<DumpOwner>,
    secondary: RwLock<DumpOwner>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| Registry {
        main: RwLock::new(DumpOwner::new()),
        secondary: RwLock::new(DumpOwner::new()),
    })
}

/// Returns the main (or secondary) dump owner slot.
///
/// Take the write lock for `load`/`clear`, the read lock for lookups.
pub fn dump_owner(main: bool) -> &'static RwLock<DumpOwner> {
    if main {
        &registry().main
    } else {
        &registry().secondary
    }
}

/// Returns the main dump owner slot.
#[inline]
pub fn main_dump_owner() -> &'static RwLock<DumpOwner> {
    dump_owner(true)
}

/// Clears both registry slots, releasing their buffers and caches.
///
/// Intended for process shutdown or between test scenarios; lookups after
/// this return empty until a dump is loaded again.
pub fn clear_all() {
    let registry = registry();
    registry.main.write().clear();
    registry.secondary.write().clear();
}

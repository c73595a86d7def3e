//! Shader dump ownership and bytecode lookup.
//!
//! [`DumpOwner`] owns the raw dump bytes (read into memory or mapped from
//! a file), the validated root view over them, and the bounded cache of
//! decompressed groups. It exposes the load/clear lifecycle and the
//! `get_code` contract that rendering threads hit on every shader resolve.
//!
//! The dump buffer is read-only once `load` returns, so lookups take
//! `&self` and need no lock of their own; only the group cache is guarded.
//! Reloading while lookups are in flight is the caller's exclusion to
//! provide (the registry slots wrap owners in a `RwLock` for exactly
//! this).

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use tracing::{debug, info, warn};

use super::cache::{DecompressedGroup, GroupCache, DEFAULT_GROUP_CACHE_CAPACITY};
use super::decompress::decompress_group;
use crate::diag::{DumpDiagnostics, NoopDiagnostics};
use crate::error::{Error, Result};
use crate::layout::{
    CompressionScheme, DumpHeader, DumpView, GroupView, SectionTable, ShaderCodeType,
    DUMP_VERSION_MAX,
};
use crate::registry;
use crate::util;

// =============================================================================
// Dump Bytes
// =============================================================================

/// The raw dump storage: read into an owned buffer or mapped from a file.
#[derive(Debug)]
enum DumpBytes {
    Empty,
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl DumpBytes {
    #[inline]
    fn as_slice(&self) -> &[u8] {
        match self {
            DumpBytes::Empty => &[],
            DumpBytes::Owned(bytes) => bytes,
            DumpBytes::Mapped(mmap) => mmap,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }
}

// =============================================================================
// Dump Owner
// =============================================================================

/// Owns a loaded shader binary dump and serves bytecode lookups from it.
pub struct DumpOwner {
    bytes: DumpBytes,
    header: Option<DumpHeader>,
    sections: SectionTable,
    /// Per-global-variable interval index, -1 where the variable has none.
    pub glob_var_interval_idx: Vec<i16>,
    /// Per-interval normalized value step, derived in [`init_after_load`].
    ///
    /// [`init_after_load`]: DumpOwner::init_after_load
    pub glob_interval_norm_values: Vec<u8>,
    cache: GroupCache,
    diag: Arc<dyn DumpDiagnostics>,
}

impl Default for DumpOwner {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpOwner {
    /// Creates an empty owner with the default group cache capacity.
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_GROUP_CACHE_CAPACITY)
    }

    /// Creates an empty owner holding at most `capacity` decompressed
    /// groups.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            bytes: DumpBytes::Empty,
            header: None,
            sections: SectionTable::default(),
            glob_var_interval_idx: Vec::new(),
            glob_interval_norm_values: Vec::new(),
            cache: GroupCache::new(capacity),
            diag: Arc::new(NoopDiagnostics),
        }
    }

    /// Installs a diagnostics sink. Pass [`NoopDiagnostics`] to detach.
    pub fn set_diagnostics(&mut self, diag: Arc<dyn DumpDiagnostics>) {
        self.diag = diag;
    }

    // =========================================================================
    // Load / Clear Lifecycle
    // =========================================================================

    /// Reads `size` bytes from `source` and loads them as the new dump.
    ///
    /// With `full_file_load` set and `size == 0`, reads the stream to its
    /// end instead. On success the previous dump (if any) is replaced, its
    /// cache dropped, and the process generation bumped. On failure the
    /// previous state is left untouched.
    pub fn load<R: Read>(&mut self, source: &mut R, size: usize, full_file_load: bool) -> Result<()> {
        let mut buf;
        if full_file_load && size == 0 {
            buf = Vec::new();
            source.read_to_end(&mut buf)?;
        } else {
            buf = vec![0u8; size];
            let mut got = 0;
            while got < size {
                let n = source.read(&mut buf[got..])?;
                if n == 0 {
                    return Err(Error::ShortRead { wanted: size, got });
                }
                got += n;
            }
        }
        self.replace(DumpBytes::Owned(buf))
    }

    /// Loads a dump from a caller-owned buffer. Same contract as [`load`].
    ///
    /// [`load`]: DumpOwner::load
    pub fn load_from_memory(&mut self, bytes: &[u8]) -> Result<()> {
        self.replace(DumpBytes::Owned(bytes.to_vec()))
    }

    /// Memory-maps a whole-file dump. Same contract as [`load`].
    ///
    /// [`load`]: DumpOwner::load
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| Error::MemoryMap {
            path: path.to_path_buf(),
            source,
        })?;
        self.replace(DumpBytes::Mapped(mmap))
    }

    /// Validates `bytes` and swaps it in as the active dump.
    fn replace(&mut self, bytes: DumpBytes) -> Result<()> {
        // Validate before touching any state: a rejected dump must leave
        // the previous one fully usable.
        let view = DumpView::parse(bytes.as_slice())?;
        let header = *view.header();
        let sections = view.sections();

        self.bytes = bytes;
        self.header = Some(header);
        self.sections = sections;
        self.cache.clear();
        self.init_after_load();

        let generation = registry::bump_generation();
        info!(
            "loaded shader dump v{} ({} bytes, {} classes, {} groups, generation {generation})",
            header.version,
            self.bytes.len(),
            self.view().map(|v| v.class_count()).unwrap_or(0),
            self.view().map(|v| v.group_count()).unwrap_or(0),
        );
        Ok(())
    }

    /// Re-derives the auxiliary index tables from the mapped dump.
    ///
    /// Normally called from `load`, but callable standalone to rebuild the
    /// derived state of a dump restored by other means.
    pub fn init_after_load(&mut self) {
        let (interval_idx, norm_values) = match self.view() {
            None => (Vec::new(), Vec::new()),
            Some(view) => {
                let mut interval_idx = Vec::with_capacity(view.global_var_count());
                for i in 0..view.global_var_count() {
                    let interval = view.global_var(i).map(|v| v.interval).unwrap_or(-1);
                    interval_idx.push(if (0..=i16::MAX as i32).contains(&interval) {
                        interval as i16
                    } else {
                        -1
                    });
                }

                let mut norm_values = Vec::with_capacity(view.interval_count());
                for i in 0..view.interval_count() {
                    let count = view.interval(i).map(|r| r.value_count).unwrap_or(0);
                    norm_values.push(if count > 1 {
                        (255 / (count - 1)).min(255) as u8
                    } else {
                        0
                    });
                }
                (interval_idx, norm_values)
            }
        };
        self.glob_var_interval_idx = interval_idx;
        self.glob_interval_norm_values = norm_values;
    }

    /// Releases the buffer, the cache, and all derived tables.
    ///
    /// Subsequent lookups return empty results until a dump is loaded.
    pub fn clear(&mut self) {
        self.bytes = DumpBytes::Empty;
        self.header = None;
        self.sections = SectionTable::default();
        self.glob_var_interval_idx.clear();
        self.glob_interval_norm_values.clear();
        self.cache.clear();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the size in bytes of the owned raw dump (0 if unloaded).
    #[inline]
    pub fn dump_size(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if a dump is currently loaded.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.header.is_some()
    }

    /// Returns the loaded dump's format generation.
    #[inline]
    pub fn version(&self) -> Option<u32> {
        self.header.map(|h| h.version)
    }

    /// Returns true if the loaded dump may contain compressed groups.
    #[inline]
    pub fn is_v3(&self) -> bool {
        self.version().is_some_and(|v| v >= DUMP_VERSION_MAX)
    }

    /// Returns the process-wide dump generation.
    #[inline]
    pub fn generation(&self) -> u32 {
        registry::get_generation()
    }

    /// Returns the mapped root view over the loaded dump.
    pub fn view(&self) -> Option<DumpView<'_>> {
        let header = self.header?;
        Some(DumpView::from_parts(
            self.bytes.as_slice(),
            header,
            self.sections,
        ))
    }

    /// Returns the name of the shader class at `index`.
    pub fn shader_class_name(&self, index: usize) -> Option<&str> {
        let view = self.view()?;
        let class = view.class(index)?;
        view.name_at(class.name_ofs).ok()
    }

    // =========================================================================
    // Bytecode Lookup
    // =========================================================================

    /// Returns the bytecode of shader `id` for the given stage.
    ///
    /// `scratch` is cleared and refilled on every call; the returned slice
    /// borrows it. No allocation happens when its existing capacity
    /// suffices. Lookups that cannot be served (no dump loaded, unknown
    /// id, null class, corrupt group) yield an empty slice; a corrupt
    /// group never poisons the cache and never affects other groups.
    pub fn get_code<'a>(
        &self,
        shader_id: u32,
        code_type: ShaderCodeType,
        scratch: &'a mut Vec<u32>,
    ) -> &'a [u32] {
        scratch.clear();
        if let Err(err) = self.fetch_code(shader_id, code_type, scratch) {
            scratch.clear();
            if err.degrades_to_empty() {
                debug!("shader {shader_id} lookup degraded to empty: {err}");
            } else {
                warn!("shader {shader_id} lookup failed: {err}");
            }
        }
        scratch.as_slice()
    }

    fn fetch_code(
        &self,
        shader_id: u32,
        code_type: ShaderCodeType,
        scratch: &mut Vec<u32>,
    ) -> Result<()> {
        let view = self.view().ok_or(Error::NotLoaded)?;
        let code_ref = view
            .code_ref(code_type, shader_id)
            .ok_or(Error::UnknownShader { id: shader_id })?;
        if code_ref.is_null() {
            // Null/placeholder class: defined empty result, not an error.
            return Ok(());
        }

        let group_id = code_ref.group_id;
        let record = view.group(group_id)?;
        let scheme = record.compression().ok_or(Error::UnknownScheme {
            group_id,
            scheme: record.scheme,
        })?;

        match scheme {
            CompressionScheme::Stored => {
                let image = view.group_stored_bytes(group_id, &record)?;
                let bytes = GroupView::over(image, group_id).shader_bytes(code_ref.index_in_group)?;
                copy_words(bytes, scratch);
            }
            CompressionScheme::Zstd => {
                let entry = self.cache.get_or_create(group_id, || {
                    let dictionary = match record.dictionary() {
                        Some(dict_id) => Some(view.dictionary_bytes(group_id, dict_id)?),
                        None => None,
                    };
                    let stored = view.group_stored_bytes(group_id, &record)?;
                    let raw = decompress_group(
                        group_id,
                        CompressionScheme::Zstd,
                        stored,
                        dictionary,
                        record.raw_len as usize,
                    )?;
                    let group = DecompressedGroup::new(group_id, raw)?;
                    self.diag.group_decompressed(group_id, record.raw_len as usize);
                    Ok(group)
                })?;
                // Copy out while the guard holds the cache lock: a
                // concurrent insertion could evict this entry the moment
                // the lock is released.
                let bytes = entry.shader_bytes(code_ref.index_in_group)?;
                copy_words(bytes, scratch);
            }
        }
        Ok(())
    }
}

/// Refills `scratch` with the packed 32-bit words in `bytes`.
fn copy_words(bytes: &[u8], scratch: &mut Vec<u32>) {
    let words = bytes.len() / 4;
    scratch.resize(words, 0);
    util::read_u32_words_into(&bytes[..words * 4], scratch);
}

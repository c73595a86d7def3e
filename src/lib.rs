//! shbindump - shader binary dump ownership and bytecode cache.
//!
//! This library owns the binary dump produced by the shader build: a flat
//! blob packing every compiled shader variant together with its metadata
//! tables. It provides random-access lookup of a variant's bytecode by
//! numeric id, transparently decompressing shader groups on demand and
//! caching the decompressed images under a bounded memory budget with
//! thread-safe concurrent access.
//!
//! # Features
//!
//! - Zero-copy mapped views over the loaded dump (offsets, not pointers)
//! - Three supported format generations, validated fully at load time
//! - Per-group zstd decompression with shared-dictionary support
//! - Bounded LRU cache of decompressed groups behind a single lock
//! - Process-wide registry of main and secondary dump owners
//! - Injectable diagnostics sink (no-op in release use)
//!
//! # Example
//!
//! ```no_run
//! use shbindump::{registry, ShaderCodeType};
//!
//! fn main() -> shbindump::Result<()> {
//!     let bytes = std::fs::read("cache/shaders.shbd")?;
//!     registry::main_dump_owner().write().load_from_memory(&bytes)?;
//!
//!     let mut scratch = Vec::new();
//!     let owner = registry::main_dump_owner().read();
//!     let code = owner.get_code(42, ShaderCodeType::Pixel, &mut scratch);
//!     println!("shader 42: {} words of bytecode", code.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diag;
pub mod dump;
pub mod error;
pub mod layout;
pub mod registry;
pub mod util;

#[cfg(test)]
mod testdump;

// Re-export main types
pub use diag::{CollectingDiagnostics, DumpDiagnostics, NoopDiagnostics};
pub use dump::{
    DecompressedGroup, DumpOwner, GroupCache, DEFAULT_GROUP_CACHE_CAPACITY,
};
pub use error::{Error, Result};
pub use layout::{CompressionScheme, DumpView, GroupView, ShaderCodeType};
pub use registry::get_generation;

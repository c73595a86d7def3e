//! Error types for shader binary dump handling.
//!
//! This module provides error handling for all dump operations, including
//! loading, format validation, group decompression, and bytecode lookup.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for shader dump operations.
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open file '{path}': {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to memory map file '{path}': {source}")]
    MemoryMap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("short read: wanted {wanted} bytes, got {got}")]
    ShortRead { wanted: usize, got: usize },

    // ==================== Dump Format Errors ====================
    #[error("invalid dump magic: expected 'SHBD', got {0:?}")]
    BadMagic([u8; 4]),

    #[error("unsupported dump format version: {0}")]
    UnsupportedVersion(u32),

    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("dump size field {declared} does not match buffer length {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("unknown dump flags: {bits:#x}")]
    UnknownFlags { bits: u32 },

    #[error("section {kind} at {offset:#x}+{len:#x} out of bounds (dump size: {size:#x})")]
    SectionOutOfBounds {
        kind: u32,
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("required section {kind} missing for format version {version}")]
    MissingSection { kind: u32, version: u32 },

    #[error("duplicate section {kind}")]
    DuplicateSection { kind: u32 },

    #[error("parse error at offset {offset:#x}: {reason}")]
    Parse { offset: usize, reason: String },

    // ==================== Group Errors ====================
    #[error("group {group_id} byte range out of bounds")]
    GroupOutOfBounds { group_id: u16 },

    #[error("unknown compression scheme {scheme} for group {group_id}")]
    UnknownScheme { group_id: u16, scheme: u8 },

    #[error("compressed group {group_id} not allowed in format version {version}")]
    CompressedGroupInOldDump { group_id: u16, version: u32 },

    #[error("group {group_id} references missing dictionary {dict_id}")]
    MissingDictionary { group_id: u16, dict_id: u8 },

    #[error("malformed group image for group {group_id}: {reason}")]
    MalformedGroup { group_id: u16, reason: String },

    #[error("failed to decompress group {group_id}: {source}")]
    Decompress {
        group_id: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("group {group_id} decompressed to {actual} bytes, expected {expected}")]
    DecompressedSizeMismatch {
        group_id: u16,
        expected: usize,
        actual: usize,
    },

    #[error("cache entry for group {group_id} vanished mid-lookup")]
    StaleCacheEntry { group_id: u16 },

    // ==================== Lookup Errors ====================
    #[error("no dump loaded")]
    NotLoaded,

    #[error("shader id {id} has no code of the requested type")]
    UnknownShader { id: u32 },

    #[error("shader index {index} out of range in group {group_id}")]
    ShaderOutOfGroup { group_id: u16, index: u16 },

    // ==================== String Errors ====================
    #[error("string offset {offset:#x} out of bounds")]
    StringOutOfBounds { offset: usize },

    #[error("invalid UTF-8 string at offset {offset:#x}")]
    InvalidString { offset: usize },
}

/// A specialized Result type for shader dump operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if this error degrades to an empty lookup result.
    ///
    /// Per-lookup failures (an unknown id, a corrupt group) must not abort
    /// rendering; `get_code` reports them as an empty span. Format and load
    /// errors are hard failures surfaced to the caller of `load`.
    #[inline]
    pub fn degrades_to_empty(&self) -> bool {
        matches!(
            self,
            Error::NotLoaded
                | Error::UnknownShader { .. }
                | Error::ShaderOutOfGroup { .. }
                | Error::MalformedGroup { .. }
                | Error::Decompress { .. }
                | Error::DecompressedSizeMismatch { .. }
                | Error::StaleCacheEntry { .. }
        )
    }

    /// Creates a parse error with a formatted message.
    #[inline]
    pub fn parse(offset: usize, reason: impl Into<String>) -> Self {
        Error::Parse {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a malformed-group error with a formatted message.
    #[inline]
    pub fn malformed_group(group_id: u16, reason: impl Into<String>) -> Self {
        Error::MalformedGroup {
            group_id,
            reason: reason.into(),
        }
    }

    /// Creates a buffer too small error.
    #[inline]
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Error::BufferTooSmall { needed, available }
    }
}

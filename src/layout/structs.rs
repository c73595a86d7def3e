//! Shader dump binary structures.
//!
//! These structures match the on-disk format of the shader binary dump.
//! They are designed for zero-copy parsing using the `zerocopy` crate.

use bitflags::bitflags;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// The magic identifier at the start of every dump.
pub const DUMP_MAGIC: &[u8; 4] = b"SHBD";

/// Oldest supported format generation.
pub const DUMP_VERSION_MIN: u32 = 1;
/// Newest supported format generation. v3 introduced compressed groups.
pub const DUMP_VERSION_MAX: u32 = 3;

/// Sentinel for a null variant reference (no code for this id).
pub const NULL_REF: u16 = u16::MAX;

/// Sentinel for a group without a shared dictionary.
pub const NO_DICTIONARY: u8 = u8::MAX;

/// Sentinel for a shader class slot with no code of that stage.
pub const NULL_CODE_ID: u32 = u32::MAX;

// =============================================================================
// Section Kinds
// =============================================================================

/// Shader class records (`ShaderClassRecord` array).
pub const SECTION_SHADER_CLASSES: u32 = 1;
/// NUL-terminated name string pool.
pub const SECTION_STRINGS: u32 = 2;
/// Variant map (`VariantMapHeader` + vertex refs + pixel refs).
pub const SECTION_VARIANT_MAP: u32 = 3;
/// Group records (`GroupRecord` array).
pub const SECTION_GROUPS: u32 = 4;
/// Global shader variable records (v2+).
pub const SECTION_GLOBAL_VARS: u32 = 5;
/// Interval records (v2+).
pub const SECTION_INTERVALS: u32 = 6;
/// Shared decompression dictionaries (v3).
pub const SECTION_DICTIONARIES: u32 = 7;

bitflags! {
    /// Feature flags carried in the dump header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DumpFlags: u32 {
        /// The dump carries shared decompression dictionaries.
        const HAS_DICTIONARIES = 0x1;
        /// The dump carries global variable and interval tables.
        const HAS_GLOBAL_VARS = 0x2;
    }
}

// =============================================================================
// Header Structures
// =============================================================================

/// The dump file header.
///
/// Followed immediately by `section_count` [`SectionRecord`] entries that
/// form the table of contents. Section offsets are absolute within the
/// loaded buffer.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct DumpHeader {
    /// Magic identifier, always `SHBD`.
    pub magic: [u8; 4],
    /// Format generation: 1, 2 or 3.
    pub version: u32,
    /// Feature flags, see [`DumpFlags`].
    pub flags: u32,
    /// Total dump size in bytes; must equal the loaded buffer length.
    pub total_size: u32,
    /// Number of `SectionRecord` entries following the header.
    pub section_count: u32,
}

/// A table-of-contents entry mapping a logical section to a byte range.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct SectionRecord {
    /// Section kind, one of the `SECTION_*` constants.
    pub kind: u32,
    /// Absolute byte offset of the section within the dump.
    pub offset: u32,
    /// Section length in bytes.
    pub len: u32,
}

// =============================================================================
// Metadata Records
// =============================================================================

/// A scripted shader class.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct ShaderClassRecord {
    /// Name offset, relative to the start of the strings section.
    pub name_ofs: u32,
    /// Vertex code id for this class, or [`NULL_CODE_ID`].
    pub vertex_id: u32,
    /// Pixel code id for this class, or [`NULL_CODE_ID`].
    pub pixel_id: u32,
}

impl ShaderClassRecord {
    /// Returns true if this class carries no code at all (a placeholder).
    #[inline]
    pub fn is_null(&self) -> bool {
        self.vertex_id == NULL_CODE_ID && self.pixel_id == NULL_CODE_ID
    }
}

/// Resolves a code id to the group holding its bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CodeRef {
    /// Id of the group containing the bytecode.
    pub group_id: u16,
    /// Index of the shader within the group image.
    pub index_in_group: u16,
}

impl CodeRef {
    /// The null reference: this id has no code.
    pub const NULL: CodeRef = CodeRef {
        group_id: NULL_REF,
        index_in_group: NULL_REF,
    };

    /// Returns true if this reference resolves to no code.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.group_id == NULL_REF && self.index_in_group == NULL_REF
    }
}

/// Header of the variant map section.
///
/// Followed by `vertex_count` vertex [`CodeRef`]s, then `pixel_count`
/// pixel [`CodeRef`]s. Compute shaders share the pixel id space.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct VariantMapHeader {
    /// Number of vertex code references.
    pub vertex_count: u32,
    /// Number of pixel code references.
    pub pixel_count: u32,
}

/// A batch of shader variants packed together for compression.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct GroupRecord {
    /// Absolute byte offset of the stored group payload.
    pub offset: u32,
    /// Stored (possibly compressed) payload length in bytes.
    pub stored_len: u32,
    /// Group image length after decompression. Equals `stored_len` for
    /// uncompressed groups.
    pub raw_len: u32,
    /// Compression scheme tag, see [`CompressionScheme`].
    pub scheme: u8,
    /// Dictionary index, or [`NO_DICTIONARY`].
    pub dict_id: u8,
    /// Reserved, must be zero.
    pub _reserved: [u8; 2],
}

impl GroupRecord {
    /// Returns the decoded compression scheme, if known.
    #[inline]
    pub fn compression(&self) -> Option<CompressionScheme> {
        CompressionScheme::from_raw(self.scheme)
    }

    /// Returns the dictionary index this group was compressed against.
    #[inline]
    pub fn dictionary(&self) -> Option<u8> {
        (self.dict_id != NO_DICTIONARY).then_some(self.dict_id)
    }
}

/// A shared decompression dictionary.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct DictionaryRecord {
    /// Absolute byte offset of the dictionary bytes.
    pub offset: u32,
    /// Dictionary length in bytes.
    pub len: u32,
}

/// A global shader variable (v2+).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct GlobalVarRecord {
    /// Name offset, relative to the start of the strings section.
    pub name_ofs: u32,
    /// Index into the intervals section, or -1 if the variable has none.
    pub interval: i32,
}

/// An interval subdividing a global variable's value range (v2+).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct IntervalRecord {
    /// Number of discrete values the interval can take.
    pub value_count: u32,
}

// =============================================================================
// Group Image Structures
// =============================================================================

/// Header of a group image (the payload after decompression).
///
/// Followed by `shader_count` [`GroupShaderEntry`] records, then the packed
/// bytecode bytes.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct GroupImageHeader {
    /// Number of shaders packed in this group.
    pub shader_count: u32,
}

/// Locates one shader's bytecode within a group image.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct GroupShaderEntry {
    /// Byte offset of the bytecode, relative to the image start.
    pub byte_ofs: u32,
    /// Bytecode length in 32-bit words.
    pub word_count: u32,
}

// =============================================================================
// Enums
// =============================================================================

/// How a group's payload is stored in the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionScheme {
    /// Payload is the group image verbatim.
    Stored,
    /// Payload is a zstd frame, optionally dictionary-assisted.
    Zstd,
}

impl CompressionScheme {
    /// Decodes the on-disk scheme tag.
    #[inline]
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(CompressionScheme::Stored),
            1 => Some(CompressionScheme::Zstd),
            _ => None,
        }
    }

    /// Encodes this scheme as its on-disk tag.
    #[inline]
    pub fn to_raw(self) -> u8 {
        match self {
            CompressionScheme::Stored => 0,
            CompressionScheme::Zstd => 1,
        }
    }
}

/// Which stage's bytecode a lookup targets.
///
/// Compute shaders are stored in the pixel id space, so `Compute` aliases
/// `Pixel` for lookup purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderCodeType {
    /// Vertex program bytecode.
    Vertex,
    /// Pixel (fragment) shader bytecode.
    Pixel,
    /// Compute shader bytecode; shares the pixel id space.
    Compute,
}

impl ShaderCodeType {
    /// Returns true if this type resolves through the pixel id space.
    #[inline]
    pub fn uses_pixel_slot(self) -> bool {
        matches!(self, ShaderCodeType::Pixel | ShaderCodeType::Compute)
    }
}

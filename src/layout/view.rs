//! Mapped views over a loaded shader dump.
//!
//! A [`DumpView`] interprets a flat byte buffer as the dump's structure
//! graph without copying: record fields are read in place and offsets are
//! resolved at access time. The full format validation happens once in
//! [`DumpView::parse`]; no view escapes a malformed buffer.
//!
//! Views never own the underlying bytes. They are valid exactly as long as
//! the backing buffer is alive and unmodified, which the owning
//! [`DumpOwner`](crate::dump::DumpOwner) guarantees by construction.

use std::mem::size_of;

use zerocopy::FromBytes;

use super::structs::*;
use crate::error::{Error, Result};
use crate::util;

/// Byte ranges of the dump's logical sections, resolved from the table of
/// contents at parse time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionTable {
    /// Shader class records.
    pub classes: Option<(usize, usize)>,
    /// Name string pool.
    pub strings: Option<(usize, usize)>,
    /// Variant map.
    pub variant_map: Option<(usize, usize)>,
    /// Group records.
    pub groups: Option<(usize, usize)>,
    /// Global variable records (v2+).
    pub global_vars: Option<(usize, usize)>,
    /// Interval records (v2+).
    pub intervals: Option<(usize, usize)>,
    /// Shared dictionaries (v3).
    pub dictionaries: Option<(usize, usize)>,
}

impl SectionTable {
    fn slot_mut(&mut self, kind: u32) -> Option<&mut Option<(usize, usize)>> {
        match kind {
            SECTION_SHADER_CLASSES => Some(&mut self.classes),
            SECTION_STRINGS => Some(&mut self.strings),
            SECTION_VARIANT_MAP => Some(&mut self.variant_map),
            SECTION_GROUPS => Some(&mut self.groups),
            SECTION_GLOBAL_VARS => Some(&mut self.global_vars),
            SECTION_INTERVALS => Some(&mut self.intervals),
            SECTION_DICTIONARIES => Some(&mut self.dictionaries),
            _ => None,
        }
    }
}

// =============================================================================
// Dump View
// =============================================================================

/// A read-only structured view over a loaded dump buffer.
#[derive(Debug, Clone, Copy)]
pub struct DumpView<'a> {
    data: &'a [u8],
    header: DumpHeader,
    sections: SectionTable,
}

impl<'a> DumpView<'a> {
    /// Parses and fully validates a dump buffer.
    ///
    /// Every structural invariant is checked here: magic, version, the
    /// table of contents, group and dictionary byte ranges, variant map
    /// references, and uncompressed group images. A buffer that parses
    /// cannot fail at field access later.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = Self::parse_header(data)?;
        let sections = Self::parse_sections(data, &header)?;
        let view = Self {
            data,
            header,
            sections,
        };
        view.validate()?;
        Ok(view)
    }

    /// Rebuilds a view from previously validated parts.
    ///
    /// Used by the dump owner to re-derive a view per lookup without
    /// re-running validation. The caller guarantees `header` and
    /// `sections` were produced by [`DumpView::parse`] over `data`.
    pub(crate) fn from_parts(data: &'a [u8], header: DumpHeader, sections: SectionTable) -> Self {
        Self {
            data,
            header,
            sections,
        }
    }

    /// Parses and validates the dump header.
    fn parse_header(data: &[u8]) -> Result<DumpHeader> {
        if data.len() < size_of::<DumpHeader>() {
            return Err(Error::buffer_too_small(size_of::<DumpHeader>(), data.len()));
        }

        let header = DumpHeader::read_from_prefix(data)
            .map_err(|_| Error::parse(0, "failed to parse dump header"))?
            .0;

        if &header.magic != DUMP_MAGIC {
            return Err(Error::BadMagic(header.magic));
        }
        if !(DUMP_VERSION_MIN..=DUMP_VERSION_MAX).contains(&header.version) {
            return Err(Error::UnsupportedVersion(header.version));
        }
        if header.total_size as usize != data.len() {
            return Err(Error::SizeMismatch {
                declared: header.total_size as usize,
                actual: data.len(),
            });
        }
        if DumpFlags::from_bits(header.flags).is_none() {
            return Err(Error::UnknownFlags { bits: header.flags });
        }

        Ok(header)
    }

    /// Parses the table of contents into resolved section ranges.
    fn parse_sections(data: &[u8], header: &DumpHeader) -> Result<SectionTable> {
        let toc_start = size_of::<DumpHeader>();
        let toc_len = header.section_count as usize * size_of::<SectionRecord>();
        if toc_start + toc_len > data.len() {
            return Err(Error::buffer_too_small(toc_start + toc_len, data.len()));
        }

        let mut sections = SectionTable::default();
        for i in 0..header.section_count as usize {
            let entry_offset = toc_start + i * size_of::<SectionRecord>();
            let record = SectionRecord::read_from_prefix(&data[entry_offset..])
                .map_err(|_| Error::parse(entry_offset, "failed to parse section record"))?
                .0;

            let offset = record.offset as usize;
            let len = record.len as usize;
            if !util::is_aligned(offset, 4) {
                return Err(Error::parse(entry_offset, "section offset not 4-aligned"));
            }
            if (record.offset as u64 + record.len as u64) > data.len() as u64 {
                return Err(Error::SectionOutOfBounds {
                    kind: record.kind,
                    offset,
                    len,
                    size: data.len(),
                });
            }

            let slot = sections
                .slot_mut(record.kind)
                .ok_or_else(|| Error::parse(entry_offset, "unknown section kind"))?;
            if slot.is_some() {
                return Err(Error::DuplicateSection { kind: record.kind });
            }
            *slot = Some((offset, len));
        }

        Ok(sections)
    }

    /// Validates everything beyond the header and table of contents.
    fn validate(&self) -> Result<()> {
        let version = self.header.version;

        for (kind, slot) in [
            (SECTION_SHADER_CLASSES, self.sections.classes),
            (SECTION_STRINGS, self.sections.strings),
            (SECTION_VARIANT_MAP, self.sections.variant_map),
            (SECTION_GROUPS, self.sections.groups),
        ] {
            if slot.is_none() {
                return Err(Error::MissingSection { kind, version });
            }
        }
        if version >= 2 {
            for (kind, slot) in [
                (SECTION_GLOBAL_VARS, self.sections.global_vars),
                (SECTION_INTERVALS, self.sections.intervals),
            ] {
                if slot.is_none() {
                    return Err(Error::MissingSection { kind, version });
                }
            }
        } else if self.sections.global_vars.is_some() || self.sections.intervals.is_some() {
            return Err(Error::parse(0, "global variable tables not valid before v2"));
        }
        if version < 3 && self.sections.dictionaries.is_some() {
            return Err(Error::parse(0, "dictionaries not valid before v3"));
        }

        self.validate_record_array(self.sections.classes, size_of::<ShaderClassRecord>())?;
        self.validate_record_array(self.sections.groups, size_of::<GroupRecord>())?;
        self.validate_record_array(self.sections.dictionaries, size_of::<DictionaryRecord>())?;
        self.validate_record_array(self.sections.global_vars, size_of::<GlobalVarRecord>())?;
        self.validate_record_array(self.sections.intervals, size_of::<IntervalRecord>())?;

        if self.group_count() > NULL_REF as usize {
            return Err(Error::parse(0, "group count exceeds 16-bit id space"));
        }
        if self.dictionary_count() > NO_DICTIONARY as usize {
            return Err(Error::parse(0, "dictionary count exceeds 8-bit id space"));
        }

        self.validate_dictionaries()?;
        self.validate_groups()?;
        self.validate_variant_map()?;
        self.validate_names()?;
        self.validate_global_vars()?;

        Ok(())
    }

    fn validate_record_array(&self, slot: Option<(usize, usize)>, record_size: usize) -> Result<()> {
        if let Some((offset, len)) = slot {
            if len % record_size != 0 {
                return Err(Error::parse(offset, "section length not a record multiple"));
            }
        }
        Ok(())
    }

    fn validate_dictionaries(&self) -> Result<()> {
        for i in 0..self.dictionary_count() {
            let record = self
                .dictionary_record(i as u8)
                .ok_or_else(|| Error::parse(0, "dictionary record unreadable"))?;
            if (record.offset as u64 + record.len as u64) > self.data.len() as u64 {
                return Err(Error::SectionOutOfBounds {
                    kind: SECTION_DICTIONARIES,
                    offset: record.offset as usize,
                    len: record.len as usize,
                    size: self.data.len(),
                });
            }
        }
        Ok(())
    }

    fn validate_groups(&self) -> Result<()> {
        for id in 0..self.group_count() as u16 {
            let record = self.group(id)?;
            let scheme = record
                .compression()
                .ok_or(Error::UnknownScheme {
                    group_id: id,
                    scheme: record.scheme,
                })?;

            if (record.offset as u64 + record.stored_len as u64) > self.data.len() as u64 {
                return Err(Error::GroupOutOfBounds { group_id: id });
            }

            match scheme {
                CompressionScheme::Stored => {
                    if record.stored_len != record.raw_len {
                        return Err(Error::malformed_group(id, "stored length mismatch"));
                    }
                    if record.dictionary().is_some() {
                        return Err(Error::malformed_group(id, "dictionary on stored group"));
                    }
                    // Uncompressed images are validated up front; compressed
                    // ones can only be checked after decompression.
                    GroupView::parse(self.group_stored_bytes(id, &record)?, id)?;
                }
                CompressionScheme::Zstd => {
                    if self.header.version < 3 {
                        return Err(Error::CompressedGroupInOldDump {
                            group_id: id,
                            version: self.header.version,
                        });
                    }
                    if let Some(dict_id) = record.dictionary() {
                        if self.dictionary_record(dict_id).is_none() {
                            return Err(Error::MissingDictionary {
                                group_id: id,
                                dict_id,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_variant_map(&self) -> Result<()> {
        let (offset, len) = self.sections.variant_map.unwrap_or((0, 0));
        if len < size_of::<VariantMapHeader>() {
            return Err(Error::buffer_too_small(size_of::<VariantMapHeader>(), len));
        }
        let map = self.variant_map_header()?;
        let expected = size_of::<VariantMapHeader>()
            + (map.vertex_count as usize + map.pixel_count as usize) * size_of::<CodeRef>();
        if expected != len {
            return Err(Error::parse(offset, "variant map length mismatch"));
        }

        let group_count = self.group_count() as u16;
        for id in 0..map.vertex_count {
            self.check_ref(self.code_ref(ShaderCodeType::Vertex, id), group_count, offset)?;
        }
        for id in 0..map.pixel_count {
            self.check_ref(self.code_ref(ShaderCodeType::Pixel, id), group_count, offset)?;
        }
        Ok(())
    }

    fn check_ref(&self, code_ref: Option<CodeRef>, group_count: u16, offset: usize) -> Result<()> {
        match code_ref {
            Some(r) if r.is_null() => Ok(()),
            Some(r) if r.group_id < group_count => Ok(()),
            _ => Err(Error::parse(offset, "variant ref names a missing group")),
        }
    }

    fn validate_names(&self) -> Result<()> {
        for i in 0..self.class_count() {
            let class = self
                .class(i)
                .ok_or_else(|| Error::parse(0, "class record unreadable"))?;
            self.name_at(class.name_ofs)?;
        }
        Ok(())
    }

    fn validate_global_vars(&self) -> Result<()> {
        let interval_count = self.interval_count() as i64;
        for i in 0..self.global_var_count() {
            let var = self
                .global_var(i)
                .ok_or_else(|| Error::parse(0, "global var record unreadable"))?;
            self.name_at(var.name_ofs)?;
            if var.interval != -1 && (var.interval < 0 || var.interval as i64 >= interval_count) {
                return Err(Error::parse(0, "global var names a missing interval"));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the parsed dump header.
    #[inline]
    pub fn header(&self) -> &DumpHeader {
        &self.header
    }

    /// Returns the format generation of this dump.
    #[inline]
    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Returns the resolved section table.
    #[inline]
    pub fn sections(&self) -> SectionTable {
        self.sections
    }

    /// Returns true if this dump carries global variable tables (v2+).
    #[inline]
    pub fn has_global_vars(&self) -> bool {
        self.header.version >= 2
    }

    /// Returns true if this dump may contain compressed groups (v3).
    #[inline]
    pub fn supports_compression(&self) -> bool {
        self.header.version >= 3
    }

    fn section(&self, slot: Option<(usize, usize)>) -> &'a [u8] {
        match slot {
            Some((offset, len)) => &self.data[offset..offset + len],
            None => &[],
        }
    }

    fn record_at<T: FromBytes>(&self, slot: Option<(usize, usize)>, index: usize) -> Option<T> {
        let bytes = self.section(slot);
        let start = index.checked_mul(size_of::<T>())?;
        T::read_from_prefix(bytes.get(start..)?).ok().map(|(r, _)| r)
    }

    /// Returns the number of shader classes.
    #[inline]
    pub fn class_count(&self) -> usize {
        self.section(self.sections.classes).len() / size_of::<ShaderClassRecord>()
    }

    /// Returns the shader class record at `index`.
    pub fn class(&self, index: usize) -> Option<ShaderClassRecord> {
        if index >= self.class_count() {
            return None;
        }
        self.record_at(self.sections.classes, index)
    }

    /// Reads a NUL-terminated name from the string pool.
    pub fn name_at(&self, name_ofs: u32) -> Result<&'a str> {
        let strings = self.section(self.sections.strings);
        let offset = name_ofs as usize;
        if offset >= strings.len() {
            return Err(Error::StringOutOfBounds { offset });
        }
        let bytes = &strings[offset..];
        let end = util::memchr_null(bytes);
        if end == bytes.len() {
            // Name runs off the end of the pool.
            return Err(Error::StringOutOfBounds { offset });
        }
        std::str::from_utf8(&bytes[..end]).map_err(|_| Error::InvalidString { offset })
    }

    fn variant_map_header(&self) -> Result<VariantMapHeader> {
        let bytes = self.section(self.sections.variant_map);
        Ok(VariantMapHeader::read_from_prefix(bytes)
            .map_err(|_| Error::parse(0, "failed to parse variant map header"))?
            .0)
    }

    /// Returns the number of vertex code ids in the variant map.
    pub fn vertex_count(&self) -> u32 {
        self.variant_map_header().map(|m| m.vertex_count).unwrap_or(0)
    }

    /// Returns the number of pixel code ids in the variant map.
    pub fn pixel_count(&self) -> u32 {
        self.variant_map_header().map(|m| m.pixel_count).unwrap_or(0)
    }

    /// Resolves a code id of the given type to its group reference.
    ///
    /// Returns `None` for an out-of-range id. A valid id whose slot holds
    /// no code yields `Some(CodeRef::NULL)`.
    pub fn code_ref(&self, code_type: ShaderCodeType, id: u32) -> Option<CodeRef> {
        let map = self.variant_map_header().ok()?;
        let slot = if code_type.uses_pixel_slot() {
            if id >= map.pixel_count {
                return None;
            }
            map.vertex_count as usize + id as usize
        } else {
            if id >= map.vertex_count {
                return None;
            }
            id as usize
        };
        let bytes = self.section(self.sections.variant_map);
        let start = size_of::<VariantMapHeader>() + slot * size_of::<CodeRef>();
        CodeRef::read_from_prefix(bytes.get(start..)?).ok().map(|(r, _)| r)
    }

    /// Returns the number of groups in this dump.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.section(self.sections.groups).len() / size_of::<GroupRecord>()
    }

    /// Returns the group record for `group_id`.
    pub fn group(&self, group_id: u16) -> Result<GroupRecord> {
        self.record_at(self.sections.groups, group_id as usize)
            .ok_or(Error::GroupOutOfBounds { group_id })
    }

    /// Returns the stored (possibly compressed) payload bytes of a group.
    pub fn group_stored_bytes(&self, group_id: u16, record: &GroupRecord) -> Result<&'a [u8]> {
        let start = record.offset as usize;
        let end = start + record.stored_len as usize;
        self.data
            .get(start..end)
            .ok_or(Error::GroupOutOfBounds { group_id })
    }

    /// Returns the number of shared dictionaries.
    #[inline]
    pub fn dictionary_count(&self) -> usize {
        self.section(self.sections.dictionaries).len() / size_of::<DictionaryRecord>()
    }

    fn dictionary_record(&self, dict_id: u8) -> Option<DictionaryRecord> {
        if (dict_id as usize) >= self.dictionary_count() {
            return None;
        }
        self.record_at(self.sections.dictionaries, dict_id as usize)
    }

    /// Returns the dictionary bytes a group was compressed against.
    pub fn dictionary_bytes(&self, group_id: u16, dict_id: u8) -> Result<&'a [u8]> {
        let record = self
            .dictionary_record(dict_id)
            .ok_or(Error::MissingDictionary { group_id, dict_id })?;
        let start = record.offset as usize;
        let end = start + record.len as usize;
        self.data
            .get(start..end)
            .ok_or(Error::MissingDictionary { group_id, dict_id })
    }

    /// Returns the number of global shader variables (0 before v2).
    #[inline]
    pub fn global_var_count(&self) -> usize {
        self.section(self.sections.global_vars).len() / size_of::<GlobalVarRecord>()
    }

    /// Returns the global variable record at `index`.
    pub fn global_var(&self, index: usize) -> Option<GlobalVarRecord> {
        if index >= self.global_var_count() {
            return None;
        }
        self.record_at(self.sections.global_vars, index)
    }

    /// Returns the number of intervals (0 before v2).
    #[inline]
    pub fn interval_count(&self) -> usize {
        self.section(self.sections.intervals).len() / size_of::<IntervalRecord>()
    }

    /// Returns the interval record at `index`.
    pub fn interval(&self, index: usize) -> Option<IntervalRecord> {
        if index >= self.interval_count() {
            return None;
        }
        self.record_at(self.sections.intervals, index)
    }
}

// =============================================================================
// Group View
// =============================================================================

/// A mapped view over one group image (decompressed or stored verbatim).
///
/// The image starts with a [`GroupImageHeader`], followed by one
/// [`GroupShaderEntry`] per packed shader, followed by the bytecode bytes.
#[derive(Debug, Clone, Copy)]
pub struct GroupView<'a> {
    image: &'a [u8],
    group_id: u16,
}

impl<'a> GroupView<'a> {
    /// Wraps an image without validating it.
    ///
    /// Accessors remain bounds-checked; use [`GroupView::parse`] when the
    /// image comes from an untrusted source.
    #[inline]
    pub fn over(image: &'a [u8], group_id: u16) -> Self {
        Self { image, group_id }
    }

    /// Wraps an image and validates every shader entry.
    pub fn parse(image: &'a [u8], group_id: u16) -> Result<Self> {
        let view = Self::over(image, group_id);
        let count = view.shader_count()?;
        let entries_end =
            size_of::<GroupImageHeader>() + count as usize * size_of::<GroupShaderEntry>();
        if entries_end > image.len() {
            return Err(Error::malformed_group(group_id, "entry table truncated"));
        }
        for index in 0..count {
            let entry = view.entry(index as u16)?;
            if !util::is_aligned(entry.byte_ofs as usize, 4) {
                return Err(Error::malformed_group(group_id, "bytecode not 4-aligned"));
            }
            if (entry.byte_ofs as u64) < entries_end as u64 {
                return Err(Error::malformed_group(group_id, "bytecode overlaps entries"));
            }
            let end = entry.byte_ofs as u64 + entry.word_count as u64 * 4;
            if end > image.len() as u64 {
                return Err(Error::malformed_group(group_id, "bytecode out of bounds"));
            }
        }
        Ok(view)
    }

    /// Returns the number of shaders packed in this group.
    pub fn shader_count(&self) -> Result<u32> {
        Ok(GroupImageHeader::read_from_prefix(self.image)
            .map_err(|_| Error::malformed_group(self.group_id, "image header truncated"))?
            .0
            .shader_count)
    }

    fn entry(&self, index: u16) -> Result<GroupShaderEntry> {
        let start =
            size_of::<GroupImageHeader>() + index as usize * size_of::<GroupShaderEntry>();
        let bytes = self
            .image
            .get(start..)
            .ok_or_else(|| Error::malformed_group(self.group_id, "entry table truncated"))?;
        Ok(GroupShaderEntry::read_from_prefix(bytes)
            .map_err(|_| Error::malformed_group(self.group_id, "entry table truncated"))?
            .0)
    }

    /// Returns the bytecode bytes of the shader at `index`.
    ///
    /// The returned slice length is a multiple of 4 (packed 32-bit words).
    pub fn shader_bytes(&self, index: u16) -> Result<&'a [u8]> {
        let count = self.shader_count()?;
        if index as u32 >= count {
            return Err(Error::ShaderOutOfGroup {
                group_id: self.group_id,
                index,
            });
        }
        let entry = self.entry(index)?;
        let start = entry.byte_ofs as usize;
        let end = start + entry.word_count as usize * 4;
        self.image
            .get(start..end)
            .ok_or_else(|| Error::malformed_group(self.group_id, "bytecode out of bounds"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdump::DumpBuilder;

    #[test]
    fn test_parse_minimal_v1() {
        let bytes = DumpBuilder::new(1)
            .class("simple", 0, NULL_CODE_ID)
            .stored_group(&[&[0xAA, 0xBB, 0xCC]])
            .vertex_ref(0, 0)
            .build();
        let view = DumpView::parse(&bytes).unwrap();
        assert_eq!(view.version(), 1);
        assert_eq!(view.class_count(), 1);
        assert_eq!(view.group_count(), 1);
        assert_eq!(view.vertex_count(), 1);
        let class = view.class(0).unwrap();
        assert_eq!(view.name_at(class.name_ofs).unwrap(), "simple");
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = DumpBuilder::new(1)
            .stored_group(&[&[1, 2, 3, 4]])
            .build();
        bytes[0] = b'X';
        assert!(matches!(
            DumpView::parse(&bytes),
            Err(Error::BadMagic(_))
        ));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut bytes = DumpBuilder::new(1)
            .stored_group(&[&[1, 2, 3, 4]])
            .build();
        bytes[4..8].copy_from_slice(&9u32.to_le_bytes());
        assert!(matches!(
            DumpView::parse(&bytes),
            Err(Error::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_truncated_buffer_rejected() {
        let bytes = DumpBuilder::new(1)
            .stored_group(&[&[1, 2, 3, 4]])
            .build();
        // Any prefix must be rejected as a size mismatch or short buffer.
        assert!(DumpView::parse(&bytes[..bytes.len() - 1]).is_err());
        assert!(DumpView::parse(&bytes[..10]).is_err());
    }

    #[test]
    fn test_compressed_group_rejected_before_v3() {
        let bytes = DumpBuilder::new(3)
            .compressed_group(&[&[1, 2, 3, 4]], None)
            .pixel_ref(0, 0)
            .build();
        assert!(DumpView::parse(&bytes).is_ok());

        // The same buffer relabelled as an older generation must fail
        // validation before any view escapes.
        let mut v1 = bytes.clone();
        v1[4..8].copy_from_slice(&1u32.to_le_bytes());
        assert!(DumpView::parse(&v1).is_err());
    }

    #[test]
    fn test_code_ref_lookup() {
        let bytes = DumpBuilder::new(1)
            .stored_group(&[&[1, 2], &[3, 4, 5]])
            .vertex_ref(0, 1)
            .pixel_null_ref()
            .build();
        let view = DumpView::parse(&bytes).unwrap();
        assert_eq!(view.vertex_count(), 1);
        assert_eq!(view.pixel_count(), 1);

        let r = view.code_ref(ShaderCodeType::Vertex, 0).unwrap();
        assert_eq!(r.group_id, 0);
        assert_eq!(r.index_in_group, 1);

        // Null slot resolves, but to the null ref.
        assert!(view.code_ref(ShaderCodeType::Pixel, 0).unwrap().is_null());
        // Compute aliases the pixel space.
        assert!(view.code_ref(ShaderCodeType::Compute, 0).unwrap().is_null());
        // Out of range.
        assert!(view.code_ref(ShaderCodeType::Vertex, 7).is_none());
    }

    #[test]
    fn test_variant_ref_to_missing_group_rejected() {
        let bytes = DumpBuilder::new(1)
            .stored_group(&[&[1, 2]])
            .vertex_ref(5, 0)
            .build();
        assert!(DumpView::parse(&bytes).is_err());
    }

    #[test]
    fn test_group_view_bounds() {
        let bytes = DumpBuilder::new(1)
            .stored_group(&[&[10, 11, 12], &[13]])
            .vertex_ref(0, 0)
            .build();
        let view = DumpView::parse(&bytes).unwrap();
        let record = view.group(0).unwrap();
        let image = view.group_stored_bytes(0, &record).unwrap();
        let group = GroupView::parse(image, 0).unwrap();

        assert_eq!(group.shader_count().unwrap(), 2);
        assert_eq!(group.shader_bytes(0).unwrap().len(), 12);
        assert_eq!(group.shader_bytes(1).unwrap().len(), 4);
        assert!(matches!(
            group.shader_bytes(2),
            Err(Error::ShaderOutOfGroup { .. })
        ));
    }

    #[test]
    fn test_malformed_group_image_rejected() {
        // A stored group whose entry points past the image must be caught
        // at load time.
        let mut image = Vec::new();
        image.extend_from_slice(&1u32.to_le_bytes()); // shader_count
        image.extend_from_slice(&12u32.to_le_bytes()); // byte_ofs
        image.extend_from_slice(&100u32.to_le_bytes()); // word_count (way out)
        assert!(matches!(
            GroupView::parse(&image, 3),
            Err(Error::MalformedGroup { group_id: 3, .. })
        ));
    }

    #[test]
    fn test_global_vars_v2() {
        let bytes = DumpBuilder::new(2)
            .stored_group(&[&[1]])
            .vertex_ref(0, 0)
            .global_var("mesh_quality", 0)
            .global_var("debug_wire", -1)
            .interval(4)
            .build();
        let view = DumpView::parse(&bytes).unwrap();
        assert!(view.has_global_vars());
        assert_eq!(view.global_var_count(), 2);
        assert_eq!(view.interval_count(), 1);
        let var = view.global_var(0).unwrap();
        assert_eq!(view.name_at(var.name_ofs).unwrap(), "mesh_quality");
        assert_eq!(var.interval, 0);
        assert_eq!(view.interval(0).unwrap().value_count, 4);
    }

    #[test]
    fn test_global_var_missing_interval_rejected() {
        let bytes = DumpBuilder::new(2)
            .stored_group(&[&[1]])
            .vertex_ref(0, 0)
            .global_var("bad", 3)
            .build();
        assert!(DumpView::parse(&bytes).is_err());
    }
}

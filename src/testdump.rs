//! Synthetic dump builder for tests.
//!
//! Assembles format-conformant dump buffers in memory so tests can load,
//! corrupt, and reload dumps without fixture files. Groups are numbered in
//! insertion order; variant refs are positional (the id is the push
//! index).

use zerocopy::IntoBytes;

use crate::layout::*;
use crate::util;

struct GroupSpec {
    shaders: Vec<Vec<u32>>,
    compressed: bool,
    dict: Option<u8>,
}

/// Builds a synthetic shader dump buffer.
pub struct DumpBuilder {
    version: u32,
    classes: Vec<(String, u32, u32)>,
    vertex_refs: Vec<CodeRef>,
    pixel_refs: Vec<CodeRef>,
    groups: Vec<GroupSpec>,
    dicts: Vec<Vec<u8>>,
    global_vars: Vec<(String, i32)>,
    intervals: Vec<u32>,
}

impl DumpBuilder {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            classes: Vec::new(),
            vertex_refs: Vec::new(),
            pixel_refs: Vec::new(),
            groups: Vec::new(),
            dicts: Vec::new(),
            global_vars: Vec::new(),
            intervals: Vec::new(),
        }
    }

    pub fn class(mut self, name: &str, vertex_id: u32, pixel_id: u32) -> Self {
        self.classes.push((name.to_string(), vertex_id, pixel_id));
        self
    }

    pub fn stored_group(mut self, shaders: &[&[u32]]) -> Self {
        self.groups.push(GroupSpec {
            shaders: shaders.iter().map(|s| s.to_vec()).collect(),
            compressed: false,
            dict: None,
        });
        self
    }

    pub fn compressed_group(mut self, shaders: &[&[u32]], dict: Option<u8>) -> Self {
        self.groups.push(GroupSpec {
            shaders: shaders.iter().map(|s| s.to_vec()).collect(),
            compressed: true,
            dict,
        });
        self
    }

    pub fn dictionary(mut self, bytes: &[u8]) -> Self {
        self.dicts.push(bytes.to_vec());
        self
    }

    pub fn vertex_ref(mut self, group_id: u16, index_in_group: u16) -> Self {
        self.vertex_refs.push(CodeRef {
            group_id,
            index_in_group,
        });
        self
    }

    pub fn vertex_null_ref(mut self) -> Self {
        self.vertex_refs.push(CodeRef::NULL);
        self
    }

    pub fn pixel_ref(mut self, group_id: u16, index_in_group: u16) -> Self {
        self.pixel_refs.push(CodeRef {
            group_id,
            index_in_group,
        });
        self
    }

    pub fn pixel_null_ref(mut self) -> Self {
        self.pixel_refs.push(CodeRef::NULL);
        self
    }

    pub fn global_var(mut self, name: &str, interval: i32) -> Self {
        self.global_vars.push((name.to_string(), interval));
        self
    }

    pub fn interval(mut self, value_count: u32) -> Self {
        self.intervals.push(value_count);
        self
    }

    pub fn build(self) -> Vec<u8> {
        // String pool and name offsets.
        let mut strings = Vec::new();
        let class_names: Vec<u32> = self
            .classes
            .iter()
            .map(|(name, _, _)| push_name(&mut strings, name))
            .collect();
        let var_names: Vec<u32> = self
            .global_vars
            .iter()
            .map(|(name, _)| push_name(&mut strings, name))
            .collect();

        // Group images and their stored (possibly compressed) payloads.
        let images: Vec<Vec<u8>> = self.groups.iter().map(|g| encode_image(&g.shaders)).collect();
        let stored: Vec<Vec<u8>> = self
            .groups
            .iter()
            .zip(&images)
            .map(|(g, image)| {
                if !g.compressed {
                    image.clone()
                } else if let Some(dict_id) = g.dict {
                    zstd::bulk::Compressor::with_dictionary(3, &self.dicts[dict_id as usize])
                        .unwrap()
                        .compress(image)
                        .unwrap()
                } else {
                    zstd::bulk::compress(image.as_slice(), 3).unwrap()
                }
            })
            .collect();

        // Section payloads (groups and dictionaries are filled once the
        // trailing blob offsets are known).
        let mut classes_bytes = Vec::new();
        for ((_, vertex_id, pixel_id), name_ofs) in self.classes.iter().zip(&class_names) {
            classes_bytes.extend_from_slice(
                ShaderClassRecord {
                    name_ofs: *name_ofs,
                    vertex_id: *vertex_id,
                    pixel_id: *pixel_id,
                }
                .as_bytes(),
            );
        }

        let mut variant_map = Vec::new();
        variant_map.extend_from_slice(
            VariantMapHeader {
                vertex_count: self.vertex_refs.len() as u32,
                pixel_count: self.pixel_refs.len() as u32,
            }
            .as_bytes(),
        );
        for r in self.vertex_refs.iter().chain(&self.pixel_refs) {
            variant_map.extend_from_slice(r.as_bytes());
        }

        let mut global_vars_bytes = Vec::new();
        for ((_, interval), name_ofs) in self.global_vars.iter().zip(&var_names) {
            global_vars_bytes.extend_from_slice(
                GlobalVarRecord {
                    name_ofs: *name_ofs,
                    interval: *interval,
                }
                .as_bytes(),
            );
        }
        let mut intervals_bytes = Vec::new();
        for value_count in &self.intervals {
            intervals_bytes.extend_from_slice(
                IntervalRecord {
                    value_count: *value_count,
                }
                .as_bytes(),
            );
        }

        // Section layout.
        let mut sections: Vec<(u32, usize)> = vec![
            (SECTION_SHADER_CLASSES, classes_bytes.len()),
            (SECTION_STRINGS, strings.len()),
            (SECTION_VARIANT_MAP, variant_map.len()),
            (
                SECTION_GROUPS,
                self.groups.len() * std::mem::size_of::<GroupRecord>(),
            ),
        ];
        if self.version >= 2 {
            sections.push((SECTION_GLOBAL_VARS, global_vars_bytes.len()));
            sections.push((SECTION_INTERVALS, intervals_bytes.len()));
        }
        if !self.dicts.is_empty() {
            sections.push((
                SECTION_DICTIONARIES,
                self.dicts.len() * std::mem::size_of::<DictionaryRecord>(),
            ));
        }

        let mut cursor =
            std::mem::size_of::<DumpHeader>() + sections.len() * std::mem::size_of::<SectionRecord>();
        let mut section_offsets = Vec::new();
        for (_, len) in &sections {
            let offset = util::align_up(cursor, 4);
            section_offsets.push(offset);
            cursor = offset + len;
        }

        // Trailing blob: group payloads, then dictionary bytes.
        let mut group_offsets = Vec::new();
        for payload in &stored {
            let offset = util::align_up(cursor, 4);
            group_offsets.push(offset);
            cursor = offset + payload.len();
        }
        let mut dict_offsets = Vec::new();
        for dict in &self.dicts {
            let offset = util::align_up(cursor, 4);
            dict_offsets.push(offset);
            cursor = offset + dict.len();
        }
        let total_size = cursor;

        // Group and dictionary records, now that offsets are final.
        let mut groups_bytes = Vec::new();
        for (i, (g, payload)) in self.groups.iter().zip(&stored).enumerate() {
            groups_bytes.extend_from_slice(
                GroupRecord {
                    offset: group_offsets[i] as u32,
                    stored_len: payload.len() as u32,
                    raw_len: images[i].len() as u32,
                    scheme: if g.compressed {
                        CompressionScheme::Zstd.to_raw()
                    } else {
                        CompressionScheme::Stored.to_raw()
                    },
                    dict_id: g.dict.unwrap_or(NO_DICTIONARY),
                    _reserved: [0; 2],
                }
                .as_bytes(),
            );
        }
        let mut dicts_bytes = Vec::new();
        for (i, dict) in self.dicts.iter().enumerate() {
            dicts_bytes.extend_from_slice(
                DictionaryRecord {
                    offset: dict_offsets[i] as u32,
                    len: dict.len() as u32,
                }
                .as_bytes(),
            );
        }

        // Assemble.
        let mut flags = DumpFlags::empty();
        if self.version >= 2 {
            flags |= DumpFlags::HAS_GLOBAL_VARS;
        }
        if !self.dicts.is_empty() {
            flags |= DumpFlags::HAS_DICTIONARIES;
        }

        let mut out = Vec::with_capacity(total_size);
        out.extend_from_slice(
            DumpHeader {
                magic: *DUMP_MAGIC,
                version: self.version,
                flags: flags.bits(),
                total_size: total_size as u32,
                section_count: sections.len() as u32,
            }
            .as_bytes(),
        );
        for (i, (kind, len)) in sections.iter().enumerate() {
            out.extend_from_slice(
                SectionRecord {
                    kind: *kind,
                    offset: section_offsets[i] as u32,
                    len: *len as u32,
                }
                .as_bytes(),
            );
        }

        let payloads: Vec<&[u8]> = {
            let mut p: Vec<&[u8]> = vec![&classes_bytes, &strings, &variant_map, &groups_bytes];
            if self.version >= 2 {
                p.push(&global_vars_bytes);
                p.push(&intervals_bytes);
            }
            if !self.dicts.is_empty() {
                p.push(&dicts_bytes);
            }
            p
        };
        for (i, payload) in payloads.iter().enumerate() {
            pad_to(&mut out, section_offsets[i]);
            out.extend_from_slice(payload);
        }
        for (i, payload) in stored.iter().enumerate() {
            pad_to(&mut out, group_offsets[i]);
            out.extend_from_slice(payload);
        }
        for (i, dict) in self.dicts.iter().enumerate() {
            pad_to(&mut out, dict_offsets[i]);
            out.extend_from_slice(dict);
        }

        assert_eq!(out.len(), total_size);
        out
    }
}

fn push_name(pool: &mut Vec<u8>, name: &str) -> u32 {
    let offset = pool.len() as u32;
    pool.extend_from_slice(name.as_bytes());
    pool.push(0);
    offset
}

/// Encodes shaders (as 32-bit word slices) into a group image.
fn encode_image(shaders: &[Vec<u32>]) -> Vec<u8> {
    let entries_end = std::mem::size_of::<GroupImageHeader>()
        + shaders.len() * std::mem::size_of::<GroupShaderEntry>();

    let mut image = Vec::new();
    image.extend_from_slice(
        GroupImageHeader {
            shader_count: shaders.len() as u32,
        }
        .as_bytes(),
    );
    let mut byte_ofs = entries_end;
    for words in shaders {
        image.extend_from_slice(
            GroupShaderEntry {
                byte_ofs: byte_ofs as u32,
                word_count: words.len() as u32,
            }
            .as_bytes(),
        );
        byte_ofs += words.len() * 4;
    }
    for words in shaders {
        for word in words {
            image.extend_from_slice(&word.to_le_bytes());
        }
    }
    image
}

fn pad_to(out: &mut Vec<u8>, offset: usize) {
    debug_assert!(out.len() <= offset);
    out.resize(offset, 0);
}

//! Diagnostics hooks for shader dump consumers.
//!
//! The dump owner reports noteworthy events (group decompressions,
//! invalid variant selections, accumulated execution time) to an injected
//! [`DumpDiagnostics`] collaborator. Release configurations install
//! [`NoopDiagnostics`]; tooling installs [`CollectingDiagnostics`] or its
//! own implementation. The hooks never affect lookup results.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::layout::{DumpView, ShaderCodeType, NULL_CODE_ID};

/// Event sink for dump diagnostics.
///
/// All methods have no-op defaults so implementations opt into the events
/// they care about.
pub trait DumpDiagnostics: Send + Sync {
    /// Called after a compressed group was rebuilt on a cache miss.
    fn group_decompressed(&self, _group_id: u16, _raw_len: usize) {}

    /// Records a variant code pair that failed to resolve for a shader
    /// class. Returns true if the mark is new.
    fn mark_invalid_variant(&self, _shader_nid: u32, _stat_code: u16, _dyn_code: u16) -> bool {
        false
    }

    /// Returns true if any invalid variant was marked for this class.
    fn has_invalid_variants(&self, _shader_nid: u32) -> bool {
        false
    }

    /// Forgets all invalid variant marks.
    fn reset_invalid_variant_marks(&self) {}

    /// Accumulates bytecode execution time for a shader class.
    fn add_exec_time(&self, _shader_nid: u32, _micros: u64) {}
}

/// The diagnostics sink used when nothing is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl DumpDiagnostics for NoopDiagnostics {}

/// A diagnostics sink that records every event for later inspection.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    marks: Mutex<HashSet<(u32, u16, u16)>>,
    exec_micros: Mutex<HashMap<u32, u64>>,
    decompressions: AtomicUsize,
}

impl CollectingDiagnostics {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many group decompressions were observed.
    pub fn decompression_count(&self) -> usize {
        self.decompressions.load(Ordering::Acquire)
    }

    /// Returns the accumulated execution time for a shader class.
    pub fn exec_micros(&self, shader_nid: u32) -> u64 {
        self.exec_micros
            .lock()
            .get(&shader_nid)
            .copied()
            .unwrap_or(0)
    }
}

impl DumpDiagnostics for CollectingDiagnostics {
    fn group_decompressed(&self, group_id: u16, raw_len: usize) {
        self.decompressions.fetch_add(1, Ordering::AcqRel);
        debug!("decompressed group {group_id} ({raw_len} bytes)");
    }

    fn mark_invalid_variant(&self, shader_nid: u32, stat_code: u16, dyn_code: u16) -> bool {
        self.marks.lock().insert((shader_nid, stat_code, dyn_code))
    }

    fn has_invalid_variants(&self, shader_nid: u32) -> bool {
        self.marks
            .lock()
            .iter()
            .any(|(nid, _, _)| *nid == shader_nid)
    }

    fn reset_invalid_variant_marks(&self) {
        self.marks.lock().clear();
    }

    fn add_exec_time(&self, shader_nid: u32, micros: u64) {
        *self.exec_micros.lock().entry(shader_nid).or_insert(0) += micros;
    }
}

/// Logs one shader class's name and code references at debug level.
pub fn log_shader_info(view: &DumpView<'_>, class_index: usize) {
    let Some(class) = view.class(class_index) else {
        debug!("shader class {class_index}: <out of range>");
        return;
    };
    let name = view.name_at(class.name_ofs).unwrap_or("<bad name>");
    if class.is_null() {
        debug!("shader class {class_index} '{name}': null class, no code");
        return;
    }

    for (label, code_type, id) in [
        ("vertex", ShaderCodeType::Vertex, class.vertex_id),
        ("pixel", ShaderCodeType::Pixel, class.pixel_id),
    ] {
        if id == NULL_CODE_ID {
            continue;
        }
        match view.code_ref(code_type, id) {
            Some(r) if !r.is_null() => debug!(
                "shader class {class_index} '{name}': {label} id {id} -> group {} index {}",
                r.group_id, r.index_in_group
            ),
            _ => debug!("shader class {class_index} '{name}': {label} id {id} -> <no code>"),
        }
    }
}

/// Logs every global variable and its interval at debug level.
pub fn log_global_vars(view: &DumpView<'_>) {
    for i in 0..view.global_var_count() {
        let Some(var) = view.global_var(i) else {
            continue;
        };
        let name = view.name_at(var.name_ofs).unwrap_or("<bad name>");
        match view.interval(var.interval.max(0) as usize) {
            Some(interval) if var.interval >= 0 => debug!(
                "global var {i} '{name}': interval {} ({} values)",
                var.interval, interval.value_count
            ),
            _ => debug!("global var {i} '{name}': no interval"),
        }
    }
}

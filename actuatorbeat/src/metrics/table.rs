//! Raw actuator key -> normalized field mapping
//!
//! Each entry names one dotted key of the flat `/metrics` document and the
//! field of [`NormalizedMetrics`] it lands in. Sparse groups (response gauges,
//! status counters) are matched by prefix instead, see [`GAUGE_RESPONSE_PREFIX`]
//! and [`STATUS_COUNTER_PREFIX`].

use super::NormalizedMetrics;

pub const GAUGE_RESPONSE_PREFIX: &str = "gauge.response.";
pub const STATUS_COUNTER_PREFIX: &str = "counter.status.";

/// Destination slot, typed by the value it holds
pub enum Slot {
    U64(fn(&mut NormalizedMetrics) -> &mut u64),
    I64(fn(&mut NormalizedMetrics) -> &mut i64),
    F64(fn(&mut NormalizedMetrics) -> &mut f64),
}

pub struct FieldMapping {
    pub raw: &'static str,
    pub slot: Slot,
}

macro_rules! field {
    ($raw:literal => u64 $($path:ident).+) => {
        FieldMapping { raw: $raw, slot: Slot::U64(|m| &mut m.$($path).+) }
    };
    ($raw:literal => i64 $($path:ident).+) => {
        FieldMapping { raw: $raw, slot: Slot::I64(|m| &mut m.$($path).+) }
    };
    ($raw:literal => f64 $($path:ident).+) => {
        FieldMapping { raw: $raw, slot: Slot::F64(|m| &mut m.$($path).+) }
    };
}

pub const FIELD_MAP: &[FieldMapping] = &[
    field!("mem" => u64 mem.total),
    field!("mem.free" => u64 mem.free),
    field!("processors" => u64 processors),
    field!("systemload.average" => f64 load_average),
    field!("uptime" => u64 uptime.total),
    field!("instance.uptime" => u64 uptime.instance),
    field!("heap" => u64 heap.total),
    field!("heap.init" => u64 heap.init),
    field!("heap.committed" => u64 heap.committed),
    field!("heap.used" => u64 heap.used),
    field!("nonheap" => u64 non_heap.total),
    field!("nonheap.init" => u64 non_heap.init),
    field!("nonheap.committed" => u64 non_heap.committed),
    field!("nonheap.used" => u64 non_heap.used),
    field!("threads" => u64 threads.total),
    field!("threads.peak" => u64 threads.peak),
    field!("threads.daemon" => u64 threads.daemon),
    field!("threads.totalStarted" => u64 threads.total_started),
    field!("classes" => u64 classes.total),
    field!("classes.loaded" => u64 classes.loaded),
    field!("classes.unloaded" => u64 classes.unloaded),
    field!("gc.ps_scavenge.count" => u64 gc.scavenge.count),
    field!("gc.ps_scavenge.time" => u64 gc.scavenge.time),
    field!("gc.ps_marksweep.count" => u64 gc.mark_sweep.count),
    field!("gc.ps_marksweep.time" => u64 gc.mark_sweep.time),
    // -1 means "unlimited" on the actuator side
    field!("httpsessions.max" => i64 http.sessions_max),
    field!("httpsessions.active" => u64 http.sessions_active),
    field!("datasource.primary.active" => u64 data_source.primary_active),
    field!("datasource.primary.usage" => f64 data_source.primary_usage),
];

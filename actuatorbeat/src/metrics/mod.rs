//! Actuator `/metrics` normalization
//!
//! The actuator reports a flat document of dotted keys (`heap.used`,
//! `gc.ps_scavenge.count`, ...). [`normalize`] rewrites it into the nested
//! [`NormalizedMetrics`] schema:
//! - every mapped field is always present, zero when the key is missing
//! - response gauges and status counters are sparse: only keys present in the
//!   raw document show up

mod table;

pub use table::{FieldMapping, Slot, FIELD_MAP, GAUGE_RESPONSE_PREFIX, STATUS_COUNTER_PREFIX};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Flat `/metrics` body as received
pub type RawMetricsDocument = Map<String, Value>;

/// Nested, stable metrics schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizedMetrics {
    pub mem: MemoryStats,
    pub processors: u64,
    pub load_average: f64,
    pub uptime: UptimeStats,
    pub heap: MemoryPool,
    pub non_heap: MemoryPool,
    pub threads: ThreadStats,
    pub classes: ClassStats,
    pub gc: GcStats,
    pub http: HttpSessionStats,
    pub data_source: DataSourceStats,
    /// Response time gauges keyed by endpoint name (sparse)
    pub gauge_response: BTreeMap<String, f64>,
    /// Response counters keyed by HTTP status, then endpoint name (sparse)
    pub status: BTreeMap<String, BTreeMap<String, u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStats {
    pub total: u64,
    pub free: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UptimeStats {
    pub total: u64,
    pub instance: u64,
}

/// Heap or non-heap memory pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryPool {
    pub total: u64,
    pub init: u64,
    pub committed: u64,
    pub used: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThreadStats {
    pub total: u64,
    pub peak: u64,
    pub daemon: u64,
    pub total_started: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassStats {
    pub total: u64,
    pub loaded: u64,
    pub unloaded: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GcStats {
    pub scavenge: GcCollector,
    pub mark_sweep: GcCollector,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcCollector {
    pub count: u64,
    pub time: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpSessionStats {
    pub sessions_max: i64,
    pub sessions_active: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataSourceStats {
    pub primary_active: u64,
    pub primary_usage: f64,
}

/// Rewrite a flat actuator document into the nested schema. Never fails.
pub fn normalize(raw: &RawMetricsDocument) -> NormalizedMetrics {
    let mut out = NormalizedMetrics::default();

    for field in FIELD_MAP {
        if let Some(value) = raw.get(field.raw) {
            if !field.slot.assign(&mut out, value) {
                debug!(key = field.raw, value = %value, "Ignoring metric with unexpected type");
            }
        }
    }

    for (key, value) in raw {
        if let Some(name) = key.strip_prefix(GAUGE_RESPONSE_PREFIX) {
            match as_f64(value) {
                Some(v) => {
                    out.gauge_response.insert(name.to_string(), v);
                }
                None => debug!(key = %key, value = %value, "Ignoring non-numeric gauge"),
            }
        } else if let Some(rest) = key.strip_prefix(STATUS_COUNTER_PREFIX) {
            let Some((code, name)) = rest.split_once('.') else {
                continue;
            };
            match as_u64(value) {
                Some(v) => {
                    out.status
                        .entry(code.to_string())
                        .or_default()
                        .insert(name.to_string(), v);
                }
                None => debug!(key = %key, value = %value, "Ignoring non-numeric counter"),
            }
        }
    }

    out
}

impl Slot {
    /// Store `value` in the slot; false when it does not fit the slot type
    fn assign(&self, metrics: &mut NormalizedMetrics, value: &Value) -> bool {
        match self {
            Slot::U64(slot) => as_u64(value).map(|v| *slot(metrics) = v).is_some(),
            Slot::I64(slot) => as_i64(value).map(|v| *slot(metrics) = v).is_some(),
            Slot::F64(slot) => as_f64(value).map(|v| *slot(metrics) = v).is_some(),
        }
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/*!
Actuator payload fixtures

Bodies shaped like a Spring Boot 1.x actuator:
- `/metrics`: flat document of dotted keys
- `/health`: nested status document
*/

use serde_json::{json, Map, Value};

/// Canned actuator bodies
pub struct ActuatorFixtures;

impl ActuatorFixtures {
    /// `/metrics` with every key the normalizer knows about
    pub fn metrics_full() -> Value {
        json!({
            "mem": 357306,
            "mem.free": 167698,
            "processors": 4,
            "instance.uptime": 120456,
            "uptime": 125961,
            "systemload.average": 1.83,
            "heap.committed": 293376,
            "heap.init": 131072,
            "heap.used": 125677,
            "heap": 1864192,
            "nonheap.committed": 65216,
            "nonheap.init": 2496,
            "nonheap.used": 63930,
            "nonheap": 0,
            "threads.peak": 23,
            "threads.daemon": 21,
            "threads.totalStarted": 27,
            "threads": 23,
            "classes": 8105,
            "classes.loaded": 8105,
            "classes.unloaded": 0,
            "gc.ps_scavenge.count": 9,
            "gc.ps_scavenge.time": 91,
            "gc.ps_marksweep.count": 2,
            "gc.ps_marksweep.time": 137,
            "httpsessions.max": -1,
            "httpsessions.active": 0,
            "datasource.primary.active": 0,
            "datasource.primary.usage": 0.0,
            "gauge.response.actuator": 2.0,
            "gauge.response.autoconfig": 6.0,
            "gauge.response.beans": 12.0,
            "gauge.response.configprops": 15.0,
            "gauge.response.dump": 23.0,
            "gauge.response.env": 3.5,
            "gauge.response.health": 11.0,
            "gauge.response.info": 1.0,
            "gauge.response.root": 4.0,
            "gauge.response.trace": 2.0,
            "gauge.response.unmapped": 1.0,
            "counter.status.200.actuator": 1,
            "counter.status.200.autoconfig": 1,
            "counter.status.200.beans": 1,
            "counter.status.200.configprops": 1,
            "counter.status.200.dump": 1,
            "counter.status.200.env": 2,
            "counter.status.200.health": 5,
            "counter.status.200.info": 1,
            "counter.status.200.root": 3,
            "counter.status.200.trace": 1
        })
    }

    /// `/metrics` from an application with no web traffic yet
    pub fn metrics_minimal() -> Value {
        json!({
            "mem": 1024,
            "mem.free": 512,
            "uptime": 1000
        })
    }

    pub fn health_up() -> Value {
        json!({
            "status": "UP",
            "diskSpace": {
                "status": "UP",
                "total": 249769230336u64,
                "free": 178162962432u64,
                "threshold": 10485760
            },
            "db": {
                "status": "UP",
                "database": "H2",
                "hello": 1
            }
        })
    }

    pub fn health_down() -> Value {
        json!({
            "status": "DOWN",
            "db": {
                "status": "DOWN",
                "database": "PostgreSQL"
            }
        })
    }
}

/// Builds custom `/metrics` bodies key by key
#[derive(Debug, Clone, Default)]
pub struct RawMetricsBuilder {
    fields: Map<String, Value>,
}

impl RawMetricsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the full fixture
    pub fn full() -> Self {
        match ActuatorFixtures::metrics_full() {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn with<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.fields.remove(key);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn build_raw(self) -> Map<String, Value> {
        self.fields
    }
}

//! Actuator `/health` body
//!
//! The document is kept exactly as received and forwarded unchanged.
//! Typed views over the well-known indicators (`diskSpace`, `db`) are decoded
//! on demand and never alter what gets published.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Actuator `/health` body, forwarded as received
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthDocument {
    body: Map<String, Value>,
}

/// Read-only view of the `diskSpace` indicator
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiskSpaceHealth {
    pub status: Option<String>,
    pub total: Option<u64>,
    pub free: Option<u64>,
    pub threshold: Option<u64>,
    /// Anything else the indicator reports (`path`, `exists`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read-only view of the `db` indicator
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DbHealth {
    pub status: Option<String>,
    pub database: Option<String>,
    pub hello: Option<Value>,
    /// Per-datasource entries when several datasources are configured
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DbHealth {
    /// Validation query result, accepting numbers and numeric strings
    pub fn hello_response(&self) -> Option<u64> {
        match self.hello.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Nested datasource indicators, keyed by datasource name
    pub fn datasources(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.extra
            .iter()
            .filter_map(|(name, value)| value.as_object().map(|obj| (name.as_str(), obj)))
    }
}

impl HealthDocument {
    pub fn status(&self) -> Option<&str> {
        self.body.get("status").and_then(Value::as_str)
    }

    pub fn is_up(&self) -> bool {
        self.status().is_some_and(|s| s.eq_ignore_ascii_case("UP"))
    }

    pub fn disk_space(&self) -> Option<DiskSpaceHealth> {
        self.indicator("diskSpace")
    }

    pub fn db(&self) -> Option<DbHealth> {
        self.indicator("db")
    }

    /// Raw JSON of one indicator
    pub fn component(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.body
    }

    fn indicator<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.body
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl From<Map<String, Value>> for HealthDocument {
    fn from(body: Map<String, Value>) -> Self {
        Self { body }
    }
}

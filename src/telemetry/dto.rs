use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NEVER: &str = "Never";

/// Latest Arduino reading as served by `/get_iot_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IotReading {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(rename = "lastUpdate")]
    pub last_update: String,
    pub connected: bool,
}

impl Default for IotReading {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            last_update: NEVER.to_string(),
            connected: false,
        }
    }
}

/// Latest NodeMCU DHT reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DhtReading {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(rename = "lastUpdate")]
    pub last_update: String,
    pub email: Option<String>,
}

impl Default for DhtReading {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            last_update: NEVER.to_string(),
            email: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SensorPayload {
    #[serde(default)]
    pub temperature: Value,
    #[serde(default)]
    pub humidity: Value,
    #[serde(default)]
    pub email: Option<String>,
}

impl SensorPayload {
    /// Blank addresses are treated as absent.
    pub fn recipient(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

/// Sensor values arrive as numbers or numeric strings; anything else reads
/// as `0.0`. Negative temperatures are kept.
pub fn reading_value(v: &Value) -> f64 {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub status: &'static str,
}

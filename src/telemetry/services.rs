use std::collections::BTreeMap;

use time::{macros::format_description, OffsetDateTime};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::dto::{reading_value, DhtReading, IotReading, SensorPayload};

/// One reading kept for a recipient's IoT report.
#[derive(Debug, Clone, PartialEq)]
pub struct IotLogEntry {
    pub email: String,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: OffsetDateTime,
}

fn stamp(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

#[derive(Debug, Default)]
pub struct TelemetryStore {
    iot: RwLock<IotReading>,
    dht: RwLock<DhtReading>,
    log: Mutex<Vec<IotLogEntry>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn log_reading(&self, email: Option<&str>, temperature: f64, humidity: f64, at: OffsetDateTime) {
        if let Some(email) = email {
            self.log.lock().await.push(IotLogEntry {
                email: email.to_string(),
                temperature,
                humidity,
                timestamp: at,
            });
        }
    }

    pub async fn record_iot(&self, payload: &SensorPayload, at: OffsetDateTime) -> IotReading {
        let reading = IotReading {
            temperature: reading_value(&payload.temperature),
            humidity: reading_value(&payload.humidity),
            last_update: stamp(at),
            connected: true,
        };
        *self.iot.write().await = reading.clone();
        self.log_reading(payload.recipient(), reading.temperature, reading.humidity, at)
            .await;
        debug!(temperature = reading.temperature, humidity = reading.humidity, "iot reading stored");
        reading
    }

    pub async fn record_dht(&self, payload: &SensorPayload, at: OffsetDateTime) -> DhtReading {
        let reading = DhtReading {
            temperature: reading_value(&payload.temperature),
            humidity: reading_value(&payload.humidity),
            last_update: stamp(at),
            email: payload.recipient().map(str::to_string),
        };
        *self.dht.write().await = reading.clone();
        self.log_reading(payload.recipient(), reading.temperature, reading.humidity, at)
            .await;
        debug!(temperature = reading.temperature, humidity = reading.humidity, "dht reading stored");
        reading
    }

    pub async fn latest_iot(&self) -> IotReading {
        self.iot.read().await.clone()
    }

    pub async fn latest_dht(&self) -> DhtReading {
        self.dht.read().await.clone()
    }

    /// Most recent logged reading per recipient. `drain` empties the log.
    pub async fn latest_per_recipient(&self, drain: bool) -> BTreeMap<String, IotLogEntry> {
        let mut log = self.log.lock().await;
        let entries: Vec<IotLogEntry> = if drain {
            std::mem::take(&mut *log)
        } else {
            log.clone()
        };
        entries
            .into_iter()
            .map(|e| (e.email.clone(), e))
            .collect()
    }
}

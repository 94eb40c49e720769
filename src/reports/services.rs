use std::{collections::BTreeMap, fmt};

use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{mailer::Mailer, templates};
use crate::{nutrition::record::NutritionRecord, telemetry::TelemetryStore};

pub const NUTRITION_SUBJECT: &str = "Your Nutrition Analysis Results";
pub const DAILY_NUTRITION_SUBJECT: &str = "Daily Nutrition Analysis Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Evening,
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Morning => "Morning",
            Self::Evening => "Evening",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NutritionLogEntry {
    pub email: String,
    pub record: NutritionRecord,
    pub timestamp: OffsetDateTime,
}

/// Analyses waiting for the evening report.
#[derive(Debug, Default)]
pub struct NutritionLog {
    entries: Mutex<Vec<NutritionLogEntry>>,
}

impl NutritionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, email: &str, record: NutritionRecord, at: OffsetDateTime) {
        self.entries.lock().await.push(NutritionLogEntry {
            email: email.to_string(),
            record,
            timestamp: at,
        });
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Empties the log, grouping entries by recipient in arrival order.
    pub async fn drain_by_recipient(&self) -> BTreeMap<String, Vec<NutritionLogEntry>> {
        let entries = std::mem::take(&mut *self.entries.lock().await);
        let mut grouped: BTreeMap<String, Vec<NutritionLogEntry>> = BTreeMap::new();
        for e in entries {
            grouped.entry(e.email.clone()).or_default().push(e);
        }
        grouped
    }
}

pub async fn send_nutrition_email(mailer: &dyn Mailer, to: &str, data: &Value) -> anyhow::Result<()> {
    mailer
        .send_html(to, NUTRITION_SUBJECT, templates::nutrition_email(data))
        .await
}

/// Mails each recipient their logged analyses. Returns how many mails went
/// out; a failed recipient is logged and skipped.
pub async fn send_daily_nutrition_reports(log: &NutritionLog, mailer: &dyn Mailer) -> usize {
    let mut sent = 0;
    for (email, entries) in log.drain_by_recipient().await {
        let html = templates::daily_nutrition_report(&entries);
        match mailer.send_html(&email, DAILY_NUTRITION_SUBJECT, html).await {
            Ok(()) => sent += 1,
            Err(e) => warn!(to = %email, error = %format!("{e:#}"), "daily nutrition report failed"),
        }
    }
    info!(sent, "daily nutrition reports done");
    sent
}

/// The evening run clears the IoT log; the morning run leaves it in place.
pub async fn send_iot_reports(store: &TelemetryStore, mailer: &dyn Mailer, time_of_day: TimeOfDay) -> usize {
    let drain = time_of_day == TimeOfDay::Evening;
    let mut sent = 0;
    for (email, latest) in store.latest_per_recipient(drain).await {
        let subject = format!("IoT Report ({time_of_day})");
        let html = templates::iot_report(time_of_day, &latest);
        match mailer.send_html(&email, &subject, html).await {
            Ok(()) => sent += 1,
            Err(e) => warn!(to = %email, error = %format!("{e:#}"), "iot report failed"),
        }
    }
    info!(sent, %time_of_day, "iot reports done");
    sent
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;
    use crate::{
        nutrition::services::extract_full_nutrition,
        reports::mailer::{testing::RecordingMailer, DisabledMailer},
        telemetry::dto::SensorPayload,
    };

    #[tokio::test]
    async fn nutrition_reports_group_and_drain() {
        let log = NutritionLog::new();
        let at = datetime!(2024-05-01 09:00 UTC);
        log.append("b@x.io", extract_full_nutrition("Calories 10"), at).await;
        log.append("a@x.io", extract_full_nutrition("Calories 20"), at).await;
        log.append("b@x.io", extract_full_nutrition("Calories 30"), at).await;

        let mailer = RecordingMailer::default();
        assert_eq!(send_daily_nutrition_reports(&log, &mailer).await, 2);
        assert_eq!(log.len().await, 0);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to, "a@x.io");
        assert_eq!(sent[1].to, "b@x.io");
        assert_eq!(sent[1].subject, DAILY_NUTRITION_SUBJECT);
        assert_eq!(sent[1].html.matches("<li>").count(), 2);
    }

    #[tokio::test]
    async fn failed_delivery_still_drains() {
        let log = NutritionLog::new();
        log.append("a@x.io", extract_full_nutrition(""), datetime!(2024-05-01 09:00 UTC))
            .await;
        assert_eq!(send_daily_nutrition_reports(&log, &DisabledMailer).await, 0);
        assert_eq!(log.len().await, 0);
    }

    #[tokio::test]
    async fn only_evening_iot_report_clears_log() {
        let store = TelemetryStore::new();
        let payload: SensorPayload =
            serde_json::from_value(json!({"temperature": 3, "humidity": 55, "email": "a@x.io"})).unwrap();
        store.record_iot(&payload, datetime!(2024-05-01 07:00 UTC)).await;

        let mailer = RecordingMailer::default();
        assert_eq!(send_iot_reports(&store, &mailer, TimeOfDay::Morning).await, 1);
        assert_eq!(send_iot_reports(&store, &mailer, TimeOfDay::Evening).await, 1);
        assert_eq!(send_iot_reports(&store, &mailer, TimeOfDay::Evening).await, 0);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "IoT Report (Morning)");
        assert_eq!(sent[1].subject, "IoT Report (Evening)");
        assert!(sent[1].html.contains("Temperature: 3°C"));
    }

    #[tokio::test]
    async fn single_result_mail_uses_template() {
        let mailer = RecordingMailer::default();
        send_nutrition_email(&mailer, "a@x.io", &json!({"calories": 12}))
            .await
            .unwrap();
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].subject, NUTRITION_SUBJECT);
        assert!(sent[0].html.contains("Calories: 12"));
    }
}

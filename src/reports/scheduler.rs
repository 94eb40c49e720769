use std::{str::FromStr, sync::Arc};

use anyhow::Context;
use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use tokio::{task::JoinHandle, time::Duration};
use tracing::{info, warn};

use super::{
    mailer::Mailer,
    services::{self, NutritionLog, TimeOfDay},
};
use crate::{config::ReportSchedule, telemetry::TelemetryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportJob {
    DailyNutrition,
    Iot(TimeOfDay),
}

impl ReportJob {
    fn name(&self) -> &'static str {
        match self {
            Self::DailyNutrition => "daily_nutrition",
            Self::Iot(TimeOfDay::Morning) => "iot_morning",
            Self::Iot(TimeOfDay::Evening) => "iot_evening",
        }
    }
}

pub fn parse_schedule(expression: &str) -> anyhow::Result<Schedule> {
    Schedule::from_str(expression).with_context(|| format!("invalid cron expression {expression:?}"))
}

/// Time from `now` until the next fire; `None` when the schedule is
/// exhausted.
pub fn next_delay<Tz: TimeZone>(schedule: &Schedule, now: &DateTime<Tz>) -> Option<Duration> {
    let next = schedule.after(now).next()?;
    Some(
        next.signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::from_secs(60)),
    )
}

/// Everything the report jobs read from.
#[derive(Clone)]
pub struct ReportContext {
    pub nutrition_log: Arc<NutritionLog>,
    pub telemetry: Arc<TelemetryStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl ReportContext {
    pub async fn run(&self, job: ReportJob) -> usize {
        match job {
            ReportJob::DailyNutrition => {
                services::send_daily_nutrition_reports(&self.nutrition_log, self.mailer.as_ref()).await
            }
            ReportJob::Iot(time_of_day) => {
                services::send_iot_reports(&self.telemetry, self.mailer.as_ref(), time_of_day).await
            }
        }
    }
}

fn spawn_job(ctx: ReportContext, job: ReportJob, schedule: Schedule) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Some(delay) = next_delay(&schedule, &Local::now()) else {
                warn!(job = job.name(), "schedule has no upcoming runs, stopping");
                return;
            };
            info!(job = job.name(), in_secs = delay.as_secs(), "next report scheduled");
            tokio::time::sleep(delay).await;
            ctx.run(job).await;
        }
    })
}

/// Starts one task per report on local wall-clock time.
pub fn start(ctx: ReportContext, cfg: &ReportSchedule) -> anyhow::Result<Vec<JoinHandle<()>>> {
    let jobs = [
        (ReportJob::DailyNutrition, &cfg.nutrition),
        (ReportJob::Iot(TimeOfDay::Morning), &cfg.iot_morning),
        (ReportJob::Iot(TimeOfDay::Evening), &cfg.iot_evening),
    ];
    let mut handles = Vec::with_capacity(jobs.len());
    for (job, expression) in jobs {
        let schedule = parse_schedule(expression)?;
        handles.push(spawn_job(ctx.clone(), job, schedule));
    }
    Ok(handles)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn delay_until_next_evening_run() {
        let schedule = parse_schedule("0 0 20 * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 19, 30, 0).unwrap();
        assert_eq!(next_delay(&schedule, &now), Some(Duration::from_secs(30 * 60)));

        let after = Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap();
        assert_eq!(next_delay(&schedule, &after), Some(Duration::from_secs(24 * 3600)));
    }

    #[test]
    fn bad_expression_is_rejected() {
        assert!(parse_schedule("every evening").is_err());
    }

    #[tokio::test]
    async fn context_runs_each_job() {
        use serde_json::json;
        use time::OffsetDateTime;

        use crate::{
            nutrition::services::extract_full_nutrition, reports::mailer::testing::RecordingMailer,
            telemetry::dto::SensorPayload,
        };

        let mailer = Arc::new(RecordingMailer::default());
        let ctx = ReportContext {
            nutrition_log: Arc::new(NutritionLog::new()),
            telemetry: Arc::new(TelemetryStore::new()),
            mailer: mailer.clone(),
        };
        let now = OffsetDateTime::now_utc();
        ctx.nutrition_log
            .append("a@x.io", extract_full_nutrition("Calories 5"), now)
            .await;
        let payload: SensorPayload = serde_json::from_value(json!({"temperature": 1, "email": "a@x.io"})).unwrap();
        ctx.telemetry.record_iot(&payload, now).await;

        assert_eq!(ctx.run(ReportJob::DailyNutrition).await, 1);
        assert_eq!(ctx.run(ReportJob::DailyNutrition).await, 0);
        assert_eq!(ctx.run(ReportJob::Iot(TimeOfDay::Morning)).await, 1);
        assert_eq!(mailer.sent.lock().unwrap().len(), 2);
    }
}

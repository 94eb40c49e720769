use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use crate::reports::scheduler::parse_schedule;

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
}

/// Cron expressions (with seconds) for the report jobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSchedule {
    pub nutrition: String,
    pub iot_morning: String,
    pub iot_evening: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub smtp: Option<SmtpConfig>,
    pub upload_folder: PathBuf,
    pub classes_json_path: PathBuf,
    pub reports: ReportSchedule,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let port = or("APP_PORT", "8080")
            .parse::<u16>()
            .context("APP_PORT must be a port number")?;

        let smtp = match (var("SMTP_SERVER"), var("SENDER_EMAIL")) {
            (Some(server), Some(sender)) => Some(SmtpConfig {
                server,
                port: or("SMTP_PORT", "587")
                    .parse::<u16>()
                    .context("SMTP_PORT must be a port number")?,
                username: or("SMTP_USERNAME", ""),
                password: or("SMTP_PASSWORD", ""),
                sender,
            }),
            _ => None,
        };

        let reports = ReportSchedule {
            nutrition: or("NUTRITION_REPORT_CRON", "0 0 20 * * *"),
            iot_morning: or("IOT_MORNING_REPORT_CRON", "0 0 8 * * *"),
            iot_evening: or("IOT_EVENING_REPORT_CRON", "0 0 20 * * *"),
        };
        for expression in [&reports.nutrition, &reports.iot_morning, &reports.iot_evening] {
            parse_schedule(expression)?;
        }

        Ok(Self {
            host: or("APP_HOST", "0.0.0.0"),
            port,
            gemini_api_key: var("SERVER_API_KEY"),
            gemini_model: or("GEMINI_MODEL", "gemini-1.5-flash"),
            ollama_url: or("OLLAMA_URL", "http://localhost:11434"),
            ollama_model: or("OLLAMA_MODEL", "mistral"),
            smtp,
            upload_folder: PathBuf::from(or("UPLOAD_FOLDER", "uploads")),
            classes_json_path: PathBuf::from(or("CLASSES_JSON_PATH", "dataset_classes.json")),
            reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.gemini_api_key, None);
        assert_eq!(cfg.gemini_model, "gemini-1.5-flash");
        assert_eq!(cfg.ollama_url, "http://localhost:11434");
        assert_eq!(cfg.ollama_model, "mistral");
        assert!(cfg.smtp.is_none());
        assert_eq!(cfg.upload_folder, PathBuf::from("uploads"));
        assert_eq!(cfg.reports.iot_morning, "0 0 8 * * *");
    }

    #[test]
    fn smtp_needs_server_and_sender() {
        assert!(load(&[("SMTP_SERVER", "smtp.gmail.com")]).unwrap().smtp.is_none());
        let cfg = load(&[
            ("SMTP_SERVER", "smtp.gmail.com"),
            ("SENDER_EMAIL", "fresh@example.com"),
            ("SMTP_USERNAME", "fresh"),
        ])
        .unwrap();
        let smtp = cfg.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.username, "fresh");
        assert_eq!(smtp.password, "");
    }

    #[test]
    fn blank_key_is_unset() {
        let cfg = load(&[("SERVER_API_KEY", "  ")]).unwrap();
        assert_eq!(cfg.gemini_api_key, None);
    }

    #[test]
    fn invalid_values_fail_fast() {
        assert!(load(&[("APP_PORT", "eighty")]).is_err());
        assert!(load(&[("NUTRITION_REPORT_CRON", "at eight")]).is_err());
    }
}

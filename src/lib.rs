//! Fresh Eye backend: nutrition-label analysis, food freshness
//! classification, storage-room telemetry and email reports.

pub mod app;
pub mod config;
pub mod error;
pub mod llm;
pub mod nutrition;
pub mod reports;
pub mod spoilage;
pub mod state;
pub mod storage;
pub mod telemetry;

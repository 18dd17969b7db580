//! Logging Infrastructure
//!
//! Structured logging setup for development and production.
//! - Console output (pretty in development, JSON in production)
//! - Daily rotating application logs (deleted after 14 days)
//! - Permanent billing logs: every bill state change, logged with `target: "billing"`

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, prelude::*};

/// Application log retention
const APP_LOG_RETENTION_DAYS: i64 = 14;

/// Target used by the ledger for bill state changes
pub const BILLING_TARGET: &str = "billing";

/// Clean up application log files older than 14 days
///
/// Billing logs are never deleted.
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(APP_LOG_RETENTION_DAYS);

    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // RollingFileAppender names files `app.YYYY-MM-DD`
        if let Some(date_part) = name.strip_prefix("app.")
            && let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }

    Ok(())
}

/// Initialize the logging system
///
/// # Arguments
/// * `level` - EnvFilter directive (e.g. "info", "bill_server=debug")
/// * `json_format` - JSON console output (production)
/// * `log_dir` - Optional directory for file logging
///
/// `RUST_LOG` overrides `level` when set.
pub fn init_logger(level: &str, json_format: bool, log_dir: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    let Some(dir) = log_dir else {
        registry.try_init()?;
        return Ok(());
    };

    let log_dir = Path::new(dir);
    let app_log_dir = log_dir.join("app");
    let billing_log_dir = log_dir.join("billing");
    fs::create_dir_all(&app_log_dir)?;
    fs::create_dir_all(&billing_log_dir)?;

    // Application logs: everything except the billing trail
    let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
    let app_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true)
        .with_writer(std::sync::Mutex::new(app_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() != BILLING_TARGET
        }));

    // Billing trail (never deleted)
    let billing_log = RollingFileAppender::new(Rotation::DAILY, billing_log_dir, "billing");
    let billing_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_writer(std::sync::Mutex::new(billing_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() == BILLING_TARGET
        }));

    registry.with(app_layer).with(billing_layer).try_init()?;

    cleanup_old_logs(log_dir)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_removes_only_old_app_logs() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        fs::create_dir_all(&app).unwrap();

        let old = chrono::Local::now().date_naive() - chrono::Duration::days(30);
        let today = chrono::Local::now().date_naive();
        let old_file = app.join(format!("app.{}", old.format("%Y-%m-%d")));
        let new_file = app.join(format!("app.{}", today.format("%Y-%m-%d")));
        let other = app.join("notes.txt");
        for f in [&old_file, &new_file, &other] {
            fs::write(f, b"x").unwrap();
        }

        cleanup_old_logs(dir.path()).unwrap();

        assert!(!old_file.exists());
        assert!(new_file.exists());
        assert!(other.exists());
    }
}

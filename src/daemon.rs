//! Repeated runs on a fixed interval, without a system scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use crate::app::AppContext;
use crate::notifier::new_run_id;

const MAX_INTERVAL_SECS: u64 = 366 * 86400;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Interval between runs in seconds (default: 86400 = 1 day)
    pub interval_secs: u64,
    /// Whether to run immediately on start
    pub run_on_start: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            interval_secs: 86400,
            run_on_start: true,
        }
    }
}

impl DaemonConfig {
    /// Parse interval string like "1h", "30m", "6h", "1d"
    pub fn parse_interval(s: &str) -> Result<u64, String> {
        let s = s.trim().to_lowercase();

        let scaled = |value: &str, unit: u64, name: &str| -> Result<u64, String> {
            value
                .parse::<u64>()
                .map_err(|_| format!("Invalid {}: {}", name, value))?
                .checked_mul(unit)
                .ok_or_else(|| format!("Interval too large: {} {}", value, name))
        };

        let secs = if let Some(hours) = s.strip_suffix('h') {
            scaled(hours, 3600, "hours")
        } else if let Some(minutes) = s.strip_suffix('m') {
            scaled(minutes, 60, "minutes")
        } else if let Some(days) = s.strip_suffix('d') {
            scaled(days, 86400, "days")
        } else if let Some(secs) = s.strip_suffix('s') {
            scaled(secs, 1, "seconds")
        } else {
            s.parse::<u64>()
                .map_err(|_| format!("Invalid interval: {}. Use format like '1d', '12h', '30m'", s))
        }?;

        if secs == 0 {
            return Err("Interval must be greater than zero".to_string());
        }
        if secs > MAX_INTERVAL_SECS {
            return Err(format!(
                "Interval too large: at most {}",
                Self::format_interval(MAX_INTERVAL_SECS)
            ));
        }
        Ok(secs)
    }

    /// Format interval for display
    pub fn format_interval(secs: u64) -> String {
        if secs >= 86400 && secs % 86400 == 0 {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

pub struct Daemon {
    ctx: Arc<AppContext>,
    config: DaemonConfig,
}

impl Daemon {
    pub fn new(ctx: Arc<AppContext>, config: DaemonConfig) -> Self {
        Self { ctx, config }
    }

    /// Run until SIGINT/SIGTERM. A run in progress finishes before exit.
    pub async fn run(&self) -> crate::app::Result<()> {
        tracing::info!(
            "Daemon started (interval: {}, PID: {})",
            DaemonConfig::format_interval(self.config.interval_secs),
            std::process::id()
        );

        let mut timer = interval(Duration::from_secs(self.config.interval_secs));
        if !self.config.run_on_start {
            timer.tick().await;
        }

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let outcome = self.ctx.pipeline.run(&new_run_id()).await;
                    if outcome.has_failures() {
                        tracing::warn!("Run {} finished with failures", outcome.run_id);
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        tracing::info!("Daemon shutting down");
        Ok(())
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
        }
        _ => {
            tracing::warn!("Failed to install signal handlers, falling back to Ctrl-C");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(DaemonConfig::parse_interval("1h").unwrap(), 3600);
        assert_eq!(DaemonConfig::parse_interval("30m").unwrap(), 1800);
        assert_eq!(DaemonConfig::parse_interval("1d").unwrap(), 86400);
        assert_eq!(DaemonConfig::parse_interval("60s").unwrap(), 60);
        assert_eq!(DaemonConfig::parse_interval("3600").unwrap(), 3600);
        assert_eq!(DaemonConfig::parse_interval(" 12H ").unwrap(), 43200);
        assert!(DaemonConfig::parse_interval("invalid").is_err());
        assert!(DaemonConfig::parse_interval("0h").is_err());
    }

    #[test]
    fn test_parse_interval_overflow() {
        assert!(DaemonConfig::parse_interval("999999999999999999d").is_err());
        assert!(DaemonConfig::parse_interval("99999999999999999999s").is_err());
        assert!(DaemonConfig::parse_interval("18446744073709551615s").is_err());
        assert!(DaemonConfig::parse_interval("367d").is_err());
        assert_eq!(DaemonConfig::parse_interval("366d").unwrap(), 366 * 86400);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(DaemonConfig::format_interval(3600), "1h");
        assert_eq!(DaemonConfig::format_interval(1800), "30m");
        assert_eq!(DaemonConfig::format_interval(86400), "1d");
        assert_eq!(DaemonConfig::format_interval(90), "90s");
        assert_eq!(DaemonConfig::format_interval(7200), "2h");
    }
}

use crate::error::ConfigError;
use chrono::Weekday;
use serde::Deserialize;
use std::net::SocketAddr;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub mail: MailConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the PostgreSQL pool.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Settings for the HTTP surface.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Header carrying the username authenticated by the upstream gateway.
    pub identity_header: String,
}

/// The single account allowed to request the all-users report.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub super_admin: String,
}

/// The outbound channel. One relay, one sender, one fixed recipient.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Use implicit TLS (SMTPS). When false the connection is upgraded with STARTTLS.
    #[serde(default = "default_true")]
    pub implicit_tls: bool,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub recipient: String,
}

/// Content and window of the generated report.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Length of the trailing window, in days.
    pub window_days: i64,
    pub attachment_name: String,
    pub title: String,
    pub currency: String,
}

/// When the recurring all-users report fires, in the process's local time zone.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    /// Directory for the daily rolling log file. No file is written when unset.
    pub directory: Option<String>,
    pub file_prefix: String,
}

// --- Default Implementations ---
// These allow a deployment to omit whole sections from config.toml.

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_smtp_port() -> u16 {
    465
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            identity_header: "x-authenticated-user".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            attachment_name: "Consolidated_Report.pdf".to_string(),
            title: "CPA PRO - CONSOLIDATED REPORT".to_string(),
            currency: "R$".to_string(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            weekday: Weekday::Mon,
            hour: 9,
            minute: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "cpa-manager.log".to_string(),
        }
    }
}

impl Config {
    /// Checks the values serde cannot: ranges and required non-empty strings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.hour > 23 {
            return Err(ConfigError::ValidationError(format!(
                "schedule.hour must be between 0 and 23, got {}",
                self.schedule.hour
            )));
        }
        if self.schedule.minute > 59 {
            return Err(ConfigError::ValidationError(format!(
                "schedule.minute must be between 0 and 59, got {}",
                self.schedule.minute
            )));
        }
        if self.report.window_days <= 0 {
            return Err(ConfigError::ValidationError(
                "report.window_days must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("mail.sender", &self.mail.sender),
            ("mail.recipient", &self.mail.recipient),
            ("mail.smtp_host", &self.mail.smtp_host),
            ("admin.super_admin", &self.admin.super_admin),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

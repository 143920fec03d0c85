//! Runtime configuration read from `TASKDECK_*` environment variables

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::Error;

pub const DEFAULT_DATA_DIR: &str = ".taskdeck-data";
pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_SIGN_LANGUAGE_WIDGET_URL: &str = "https://vlibras.gov.br/app/vlibras-plugin.js";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_BOARD_IDLE_MS: u64 = 10 * 60 * 1000;
const DEFAULT_MAX_BOARDS: usize = 1024;

/// Where task documents live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    File,
    Memory,
    Http,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "http" => Ok(Self::Http),
            other => Err(Error::validation(
                "TASKDECK_BACKEND",
                format!("unknown backend '{}'", other),
            )),
        }
    }
}

/// Third-party sign-language widget. Only its presence matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignLanguageWidget {
    pub enabled: bool,
    pub script_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: BackendKind,
    pub backend_url: Option<String>,
    pub backend_token: Option<String>,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    /// Kanban boards unused for this long lose their live subscription
    pub board_idle_timeout: Duration,
    /// Upper bound on boards kept in memory at once
    pub max_boards: usize,
    pub sign_language_widget: SignLanguageWidget,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend = match lookup("TASKDECK_BACKEND") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, using the file backend", e);
                BackendKind::File
            }),
            None => BackendKind::File,
        };

        Self {
            data_dir: lookup("TASKDECK_DATA_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            backend,
            backend_url: non_empty(lookup("TASKDECK_BACKEND_URL")),
            backend_token: non_empty(lookup("TASKDECK_BACKEND_TOKEN")),
            request_timeout: env_millis(
                &lookup,
                "TASKDECK_REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            ),
            poll_interval: env_millis(&lookup, "TASKDECK_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
            board_idle_timeout: env_millis(&lookup, "TASKDECK_BOARD_IDLE_MS", DEFAULT_BOARD_IDLE_MS),
            max_boards: match env_number(&lookup, "TASKDECK_MAX_BOARDS", DEFAULT_MAX_BOARDS) {
                0 => {
                    warn!("TASKDECK_MAX_BOARDS must be positive, using {}", DEFAULT_MAX_BOARDS);
                    DEFAULT_MAX_BOARDS
                }
                n => n,
            },
            sign_language_widget: SignLanguageWidget {
                enabled: env_flag(&lookup, "TASKDECK_SIGN_LANGUAGE_WIDGET", true),
                script_url: non_empty(lookup("TASKDECK_SIGN_LANGUAGE_WIDGET_URL"))
                    .unwrap_or_else(|| DEFAULT_SIGN_LANGUAGE_WIDGET_URL.to_string()),
            },
            port: env_number(&lookup, "TASKDECK_PORT", DEFAULT_PORT),
        }
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir.join("tasks.json")
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: bool) -> bool {
    match lookup(name) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        None => default,
    }
}

fn env_number<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}='{}', using {}", name, raw, default);
            default
        }),
        None => default,
    }
}

/// A positive number of milliseconds; zero falls back to `default_ms`
fn env_millis(lookup: &impl Fn(&str) -> Option<String>, name: &str, default_ms: u64) -> Duration {
    match env_number(lookup, name, default_ms) {
        0 => {
            warn!("{} must be positive, using {}", name, default_ms);
            Duration::from_millis(default_ms)
        }
        ms => Duration::from_millis(ms),
    }
}

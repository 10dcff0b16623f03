use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::logger::LogLevel;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub function: FunctionConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub host: HostConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Companion backend function. The remote-call widget only exists when
/// `name` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionConfig {
    pub name: Option<String>,
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSourceKind {
    /// Replay a WAV file as if it were a microphone
    File,
    /// Default input device (requires the `microphone` feature)
    Microphone,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_capture_source")]
    pub source: CaptureSourceKind,
    #[serde(default = "default_capture_file")]
    pub file_path: PathBuf,
    /// Frame size delivered by the device, in milliseconds
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    /// Recorder fragment interval, in milliseconds
    #[serde(default = "default_timeslice_ms")]
    pub timeslice_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

/// Settings for the standalone host used outside Teams
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    pub access_token: Option<String>,
    #[serde(default = "default_true")]
    pub media_api: bool,
}

fn default_service_name() -> String {
    "teams-audio-tab".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    53000
}

fn default_api_endpoint() -> String {
    "http://localhost:7071".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_capture_source() -> CaptureSourceKind {
    if cfg!(feature = "microphone") {
        CaptureSourceKind::Microphone
    } else {
        CaptureSourceKind::File
    }
}

fn default_capture_file() -> PathBuf {
    PathBuf::from("assets/microphone.wav")
}

fn default_frame_ms() -> u64 {
    100
}

fn default_timeslice_ms() -> u64 {
    1000
}

fn default_log_level() -> LogLevel {
    LogLevel::Debug
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_locale() -> String {
    "en-us".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            name: None,
            api_endpoint: default_api_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: default_capture_source(),
            file_path: default_capture_file(),
            frame_ms: default_frame_ms(),
            timeslice_ms: default_timeslice_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            locale: default_locale(),
            access_token: None,
            media_api: true,
        }
    }
}

impl Config {
    /// Load from `path` (any format `config` understands, extension optional)
    /// layered with `TEAMS_TAB__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TEAMS_TAB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Whether the remote-call widget is shown
    pub fn show_function(&self) -> bool {
        self.function
            .name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            function: FunctionConfig::default(),
            capture: CaptureConfig::default(),
            logging: LoggingConfig::default(),
            host: HostConfig::default(),
        }
    }
}

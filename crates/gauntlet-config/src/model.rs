// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Gauntlet quiz runner.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Gauntlet configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GauntletConfig {
    /// Process-wide runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Stage engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// API rate-limit ceilings.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Reasoning backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Process-wide runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Stage engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Hard time budget per stage, in seconds.
    #[serde(default = "default_stage_deadline_secs")]
    pub stage_deadline_secs: u64,

    /// Maximum backend attempts per stage.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stage_deadline_secs: default_stage_deadline_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_stage_deadline_secs() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

/// API rate-limit ceilings, matching the backend's published quota.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Requests per minute.
    #[serde(default = "default_rpm")]
    pub rpm: u32,

    /// Tokens per minute.
    #[serde(default = "default_tpm")]
    pub tpm: u64,

    /// Requests per day.
    #[serde(default = "default_rpd")]
    pub rpd: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rpm: default_rpm(),
            tpm: default_tpm(),
            rpd: default_rpd(),
        }
    }
}

fn default_rpm() -> u32 {
    10
}

fn default_tpm() -> u64 {
    1_000_000
}

fn default_rpd() -> u32 {
    1500
}

/// Which reasoning backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The Gemini generateContent API.
    Gemini,
    /// In-process mock backend for test runs.
    Mock,
}

/// Reasoning backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Backend selection; `mock` enables deterministic test runs.
    #[serde(default = "default_backend_kind")]
    pub kind: BackendKind,

    /// API key. `None` falls back to the `GEMINI_API_KEY` environment
    /// variable at startup.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default model for backend requests.
    #[serde(default = "default_model")]
    pub model: String,

    /// Cheaper model used for text-only stages under deadline pressure.
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            api_key: None,
            model: default_model(),
            fast_model: default_fast_model(),
        }
    }
}

fn default_backend_kind() -> BackendKind {
    BackendKind::Gemini
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_fast_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret expected in run requests. `None` rejects all run
    /// requests (fail-closed).
    #[serde(default)]
    pub shared_secret: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shared_secret: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

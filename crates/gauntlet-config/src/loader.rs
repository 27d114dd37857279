// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./gauntlet.toml` > `~/.config/gauntlet/gauntlet.toml`
//! > `/etc/gauntlet/gauntlet.toml` with environment variable overrides via
//! `GAUNTLET_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::GauntletConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/gauntlet/gauntlet.toml` (system-wide)
/// 3. `~/.config/gauntlet/gauntlet.toml` (user XDG config)
/// 4. `./gauntlet.toml` (local directory)
/// 5. `GAUNTLET_*` environment variables
pub fn load_config() -> Result<GauntletConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GauntletConfig::default()))
        .merge(Toml::file("/etc/gauntlet/gauntlet.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("gauntlet/gauntlet.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("gauntlet.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<GauntletConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GauntletConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GauntletConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GauntletConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `GAUNTLET_GATEWAY_SHARED_SECRET` must map
/// to `gateway.shared_secret`, not `gateway.shared.secret`.
fn env_provider() -> Env {
    Env::prefixed("GAUNTLET_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: GAUNTLET_BACKEND_API_KEY -> "backend_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("runner_", "runner.", 1)
            .replacen("engine_", "engine.", 1)
            .replacen("limits_", "limits.", 1)
            .replacen("backend_", "backend.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}

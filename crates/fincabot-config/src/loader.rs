// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./fincabot.toml` > `~/.config/fincabot/fincabot.toml`
//! > `/etc/fincabot/fincabot.toml`, with environment variable overrides via the
//! `FINCABOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FincabotConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/fincabot/fincabot.toml` (system-wide)
/// 3. `~/.config/fincabot/fincabot.toml` (user XDG config)
/// 4. `./fincabot.toml` (local directory)
/// 5. `FINCABOT_*` environment variables
pub fn load_config() -> Result<FincabotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FincabotConfig::default()))
        .merge(Toml::file("/etc/fincabot/fincabot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("fincabot/fincabot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("fincabot.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit inline configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FincabotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FincabotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FincabotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FincabotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that keys containing
/// underscores stay intact: `FINCABOT_YCLOUD_WABA_NUMBER` must map to
/// `ycloud.waba_number`, not `ycloud.waba.number`.
fn env_provider() -> Env {
    Env::prefixed("FINCABOT_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("ycloud_", "ycloud.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}

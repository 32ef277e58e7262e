// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup rather than silently ignoring typos.

use serde::{Deserialize, Serialize};

/// Top-level Fincabot configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; secrets (API keys) have no defaults and are normally injected
/// through the environment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FincabotConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// OpenAI text-generation settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// YCloud WhatsApp transport settings.
    #[serde(default)]
    pub ycloud: YCloudConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "fincabot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "fincabot.db".to_string()
}

/// OpenAI Chat Completions configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. Usually set via `FINCABOT_OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the Chat Completions endpoint.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model identifier for both replies and intent classification.
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Maximum completion tokens for free-form replies.
    #[serde(default = "default_openai_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            max_tokens: default_openai_max_tokens(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_max_tokens() -> u32 {
    1024
}

/// YCloud WhatsApp transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct YCloudConfig {
    /// API key. Usually set via `FINCABOT_YCLOUD_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// E.164 number of the business WhatsApp account (the `from` field).
    #[serde(default)]
    pub waba_number: Option<String>,

    /// Base URL of the YCloud WhatsApp API.
    #[serde(default = "default_ycloud_base_url")]
    pub base_url: String,
}

impl Default for YCloudConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            waba_number: None,
            base_url: default_ycloud_base_url(),
        }
    }
}

fn default_ycloud_base_url() -> String {
    "https://api.ycloud.com/v2".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

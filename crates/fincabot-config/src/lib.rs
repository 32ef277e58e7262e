// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered TOML configuration for the Fincabot agent.
//!
//! Config files merge in XDG order with `FINCABOT_*` environment variable
//! overrides on top. Unknown keys are rejected at load time.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::FincabotConfig;

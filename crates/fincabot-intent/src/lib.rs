// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification for inbound customer messages.
//!
//! The primary path asks the text-generation provider for a single JSON
//! object and parses it defensively ([`classifier`]); the deterministic
//! fallback path ([`patterns`]) matches Spanish phrases with regexes. A
//! single message never mixes both: the patterns run only when the
//! classifier is unavailable or returns [`Intent::None`].

pub mod classifier;
pub mod dates;
pub mod patterns;

pub use classifier::{Intent, IntentClassifier};

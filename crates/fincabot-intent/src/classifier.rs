// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-backed intent classification with a strict parse boundary.
//!
//! The provider is instructed to answer with exactly one JSON object in one
//! of four shapes. The response is parsed defensively: code fences are
//! stripped, field types are validated, and anything that does not survive
//! validation maps to [`Intent::None`] so the caller can fall back to the
//! deterministic patterns. Parse failures never propagate as errors.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use fincabot_core::TextGenerator;
use tracing::warn;

/// The classified purpose of an inbound message, for catalog dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// No catalog-relevant intent.
    None,
    /// The customer wants to see one listing by name.
    SingleListing { name: String },
    /// The customer asks for other options than the ones already sent.
    MoreOptions,
    /// A search by location, with optional dates, capacity, and price hints.
    Search {
        location: String,
        has_weekend: bool,
        day_start: Option<u32>,
        day_end: Option<u32>,
        min_capacity: Option<i64>,
        sort_by_price: bool,
    },
}

/// Classifier backed by the constrained text-generation call.
pub struct IntentClassifier {
    generator: Arc<dyn TextGenerator>,
}

impl IntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Classify one customer message.
    ///
    /// Returns [`Intent::None`] on any provider or parse failure; never
    /// errors.
    pub async fn classify(&self, message: &str, now: DateTime<Utc>) -> Intent {
        let prompt = classifier_prompt(now);
        match self.generator.classify(&prompt, message).await {
            Ok(raw) => parse_intent(&raw),
            Err(e) => {
                warn!(error = %e, "intent classification call failed, falling back");
                Intent::None
            }
        }
    }
}

/// The closed instruction set for the classification call.
fn classifier_prompt(now: DateTime<Utc>) -> String {
    let month = now.month();
    let year = now.year();
    format!(
        r#"Eres un clasificador. Del mensaje del usuario extrae la intención y datos. Responde SOLO con un JSON válido, sin markdown, sin explicación.

Reglas:
- intent: "single_finca" si pide VER una finca por nombre (ej. "quiero ver villa green", "mostrar la finca X"). En fincaName pon solo el nombre de la finca en minúsculas, sin "finca" ni "la".
- intent: "more_options" si pide otras opciones, más opciones, no le gustan, envía más, otras fincas, dame otras.
- intent: "search_catalog" si pide buscar fincas en una UBICACIÓN y tiene fechas o "fin de semana". Extrae: location (solo nombre del lugar, minúsculas, sin emojis), hasWeekend (true si dice fin de semana / este fin / próximo fin), dateD1 y dateD2 (números del 1 al 31 si dice "del X al Y"), minCapacity (número si dice "X personas" o "X o más personas"), sortByPrice (true si dice buen precio, económico, barato).
- intent: "none" si no aplica ninguna de las anteriores.

Ejemplos de salida:
{{"intent":"single_finca","fincaName":"villa green"}}
{{"intent":"more_options"}}
{{"intent":"search_catalog","location":"melgar","hasWeekend":true,"minCapacity":5,"sortByPrice":true}}
{{"intent":"search_catalog","location":"restrepo","dateD1":20,"dateD2":21,"minCapacity":10}}
{{"intent":"none"}}

Mes actual: {month}, año: {year}."#
    )
}

/// Strip a wrapping Markdown code fence, if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Keep letters (with Spanish accents), digits, and spaces.
fn clean_location(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the classifier's raw output into an [`Intent`].
///
/// Invalid or partial JSON maps to [`Intent::None`] rather than erroring,
/// preserving the fallback contract.
pub fn parse_intent(raw: &str) -> Intent {
    let cleaned = strip_code_fence(raw);
    let Ok(value) = serde_json::from_str::<serde_json::Value>(cleaned) else {
        return Intent::None;
    };
    let Some(intent) = value.get("intent").and_then(|v| v.as_str()) else {
        return Intent::None;
    };

    match intent {
        "single_finca" => {
            let name = value
                .get("fincaName")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .unwrap_or_default();
            if name.is_empty() {
                Intent::None
            } else {
                Intent::SingleListing {
                    name: name.to_string(),
                }
            }
        }
        "more_options" => Intent::MoreOptions,
        "search_catalog" => {
            let location = value
                .get("location")
                .and_then(|v| v.as_str())
                .map(clean_location)
                .unwrap_or_default();
            if location.len() < 2 {
                return Intent::None;
            }
            let day = |key: &str| {
                value
                    .get(key)
                    .and_then(|v| v.as_u64())
                    .and_then(|d| u32::try_from(d).ok())
            };
            Intent::Search {
                location,
                has_weekend: value.get("hasWeekend").and_then(|v| v.as_bool()) == Some(true),
                day_start: day("dateD1"),
                day_end: day("dateD2"),
                min_capacity: value.get("minCapacity").and_then(|v| v.as_i64()),
                sort_by_price: value.get("sortByPrice").and_then(|v| v.as_bool()) == Some(true),
            }
        }
        _ => Intent::None,
    }
}

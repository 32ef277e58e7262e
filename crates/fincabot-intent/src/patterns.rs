// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic Spanish phrase parsing.
//!
//! The fallback when the classifier is unavailable or returns nothing:
//! "quiero ver <finca>", "<ubicación> del D al D", weekend searches, and
//! "otras opciones". All matching is over the lowercased message.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use fincabot_core::SearchFilters;
use regex::Regex;

use crate::dates;

static SINGLE_LISTING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?:quiero\s+)?(?:ver|mostrar)\s+(?:la\s+)?(?:finca\s+)?(?:de\s+)?([a-záéíóúñ0-9\s#]+)")
            .expect("static regex"),
        Regex::new(r"(?:la\s+)?finca\s+(?:de\s+)?([a-záéíóúñ0-9\s#]+)").expect("static regex"),
        Regex::new(r"(?:ver|mostrar)\s+([a-záéíóúñ0-9\s#]+)").expect("static regex"),
    ]
});

static ARTICLE_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(la|el|de|una?)$").expect("static regex"));

static LOCATION_BEFORE_DATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:para|en)\s+([a-záéíóúñ\s]+?)(?:\s+del\s|\s+para\s|\s+\d|$)")
        .expect("static regex")
});

static DAY_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:del\s+)?(\d{1,2})\s*al\s*(\d{1,2})").expect("static regex"));

static WEEKEND_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(fin\s+de\s+semana|este\s+fin|próximo\s+fin|el\s+fin\s+de\s+semana)\b")
        .expect("static regex")
});

static LOCATION_IN_SEARCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:buscando\s+)?en\s+(.+?)(?:\s+una|\s+finca|,|\s+para\s+\d|$)")
        .expect("static regex")
});

static LOCATION_IN_SEARCH_ALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:para|en)\s+(.+?)(?:\s+una|\s+finca|,|\s+grupo|$)").expect("static regex")
});

static CAPACITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:o\s+m[aá]s\s+)?personas").expect("static regex"));

static PRICE_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(buen\s+precio|económico|económicas|barato|barata)\b").expect("static regex")
});

static MORE_OPTIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(otras\s+opciones|más\s+opciones|no\s+me\s+gustan|envía\s+más|otras\s+fincas|dame\s+otras|quiero\s+ver\s+otras)\b",
    )
    .expect("static regex")
});

static MORE_OPTIONS_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(otras|más|más\s+opciones)$").expect("static regex"));

/// Strip everything but letters (including Spanish accents), digits, and
/// whitespace, then collapse runs of spaces.
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

/// "quiero ver villa green" → `Some("villa green")`.
pub fn parse_single_listing_request(message: &str) -> Option<String> {
    let msg = message.trim().to_lowercase();
    if msg.len() < 4 {
        return None;
    }
    for pattern in SINGLE_LISTING_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(&msg) {
            let term = captures.get(1).map(|m| m.as_str().trim())?;
            if term.len() >= 2 && !ARTICLE_ONLY.is_match(term) {
                return Some(term.to_string());
            }
        }
    }
    None
}

/// "para restrepo del 20 al 21 para 10 personas" → filters with an explicit
/// day pair. Requires both a location and two day numbers.
pub fn parse_location_and_dates(message: &str, now: DateTime<Utc>) -> Option<SearchFilters> {
    let msg = message.trim().to_lowercase();

    let location = LOCATION_BEFORE_DATES
        .captures(&msg)
        .and_then(|c| c.get(1))
        .map(|m| clean_location(m.as_str()))?;
    let days = DAY_PAIR.captures(&msg)?;
    if location.is_empty() {
        return None;
    }

    let day_start: u32 = days.get(1)?.as_str().parse().ok()?;
    let day_end: u32 = days.get(2)?.as_str().parse().ok()?;
    let (starts_at, ends_at) = dates::day_pair_range(now, day_start, day_end)?;

    Some(SearchFilters {
        location,
        starts_at,
        ends_at,
        min_capacity: parse_capacity(&msg),
        sort_by_price: PRICE_HINT.is_match(&msg),
    })
}

/// Weekend search: "Estoy buscando en Melgar una finca para 12 personas este
/// fin de semana con buen precio". Requires a weekend phrase and a location;
/// dates resolve to the next weekend.
pub fn parse_weekend_filters(message: &str, now: DateTime<Utc>) -> Option<SearchFilters> {
    let msg = message
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if !WEEKEND_PHRASE.is_match(&msg) {
        return None;
    }

    let raw_location = LOCATION_IN_SEARCH
        .captures(&msg)
        .or_else(|| LOCATION_IN_SEARCH_ALT.captures(&msg))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())?;
    let location = clean_location(raw_location);
    if location.len() < 2 {
        return None;
    }

    let (starts_at, ends_at) = dates::next_weekend(now);
    Some(SearchFilters {
        location,
        starts_at,
        ends_at,
        min_capacity: parse_capacity(&msg),
        sort_by_price: PRICE_HINT.is_match(&msg),
    })
}

/// "otras opciones", "dame otras", bare "más" …
pub fn detect_more_options(message: &str) -> bool {
    let msg = message.trim().to_lowercase();
    MORE_OPTIONS.is_match(&msg) || MORE_OPTIONS_BARE.is_match(&msg)
}

fn parse_capacity(msg: &str) -> Option<i64> {
    CAPACITY
        .captures(msg)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // Wednesday 2026-03-11.
        Utc.with_ymd_and_hms(2026, 3, 11, 10, 0, 0).unwrap()
    }

    #[test]
    fn single_listing_request_extracts_name() {
        assert_eq!(
            parse_single_listing_request("quiero ver villa green").as_deref(),
            Some("villa green")
        );
        assert_eq!(
            parse_single_listing_request("Mostrar la finca de Quinta Tramontini").as_deref(),
            Some("quinta tramontini")
        );
        assert_eq!(parse_single_listing_request("ok"), None);
        assert_eq!(parse_single_listing_request("quiero ver la"), None);
    }

    #[test]
    fn explicit_dates_with_location() {
        let filters =
            parse_location_and_dates("para restrepo del 20 al 21 para 10 personas", now())
                .unwrap();
        assert_eq!(filters.location, "restrepo");
        assert_eq!(filters.min_capacity, Some(10));
        assert!(!filters.sort_by_price);

        // Check-in the 20th at 00:00; the exclusive end is 00:00 the day
        // after the named check-out day.
        let span_ms = filters.ends_at - filters.starts_at;
        assert_eq!(span_ms, 2 * 24 * 60 * 60 * 1000);
    }

    #[test]
    fn dates_without_location_are_no_signal() {
        assert!(parse_location_and_dates("del 20 al 21", now()).is_none());
        assert!(parse_location_and_dates("para melgar este fin", now()).is_none());
    }

    #[test]
    fn weekend_search_extracts_everything() {
        let filters = parse_weekend_filters(
            "Estoy buscando en Melgar una finca para 12 personas este fin de semana con buen precio",
            now(),
        )
        .unwrap();
        assert_eq!(filters.location, "melgar");
        assert_eq!(filters.min_capacity, Some(12));
        assert!(filters.sort_by_price);

        let (sat, mon) = crate::dates::next_weekend(now());
        assert_eq!(filters.starts_at, sat);
        assert_eq!(filters.ends_at, mon);
    }

    #[test]
    fn weekend_search_without_weekend_phrase_is_none() {
        assert!(
            parse_weekend_filters("estoy buscando en melgar una finca para 12 personas", now())
                .is_none()
        );
    }

    #[test]
    fn location_with_emoji_decoration_is_cleaned() {
        let filters =
            parse_weekend_filters("buscando en ✨melgar✨ una finca este fin de semana", now())
                .unwrap();
        assert_eq!(filters.location, "melgar");
    }

    #[test]
    fn more_options_phrases() {
        assert!(detect_more_options("otras opciones"));
        assert!(detect_more_options("no me gustan, dame otras"));
        assert!(detect_more_options("más"));
        assert!(detect_more_options("Quiero ver otras fincas"));
        assert!(!detect_more_options("quiero ver villa green"));
        assert!(!detect_more_options("hola"));
    }
}

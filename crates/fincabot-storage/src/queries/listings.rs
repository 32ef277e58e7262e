// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing queries: free-text search and date-aware availability.
//!
//! Listings are read-mostly from the agent's perspective; the insert helpers
//! exist for the external listing sync and for tests. The catalog is small
//! (tens to low hundreds of rows), so matching and ranking happen in memory
//! after a single table scan.

use std::collections::HashSet;

use fincabot_core::FincabotError;
use rusqlite::{params, Row};

use crate::database::Database;
use crate::models::{Booking, Listing, ListingCard, SearchFilters};

/// Words that carry no search signal in customer messages.
const SEARCH_STOPWORDS: &[&str] = &[
    "estoy", "buscando", "en", "una", "para", "el", "la", "los", "las", "que", "más", "mas",
    "personas", "grupo", "amigos", "dame", "buen", "precio", "este", "fin", "de", "semana",
    "viene", "o", "y", "con", "del", "al", "por", "necesito", "quiero", "ver", "opciones", "me",
    "gusta", "gustan",
];

fn row_to_listing(row: &Row<'_>) -> rusqlite::Result<Listing> {
    Ok(Listing {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        capacity: row.get(4)?,
        base_price: row.get(5)?,
        visible: row.get(6)?,
        reservable: row.get(7)?,
    })
}

const LISTING_COLUMNS: &str =
    "id, title, description, location, capacity, base_price, visible, reservable";

/// Extract search terms from a free-text customer message.
///
/// Lowercases, strips punctuation, and drops stopwords so a long message like
/// "Estoy buscando en Melgar una finca para 5 personas" matches on "melgar".
fn extract_terms(query: &str) -> Vec<String> {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || "áéíóúñ".contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    let words: Vec<String> = cleaned
        .split_whitespace()
        .filter(|w| w.len() >= 2 && !SEARCH_STOPWORDS.contains(w))
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        let fallback: String = cleaned.trim().chars().take(50).collect();
        vec![fallback]
    } else {
        words
    }
}

/// Free-text listing search ranked by how many terms match.
///
/// A listing matches a term when its title, description, or location contains
/// it (case-insensitive). Only visible listings are returned.
pub async fn search(
    db: &Database,
    query: &str,
    limit: usize,
) -> Result<Vec<Listing>, FincabotError> {
    let terms = extract_terms(query);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LISTING_COLUMNS} FROM listings WHERE visible = 1"
            ))?;
            let rows = stmt.query_map([], row_to_listing)?;

            let matches_term = |l: &Listing, term: &str| {
                l.title.to_lowercase().contains(term)
                    || l.description.to_lowercase().contains(term)
                    || l.location.to_lowercase().contains(term)
            };

            let mut scored: Vec<(usize, Listing)> = Vec::new();
            for row in rows {
                let listing = row?;
                let hits = terms.iter().filter(|t| matches_term(&listing, t)).count();
                if hits > 0 {
                    scored.push((hits, listing));
                }
            }
            scored.sort_by(|a, b| b.0.cmp(&a.0));
            Ok(scored.into_iter().map(|(_, l)| l).take(limit).collect())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Listings available for a location and date range, for a catalog send.
///
/// A candidate must be visible, belong to at least one catalog, match the
/// location as a case-insensitive substring, meet the capacity floor when
/// given, not appear in `exclude`, and have no overlapping non-cancelled
/// booking (overlap: `existing.start < new.end AND existing.end > new.start`).
/// Optionally sorted by ascending base price; capped at `limit`.
pub async fn search_available(
    db: &Database,
    filters: &SearchFilters,
    exclude: &[String],
    limit: usize,
) -> Result<Vec<ListingCard>, FincabotError> {
    let location = filters.location.trim().to_lowercase();
    if location.is_empty() {
        return Ok(Vec::new());
    }
    let starts_at = filters.starts_at;
    let ends_at = filters.ends_at;
    let min_capacity = filters.min_capacity;
    let sort_by_price = filters.sort_by_price;
    let exclude: HashSet<String> = exclude.iter().cloned().collect();

    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LISTING_COLUMNS} FROM listings l WHERE l.visible = 1 \
                 AND EXISTS (SELECT 1 FROM catalog_links cl WHERE cl.listing_id = l.id) \
                 AND instr(lower(l.location), ?1) > 0"
            ))?;
            let rows = stmt.query_map(params![location], row_to_listing)?;

            let mut candidates = Vec::new();
            for row in rows {
                let listing = row?;
                if exclude.contains(&listing.id) {
                    continue;
                }
                if let Some(floor) = min_capacity {
                    if listing.capacity < floor {
                        continue;
                    }
                }
                candidates.push(listing);
            }

            let mut available = Vec::new();
            {
                let mut overlap_stmt = conn.prepare(
                    "SELECT COUNT(*) FROM bookings WHERE listing_id = ?1 \
                     AND status <> 'cancelled' AND starts_at < ?2 AND ends_at > ?3",
                )?;
                for listing in candidates {
                    let overlapping: i64 = overlap_stmt
                        .query_row(params![listing.id, ends_at, starts_at], |row| row.get(0))?;
                    if overlapping == 0 {
                        available.push(ListingCard {
                            id: listing.id,
                            title: listing.title,
                            base_price: listing.base_price,
                        });
                    }
                }
            }

            if sort_by_price {
                available.sort_by(|a, b| {
                    a.base_price
                        .unwrap_or(0.0)
                        .partial_cmp(&b.base_price.unwrap_or(0.0))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            available.truncate(limit);
            Ok(available)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a listing. Used by the external listing sync and by tests.
pub async fn insert(db: &Database, listing: &Listing) -> Result<(), FincabotError> {
    let listing = listing.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO listings (id, title, description, location, capacity, base_price, \
                 visible, reservable) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    listing.id,
                    listing.title,
                    listing.description,
                    listing.location,
                    listing.capacity,
                    listing.base_price,
                    listing.visible,
                    listing.reservable,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a booking. Used by the external booking sync and by tests.
pub async fn insert_booking(db: &Database, booking: &Booking) -> Result<(), FincabotError> {
    let booking = booking.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bookings (id, listing_id, starts_at, ends_at, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    booking.id,
                    booking.listing_id,
                    booking.starts_at,
                    booking.ends_at,
                    booking.status,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

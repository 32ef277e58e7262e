// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog membership and routing queries.

use fincabot_core::FincabotError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::Database;
use crate::models::Catalog;

fn row_to_catalog(row: &Row<'_>) -> rusqlite::Result<Catalog> {
    Ok(Catalog {
        id: row.get(0)?,
        name: row.get(1)?,
        external_id: row.get(2)?,
        location_keyword: row.get(3)?,
        is_default: row.get(4)?,
    })
}

const CATALOG_COLUMNS: &str = "id, name, external_id, location_keyword, is_default";

/// The catalog flagged as routing default, if any.
pub async fn get_default(db: &Database) -> Result<Option<Catalog>, FincabotError> {
    db.connection()
        .call(move |conn| {
            let catalog = conn
                .query_row(
                    &format!(
                        "SELECT {CATALOG_COLUMNS} FROM catalogs WHERE is_default = 1 LIMIT 1"
                    ),
                    [],
                    row_to_catalog,
                )
                .optional()?;
            Ok(catalog)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The first catalog whose location keyword appears in the requested
/// location (case-insensitive substring), if any.
pub async fn get_by_location_keyword(
    db: &Database,
    location: &str,
) -> Result<Option<Catalog>, FincabotError> {
    let location = location.trim().to_lowercase();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CATALOG_COLUMNS} FROM catalogs WHERE location_keyword IS NOT NULL"
            ))?;
            let rows = stmt.query_map([], row_to_catalog)?;
            for row in rows {
                let catalog = row?;
                if let Some(keyword) = &catalog.location_keyword {
                    if !keyword.is_empty() && location.contains(&keyword.to_lowercase()) {
                        return Ok(Some(catalog));
                    }
                }
            }
            Ok(None)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Resolve listing ids to provider product ids within one catalog.
///
/// Returns `(listing_id, product_retailer_id)` pairs, preserving the order of
/// `listing_ids` and silently dropping listings not linked to the catalog.
pub async fn product_ids_for_listings(
    db: &Database,
    catalog_id: &str,
    listing_ids: &[String],
) -> Result<Vec<(String, String)>, FincabotError> {
    let catalog_id = catalog_id.to_string();
    let listing_ids = listing_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT product_retailer_id FROM catalog_links \
                 WHERE catalog_id = ?1 AND listing_id = ?2",
            )?;
            let mut out = Vec::new();
            for listing_id in &listing_ids {
                let product: Option<String> = stmt
                    .query_row(params![catalog_id, listing_id], |row| row.get(0))
                    .optional()?;
                if let Some(product_id) = product {
                    out.push((listing_id.clone(), product_id));
                }
            }
            Ok(out)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Of the given listing ids, the ones present in at least one catalog.
pub async fn listings_in_any_catalog(
    db: &Database,
    listing_ids: &[String],
) -> Result<Vec<String>, FincabotError> {
    let listing_ids = listing_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT COUNT(*) FROM catalog_links WHERE listing_id = ?1",
            )?;
            let mut out = Vec::new();
            for listing_id in &listing_ids {
                let links: i64 = stmt.query_row(params![listing_id], |row| row.get(0))?;
                if links > 0 {
                    out.push(listing_id.clone());
                }
            }
            Ok(out)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a catalog. Used by the external catalog sync and by tests.
pub async fn insert(db: &Database, catalog: &Catalog) -> Result<(), FincabotError> {
    let catalog = catalog.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO catalogs (id, name, external_id, location_keyword, is_default) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    catalog.id,
                    catalog.name,
                    catalog.external_id,
                    catalog.location_keyword,
                    catalog.is_default,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Link a listing into a catalog under a provider product id.
pub async fn link_listing(
    db: &Database,
    catalog_id: &str,
    listing_id: &str,
    product_retailer_id: &str,
) -> Result<(), FincabotError> {
    let catalog_id = catalog_id.to_string();
    let listing_id = listing_id.to_string();
    let product_retailer_id = product_retailer_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO catalog_links (catalog_id, listing_id, product_retailer_id) \
                 VALUES (?1, ?2, ?3)",
                params![catalog_id, listing_id, product_retailer_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The catalog dispatcher.
//!
//! Filter selection precedence, first match wins:
//! 1. `more_options` intent with a remembered prior search
//! 2. `search` intent
//! 3. deterministic "otras opciones" phrase with a remembered prior search
//! 4. deterministic explicit-date parse, else weekend-phrase parse
//! 5. no signal: exit without sending or erroring
//!
//! Catalog routing prefers a location-keyword catalog, falling back to the
//! default; when the routed catalog resolves zero product ids, the default
//! catalog is tried once (a deliberate one-shot fallback, not a retry loop).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fincabot_core::{FincabotError, SearchFilters, WhatsAppTransport};
use fincabot_intent::patterns;
use fincabot_intent::{dates, Intent};
use fincabot_storage::queries::{catalogs, conversations, listings};
use fincabot_storage::Database;
use tracing::debug;

/// Maximum listings per catalog send.
const CATALOG_LIMIT: usize = 3;

const FIRST_SEND_BODY: &str = "Estas son 3 opciones de fincas disponibles para tus fechas:";
const MORE_OPTIONS_BODY: &str = "Aquí tienes más opciones con los mismos filtros:";

/// Outcome of a single-listing card send.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SingleSendOutcome {
    pub sent: bool,
    pub listing_title: Option<String>,
}

/// Selects listings and sends provider-native product messages.
pub struct CatalogDispatcher {
    db: Database,
    transport: Arc<dyn WhatsAppTransport>,
}

impl CatalogDispatcher {
    pub fn new(db: Database, transport: Arc<dyn WhatsAppTransport>) -> Self {
        Self { db, transport }
    }

    /// Send a single listing card when the customer asked to see one by name.
    ///
    /// `extracted_name` is the classifier's extraction; when absent, the
    /// deterministic "quiero ver <nombre>" parse runs on the raw message.
    /// Returns whether a card went out and, if so, the listing's title so the
    /// reply can stay short.
    pub async fn send_single_listing(
        &self,
        phone: &str,
        user_message: &str,
        extracted_name: Option<&str>,
        wamid: Option<&str>,
    ) -> Result<SingleSendOutcome, FincabotError> {
        let search_term = match extracted_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => match patterns::parse_single_listing_request(user_message) {
                Some(term) => term,
                None => return Ok(SingleSendOutcome::default()),
            },
        };

        let results = listings::search(&self.db, &search_term, 5).await?;
        if results.is_empty() {
            return Ok(SingleSendOutcome::default());
        }

        let result_ids: Vec<String> = results.iter().map(|l| l.id.clone()).collect();
        let in_catalog = catalogs::listings_in_any_catalog(&self.db, &result_ids).await?;
        let Some(chosen) = results.iter().find(|l| in_catalog.contains(&l.id)) else {
            return Ok(SingleSendOutcome::default());
        };

        let Some(catalog) = catalogs::get_default(&self.db).await? else {
            return Ok(SingleSendOutcome::default());
        };
        let entries =
            catalogs::product_ids_for_listings(&self.db, &catalog.id, &[chosen.id.clone()])
                .await?;
        if entries.is_empty() {
            return Ok(SingleSendOutcome::default());
        }

        let product_ids: Vec<String> = entries.into_iter().map(|(_, p)| p).collect();
        self.transport
            .send_product_list(
                phone,
                &product_ids,
                &format!("Aquí está {} 🏡", chosen.title),
                &catalog.external_id,
                wamid,
            )
            .await?;

        Ok(SingleSendOutcome {
            sent: true,
            listing_title: Some(chosen.title.clone()),
        })
    }

    /// Multi-listing dispatch for search and "more options" requests.
    ///
    /// A no-op (without error) when no filter source applies, when no
    /// candidate is available, or when no product id resolves.
    pub async fn dispatch(
        &self,
        conversation_id: &str,
        phone: &str,
        user_message: &str,
        wamid: Option<&str>,
        intent: Option<&Intent>,
        now: DateTime<Utc>,
    ) -> Result<(), FincabotError> {
        let Some(conversation) = conversations::get(&self.db, conversation_id).await? else {
            return Ok(());
        };

        let mut exclude: Vec<String> = Vec::new();
        let filters = match intent {
            Some(Intent::MoreOptions) if conversation.last_search_filters.is_some() => {
                exclude = conversation.last_sent_listing_ids.clone();
                match conversation.last_search_filters.clone() {
                    Some(filters) => filters,
                    None => return Ok(()),
                }
            }
            Some(Intent::Search {
                location,
                has_weekend: _,
                day_start,
                day_end,
                min_capacity,
                sort_by_price,
            }) => {
                // An explicit day pair beats the weekend hint; the weekend
                // hint and the no-date default both resolve to next weekend.
                let (starts_at, ends_at) = match (day_start, day_end) {
                    (Some(d1), Some(d2)) => dates::day_pair_range(now, *d1, *d2)
                        .unwrap_or_else(|| dates::next_weekend(now)),
                    _ => dates::next_weekend(now),
                };
                SearchFilters {
                    location: location.clone(),
                    starts_at,
                    ends_at,
                    min_capacity: *min_capacity,
                    sort_by_price: *sort_by_price,
                }
            }
            _ => {
                if patterns::detect_more_options(user_message)
                    && conversation.last_search_filters.is_some()
                {
                    exclude = conversation.last_sent_listing_ids.clone();
                    match conversation.last_search_filters.clone() {
                        Some(filters) => filters,
                        None => return Ok(()),
                    }
                } else {
                    match patterns::parse_location_and_dates(user_message, now)
                        .or_else(|| patterns::parse_weekend_filters(user_message, now))
                    {
                        Some(filters) => filters,
                        None => {
                            debug!(conversation_id, "no catalog signal in message");
                            return Ok(());
                        }
                    }
                }
            }
        };

        let candidates =
            listings::search_available(&self.db, &filters, &exclude, CATALOG_LIMIT).await?;
        if candidates.is_empty() {
            debug!(conversation_id, location = %filters.location, "no available listings");
            return Ok(());
        }
        let candidate_ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();

        let routed = match catalogs::get_by_location_keyword(&self.db, &filters.location).await? {
            Some(catalog) => catalog,
            None => match catalogs::get_default(&self.db).await? {
                Some(catalog) => catalog,
                None => return Ok(()),
            },
        };

        let mut chosen = routed;
        let mut entries =
            catalogs::product_ids_for_listings(&self.db, &chosen.id, &candidate_ids).await?;
        if entries.is_empty() {
            // One-shot fallback to the default catalog.
            if let Some(default) = catalogs::get_default(&self.db).await? {
                if default.id != chosen.id {
                    entries =
                        catalogs::product_ids_for_listings(&self.db, &default.id, &candidate_ids)
                            .await?;
                    chosen = default;
                }
            }
        }
        if entries.is_empty() {
            debug!(conversation_id, catalog = %chosen.id, "no product ids resolve");
            return Ok(());
        }

        let product_ids: Vec<String> = entries.into_iter().map(|(_, p)| p).collect();
        let body = if exclude.is_empty() {
            FIRST_SEND_BODY
        } else {
            MORE_OPTIONS_BODY
        };
        self.transport
            .send_product_list(phone, &product_ids, body, &chosen.external_id, wamid)
            .await?;

        conversations::set_last_catalog_sent(&self.db, conversation_id, &candidate_ids, &filters)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use fincabot_storage::models::{Catalog, Listing};
    use fincabot_storage::queries::contacts;
    use tempfile::tempdir;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Sent {
        to: String,
        product_ids: Vec<String>,
        body: String,
        catalog_external_id: String,
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Sent>>,
    }

    #[async_trait]
    impl WhatsAppTransport for RecordingTransport {
        async fn send_text(
            &self,
            _to: &str,
            _body: &str,
            _reply_to: Option<&str>,
        ) -> Result<(), FincabotError> {
            Ok(())
        }

        async fn send_product_list(
            &self,
            to: &str,
            product_ids: &[String],
            body_text: &str,
            catalog_external_id: &str,
            _reply_to: Option<&str>,
        ) -> Result<(), FincabotError> {
            self.sent.lock().await.push(Sent {
                to: to.to_string(),
                product_ids: product_ids.to_vec(),
                body: body_text.to_string(),
                catalog_external_id: catalog_external_id.to_string(),
            });
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        // Wednesday 2026-03-11.
        Utc.with_ymd_and_hms(2026, 3, 11, 10, 0, 0).unwrap()
    }

    fn listing(id: &str, title: &str, location: &str, capacity: i64, price: f64) -> Listing {
        Listing {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            location: location.to_string(),
            capacity,
            base_price: Some(price),
            visible: true,
            reservable: true,
        }
    }

    struct Fixture {
        db: Database,
        transport: Arc<RecordingTransport>,
        dispatcher: CatalogDispatcher,
        conversation_id: String,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let contact_id = contacts::get_or_create(&db, "+573001112233", "Ana", 1_000)
            .await
            .unwrap();
        let (conv, _) = conversations::resolve_for_contact(&db, &contact_id, "hola", 1_000)
            .await
            .unwrap();

        for (id, title, price) in [
            ("f1", "Villa Hermosa", 500.0),
            ("f2", "Quinta Tramontini", 450.0),
            ("f3", "Casa Chimbi", 400.0),
            ("f4", "Villa Green", 650.0),
        ] {
            listings::insert(&db, &listing(id, title, "Melgar", 15, price))
                .await
                .unwrap();
        }
        catalogs::insert(
            &db,
            &Catalog {
                id: "cat-main".into(),
                name: "Fincas".into(),
                external_id: "ext-main".into(),
                location_keyword: None,
                is_default: true,
            },
        )
        .await
        .unwrap();
        for (i, id) in ["f1", "f2", "f3", "f4"].iter().enumerate() {
            catalogs::link_listing(&db, "cat-main", id, &format!("retail-{i}"))
                .await
                .unwrap();
        }

        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = CatalogDispatcher::new(db.clone(), transport.clone());
        Fixture {
            db,
            transport,
            dispatcher,
            conversation_id: conv.id,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn search_intent_sends_capped_catalog_and_remembers_filters() {
        let f = fixture().await;
        let intent = Intent::Search {
            location: "melgar".into(),
            has_weekend: true,
            day_start: None,
            day_end: None,
            min_capacity: Some(10),
            sort_by_price: false,
        };

        f.dispatcher
            .dispatch(&f.conversation_id, "+573001112233", "texto", None, Some(&intent), now())
            .await
            .unwrap();

        let sent = f.transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].product_ids.len(), 3, "capped at 3");
        assert_eq!(sent[0].body, FIRST_SEND_BODY);
        assert_eq!(sent[0].catalog_external_id, "ext-main");

        let conv = conversations::get(&f.db, &f.conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conv.last_sent_listing_ids.len(), 3);
        let filters = conv.last_search_filters.unwrap();
        assert_eq!(filters.location, "melgar");
        let (sat, mon) = dates::next_weekend(now());
        assert_eq!((filters.starts_at, filters.ends_at), (sat, mon));
    }

    #[tokio::test]
    async fn more_options_replays_filters_and_excludes_sent() {
        let f = fixture().await;
        let search = Intent::Search {
            location: "melgar".into(),
            has_weekend: true,
            day_start: None,
            day_end: None,
            min_capacity: None,
            sort_by_price: false,
        };
        f.dispatcher
            .dispatch(&f.conversation_id, "+573001112233", "texto", None, Some(&search), now())
            .await
            .unwrap();

        let first_ids = conversations::get(&f.db, &f.conversation_id)
            .await
            .unwrap()
            .unwrap()
            .last_sent_listing_ids;

        f.dispatcher
            .dispatch(
                &f.conversation_id,
                "+573001112233",
                "otras opciones",
                None,
                Some(&Intent::MoreOptions),
                now(),
            )
            .await
            .unwrap();

        let sent = f.transport.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].body, MORE_OPTIONS_BODY);
        // Three of four listings went first; only the fourth remains.
        assert_eq!(sent[1].product_ids.len(), 1);

        let second_ids = conversations::get(&f.db, &f.conversation_id)
            .await
            .unwrap()
            .unwrap()
            .last_sent_listing_ids;
        assert!(second_ids.iter().all(|id| !first_ids.contains(id)));
    }

    #[tokio::test]
    async fn more_options_without_memory_is_silent_noop() {
        let f = fixture().await;
        f.dispatcher
            .dispatch(
                &f.conversation_id,
                "+573001112233",
                "otras opciones",
                None,
                Some(&Intent::MoreOptions),
                now(),
            )
            .await
            .unwrap();
        assert!(f.transport.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn deterministic_weekend_parse_dispatches_without_intent() {
        let f = fixture().await;
        f.dispatcher
            .dispatch(
                &f.conversation_id,
                "+573001112233",
                "Estoy buscando en Melgar una finca para 12 personas este fin de semana con buen precio",
                None,
                None,
                now(),
            )
            .await
            .unwrap();

        let sent = f.transport.sent.lock().await;
        assert_eq!(sent.len(), 1);

        let filters = conversations::get(&f.db, &f.conversation_id)
            .await
            .unwrap()
            .unwrap()
            .last_search_filters
            .unwrap();
        assert_eq!(filters.location, "melgar");
        assert_eq!(filters.min_capacity, Some(12));
        assert!(filters.sort_by_price);
    }

    #[tokio::test]
    async fn day_pair_takes_priority_over_weekend_hint() {
        let f = fixture().await;
        let intent = Intent::Search {
            location: "melgar".into(),
            has_weekend: true,
            day_start: Some(20),
            day_end: Some(21),
            min_capacity: None,
            sort_by_price: false,
        };
        f.dispatcher
            .dispatch(&f.conversation_id, "+573001112233", "texto", None, Some(&intent), now())
            .await
            .unwrap();

        let filters = conversations::get(&f.db, &f.conversation_id)
            .await
            .unwrap()
            .unwrap()
            .last_search_filters
            .unwrap();
        let expected = dates::day_pair_range(now(), 20, 21).unwrap();
        assert_eq!((filters.starts_at, filters.ends_at), expected);
    }

    #[tokio::test]
    async fn no_signal_is_a_silent_noop() {
        let f = fixture().await;
        f.dispatcher
            .dispatch(&f.conversation_id, "+573001112233", "hola, ¿cómo están?", None, None, now())
            .await
            .unwrap();
        assert!(f.transport.sent.lock().await.is_empty());
        let conv = conversations::get(&f.db, &f.conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert!(conv.last_search_filters.is_none());
    }

    #[tokio::test]
    async fn keyword_catalog_routes_then_falls_back_to_default_once() {
        let f = fixture().await;
        // A keyword catalog for Melgar with no product links.
        catalogs::insert(
            &f.db,
            &Catalog {
                id: "cat-tolima".into(),
                name: "Tolima".into(),
                external_id: "ext-tolima".into(),
                location_keyword: Some("melgar".into()),
                is_default: false,
            },
        )
        .await
        .unwrap();

        let intent = Intent::Search {
            location: "melgar".into(),
            has_weekend: true,
            day_start: None,
            day_end: None,
            min_capacity: None,
            sort_by_price: false,
        };
        f.dispatcher
            .dispatch(&f.conversation_id, "+573001112233", "texto", None, Some(&intent), now())
            .await
            .unwrap();

        let sent = f.transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].catalog_external_id, "ext-main",
            "empty keyword catalog falls back to default"
        );
    }

    #[tokio::test]
    async fn single_listing_send_uses_extracted_name() {
        let f = fixture().await;
        let outcome = f
            .dispatcher
            .send_single_listing("+573001112233", "quiero ver villa green", Some("villa green"), None)
            .await
            .unwrap();
        assert!(outcome.sent);
        assert_eq!(outcome.listing_title.as_deref(), Some("Villa Green"));

        let sent = f.transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].product_ids, vec!["retail-3".to_string()]);
        assert!(sent[0].body.contains("Villa Green"));
    }

    #[tokio::test]
    async fn single_listing_falls_back_to_pattern_parse() {
        let f = fixture().await;
        let outcome = f
            .dispatcher
            .send_single_listing("+573001112233", "quiero ver casa chimbi", None, None)
            .await
            .unwrap();
        assert!(outcome.sent);
        assert_eq!(outcome.listing_title.as_deref(), Some("Casa Chimbi"));
    }

    #[tokio::test]
    async fn single_listing_unknown_name_sends_nothing() {
        let f = fixture().await;
        let outcome = f
            .dispatcher
            .send_single_listing("+573001112233", "quiero ver el castillo encantado", None, None)
            .await
            .unwrap();
        assert!(!outcome.sent);
        assert!(f.transport.sent.lock().await.is_empty());
    }
}

// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The inbound orchestrator.
//!
//! One [`InboundAgent::handle_inbound_event`] call per webhook event:
//! deduplicate, resolve contact and conversation, persist the user message,
//! and — only while the conversation is automated — classify, attempt the
//! catalog sends, compose, and send the reply. Every external call is
//! fault-isolated so a partial failure degrades to "no reply this turn"
//! rather than corrupting conversation state.

pub mod inbox;

use std::sync::Arc;

use chrono::Utc;
use fincabot_catalog::dispatcher::SingleSendOutcome;
use fincabot_catalog::CatalogDispatcher;
use fincabot_composer::{script, ComposeHints, ReplyComposer};
use fincabot_core::{
    ConversationStatus, FincabotError, KnowledgeSearch, Sender, TextGenerator, WhatsAppTransport,
};
use fincabot_intent::{Intent, IntentClassifier};
use fincabot_storage::queries::{contacts, conversations, events, messages};
use fincabot_storage::{Database, Message};
use tracing::{debug, info, warn};

/// One inbound webhook event, already extracted from the envelope.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub event_id: String,
    pub phone: String,
    pub name: String,
    pub text: String,
    pub wamid: Option<String>,
}

/// Composes the full inbound pipeline per event.
pub struct InboundAgent {
    db: Database,
    transport: Arc<dyn WhatsAppTransport>,
    classifier: IntentClassifier,
    dispatcher: CatalogDispatcher,
    composer: ReplyComposer,
}

impl InboundAgent {
    pub fn new(
        db: Database,
        generator: Arc<dyn TextGenerator>,
        transport: Arc<dyn WhatsAppTransport>,
        knowledge: Arc<dyn KnowledgeSearch>,
    ) -> Self {
        let classifier = IntentClassifier::new(generator.clone());
        let dispatcher = CatalogDispatcher::new(db.clone(), transport.clone());
        let composer = ReplyComposer::new(db.clone(), generator, knowledge);
        Self {
            db,
            transport,
            classifier,
            dispatcher,
            composer,
        }
    }

    /// Process one inbound event end to end. Idempotent on `event_id`.
    pub async fn handle_inbound_event(&self, event: InboundEvent) -> Result<(), FincabotError> {
        if events::record_if_new(&self.db, &event.event_id).await? {
            debug!(event_id = %event.event_id, "duplicate event, skipping");
            return Ok(());
        }

        let now = Utc::now();
        let now_ms = now.timestamp_millis();

        let contact_id =
            contacts::get_or_create(&self.db, &event.phone, &event.name, now_ms).await?;
        let (conversation, is_new) = conversations::resolve_for_contact(
            &self.db,
            &contact_id,
            script::WELCOME_MESSAGE,
            now_ms,
        )
        .await?;

        messages::insert(
            &self.db,
            &Message {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id: conversation.id.clone(),
                sender: Sender::User,
                content: event.text.clone(),
                media_kind: None,
                media_url: None,
                created_at: now_ms,
            },
        )
        .await?;

        // Re-fetch: an operator may have changed hands since resolution.
        let Some(current) = conversations::get(&self.db, &conversation.id).await? else {
            return Ok(());
        };
        if current.status != ConversationStatus::Automated {
            debug!(
                conversation_id = %current.id,
                status = %current.status,
                "conversation is not automated, staying silent"
            );
            conversations::update_last_message_at(&self.db, &current.id, now_ms).await?;
            return Ok(());
        }

        let reply = if is_new {
            Some(script::WELCOME_MESSAGE.to_string())
        } else {
            self.automated_turn(&current.id, &event, now).await
        };

        if let Some(text) = reply {
            if let Err(e) = self
                .transport
                .send_text(&event.phone, &text, event.wamid.as_deref())
                .await
            {
                warn!(error = %e, phone = %event.phone, "reply send failed");
            }
        }

        conversations::update_last_message_at(&self.db, &current.id, Utc::now().timestamp_millis())
            .await?;
        Ok(())
    }

    /// Classification, catalog sends, and composition for one automated turn.
    ///
    /// Returns the reply text, or `None` when composition failed. The two
    /// send attempts are independently fault-isolated: a failure in one
    /// never blocks the other or the reply.
    async fn automated_turn(
        &self,
        conversation_id: &str,
        event: &InboundEvent,
        now: chrono::DateTime<Utc>,
    ) -> Option<String> {
        let intent = self.classifier.classify(&event.text, now).await;
        debug!(conversation_id, ?intent, "intent classified");

        let extracted_name = match &intent {
            Intent::SingleListing { name } => Some(name.as_str()),
            _ => None,
        };
        let single_outcome = match self
            .dispatcher
            .send_single_listing(
                &event.phone,
                &event.text,
                extracted_name,
                event.wamid.as_deref(),
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, conversation_id, "single-listing catalog send failed");
                SingleSendOutcome::default()
            }
        };

        let dispatch_intent = match &intent {
            Intent::MoreOptions | Intent::Search { .. } => Some(&intent),
            _ => None,
        };
        if let Err(e) = self
            .dispatcher
            .dispatch(
                conversation_id,
                &event.phone,
                &event.text,
                event.wamid.as_deref(),
                dispatch_intent,
                now,
            )
            .await
        {
            warn!(error = %e, conversation_id, "catalog dispatch failed");
        }

        let search_override = match &intent {
            Intent::SingleListing { name } => Some(name.as_str()),
            _ if single_outcome.sent => single_outcome.listing_title.as_deref(),
            _ => None,
        };
        let hints = ComposeHints {
            catalog_just_sent: single_outcome.sent,
            just_sent_title: single_outcome.listing_title.as_deref(),
            search_override,
        };

        match self
            .composer
            .compose(conversation_id, &event.text, hints, now.timestamp_millis())
            .await
        {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, conversation_id, "reply composition failed, no reply this turn");
                None
            }
        }
    }

    /// The business sent a message manually: force the contact's active
    /// conversation to `human` so the pipeline stops replying.
    pub async fn mark_human_outbound(&self, phone: &str) -> Result<(), FincabotError> {
        let Some(contact) = contacts::get_by_phone(&self.db, phone).await? else {
            return Ok(());
        };
        if conversations::escalate_latest_for_contact(&self.db, &contact.id).await? {
            info!(phone, "conversation escalated to human after manual outbound");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fincabot_core::ChatMessage;
    use fincabot_storage::models::{Catalog, Listing};
    use fincabot_storage::queries::{catalogs, listings};
    use tempfile::tempdir;
    use tokio::sync::Mutex;

    /// Generator with a scripted classification answer and call counters.
    struct ScriptedGenerator {
        classify_response: Mutex<Result<String, ()>>,
        classify_calls: Mutex<u32>,
        generate_calls: Mutex<u32>,
    }

    impl ScriptedGenerator {
        fn new(classify_response: Result<&str, ()>) -> Self {
            Self {
                classify_response: Mutex::new(classify_response.map(str::to_string)),
                classify_calls: Mutex::new(0),
                generate_calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            _system_prompt: &str,
            _messages: &[ChatMessage],
        ) -> Result<String, FincabotError> {
            *self.generate_calls.lock().await += 1;
            Ok("Respuesta generada 🏡".to_string())
        }

        async fn classify(
            &self,
            _system_prompt: &str,
            _user_message: &str,
        ) -> Result<String, FincabotError> {
            *self.classify_calls.lock().await += 1;
            self.classify_response
                .lock()
                .await
                .clone()
                .map_err(|_| FincabotError::Generation {
                    message: "classifier down".into(),
                    source: None,
                })
        }
    }

    struct NoKnowledge;

    #[async_trait]
    impl KnowledgeSearch for NoKnowledge {
        async fn search(
            &self,
            _namespace: &str,
            _query: &str,
            _limit: usize,
        ) -> Result<String, FincabotError> {
            Ok(String::new())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum SentItem {
        Text(String),
        Products(Vec<String>),
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<SentItem>>,
        fail_text_sends: bool,
    }

    #[async_trait]
    impl WhatsAppTransport for RecordingTransport {
        async fn send_text(
            &self,
            _to: &str,
            body: &str,
            _reply_to: Option<&str>,
        ) -> Result<(), FincabotError> {
            if self.fail_text_sends {
                return Err(FincabotError::Transport {
                    message: "provider down".into(),
                    source: None,
                });
            }
            self.sent.lock().await.push(SentItem::Text(body.to_string()));
            Ok(())
        }

        async fn send_product_list(
            &self,
            _to: &str,
            product_ids: &[String],
            _body_text: &str,
            _catalog_external_id: &str,
            _reply_to: Option<&str>,
        ) -> Result<(), FincabotError> {
            self.sent
                .lock()
                .await
                .push(SentItem::Products(product_ids.to_vec()));
            Ok(())
        }
    }

    struct Fixture {
        agent: InboundAgent,
        db: Database,
        generator: Arc<ScriptedGenerator>,
        transport: Arc<RecordingTransport>,
        _dir: tempfile::TempDir,
    }

    async fn fixture_with(classify: Result<&str, ()>, fail_text_sends: bool) -> Fixture {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        let generator = Arc::new(ScriptedGenerator::new(classify));
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
            fail_text_sends,
        });
        let agent = InboundAgent::new(
            db.clone(),
            generator.clone(),
            transport.clone(),
            Arc::new(NoKnowledge),
        );
        Fixture {
            agent,
            db,
            generator,
            transport,
            _dir: dir,
        }
    }

    fn event(id: &str, text: &str) -> InboundEvent {
        InboundEvent {
            event_id: id.to_string(),
            phone: "+573001112233".to_string(),
            name: "Ana".to_string(),
            text: text.to_string(),
            wamid: Some("wamid.1".to_string()),
        }
    }

    async fn seed_catalog(db: &Database) {
        listings::insert(
            db,
            &Listing {
                id: "f1".into(),
                title: "Villa Green".into(),
                description: "Piscina".into(),
                location: "Melgar".into(),
                capacity: 10,
                base_price: Some(500.0),
                visible: true,
                reservable: true,
            },
        )
        .await
        .unwrap();
        catalogs::insert(
            db,
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
        catalogs::link_listing(db, "cat-main", "f1", "retail-1")
            .await
            .unwrap();
    }

    async fn only_conversation(db: &Database) -> fincabot_core::Conversation {
        let all = conversations::list(db, None, None, 10).await.unwrap();
        assert_eq!(all.len(), 1);
        all[0].conversation.clone()
    }

    #[tokio::test]
    async fn first_contact_gets_welcome_without_classification() {
        let f = fixture_with(Ok(r#"{"intent":"none"}"#), false).await;

        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();

        // Exactly one assistant message (the welcome), one text send.
        let conv = only_conversation(&f.db).await;
        let msgs = messages::list_recent(&f.db, &conv.id, 10).await.unwrap();
        let assistant: Vec<_> = msgs.iter().filter(|m| m.sender == Sender::Assistant).collect();
        assert_eq!(assistant.len(), 1);
        assert!(assistant[0].content.contains("Bienvenido"));

        assert_eq!(*f.generator.classify_calls.lock().await, 0);
        assert_eq!(*f.generator.generate_calls.lock().await, 0);

        let sent = f.transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            SentItem::Text(body) => assert!(body.contains("Bienvenido")),
            other => panic!("expected welcome text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_event_is_fully_ignored() {
        let f = fixture_with(Ok(r#"{"intent":"none"}"#), false).await;

        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();
        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();

        let conv = only_conversation(&f.db).await;
        let msgs = messages::list_recent(&f.db, &conv.id, 10).await.unwrap();
        // Welcome + one user message, not two.
        assert_eq!(msgs.len(), 2);
        assert_eq!(f.transport.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn human_conversation_gets_no_automated_reply() {
        let f = fixture_with(Ok(r#"{"intent":"none"}"#), false).await;
        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();

        let conv = only_conversation(&f.db).await;
        conversations::set_status(&f.db, &conv.id, ConversationStatus::Human)
            .await
            .unwrap();
        let before = conversations::get(&f.db, &conv.id).await.unwrap().unwrap();

        f.agent
            .handle_inbound_event(event("e2", "¿siguen ahí?"))
            .await
            .unwrap();

        // The user message is recorded, the timestamp moves, but no reply.
        let msgs = messages::list_recent(&f.db, &conv.id, 10).await.unwrap();
        assert_eq!(msgs.last().unwrap().content, "¿siguen ahí?");
        let after = conversations::get(&f.db, &conv.id).await.unwrap().unwrap();
        assert!(after.last_message_at >= before.last_message_at);
        assert_eq!(*f.generator.generate_calls.lock().await, 0);
        assert_eq!(f.transport.sent.lock().await.len(), 1, "only the welcome");
    }

    #[tokio::test]
    async fn resolved_conversation_reactivates_and_replies() {
        let f = fixture_with(Ok(r#"{"intent":"none"}"#), false).await;
        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();

        let conv = only_conversation(&f.db).await;
        conversations::set_status(&f.db, &conv.id, ConversationStatus::Resolved)
            .await
            .unwrap();

        f.agent
            .handle_inbound_event(event("e2", "una pregunta más"))
            .await
            .unwrap();

        let after = conversations::get(&f.db, &conv.id).await.unwrap().unwrap();
        assert_eq!(after.status, ConversationStatus::Automated);
        // Same conversation, no duplicate thread.
        assert_eq!(conversations::list(&f.db, None, None, 10).await.unwrap().len(), 1);
        // This was a reactivation, not a first contact: a generated reply.
        assert_eq!(*f.generator.generate_calls.lock().await, 1);
    }

    #[tokio::test]
    async fn single_listing_intent_sends_card_and_short_reply() {
        let f = fixture_with(
            Ok(r#"{"intent":"single_finca","fincaName":"villa green"}"#),
            false,
        )
        .await;
        seed_catalog(&f.db).await;

        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();
        f.agent
            .handle_inbound_event(event("e2", "quiero ver villa green"))
            .await
            .unwrap();

        let sent = f.transport.sent.lock().await;
        // Welcome, then product card, then generated confirmation.
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1], SentItem::Products(vec!["retail-1".to_string()]));
        assert!(matches!(&sent[2], SentItem::Text(_)));
        assert_eq!(*f.generator.generate_calls.lock().await, 1);
    }

    #[tokio::test]
    async fn classifier_failure_falls_back_to_patterns() {
        let f = fixture_with(Err(()), false).await;
        seed_catalog(&f.db).await;

        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();
        f.agent
            .handle_inbound_event(event(
                "e2",
                "Estoy buscando en Melgar una finca este fin de semana con buen precio",
            ))
            .await
            .unwrap();

        // The deterministic weekend parse dispatched the catalog.
        let conv = only_conversation(&f.db).await;
        let filters = conv.last_search_filters.expect("filters remembered");
        assert_eq!(filters.location, "melgar");
        assert!(filters.sort_by_price);
        assert_eq!(conv.last_sent_listing_ids, vec!["f1".to_string()]);

        let sent = f.transport.sent.lock().await;
        // Welcome, product send, generated reply.
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1], SentItem::Products(vec!["retail-1".to_string()]));
    }

    #[tokio::test]
    async fn capacity_floor_blocks_dispatch_but_not_the_reply() {
        let f = fixture_with(Err(()), false).await;
        seed_catalog(&f.db).await;

        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();
        f.agent
            .handle_inbound_event(event(
                "e2",
                "Estoy buscando en Melgar una finca para 12 personas este fin de semana con buen precio",
            ))
            .await
            .unwrap();

        // The only listing holds 10 people; nothing qualifies, nothing is
        // remembered, but the composed reply still goes out.
        let conv = only_conversation(&f.db).await;
        assert!(conv.last_search_filters.is_none());
        assert!(conv.last_sent_listing_ids.is_empty());
        let sent = f.transport.sent.lock().await;
        assert_eq!(sent.len(), 2, "welcome + generated reply");
    }

    #[tokio::test]
    async fn more_options_without_memory_still_composes_reply() {
        let f = fixture_with(Ok(r#"{"intent":"more_options"}"#), false).await;
        seed_catalog(&f.db).await;

        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();
        f.agent
            .handle_inbound_event(event("e2", "otras opciones"))
            .await
            .unwrap();

        let sent = f.transport.sent.lock().await;
        // No dispatch happened (nothing remembered), but the composer ran.
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[1], SentItem::Text(t) if t == "Respuesta generada 🏡"));
        assert_eq!(*f.generator.generate_calls.lock().await, 1);
    }

    #[tokio::test]
    async fn transport_failure_still_records_state() {
        let f = fixture_with(Ok(r#"{"intent":"none"}"#), true).await;

        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();

        // The send failed but the message trail and conversation survive.
        let conv = only_conversation(&f.db).await;
        let msgs = messages::list_recent(&f.db, &conv.id, 10).await.unwrap();
        assert_eq!(msgs.len(), 2, "welcome + user message recorded");
        assert_eq!(conv.status, ConversationStatus::Automated);
    }

    #[tokio::test]
    async fn mark_human_outbound_escalates_active_conversation() {
        let f = fixture_with(Ok(r#"{"intent":"none"}"#), false).await;
        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();

        f.agent.mark_human_outbound("+573001112233").await.unwrap();
        let conv = only_conversation(&f.db).await;
        assert_eq!(conv.status, ConversationStatus::Human);

        // Unknown phone is a no-op.
        f.agent.mark_human_outbound("+570000000000").await.unwrap();
    }

    #[tokio::test]
    async fn wrong_classifier_fallback_never_mixes_with_intent() {
        // Classifier confidently answers none; the message also contains no
        // deterministic signal. Nothing must be dispatched.
        let f = fixture_with(Ok(r#"{"intent":"none"}"#), false).await;
        seed_catalog(&f.db).await;

        f.agent.handle_inbound_event(event("e1", "hola")).await.unwrap();
        f.agent
            .handle_inbound_event(event("e2", "gracias por la información"))
            .await
            .unwrap();

        let conv = only_conversation(&f.db).await;
        assert!(conv.last_search_filters.is_none());
        assert!(conv.last_sent_listing_ids.is_empty());
    }
}

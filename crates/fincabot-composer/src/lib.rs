// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grounded reply composition.
//!
//! Builds a system prompt from the static persona script, retrieved
//! knowledge snippets, a plain-text summary of matching listings, and a
//! short-confirmation hint when a listing card was just sent; then invokes
//! text generation over the recent dialogue and persists the result. This is
//! the only place where conversation history influences output.

pub mod script;

use std::sync::Arc;

use fincabot_core::{
    ChatMessage, FincabotError, KnowledgeSearch, Listing, Sender, TextGenerator,
};
use fincabot_storage::queries::{listings, messages};
use fincabot_storage::{Database, Message};
use tracing::warn;

/// Knowledge namespace for the listing business.
const KNOWLEDGE_NAMESPACE: &str = "fincas";
/// Snippets retrieved per reply.
const KNOWLEDGE_LIMIT: usize = 5;
/// Listings summarized into the prompt.
const LISTINGS_LIMIT: usize = 12;
/// Dialogue turns handed to generation.
const HISTORY_LIMIT: i64 = 10;

/// Transient hints from the send attempts that ran before composition.
#[derive(Debug, Clone, Default)]
pub struct ComposeHints<'a> {
    /// A single-listing card was just sent; keep the reply to one short
    /// confirmation sentence and do not ask for new information.
    pub catalog_just_sent: bool,
    /// Title of the listing whose card was just sent.
    pub just_sent_title: Option<&'a str>,
    /// Query override so the listing summary matches what was shown
    /// (classifier-extracted name, or the just-sent title).
    pub search_override: Option<&'a str>,
}

/// Assembles and persists the generated reply for one turn.
pub struct ReplyComposer {
    db: Database,
    generator: Arc<dyn TextGenerator>,
    knowledge: Arc<dyn KnowledgeSearch>,
}

impl ReplyComposer {
    pub fn new(
        db: Database,
        generator: Arc<dyn TextGenerator>,
        knowledge: Arc<dyn KnowledgeSearch>,
    ) -> Self {
        Self {
            db,
            generator,
            knowledge,
        }
    }

    /// Compose the reply for `user_message`, persist it as an assistant
    /// message, and return it for sending.
    ///
    /// Knowledge retrieval failures degrade to an empty context; a
    /// generation failure is the caller's to log (the reply is the whole
    /// point of this call).
    pub async fn compose(
        &self,
        conversation_id: &str,
        user_message: &str,
        hints: ComposeHints<'_>,
        now_ms: i64,
    ) -> Result<String, FincabotError> {
        let query = hints.search_override.unwrap_or(user_message).trim();

        let knowledge_context = match self
            .knowledge
            .search(KNOWLEDGE_NAMESPACE, query, KNOWLEDGE_LIMIT)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "knowledge retrieval failed, composing without it");
                String::new()
            }
        };

        let matching = listings::search(&self.db, query, LISTINGS_LIMIT).await?;
        let listings_context = format_listings(&matching);

        let recent = messages::list_recent(&self.db, conversation_id, HISTORY_LIMIT).await?;
        let history: Vec<ChatMessage> = recent
            .iter()
            .map(|m| ChatMessage {
                role: m.sender,
                content: m.content.clone(),
            })
            .collect();

        let system_prompt = build_system_prompt(&knowledge_context, &listings_context, &hints);
        let reply = self.generator.generate(&system_prompt, &history).await?;

        messages::insert(
            &self.db,
            &Message {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id: conversation_id.to_string(),
                sender: Sender::Assistant,
                content: reply.clone(),
                media_kind: None,
                media_url: None,
                created_at: now_ms,
            },
        )
        .await?;

        Ok(reply)
    }
}

/// Plain-text inventory summary for the prompt.
fn format_listings(list: &[Listing]) -> String {
    list.iter()
        .map(|l| {
            let price = l
                .base_price
                .map(|p| format!("{p}"))
                .unwrap_or_else(|| "consultar".to_string());
            format!(
                "- {}: {} | Ubicación: {} | Capacidad: {} personas | Precio base: {}",
                l.title, l.description, l.location, l.capacity, price
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concatenate the persona script, retrieved knowledge, listing summary, and
/// the transient short-reply hint into one system prompt.
fn build_system_prompt(
    knowledge_context: &str,
    listings_context: &str,
    hints: &ComposeHints<'_>,
) -> String {
    let single_listing_hint = match (hints.catalog_just_sent, hints.just_sent_title) {
        (true, Some(title)) if !title.is_empty() => format!(
            "\n---\n**AHORA MISMO:** El usuario pidió ver una finca y YA SE LE ENVIÓ la ficha \
             por catálogo (WhatsApp). Responde UNA sola frase corta (máximo 1-2 líneas) \
             confirmando que le enviaste la ficha. NO pidas fechas ni número de personas en \
             este mensaje. Ejemplo: \"Te envié la ficha de {title}. Cuando quieras reservar, \
             cuéntame fechas y personas. 🏡\"\n"
        ),
        _ => String::new(),
    };

    let knowledge_block = if knowledge_context.is_empty() {
        "(No hay fragmentos relevantes para esta consulta. Responde con las reglas generales \
         del consultor.)"
    } else {
        knowledge_context
    };
    let listings_block = if listings_context.is_empty() {
        "(No hay fincas que coincidan. Ofrece alternativas de sector o pide más datos.)"
    } else {
        listings_context
    };

    format!(
        "{persona}\n\n---\n## CONTEXTO ACTUAL (usa SOLO esta información para datos concretos)\n\n\
         ### 1) Base de conocimiento (normas, políticas, FAQs, respuestas rápidas):\n\
         {knowledge_block}\n\n\
         ### 2) Fincas disponibles según la búsqueda del usuario:\n\
         {listings_block}\n{single_listing_hint}---\n\
         **CRÍTICO:** NUNCA vuelvas a enviar el mensaje de bienvenida largo (HERNÁN, lista de \
         preguntas con 📅👥🫂🎉). Ese mensaje ya lo recibió el usuario en el primer mensaje. \
         Si el usuario ya dio ubicación, fechas, personas o tipo de plan, CONFIRMA esos datos \
         en una frase y sigue: muestra oferta de fincas del catálogo o pregunta lo que falte.\n\n\
         **Si en el contexto hay VARIAS fincas para la ubicación que pide el usuario:** \
         menciona 3-5 opciones con nombre y precio (o \"consultar\"), no solo una. No digas \
         que \"solo hay una\" si la lista tiene más.",
        persona = script::SYSTEM_PROMPT,
    )
}

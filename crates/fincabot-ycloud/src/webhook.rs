// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! YCloud webhook event envelope and payload extraction.
//!
//! YCloud delivers events at-least-once; the envelope `id` feeds the event
//! deduplicator. Only text messages from customers and send-confirmations of
//! business-originated messages matter to the agent; everything else maps to
//! [`WebhookPayload::Ignored`].

use serde::Deserialize;

/// The webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Globally unique event id, reused on redelivery.
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub whatsapp_inbound_message: Option<InboundMessageEvent>,
    #[serde(default)]
    pub whatsapp_message: Option<OutboundMessageEvent>,
}

/// An inbound customer message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessageEvent {
    /// Customer phone in E.164.
    pub from: String,
    /// Provider message id (wamid), used for reply threading.
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub text: Option<TextBody>,
    #[serde(default)]
    pub customer_profile: Option<CustomerProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerProfile {
    #[serde(default)]
    pub name: String,
}

/// A message the business itself sent (e.g., an operator typing in the
/// provider console).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessageEvent {
    /// Customer phone the business wrote to.
    pub to: String,
}

/// What the orchestrator should do with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookPayload {
    /// A customer text message to run through the inbound pipeline.
    InboundText {
        event_id: String,
        phone: String,
        name: String,
        text: String,
        wamid: Option<String>,
    },
    /// The business sent a message manually; escalate the conversation.
    BusinessOutbound { phone: String },
    /// Delivery receipts, media we don't handle, unknown event types.
    Ignored,
}

impl WebhookEvent {
    /// Classify the event into an orchestrator action.
    pub fn payload(&self) -> WebhookPayload {
        if self.event_type == "whatsapp.inbound_message.received" {
            if let Some(inbound) = &self.whatsapp_inbound_message {
                if inbound.message_type == "text" {
                    if let Some(text) = &inbound.text {
                        return WebhookPayload::InboundText {
                            event_id: self.id.clone(),
                            phone: inbound.from.clone(),
                            name: inbound
                                .customer_profile
                                .as_ref()
                                .map(|p| p.name.clone())
                                .unwrap_or_default(),
                            text: text.body.clone(),
                            wamid: inbound.id.clone(),
                        };
                    }
                }
            }
            return WebhookPayload::Ignored;
        }

        if self.event_type == "whatsapp.message.updated" {
            if let Some(outbound) = &self.whatsapp_message {
                return WebhookPayload::BusinessOutbound {
                    phone: outbound.to.clone(),
                };
            }
        }

        WebhookPayload::Ignored
    }
}

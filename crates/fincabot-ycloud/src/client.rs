// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound YCloud WhatsApp client.
//!
//! Text messages go through `/whatsapp/messages`; interactive catalog
//! messages use `/whatsapp/messages/sendDirectly`. A single product id is
//! sent as the `product` interactive type, multiple ids as `product_list`
//! with a fixed section title.

use std::time::Duration;

use async_trait::async_trait;
use fincabot_core::{FincabotError, WhatsAppTransport};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use tracing::debug;

/// Footer shown on interactive catalog messages.
const CATALOG_FOOTER: &str = "FincasYa";
/// Header of the product-list message.
const CATALOG_HEADER: &str = "Fincas";
/// Fixed section title of the product-list message.
const CATALOG_SECTION_TITLE: &str = "Fincas disponibles";

/// HTTP client for the YCloud WhatsApp API.
#[derive(Debug, Clone)]
pub struct YCloudClient {
    client: reqwest::Client,
    base_url: String,
    waba_number: String,
}

impl YCloudClient {
    /// Creates a new client.
    ///
    /// `waba_number` is the E.164 number of the business account, used as the
    /// `from` field on every send.
    pub fn new(
        api_key: &str,
        base_url: String,
        waba_number: String,
    ) -> Result<Self, FincabotError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| FincabotError::Config(format!("invalid API key header value: {e}")))?;
        headers.insert("x-api-key", key);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FincabotError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            waba_number,
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), FincabotError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FincabotError::Transport {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, path, "YCloud response received");
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FincabotError::Transport {
                message: format!("YCloud API error: {status} - {text}"),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WhatsAppTransport for YCloudClient {
    async fn send_text(
        &self,
        to: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<(), FincabotError> {
        let mut payload = json!({
            "from": self.waba_number,
            "to": to,
            "type": "text",
            "text": { "body": body },
        });
        if let Some(wamid) = reply_to {
            payload["context"] = json!({ "message_id": wamid });
        }
        self.post("/whatsapp/messages", payload).await
    }

    async fn send_product_list(
        &self,
        to: &str,
        product_ids: &[String],
        body_text: &str,
        catalog_external_id: &str,
        reply_to: Option<&str>,
    ) -> Result<(), FincabotError> {
        if product_ids.is_empty() {
            return Ok(());
        }

        let interactive = if product_ids.len() == 1 {
            json!({
                "type": "product",
                "body": { "text": body_text },
                "footer": { "text": CATALOG_FOOTER },
                "action": {
                    "catalog_id": catalog_external_id,
                    "product_retailer_id": product_ids[0],
                },
            })
        } else {
            json!({
                "type": "product_list",
                "header": { "type": "text", "text": CATALOG_HEADER },
                "body": { "text": body_text },
                "footer": { "text": CATALOG_FOOTER },
                "action": {
                    "catalog_id": catalog_external_id,
                    "sections": [{
                        "title": CATALOG_SECTION_TITLE,
                        "product_items": product_ids
                            .iter()
                            .map(|id| json!({ "product_retailer_id": id }))
                            .collect::<Vec<_>>(),
                    }],
                },
            })
        };

        let mut payload = json!({
            "from": self.waba_number,
            "to": to,
            "type": "interactive",
            "interactive": interactive,
        });
        if let Some(wamid) = reply_to {
            payload["context"] = json!({ "message_id": wamid });
        }
        self.post("/whatsapp/messages/sendDirectly", payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn make_client(server: &MockServer) -> YCloudClient {
        YCloudClient::new("yc-test", server.uri(), "+573000000000".to_string()).unwrap()
    }

    #[tokio::test]
    async fn send_text_posts_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/whatsapp/messages"))
            .and(header("x-api-key", "yc-test"))
            .and(body_partial_json(serde_json::json!({
                "from": "+573000000000",
                "to": "+573001112233",
                "type": "text",
                "text": { "body": "¡Hola! 🏡" },
                "context": { "message_id": "wamid.abc" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "m1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        client
            .send_text("+573001112233", "¡Hola! 🏡", Some("wamid.abc"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn single_product_id_degrades_to_product_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/whatsapp/messages/sendDirectly"))
            .and(body_partial_json(serde_json::json!({
                "type": "interactive",
                "interactive": {
                    "type": "product",
                    "action": { "catalog_id": "ext-1", "product_retailer_id": "retail-1" },
                },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "m2"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        client
            .send_product_list(
                "+573001112233",
                &["retail-1".into()],
                "Aquí está Villa Green 🏡",
                "ext-1",
                None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn multiple_product_ids_send_product_list_with_section() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/whatsapp/messages/sendDirectly"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "m3"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        client
            .send_product_list(
                "+573001112233",
                &["r1".into(), "r2".into(), "r3".into()],
                "Estas son 3 opciones de fincas disponibles para tus fechas:",
                "ext-1",
                None,
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(body["interactive"]["type"], "product_list");
        let section = &body["interactive"]["action"]["sections"][0];
        assert_eq!(section["title"], "Fincas disponibles");
        assert_eq!(section["product_items"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_product_ids_is_a_silent_no_op() {
        let server = MockServer::start().await;
        // No mock mounted: any request would 404 and fail the send.
        let client = make_client(&server).await;
        client
            .send_product_list("+573001112233", &[], "texto", "ext-1", None)
            .await
            .unwrap();
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn api_error_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad to number"))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let err = client
            .send_text("+57300", "hola", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("400"));
    }
}

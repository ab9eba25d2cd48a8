//! # Remote Collaborators
//!
//! The register talks to three remote services. Each is a trait so the
//! orchestrator can be driven by fakes; [`HttpApi`] implements all three
//! against the venue's REST API.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TicketService   POST /api/tickets            [WireTicket, ...]        │
//! │                  GET  /                       reachability probe       │
//! │  LoyaltyService  POST /api/loyalty/earn       {mobile, amount, ticketId}│
//! │                  POST /api/loyalty/redeem     {mobile, ticketId}       │
//! │                  GET  /api/loyalty/{mobile}   → {points}               │
//! │  CatalogService  GET  /api/products           → [WireProduct, ...]     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts cross the wire in rupees; everything local stays in paise.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use ridepass_core::{Money, Product, TicketRecord};

use crate::config::TerminalConfig;
use crate::error::{SubmitError, SyncError, SyncResult};

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Ticket persistence. A batch is accepted or rejected as a whole.
#[async_trait]
pub trait TicketService: Send + Sync {
    async fn submit_batch(&self, records: &[TicketRecord]) -> Result<(), SubmitError>;

    /// True when the service answers at all.
    async fn probe(&self) -> bool;
}

/// Points balance returned by every loyalty call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoyaltyBalance {
    #[serde(default)]
    pub points: i64,
}

#[async_trait]
pub trait LoyaltyService: Send + Sync {
    async fn earn(&self, phone: &str, amount: Money, ticket_ref: &str)
        -> SyncResult<LoyaltyBalance>;

    async fn redeem(&self, phone: &str, ticket_ref: &str) -> SyncResult<LoyaltyBalance>;

    async fn lookup(&self, phone: &str) -> SyncResult<LoyaltyBalance>;
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn fetch_products(&self) -> SyncResult<Vec<Product>>;
}

// =============================================================================
// Wire Types
// =============================================================================

/// A ticket as the persistence service stores it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTicket {
    pub id: String,
    pub amount: f64,
    pub date: String,
    pub items: Vec<WireItem>,
    pub status: String,
    pub mobile: Option<String>,
    pub payment_mode: String,
    pub created_by: String,
    pub created_at: String,
    pub is_coupon: bool,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
}

impl From<&TicketRecord> for WireTicket {
    fn from(record: &TicketRecord) -> Self {
        WireTicket {
            id: record.id.clone(),
            amount: record.amount.to_major_f64(),
            date: record.issued_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            items: record
                .items
                .iter()
                .map(|line| WireItem {
                    id: line.product_ref.clone(),
                    name: line.display_name.clone(),
                    price: line.unit_price.to_major_f64(),
                    quantity: line.quantity,
                })
                .collect(),
            status: record.status.as_str().to_string(),
            mobile: record.phone.clone(),
            payment_mode: record.payment_mode.as_str().to_string(),
            created_by: record.issued_by.clone(),
            created_at: record.issued_at.to_rfc3339(),
            is_coupon: record.is_sub_ticket,
            parent_id: record.parent_id.clone(),
        }
    }
}

/// A catalog entry as the products endpoint returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct WireProduct {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "_id", default)]
    pub object_id: Option<String>,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `"on"` or `"off"`.
    #[serde(default)]
    pub status: Option<String>,
}

impl WireProduct {
    /// `None` when the entry carries no identifier.
    pub fn into_product(self) -> Option<Product> {
        let id = self.id.or(self.object_id)?;
        Some(Product {
            id,
            name: self.name,
            price: Money::from_major_f64(self.price),
            category: self.category,
            description: self.description,
            active: self.status.as_deref() != Some("off"),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EarnRequest<'a> {
    mobile: &'a str,
    amount: f64,
    ticket_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RedeemRequest<'a> {
    mobile: &'a str,
    ticket_id: &'a str,
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// reqwest client for the venue API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration, token: Option<String>) -> SyncResult<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Internal(format!("HTTP client: {e}")))?;

        Ok(HttpApi { client, base, token })
    }

    pub fn from_config(config: &TerminalConfig) -> SyncResult<Self> {
        Self::new(
            &config.api.base_url,
            config.request_timeout(),
            config.api.token.clone(),
        )
    }

    fn endpoint(&self, path: &str) -> SyncResult<Url> {
        Ok(self.base.join(path)?)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl TicketService for HttpApi {
    async fn submit_batch(&self, records: &[TicketRecord]) -> Result<(), SubmitError> {
        let url = self
            .endpoint("api/tickets")
            .map_err(|e| SubmitError::Unavailable(e.to_string()))?;
        let body: Vec<WireTicket> = records.iter().map(WireTicket::from).collect();

        debug!(count = body.len(), "Submitting ticket batch");
        self.authorized(self.client.post(url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        info!(count = body.len(), "Ticket batch accepted");
        Ok(())
    }

    async fn probe(&self) -> bool {
        match self.client.get(self.base.clone()).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl LoyaltyService for HttpApi {
    async fn earn(
        &self,
        phone: &str,
        amount: Money,
        ticket_ref: &str,
    ) -> SyncResult<LoyaltyBalance> {
        let body = EarnRequest {
            mobile: phone,
            amount: amount.to_major_f64(),
            ticket_id: ticket_ref,
        };
        let balance = self
            .authorized(self.client.post(self.endpoint("api/loyalty/earn")?))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<LoyaltyBalance>()
            .await?;
        Ok(balance)
    }

    async fn redeem(&self, phone: &str, ticket_ref: &str) -> SyncResult<LoyaltyBalance> {
        let body = RedeemRequest {
            mobile: phone,
            ticket_id: ticket_ref,
        };
        let balance = self
            .authorized(self.client.post(self.endpoint("api/loyalty/redeem")?))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<LoyaltyBalance>()
            .await?;
        Ok(balance)
    }

    async fn lookup(&self, phone: &str) -> SyncResult<LoyaltyBalance> {
        let url = self.endpoint(&format!("api/loyalty/{phone}"))?;
        let balance = self
            .authorized(self.client.get(url))
            .send()
            .await?
            .error_for_status()?
            .json::<LoyaltyBalance>()
            .await?;
        Ok(balance)
    }
}

#[async_trait]
impl CatalogService for HttpApi {
    async fn fetch_products(&self) -> SyncResult<Vec<Product>> {
        let wire = self
            .authorized(self.client.get(self.endpoint("api/products")?))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<WireProduct>>()
            .await?;

        let total = wire.len();
        let products: Vec<Product> = wire.into_iter().filter_map(WireProduct::into_product).collect();
        if products.len() < total {
            debug!(skipped = total - products.len(), "Catalog entries without an id skipped");
        }
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ridepass_core::fanout::{fan_out, CheckoutContext};
    use ridepass_core::{CartLine, FanOutRule, Issuer, PaymentMode, TransactionId};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> HttpApi {
        HttpApi::new(&server.uri(), Duration::from_secs(2), None).unwrap()
    }

    fn records() -> Vec<TicketRecord> {
        let lines = vec![CartLine {
            product_ref: "4".into(),
            display_name: "TL TRAIN".into(),
            unit_price: Money::from_major(50),
            quantity: 2,
            fan_out: FanOutRule::PerUnit,
        }];
        let now = Utc::now();
        fan_out(
            &lines,
            &CheckoutContext {
                transaction_id: TransactionId::generate(now),
                issued_at: now,
                phone: Some("9876543210".into()),
                payment_mode: PaymentMode::Upi,
                issuer: Issuer::named("Asha"),
            },
        )
        .unwrap()
        .to_records()
    }

    #[tokio::test]
    async fn test_submit_batch_posts_wire_tickets() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tickets"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let batch = records();
        api(&server).submit_batch(&batch).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        let tickets = body.as_array().unwrap();
        assert_eq!(tickets.len(), 3);
        assert_eq!(tickets[0]["amount"], 100.0);
        assert_eq!(tickets[0]["isCoupon"], false);
        assert_eq!(tickets[1]["amount"], 50.0);
        assert_eq!(tickets[1]["isCoupon"], true);
        assert_eq!(tickets[1]["parentId"], batch[0].id.as_str());
        assert_eq!(tickets[1]["paymentMode"], "upi");
        assert_eq!(tickets[1]["mobile"], "9876543210");
        assert_eq!(tickets[1]["items"][0]["quantity"], 1);
    }

    #[tokio::test]
    async fn test_bad_request_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tickets"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = api(&server).submit_batch(&records()).await.unwrap_err();
        assert_eq!(err, SubmitError::Rejected { status: 400 });
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tickets"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = api(&server).submit_batch(&records()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_is_unavailable() {
        let api = HttpApi::new("http://127.0.0.1:9", Duration::from_millis(500), None).unwrap();
        let err = api.submit_batch(&records()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Unavailable(_)));
        assert!(!api.probe().await);
    }

    #[tokio::test]
    async fn test_probe_accepts_any_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        assert!(api(&server).probe().await);
    }

    #[tokio::test]
    async fn test_loyalty_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/loyalty/earn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Points added successfully",
                "points": 160,
                "earned": 60
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/loyalty/redeem"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "points": 60
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/loyalty/9876543210"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "points": 60
            })))
            .mount(&server)
            .await;

        let api = api(&server);
        let earned = api
            .earn("9876543210", Money::from_major(600), "TXN-1")
            .await
            .unwrap();
        assert_eq!(earned.points, 160);
        assert_eq!(api.redeem("9876543210", "TXN-1").await.unwrap().points, 60);
        assert_eq!(api.lookup("9876543210").await.unwrap().points, 60);

        let requests = server.received_requests().await.unwrap();
        let earn_body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(earn_body["amount"], 600.0);
        assert_eq!(earn_body["ticketId"], "TXN-1");
    }

    #[tokio::test]
    async fn test_redeem_insufficient_points_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/loyalty/redeem"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = api(&server).redeem("9876543210", "TXN-1").await.unwrap_err();
        assert!(matches!(err, SyncError::Http { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_fetch_products_maps_wire_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "19", "name": "Combo (5 Rides)", "price": 500, "status": "on"},
                {"_id": "65f0c0ffee", "name": "VR Game", "price": 149.5, "category": "play"},
                {"id": "p2-6", "name": "Massage Chair", "price": 100, "status": "off"},
                {"name": "No id", "price": 10}
            ])))
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), Duration::from_secs(2), Some("secret".into())).unwrap();
        let products = api.fetch_products().await.unwrap();

        assert_eq!(products.len(), 3);
        assert_eq!(products[0].price, Money::from_major(500));
        assert_eq!(products[1].id, "65f0c0ffee");
        assert_eq!(products[1].price, Money::from_major_minor(149, 50));
        assert!(!products[2].active);
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let api = HttpApi::new("https://venue.example/pos", Duration::from_secs(1), None).unwrap();
        assert_eq!(
            api.endpoint("api/tickets").unwrap().as_str(),
            "https://venue.example/pos/api/tickets"
        );
    }
}

use std::time::Duration;

use anyhow::Result;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::error;
use url::Url;
use uuid::Uuid;

use crate::domain::value_objects::enums::payment_statuses::PaymentStatus;
use crate::payments::signature;

/// Minimal PayGate client built on reqwest. Credentials and endpoints are
/// injected at startup; the digest math lives in `payments::signature`.
pub struct PayGateClient {
    http: reqwest::Client,
    api_base_url: Url,
    public_key: String,
    shared_secret: String,
    redirect_base_url: String,
}

/// The gateway's own view of a transaction, as returned by its lookup API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayTransaction {
    pub id: Option<String>,
    pub reference: Option<String>,
    pub status: Option<String>,
}

impl PayGateClient {
    pub fn new(
        api_base_url: Url,
        public_key: String,
        shared_secret: String,
        redirect_base_url: String,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            http,
            api_base_url,
            public_key,
            shared_secret,
            redirect_base_url,
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn shared_secret(&self) -> &str {
        &self.shared_secret
    }

    /// Digest the widget presents to the gateway alongside the checkout
    /// fields; the gateway recomputes it before taking the payment.
    pub fn widget_signature(&self, reference: &str, amount_minor: i32, currency: &str) -> String {
        signature::checkout_digest(reference, amount_minor, currency, &self.shared_secret)
    }

    /// Where the gateway sends the shopper after the widget closes.
    pub fn redirect_url(&self, payment_id: Uuid) -> String {
        format!("{}?paymentId={}", self.redirect_base_url, payment_id)
    }

    /// Looks up the gateway's view of a transaction by our reference. The
    /// client applies its bounded timeout; callers treat any failure here as
    /// recoverable, never as a terminal payment state.
    pub async fn fetch_transaction(&self, reference: &str) -> Result<GatewayTransaction> {
        let url = self
            .api_base_url
            .join(&format!("transactions/{}", reference))?;

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.shared_secret))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "fetch transaction").await?;

        let transaction: GatewayTransaction = resp.json().await?;
        Ok(transaction)
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "paygate api request failed"
        );

        anyhow::bail!("PayGate API request failed: {} (status {})", context, status);
    }
}

/// Maps the gateway's transaction status vocabulary onto the ledger's.
/// Unknown strings become `error` so the payment still settles rather than
/// hanging in `pending` forever.
pub fn map_transaction_status(gateway_status: &str) -> PaymentStatus {
    match gateway_status.trim().to_ascii_uppercase().as_str() {
        "APPROVED" | "SUCCESS" | "COMPLETED" => PaymentStatus::Approved,
        "DECLINED" | "FAILED" | "REJECTED" => PaymentStatus::Declined,
        "VOIDED" | "CANCELLED" | "REVERSED" => PaymentStatus::Voided,
        _ => PaymentStatus::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PayGateClient {
        PayGateClient::new(
            Url::parse("https://api.paygate.test/v1/").unwrap(),
            "pk_test_123".to_string(),
            "whsec_test".to_string(),
            "https://app.example.test/billing/return".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn maps_gateway_status_vocabulary() {
        assert_eq!(map_transaction_status("APPROVED"), PaymentStatus::Approved);
        assert_eq!(map_transaction_status("success"), PaymentStatus::Approved);
        assert_eq!(map_transaction_status("DECLINED"), PaymentStatus::Declined);
        assert_eq!(map_transaction_status(" failed "), PaymentStatus::Declined);
        assert_eq!(map_transaction_status("CANCELLED"), PaymentStatus::Voided);
        assert_eq!(map_transaction_status("garbage"), PaymentStatus::Error);
    }

    #[test]
    fn redirect_url_carries_the_payment_id() {
        let payment_id = Uuid::new_v4();
        let url = client().redirect_url(payment_id);
        assert_eq!(
            url,
            format!("https://app.example.test/billing/return?paymentId={payment_id}")
        );
    }

    #[test]
    fn widget_signature_matches_checkout_digest() {
        let client = client();
        assert_eq!(
            client.widget_signature("PAY-1-x", 999, "USD"),
            signature::checkout_digest("PAY-1-x", 999, "USD", "whsec_test")
        );
    }
}

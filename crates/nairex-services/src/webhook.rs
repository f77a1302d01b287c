//! Signed webhook delivery.
//!
//! Events are fire-and-forget: delivery runs on its own tokio task and the
//! triggering request never waits for it. A single POST is attempted per
//! event; failures are logged.
//!
//! TODO: schedule a single retry on non-2xx responses.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tracing::{error, info};

type HmacSha256 = Hmac<Sha256>;

/// Where (and how) a main account wants its events delivered.
#[derive(Debug, Clone, Default)]
pub struct WebhookDetails {
    pub callback_url: Option<String>,
    pub webhook_key: Option<String>,
}

/// The closed set of domain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEvent {
    WalletUpdated,
    SwapTransactionCompleted,
    SwapTransactionReversed,
    SwapTransactionFailed,
    WithdrawSuccessful,
    WithdrawRejected,
    DepositConfirmation,
    DepositSuccessful,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WalletUpdated => "wallet.updated",
            Self::SwapTransactionCompleted => "swap_transaction.completed",
            Self::SwapTransactionReversed => "swap_transaction.reversed",
            Self::SwapTransactionFailed => "swap_transaction.failed",
            Self::WithdrawSuccessful => "withdraw.successful",
            Self::WithdrawRejected => "withdraw.rejected",
            Self::DepositConfirmation => "deposit.confirmation",
            Self::DepositSuccessful => "deposit.successful",
        }
    }
}

#[derive(Serialize)]
struct Envelope {
    event: &'static str,
    data: serde_json::Value,
}

/// HMAC-signed JSON POST dispatcher.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    http: reqwest::Client,
    /// Pause before each POST (legacy pacing contract).
    pre_delay: Duration,
    /// Gap between the two deposit events.
    deposit_gap: Duration,
}

impl WebhookDispatcher {
    pub fn new(pre_delay: Duration, deposit_gap: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            pre_delay,
            deposit_gap,
        }
    }

    /// Dispatch one event. A missing callback URL makes this a no-op.
    pub fn enqueue(&self, details: &WebhookDetails, event: WebhookEvent, data: serde_json::Value) {
        let Some(url) = details.callback_url.clone() else {
            return;
        };
        let dispatcher = self.clone();
        let key = details.webhook_key.clone();
        tokio::spawn(async move {
            dispatcher.deliver(&url, key.as_deref(), event, data).await;
        });
    }

    /// The deposit contract is a two-shot: `deposit.confirmation` followed,
    /// after a pause, by `deposit.successful` with the same payload.
    pub fn enqueue_deposit_success(&self, details: &WebhookDetails, data: serde_json::Value) {
        let Some(url) = details.callback_url.clone() else {
            return;
        };
        let dispatcher = self.clone();
        let key = details.webhook_key.clone();
        tokio::spawn(async move {
            dispatcher
                .deliver(&url, key.as_deref(), WebhookEvent::DepositConfirmation, data.clone())
                .await;
            tokio::time::sleep(dispatcher.deposit_gap).await;
            dispatcher
                .deliver(&url, key.as_deref(), WebhookEvent::DepositSuccessful, data)
                .await;
        });
    }

    async fn deliver(
        &self,
        url: &str,
        key: Option<&str>,
        event: WebhookEvent,
        data: serde_json::Value,
    ) {
        info!(event = event.as_str(), "dispatching event...");

        let body = match serde_json::to_string(&Envelope { event: event.as_str(), data }) {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "encoding webhook body");
                return;
            }
        };

        tokio::time::sleep(self.pre_delay).await;

        let mut request = self
            .http
            .post(url)
            .header("content-type", "application/json")
            .header("accept", "application/json");

        if let Some(key) = key {
            let ts = Utc::now().timestamp();
            let signature = sign(key, ts, &body);
            request = request.header("quidax-signature", format!("ts={ts},sig={signature}"));
        }

        match request.body(body).send().await {
            Ok(response) => {
                let status = response.status();
                let response_body = response.text().await.unwrap_or_default();
                info!(%status, body = %response_body, "response from callback");
                if !status.is_success() {
                    error!(event = event.as_str(), %status, "webhook delivery failed");
                }
            }
            Err(err) => {
                error!(event = event.as_str(), error = %err, "dispatching request");
            }
        }
    }
}

/// `hex(HMAC-SHA256(key, "<ts>.<escaped_body>"))` where the body has `/`
/// escaped as `\/` to match the signature scheme of the upstream consumer.
/// The POST itself carries the unescaped body.
pub fn sign(key: &str, ts: i64, body: &str) -> String {
    let escaped = body.replace('/', "\\/");
    let payload = format!("{ts}.{escaped}");
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn signature_is_deterministic_and_hex() {
        let a = sign("secret", 1700000000, r#"{"event":"wallet.updated"}"#);
        let b = sign("secret", 1700000000, r#"{"event":"wallet.updated"}"#);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_covers_the_escaped_body() {
        // The slash escape must change the signature.
        let with_slash = sign("secret", 1, r#"{"url":"https://example.com"}"#);
        let manual = {
            let payload = format!("{}.{}", 1, r#"{"url":"https:\/\/example.com"}"#);
            let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
            mac.update(payload.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        };
        assert_eq!(with_slash, manual);
    }

    #[tokio::test]
    async fn missing_url_is_a_noop() {
        let dispatcher = WebhookDispatcher::new(Duration::ZERO, Duration::ZERO);
        // No URL: enqueue must not spawn anything that could panic later.
        dispatcher.enqueue(
            &WebhookDetails::default(),
            WebhookEvent::WalletUpdated,
            serde_json::json!({}),
        );
    }

    #[tokio::test]
    async fn delivers_signed_events_to_the_callback() {
        use axum::extract::State;
        use axum::routing::post;

        type Seen = Arc<Mutex<Vec<(Option<String>, String)>>>;
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));

        async fn capture(
            State(seen): State<Seen>,
            headers: axum::http::HeaderMap,
            body: String,
        ) -> &'static str {
            let signature = headers
                .get("quidax-signature")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            seen.lock().unwrap().push((signature, body));
            "ok"
        }

        let app = axum::Router::new()
            .route("/hook", post(capture))
            .with_state(Arc::clone(&seen));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let dispatcher = WebhookDispatcher::new(Duration::ZERO, Duration::from_millis(10));
        let details = WebhookDetails {
            callback_url: Some(format!("http://{addr}/hook")),
            webhook_key: Some("whk_test".into()),
        };
        dispatcher.enqueue(
            &details,
            WebhookEvent::WithdrawSuccessful,
            serde_json::json!({"id": "w-1"}),
        );
        dispatcher.enqueue_deposit_success(&details, serde_json::json!({"id": "d-1"}));

        // Three deliveries: the withdrawal plus the deposit two-shot.
        for _ in 0..100 {
            if seen.lock().unwrap().len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 3);
        for (signature, body) in events.iter() {
            let header = signature.as_ref().expect("signature header present");
            let (ts, sig) = header.split_once(",sig=").unwrap();
            let ts: i64 = ts.strip_prefix("ts=").unwrap().parse().unwrap();
            assert_eq!(sign("whk_test", ts, body), sig);
        }
        let names: Vec<String> = events
            .iter()
            .map(|(_, body)| serde_json::from_str::<serde_json::Value>(body).unwrap()["event"]
                .as_str()
                .unwrap()
                .to_string())
            .collect();
        assert!(names.contains(&"withdraw.successful".to_string()));
        assert!(names.contains(&"deposit.confirmation".to_string()));
        assert!(names.contains(&"deposit.successful".to_string()));
    }
}

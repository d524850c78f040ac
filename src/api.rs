//! Provider seams and their HTTP implementations.
//!
//! The controllers never talk to the network directly. They depend on two
//! small traits:
//! - [`NewsProvider`]: Read the current aggregation, or ask the server to re-aggregate
//! - [`SubscriptionProvider`]: Register an email for category digests
//!
//! [`HttpNewsProvider`] and [`HttpSubscriptionProvider`] implement them on top
//! of a shared `reqwest` client. Each call is a single request: there is no
//! retry or backoff, a failure is reported to the controller as-is.
//!
//! # Endpoints
//!
//! | Call | Method | Path |
//! |------|--------|------|
//! | `read_aggregated_news` | `GET` | `/api/news` |
//! | `trigger_aggregation` | `POST` | `/api/news/fetch` |
//! | `create_subscription` | `POST` | `/api/subscriptions` |

use crate::error::ProviderError;
use crate::models::{NewsEnvelope, NewsResponse, SubscriptionReply, SubscriptionRequest};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Source of aggregated news.
pub trait NewsProvider: Send + Sync {
    /// Fetch the current aggregation. Idempotent.
    fn read_aggregated_news(
        &self,
    ) -> impl Future<Output = Result<NewsResponse, ProviderError>> + Send;

    /// Ask the server to re-aggregate. The acknowledgement carries no payload.
    fn trigger_aggregation(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Sink for subscription requests.
pub trait SubscriptionProvider: Send + Sync {
    fn create_subscription(
        &self,
        request: SubscriptionRequest,
    ) -> impl Future<Output = Result<SubscriptionReply, ProviderError>> + Send;
}

impl<T: NewsProvider> NewsProvider for Arc<T> {
    fn read_aggregated_news(
        &self,
    ) -> impl Future<Output = Result<NewsResponse, ProviderError>> + Send {
        (**self).read_aggregated_news()
    }

    fn trigger_aggregation(&self) -> impl Future<Output = Result<(), ProviderError>> + Send {
        (**self).trigger_aggregation()
    }
}

impl<T: SubscriptionProvider> SubscriptionProvider for Arc<T> {
    fn create_subscription(
        &self,
        request: SubscriptionRequest,
    ) -> impl Future<Output = Result<SubscriptionReply, ProviderError>> + Send {
        (**self).create_subscription(request)
    }
}

/// Build the HTTP client shared by both providers.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("newsy-client/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .timeout(timeout)
        .build()
}

/// Error body the server sends with a non-success status.
///
/// Only `message` is meant for the user. `error` is the framework's status
/// label (`"Internal Server Error"`) and is logged, never shown.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Turn a non-success response into [`ProviderError::Status`].
async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let (message, label) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => (parsed.message, parsed.error),
        Err(_) => (None, None),
    };
    debug!(
        status = status.as_u16(),
        label = label.as_deref().unwrap_or_default(),
        body = %crate::utils::truncate_for_log(&body, 200),
        "Error response"
    );
    Err(ProviderError::Status {
        status: status.as_u16(),
        message: message.filter(|m| !m.trim().is_empty()),
    })
}

fn endpoint(base_url: &Url, path: &str) -> Result<Url, ProviderError> {
    base_url
        .join(path)
        .map_err(|e| ProviderError::Other(format!("invalid endpoint {path}: {e}")))
}

/// [`NewsProvider`] backed by the aggregator's REST API.
#[derive(Debug, Clone)]
pub struct HttpNewsProvider {
    client: Client,
    /// API root; always ends with `/` so relative joins keep its path.
    base_url: Url,
}

impl HttpNewsProvider {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

impl NewsProvider for HttpNewsProvider {
    #[instrument(level = "info", skip_all)]
    async fn read_aggregated_news(&self) -> Result<NewsResponse, ProviderError> {
        let t0 = Instant::now();
        let url = endpoint(&self.base_url, "api/news")?;
        let response = check_status(self.client.get(url).send().await?).await?;
        let body = response.bytes().await?;
        let envelope: NewsEnvelope = serde_json::from_slice(&body)?;

        debug!(categories = ?envelope.news.categories().collect::<Vec<_>>(), "Categories received");
        info!(
            categories = envelope.news.len(),
            articles = envelope.news.total_articles(),
            reported_categories = ?envelope.total_categories,
            reported_articles = ?envelope.total_articles,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Read aggregated news"
        );
        Ok(envelope.news)
    }

    #[instrument(level = "info", skip_all)]
    async fn trigger_aggregation(&self) -> Result<(), ProviderError> {
        let t0 = Instant::now();
        let url = endpoint(&self.base_url, "api/news/fetch")?;
        let response = check_status(self.client.post(url).send().await?).await?;
        // The acknowledgement body is informational only.
        let ack = response.text().await.unwrap_or_default();
        debug!(ack = %crate::utils::truncate_for_log(&ack, 200), "Aggregation acknowledgement");
        info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Triggered aggregation");
        Ok(())
    }
}

/// [`SubscriptionProvider`] backed by the aggregator's REST API.
#[derive(Debug, Clone)]
pub struct HttpSubscriptionProvider {
    client: Client,
    base_url: Url,
}

impl HttpSubscriptionProvider {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

impl SubscriptionProvider for HttpSubscriptionProvider {
    #[instrument(level = "info", skip_all, fields(categories = request.categories.len()))]
    async fn create_subscription(
        &self,
        request: SubscriptionRequest,
    ) -> Result<SubscriptionReply, ProviderError> {
        let url = endpoint(&self.base_url, "api/subscriptions")?;
        let sent = self.client.post(url).json(&request).send().await;
        let response = match sent {
            Ok(response) => check_status(response).await,
            Err(e) => Err(e.into()),
        };
        let response = response.inspect_err(|e| warn!(error = %e, "Subscription request failed"))?;

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(SubscriptionReply::default());
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::subscription::{DEFAULT_ERROR_MESSAGE, SubmitOutcome, SubscriptionForm};
    use axum::{
        extract::State,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct ServerState {
        triggers: Arc<Mutex<u32>>,
        subscriptions: Arc<Mutex<Vec<SubscriptionRequest>>>,
    }

    async fn all_news() -> Json<serde_json::Value> {
        Json(json!({
            "totalCategories": 2,
            "totalArticles": 2,
            "news": {
                "Technology": [{"title": "Chips", "url": "https://t", "publishedAt": "2025-05-06T10:00:00", "category": "Technology"}],
                "Sports": [{"title": "Final", "url": "https://s", "publishedAt": "2025-05-06T11:00:00", "category": "Sports"}]
            }
        }))
    }

    async fn trigger(State(state): State<ServerState>) -> Json<serde_json::Value> {
        *state.triggers.lock().unwrap() += 1;
        Json(json!({"message": "News fetch completed successfully"}))
    }

    async fn subscribe(
        State(state): State<ServerState>,
        Json(request): Json<SubscriptionRequest>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let duplicate = state
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.email == request.email);
        if duplicate {
            return (
                StatusCode::CONFLICT,
                Json(json!({"message": "Email already subscribed"})),
            );
        }
        state.subscriptions.lock().unwrap().push(request);
        (StatusCode::OK, Json(json!({})))
    }

    async fn spawn_server(app: Router) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    async fn spawn_api() -> (Url, ServerState) {
        let state = ServerState::default();
        let app = Router::new()
            .route("/api/news", get(all_news))
            .route("/api/news/fetch", post(trigger))
            .route("/api/subscriptions", post(subscribe))
            .with_state(state.clone());
        (spawn_server(app).await, state)
    }

    fn client() -> Client {
        build_http_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_read_aggregated_news_keeps_category_order() {
        let (base, _) = spawn_api().await;
        let provider = HttpNewsProvider::new(client(), base);

        let news = provider.read_aggregated_news().await.unwrap();
        assert_eq!(news.categories().collect::<Vec<_>>(), vec!["Technology", "Sports"]);
        assert_eq!(crate::models::fixtures::group(&news, "Sports")[0].title, "Final");
    }

    #[tokio::test]
    async fn test_trigger_aggregation_posts_to_fetch() {
        let (base, state) = spawn_api().await;
        let provider = HttpNewsProvider::new(client(), base);

        provider.trigger_aggregation().await.unwrap();
        provider.trigger_aggregation().await.unwrap();
        assert_eq!(*state.triggers.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_server_error_body_becomes_status_error() {
        let app = Router::new().route(
            "/api/news",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Failed to fetch news"})),
                )
            }),
        );
        let provider = HttpNewsProvider::new(client(), spawn_server(app).await);

        let err = provider.read_aggregated_news().await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 500, .. }));
        assert_eq!(err.server_message(), None);
    }

    #[tokio::test]
    async fn test_status_label_is_not_a_user_message() {
        let app = Router::new().route(
            "/api/subscriptions",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "timestamp": "2025-05-06T10:00:00.000+00:00",
                        "status": 500,
                        "error": "Internal Server Error",
                        "path": "/api/subscriptions"
                    })),
                )
            }),
        );
        let provider = HttpSubscriptionProvider::new(client(), spawn_server(app).await);
        let (form, _handle) = SubscriptionForm::open(provider);
        form.set_email("a@b.com");
        form.toggle_category("sports");

        assert_eq!(form.submit().await, SubmitOutcome::Failed);
        let state = form.state();
        assert_eq!(state.message.as_deref(), Some(DEFAULT_ERROR_MESSAGE));
        assert!(!state.closed);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let app = Router::new().route("/api/news", get(|| async { "not json" }));
        let provider = HttpNewsProvider::new(client(), spawn_server(app).await);

        let err = provider.read_aggregated_news().await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_body_without_news_is_decode_error() {
        let app = Router::new().route(
            "/api/news",
            get(|| async { Json(json!({"totalCategories": 0, "totalArticles": 0})) }),
        );
        let provider = HttpNewsProvider::new(client(), spawn_server(app).await);

        let err = provider.read_aggregated_news().await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_create_subscription_sends_request_and_reports_conflict() {
        let (base, state) = spawn_api().await;
        let provider = HttpSubscriptionProvider::new(client(), base);
        let request = SubscriptionRequest {
            email: "a@b.com".to_string(),
            categories: vec!["sports".to_string(), "technology".to_string()],
        };

        let reply = provider.create_subscription(request.clone()).await.unwrap();
        assert_eq!(reply.message, None);
        assert_eq!(state.subscriptions.lock().unwrap().as_slice(), &[request.clone()]);

        let err = provider.create_subscription(request).await.unwrap_err();
        assert_eq!(err.server_message(), Some("Email already subscribed"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let base = Url::parse(&format!("http://{addr}/")).unwrap();
        let provider = HttpNewsProvider::new(client(), base);

        let err = provider.trigger_aggregation().await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}

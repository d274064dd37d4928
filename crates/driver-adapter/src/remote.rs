//! JSON bridge to an out-of-process browser driver service.
//!
//! The concrete browser (CDP, WebDriver, Playwright sidecar) lives behind a
//! small HTTP surface; this adapter only shuttles requests and maps the
//! service's error codes onto [`DriverErrorKind`]. Wire format details stay
//! on the service side.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::driver::BrowserDriver;
use crate::errors::{DriverError, DriverErrorKind};
use crate::model::{ElementDescriptor, EventKind, ImageFormat, Screenshot};

/// Connection settings for the driver service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteDriverConfig {
    /// Base URL of the driver service, e.g. `http://127.0.0.1:9515`.
    pub base_url: String,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for RemoteDriverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9515".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Driver implementation backed by a remote service.
pub struct RemoteDriver {
    cfg: RemoteDriverConfig,
    client: reqwest::Client,
    session: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct SessionResponse {
    session: String,
}

#[derive(Deserialize)]
struct UrlResponse {
    url: String,
}

#[derive(Deserialize)]
struct LoadResponse {
    loaded: bool,
}

#[derive(Deserialize)]
struct ElementsResponse {
    elements: Vec<ElementDescriptor>,
}

#[derive(Deserialize)]
struct ScreenshotResponse {
    data: String,
    format: ImageFormat,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl RemoteDriver {
    pub fn new(cfg: RemoteDriverConfig) -> Result<Self, DriverError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| {
                DriverError::new(DriverErrorKind::Internal).with_hint(e.to_string())
            })?;
        Ok(Self {
            cfg,
            client,
            session: Mutex::new(None),
        })
    }

    async fn session_path(&self, suffix: &str) -> Result<String, DriverError> {
        let session = self.session.lock().await;
        let id = session.as_ref().ok_or_else(|| {
            DriverError::new(DriverErrorKind::SessionClosed).with_hint("no session open")
        })?;
        Ok(format!("{}/session/{}/{}", self.cfg.base_url, id, suffix))
    }

    async fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<reqwest::Response, DriverError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, DriverError> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        check_status(response).await
    }
}

fn transport_error(err: reqwest::Error) -> DriverError {
    let kind = if err.is_timeout() {
        DriverErrorKind::NavTimeout
    } else {
        DriverErrorKind::Io
    };
    DriverError::new(kind).with_hint(err.to_string()).retriable(true)
}

/// Map a non-success response onto the driver error taxonomy.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DriverError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: ErrorBody = response.json().await.unwrap_or(ErrorBody {
        code: None,
        message: None,
    });
    let kind = match body.code.as_deref() {
        Some("not_found") => DriverErrorKind::TargetNotFound,
        Some("intercepted") => DriverErrorKind::ClickIntercepted,
        Some("nav_timeout") => DriverErrorKind::NavTimeout,
        Some("session_closed") => DriverErrorKind::SessionClosed,
        _ => DriverErrorKind::Protocol,
    };
    let hint = body
        .message
        .unwrap_or_else(|| format!("driver service returned {status}"));
    Err(DriverError::new(kind).with_hint(hint))
}

#[async_trait]
impl BrowserDriver for RemoteDriver {
    async fn open(&self) -> Result<(), DriverError> {
        let url = format!("{}/session", self.cfg.base_url);
        let response = self.post(&url, &serde_json::json!({})).await?;
        let parsed: SessionResponse = response.json().await.map_err(transport_error)?;
        debug!(session = %parsed.session, "driver session opened");
        *self.session.lock().await = Some(parsed.session);
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let path = self.session_path("navigate").await?;
        self.post(&path, &serde_json::json!({ "url": url })).await?;
        Ok(())
    }

    async fn wait_for_load(&self, timeout: Duration) -> Result<bool, DriverError> {
        let path = self.session_path("wait-load").await?;
        let response = self
            .post(
                &path,
                &serde_json::json!({ "timeout_ms": timeout.as_millis() as u64 }),
            )
            .await?;
        let parsed: LoadResponse = response.json().await.map_err(transport_error)?;
        Ok(parsed.loaded)
    }

    async fn extract_elements(&self) -> Result<Vec<ElementDescriptor>, DriverError> {
        let path = self.session_path("elements").await?;
        let response = self.get(&path).await?;
        let parsed: ElementsResponse = response.json().await.map_err(transport_error)?;
        Ok(parsed.elements)
    }

    async fn screenshot(&self) -> Result<Screenshot, DriverError> {
        let path = self.session_path("screenshot").await?;
        let response = self.get(&path).await?;
        let parsed: ScreenshotResponse = response.json().await.map_err(transport_error)?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(parsed.data.as_bytes())
            .map_err(|e| DriverError::new(DriverErrorKind::Protocol).with_hint(e.to_string()))?;
        Ok(Screenshot {
            bytes,
            format: parsed.format,
        })
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let path = self.session_path("click").await?;
        self.post(&path, &serde_json::json!({ "selector": selector }))
            .await?;
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let path = self.session_path("type").await?;
        self.post(
            &path,
            &serde_json::json!({ "selector": selector, "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn scroll(&self, selector: &str) -> Result<(), DriverError> {
        let path = self.session_path("scroll").await?;
        self.post(&path, &serde_json::json!({ "selector": selector }))
            .await?;
        Ok(())
    }

    async fn dispatch_event(&self, selector: &str, kind: EventKind) -> Result<(), DriverError> {
        let path = self.session_path("dispatch").await?;
        self.post(
            &path,
            &serde_json::json!({ "selector": selector, "event": kind }),
        )
        .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let path = self.session_path("url").await?;
        let response = self.get(&path).await?;
        let parsed: UrlResponse = response.json().await.map_err(transport_error)?;
        Ok(parsed.url)
    }

    async fn close(&self) -> Result<(), DriverError> {
        let mut session = self.session.lock().await;
        if let Some(id) = session.take() {
            let url = format!("{}/session/{}", self.cfg.base_url, id);
            let response = self.client.delete(&url).send().await.map_err(transport_error)?;
            check_status(response).await?;
        }
        Ok(())
    }
}

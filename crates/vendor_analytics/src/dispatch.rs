use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{
    config::AnalyticsConfig,
    error::TransportError,
    request::PageContext,
    transport::Transport,
    validate::{ValidatedClick, ValidatedVisit},
};

/// Visit body sent to `<endpoint>/visit`. `plan` and `tier` are never both set.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct VisitPayload {
    pub vendor: String,
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    pub url: String,
    pub referrer: String,
}

impl VisitPayload {
    pub fn new(visit: &ValidatedVisit, page: &PageContext) -> Self {
        let placements = (!visit.placements().is_empty())
            .then(|| visit.placements().iter().cloned().collect());
        Self {
            vendor: visit.vendor().to_string(),
            page: visit.page().to_string(),
            plan: visit.plan().plan().map(str::to_string),
            placements,
            tier: visit.plan().tier().map(str::to_string),
            url: page.url.clone(),
            referrer: page.referrer.clone(),
        }
    }
}

/// Click body sent to `<endpoint>/click`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ClickPayload {
    pub vendor: String,
    #[serde(rename = "type")]
    pub click_type: String,
    pub url: String,
}

impl ClickPayload {
    pub fn new(click: &ValidatedClick, page: &PageContext) -> Self {
        Self {
            vendor: click.vendor().to_string(),
            click_type: click.click_type().to_string(),
            url: page.url.clone(),
        }
    }
}

/// Handle to a fire-and-forget send. It carries no result; awaiting [`Detached::settled`]
/// only waits for the attempt to finish, it never reports whether delivery worked.
#[derive(Debug, Default)]
pub struct Detached(Option<JoinHandle<()>>);

impl Detached {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Self(Some(handle.spawn(future))),
            Err(_) => {
                debug!("no tokio runtime; analytics task dropped");
                Self(None)
            }
        }
    }

    pub(crate) fn none() -> Self {
        Self(None)
    }

    /// True when a background task was actually started.
    pub fn is_scheduled(&self) -> bool {
        self.0.is_some()
    }

    pub async fn settled(self) {
        if let Some(handle) = self.0 {
            let _ = handle.await;
        }
    }
}

/// Posts validated events to the collection worker without ever surfacing a failure.
#[derive(Clone)]
pub struct EventDispatcher {
    transport: Arc<dyn Transport>,
    visit_url: String,
    click_url: String,
}

impl EventDispatcher {
    pub fn new(transport: Arc<dyn Transport>, config: &AnalyticsConfig) -> Self {
        Self {
            transport,
            visit_url: config.visit_url(),
            click_url: config.click_url(),
        }
    }

    pub fn send_visit(&self, visit: &ValidatedVisit, page: &PageContext) -> Detached {
        self.post(self.visit_url.clone(), &VisitPayload::new(visit, page))
    }

    pub fn send_click(&self, click: &ValidatedClick, page: &PageContext) -> Detached {
        self.post(self.click_url.clone(), &ClickPayload::new(click, page))
    }

    fn post<T: Serialize>(&self, url: String, payload: &T) -> Detached {
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(error) => {
                debug!(%url, %error, "analytics payload serialization failed");
                return Detached::none();
            }
        };
        let transport = Arc::clone(&self.transport);
        Detached::spawn(async move {
            match transport.post_json(url.clone(), body).await {
                Ok(status) if (200..300).contains(&status) => {}
                Ok(status) => debug!(%url, status, "analytics endpoint returned non-success"),
                Err(error) => debug!(%url, %error, "analytics send failed"),
            }
        })
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("visit_url", &self.visit_url)
            .field("click_url", &self.click_url)
            .finish()
    }
}

/// Builds an outbound link that routes through the collection worker:
/// `<endpoint>/click?vendor=..&type=..&to=<destination>`.
pub fn tracked_click_url(
    config: &AnalyticsConfig,
    click: &ValidatedClick,
    destination: &str,
) -> Result<String, TransportError> {
    let base = config.click_url();
    let mut url = reqwest::Url::parse(&base).map_err(|e| TransportError::InvalidUrl {
        url: base.clone(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("vendor", click.vendor())
        .append_pair("type", click.click_type())
        .append_pair("to", destination);
    Ok(url.to_string())
}

use std::sync::Arc;

use tracing::debug;

use crate::{
    config::AnalyticsConfig,
    dispatch::{tracked_click_url, Detached, EventDispatcher},
    error::Rejection,
    request::{ClickRequest, PageContext, VisitRequest},
    store::SchemaStore,
    transport::{ReqwestTransport, Transport},
    validate::{validate_click, validate_visit, ValidatedClick, ValidatedVisit},
};

/// Page-facing entry point: load schema, normalize, validate, dispatch.
///
/// ```rust,no_run
/// use vendor_analytics::{Analytics, PageContext, VisitRequest};
/// # #[tokio::main]
/// # async fn main() {
/// let analytics = Analytics::builder()
///     .page(PageContext::new("https://startmyloveengine.com/directory/dave-blake"))
///     .build();
/// analytics.prime();
/// analytics.track_visit(VisitRequest::new("dave-blake", "profile").plan("featured"));
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Analytics {
    config: AnalyticsConfig,
    store: Arc<SchemaStore>,
    dispatcher: EventDispatcher,
    page: Arc<PageContext>,
}

/// Builder for [`Analytics`].
///
/// Starts from [`AnalyticsConfig::from_env`], so `ANALYTICS_ENDPOINT` and
/// `ANALYTICS_SCHEMA_URL` apply unless [`AnalyticsBuilder::config`] replaces the config.
#[derive(Clone)]
pub struct AnalyticsBuilder {
    config: AnalyticsConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<SchemaStore>>,
    page: PageContext,
}

impl Default for AnalyticsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsBuilder {
    pub fn new() -> Self {
        Self {
            config: AnalyticsConfig::from_env(),
            transport: None,
            store: None,
            page: PageContext::default(),
        }
    }

    pub fn config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default `reqwest` transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Shares an existing store instead of creating one from `config.schema_url`.
    pub fn store(mut self, store: Arc<SchemaStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn page(mut self, page: PageContext) -> Self {
        self.page = page;
        self
    }

    pub fn build(self) -> Analytics {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new(self.config.timeout())));
        let store = self.store.unwrap_or_else(|| {
            Arc::new(SchemaStore::new(
                Arc::clone(&transport),
                self.config.schema_url.clone(),
            ))
        });
        Analytics {
            dispatcher: EventDispatcher::new(transport, &self.config),
            config: self.config,
            store,
            page: Arc::new(self.page),
        }
    }
}

impl Analytics {
    pub fn builder() -> AnalyticsBuilder {
        AnalyticsBuilder::new()
    }

    pub fn store(&self) -> &Arc<SchemaStore> {
        &self.store
    }

    pub fn page(&self) -> &PageContext {
        &self.page
    }

    /// Warms the schema cache ahead of the first event.
    pub fn prime(&self) {
        self.store.prime();
    }

    pub async fn check_visit(&self, request: &VisitRequest) -> Result<ValidatedVisit, Rejection> {
        let schema = self.store.load().await;
        validate_visit(request, &schema)
    }

    /// Validates a click, filling a missing vendor from the page.
    pub async fn check_click(&self, request: ClickRequest) -> Result<ValidatedClick, Rejection> {
        let request = request.with_default_vendor(self.page.vendor.as_deref());
        let schema = self.store.load().await;
        validate_click(&request, &schema)
    }

    /// Records a visit in the background. Rejected visits are logged and dropped.
    pub fn track_visit(&self, request: VisitRequest) -> Detached {
        let this = self.clone();
        Detached::spawn(async move {
            match this.check_visit(&request).await {
                Ok(visit) => this.dispatcher.send_visit(&visit, &this.page).settled().await,
                Err(reason) => debug!(%reason, "analytics visit dropped"),
            }
        })
    }

    /// Records an outbound click in the background. Rejected clicks are logged and dropped.
    pub fn track_click(&self, request: ClickRequest) -> Detached {
        let this = self.clone();
        Detached::spawn(async move {
            match this.check_click(request).await {
                Ok(click) => this.dispatcher.send_click(&click, &this.page).settled().await,
                Err(reason) => debug!(%reason, "analytics click dropped"),
            }
        })
    }

    /// Outbound URL routed through the click endpoint, or `None` when the click is rejected.
    pub async fn tracked_url(&self, request: ClickRequest, destination: &str) -> Option<String> {
        let click = match self.check_click(request).await {
            Ok(click) => click,
            Err(reason) => {
                debug!(%reason, "tracked link not built");
                return None;
            }
        };
        tracked_click_url(&self.config, &click, destination)
            .map_err(|error| debug!(%error, "tracked link not built"))
            .ok()
    }
}

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::{error::SchemaLoadError, schema::Schema, transport::Transport};

/// Load-once holder for the allowlist schema.
///
/// The first caller of [`SchemaStore::load`] issues the fetch; concurrent callers await the same
/// in-flight load and later callers get the cached value. A failed fetch settles the store on
/// [`Schema::empty`] for the rest of its lifetime, so every event is rejected rather than
/// accepted. Construct a fresh store to start over (tests do this per case).
pub struct SchemaStore {
    transport: Arc<dyn Transport>,
    schema_url: String,
    cell: OnceCell<Arc<Schema>>,
}

impl SchemaStore {
    pub fn new(transport: Arc<dyn Transport>, schema_url: impl Into<String>) -> Self {
        Self {
            transport,
            schema_url: schema_url.into(),
            cell: OnceCell::new(),
        }
    }

    /// A store that is already settled on `schema`; no fetch is ever issued.
    pub fn preloaded(transport: Arc<dyn Transport>, schema: Schema) -> Self {
        Self {
            transport,
            schema_url: String::new(),
            cell: OnceCell::new_with(Some(Arc::new(schema))),
        }
    }

    pub fn schema_url(&self) -> &str {
        &self.schema_url
    }

    /// Returns the schema, fetching it on first use.
    pub async fn load(&self) -> Arc<Schema> {
        self.cell
            .get_or_init(|| async {
                match self.fetch().await {
                    Ok(schema) => {
                        debug!(url = %self.schema_url, "analytics schema loaded");
                        Arc::new(schema)
                    }
                    Err(error) => {
                        warn!(
                            url = %self.schema_url,
                            %error,
                            "analytics schema unavailable; rejecting all events"
                        );
                        Arc::new(Schema::empty())
                    }
                }
            })
            .await
            .clone()
    }

    /// The settled schema, if a load has completed.
    pub fn cached(&self) -> Option<Arc<Schema>> {
        self.cell.get().cloned()
    }

    /// Starts the load in the background so the first event does not wait on it.
    ///
    /// Without a tokio runtime this is a no-op; the first [`Self::load`] fetches instead.
    pub fn prime(self: &Arc<Self>) {
        if self.cell.initialized() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(self);
                handle.spawn(async move {
                    store.load().await;
                });
            }
            Err(_) => debug!("no tokio runtime; schema prime skipped"),
        }
    }

    async fn fetch(&self) -> Result<Schema, SchemaLoadError> {
        let response = self.transport.get(self.schema_url.clone(), None).await?;
        if !response.is_success() {
            return Err(SchemaLoadError::Status {
                url: self.schema_url.clone(),
                status: response.status,
            });
        }
        Schema::from_json_slice(&response.body)
    }
}

impl std::fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaStore")
            .field("schema_url", &self.schema_url)
            .field("loaded", &self.cell.initialized())
            .finish()
    }
}

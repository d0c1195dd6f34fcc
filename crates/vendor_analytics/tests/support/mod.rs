#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use serde_json::{json, Value};
use vendor_analytics::{HttpResponse, Transport, TransportError, TransportFuture};

pub const PAGE_URL: &str = "https://startmyloveengine.com/directory/dave-blake";
pub const REFERRER: &str = "https://startmyloveengine.com/";
pub const SCHEMA_URL: &str = "https://startmyloveengine.com/config/analytics.json";

pub fn schema_document() -> Value {
    json!({
        "allowedPages": ["profile"],
        "allowedPlans": ["featured", "basic", "unpaid"],
        "allowedPlacements": ["spotlight", "homepage"],
        "allowedClickTypes": ["website", "phone", "email"],
        "vendorSlugRegex": "^[a-z0-9-]+$",
    })
}

pub fn json_response(status: u16, body: &Value) -> HttpResponse {
    HttpResponse {
        status,
        content_type: Some("application/json".to_string()),
        body: serde_json::to_vec(body).expect("serialize fixture"),
    }
}

enum GetBehavior {
    Respond(HttpResponse),
    Fail,
}

/// In-memory transport: serves one canned GET response and records every POST.
pub struct FakeTransport {
    get: GetBehavior,
    get_delay: Duration,
    post_status: Option<u16>,
    gets: AtomicUsize,
    get_urls: Mutex<Vec<String>>,
    bearers: Mutex<Vec<Option<String>>>,
    posts: Mutex<Vec<(String, Value)>>,
}

impl FakeTransport {
    pub fn serving(response: HttpResponse) -> Self {
        Self {
            get: GetBehavior::Respond(response),
            get_delay: Duration::ZERO,
            post_status: Some(204),
            gets: AtomicUsize::new(0),
            get_urls: Mutex::new(Vec::new()),
            bearers: Mutex::new(Vec::new()),
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_schema() -> Self {
        Self::serving(json_response(200, &schema_document()))
    }

    pub fn unreachable() -> Self {
        Self {
            get: GetBehavior::Fail,
            ..Self::with_schema()
        }
    }

    pub fn get_delay(mut self, delay: Duration) -> Self {
        self.get_delay = delay;
        self
    }

    /// Every POST fails at the network layer.
    pub fn failing_posts(mut self) -> Self {
        self.post_status = None;
        self
    }

    pub fn post_status(mut self, status: u16) -> Self {
        self.post_status = Some(status);
        self
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn get_urls(&self) -> Vec<String> {
        self.get_urls.lock().unwrap().clone()
    }

    pub fn bearers(&self) -> Vec<Option<String>> {
        self.bearers.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn posts_to(&self, url: &str) -> Vec<Value> {
        self.posts()
            .into_iter()
            .filter(|(posted, _)| posted == url)
            .map(|(_, body)| body)
            .collect()
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: String, bearer: Option<String>) -> TransportFuture<'_, HttpResponse> {
        Box::pin(async move {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.get_urls.lock().unwrap().push(url.clone());
            self.bearers.lock().unwrap().push(bearer);
            if !self.get_delay.is_zero() {
                tokio::time::sleep(self.get_delay).await;
            }
            match &self.get {
                GetBehavior::Respond(response) => Ok(response.clone()),
                GetBehavior::Fail => Err(TransportError::Request {
                    url,
                    reason: "connection refused".to_string(),
                }),
            }
        })
    }

    fn post_json(&self, url: String, body: Vec<u8>) -> TransportFuture<'_, u16> {
        Box::pin(async move {
            let value: Value = serde_json::from_slice(&body).expect("posted body is JSON");
            self.posts.lock().unwrap().push((url.clone(), value));
            self.post_status.ok_or(TransportError::Request {
                url,
                reason: "connection reset".to_string(),
            })
        })
    }
}

pub fn shared(transport: FakeTransport) -> (Arc<FakeTransport>, Arc<dyn Transport>) {
    let concrete = Arc::new(transport);
    let erased: Arc<dyn Transport> = concrete.clone();
    (concrete, erased)
}

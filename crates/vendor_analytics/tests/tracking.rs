mod support;

use std::sync::Arc;

use serde_json::json;
use support::*;
use vendor_analytics::{
    Analytics, AnalyticsConfig, ClickRequest, PageContext, Rejection, VisitRequest,
};

const VISIT_URL: &str = "https://go.startmyloveengine.com/visit";
const CLICK_URL: &str = "https://go.startmyloveengine.com/click";

fn analytics(fake: FakeTransport) -> (Arc<FakeTransport>, Analytics) {
    let (fake, transport) = shared(fake);
    let config = AnalyticsConfig {
        schema_url: SCHEMA_URL.to_string(),
        ..AnalyticsConfig::default()
    };
    let analytics = Analytics::builder()
        .config(config)
        .transport(transport)
        .page(PageContext::new(PAGE_URL).referrer(REFERRER).vendor("dave-blake"))
        .build();
    (fake, analytics)
}

#[tokio::test]
async fn visit_sends_plan_and_placements_without_tier() {
    let (fake, analytics) = analytics(FakeTransport::with_schema());
    analytics.prime();

    analytics
        .track_visit(
            VisitRequest::new("dave-blake", "profile")
                .plan("featured")
                .placements(json!(["spotlight"]))
                .tier("featured"),
        )
        .settled()
        .await;

    let visits = fake.posts_to(VISIT_URL);
    assert_eq!(visits.len(), 1);
    assert_eq!(
        visits[0],
        json!({
            "vendor": "dave-blake",
            "page": "profile",
            "plan": "featured",
            "placements": ["spotlight"],
            "url": PAGE_URL,
            "referrer": REFERRER,
        })
    );
    assert_eq!(fake.get_count(), 1);
}

#[tokio::test]
async fn visit_falls_back_to_tier_when_plan_missing() {
    let (fake, analytics) = analytics(FakeTransport::with_schema());

    analytics
        .track_visit(VisitRequest::new("dave-blake", "profile").tier("featured"))
        .settled()
        .await;

    let visits = fake.posts_to(VISIT_URL);
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0]["tier"], json!("featured"));
    assert!(visits[0].get("plan").is_none());
}

#[tokio::test]
async fn invalid_vendor_or_page_is_never_sent() {
    let strict = json!({
        "allowedPages": ["profile"],
        "allowedPlans": ["featured"],
        "vendorSlugRegex": "[a-z]+",
    });
    let (fake, analytics) = analytics(FakeTransport::serving(json_response(200, &strict)));

    analytics
        .track_visit(VisitRequest::new("Bad Vendor", "profile").tier("featured"))
        .settled()
        .await;
    analytics
        .track_visit(VisitRequest::new("dave", "blog"))
        .settled()
        .await;

    assert!(fake.posts().is_empty());
    assert_eq!(
        analytics
            .check_visit(&VisitRequest::new("Bad Vendor", "profile"))
            .await
            .unwrap_err(),
        Rejection::VendorPattern {
            vendor: "bad-vendor".to_string()
        }
    );
}

#[tokio::test]
async fn click_sends_type_and_url_only() {
    let (fake, analytics) = analytics(FakeTransport::with_schema());

    analytics
        .track_click(ClickRequest::new("dave-blake", "website").tier("featured"))
        .settled()
        .await;

    assert_eq!(
        fake.posts_to(CLICK_URL),
        vec![json!({
            "vendor": "dave-blake",
            "type": "website",
            "url": PAGE_URL,
        })]
    );
}

#[tokio::test]
async fn click_with_unknown_type_is_skipped() {
    let (fake, analytics) = analytics(FakeTransport::with_schema());

    analytics
        .track_click(ClickRequest::new("dave-blake", "twitter"))
        .settled()
        .await;

    assert!(fake.posts().is_empty());
}

#[tokio::test]
async fn click_without_vendor_uses_page_vendor() {
    let (fake, analytics) = analytics(FakeTransport::with_schema());

    analytics
        .track_click(ClickRequest::for_page("phone"))
        .settled()
        .await;

    let clicks = fake.posts_to(CLICK_URL);
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0]["vendor"], json!("dave-blake"));
}

#[tokio::test]
async fn unreachable_schema_drops_everything() {
    let (fake, analytics) = analytics(FakeTransport::unreachable());

    analytics
        .track_visit(VisitRequest::new("dave-blake", "profile").plan("featured"))
        .settled()
        .await;
    analytics
        .track_click(ClickRequest::new("dave-blake", "website"))
        .settled()
        .await;

    assert!(fake.posts().is_empty());
    assert_eq!(fake.get_count(), 1);
}

#[tokio::test]
async fn delivery_failures_are_swallowed() {
    for fake in [
        FakeTransport::with_schema().failing_posts(),
        FakeTransport::with_schema().post_status(503),
    ] {
        let (fake, analytics) = analytics(fake);
        analytics
            .track_visit(VisitRequest::new("dave-blake", "profile"))
            .settled()
            .await;
        analytics
            .track_click(ClickRequest::new("dave-blake", "email"))
            .settled()
            .await;
        // One attempt each, no retries.
        assert_eq!(fake.posts().len(), 2);
    }
}

#[tokio::test]
async fn many_events_share_one_schema_fetch() {
    let (fake, analytics) = analytics(FakeTransport::with_schema());

    let handles: Vec<_> = (0..5)
        .map(|_| analytics.track_click(ClickRequest::new("dave-blake", "website")))
        .collect();
    for handle in handles {
        handle.settled().await;
    }

    assert_eq!(fake.get_count(), 1);
    assert_eq!(fake.posts_to(CLICK_URL).len(), 5);
}

#[tokio::test]
async fn tracked_url_only_for_valid_clicks() {
    let (_, analytics) = analytics(FakeTransport::with_schema());

    let url = analytics
        .tracked_url(ClickRequest::for_page("website"), "https://daveblake.example/")
        .await
        .unwrap();
    assert_eq!(
        url,
        "https://go.startmyloveengine.com/click?vendor=dave-blake&type=website&to=https%3A%2F%2Fdaveblake.example%2F"
    );

    assert!(analytics
        .tracked_url(ClickRequest::new("dave-blake", "twitter"), "https://x.example/")
        .await
        .is_none());
}

#[test]
fn tracking_without_a_runtime_is_a_no_op() {
    let (fake, analytics) = analytics(FakeTransport::with_schema());
    let handle = analytics.track_visit(VisitRequest::new("dave-blake", "profile"));
    assert!(!handle.is_scheduled());
    analytics.prime();
    assert_eq!(fake.get_count(), 0);
}

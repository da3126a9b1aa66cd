mod common;

use common::{strings, Listing, ScriptedSource};
use price_feeder::error::{Error, ListingFaultKind};
use price_feeder::price_infra::connectors::SourceRegistry;
use price_feeder::price_infra::SourceFilter;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn registry(sources: Vec<ScriptedSource>) -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    for source in sources {
        registry.register_handle(source.handle()).unwrap();
    }
    registry
}

#[tokio::test]
async fn test_every_target_pair_is_keyed() {
    let registry = registry(vec![ScriptedSource::new("upbit").lists(&["LUNA/KRW", "BTC/KRW"])]);
    let filter = SourceFilter::new(Arc::new(registry), "LUNA");

    let outcome = filter.filter(&strings(&["upbit"]), &strings(&["KRW", "USD", "MNT"])).await;

    assert_eq!(outcome.capabilities.len(), 3);
    assert_eq!(outcome.capabilities.source_ids("LUNA/KRW"), vec!["upbit".to_string()]);
    assert!(outcome.capabilities.contains_pair("LUNA/USD"));
    assert!(outcome.capabilities.sources("LUNA/USD").is_empty());
    assert!(outcome.capabilities.contains_pair("LUNA/MNT"));
    assert!(!outcome.capabilities.contains_pair("BTC/KRW"));
}

#[tokio::test]
async fn test_no_candidates_still_seeds_pairs() {
    let filter = SourceFilter::new(Arc::new(SourceRegistry::new()), "LUNA");

    let outcome = filter.filter(&[], &strings(&["KRW"])).await;

    assert!(outcome.capabilities.contains_pair("LUNA/KRW"));
    assert!(outcome.capabilities.sources("LUNA/KRW").is_empty());
}

#[tokio::test]
async fn test_blacklisted_source_is_never_instantiated() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let banned = ScriptedSource::new("bitfinex").lists(&["LUNA/KRW"]).handle();

    let mut registry = registry(vec![ScriptedSource::new("upbit").lists(&["LUNA/KRW"])]);
    let counter = constructed.clone();
    registry
        .register("bitfinex", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(banned.clone())
        })
        .unwrap();

    let filter = SourceFilter::new(Arc::new(registry), "LUNA")
        .with_blacklist(strings(&["bitfinex"]));
    let outcome = filter.filter(&strings(&["bitfinex", "upbit"]), &strings(&["KRW"])).await;

    assert_eq!(outcome.capabilities.source_ids("LUNA/KRW"), vec!["upbit".to_string()]);
    assert_eq!(outcome.blacklisted, vec!["bitfinex".to_string()]);
    assert_eq!(constructed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_listings_are_skipped_without_aborting() {
    let registry = registry(vec![
        ScriptedSource::new("empty"),
        ScriptedSource::new("scalar").listing(Listing::Markets(json!("LUNA/KRW"))),
        ScriptedSource::new("strings").listing(Listing::Markets(json!(["LUNA/KRW"]))),
        ScriptedSource::new("nosymbol")
            .listing(Listing::Markets(json!([{ "symbol": "LUNA/KRW" }, { "id": "lunakrw" }]))),
        ScriptedSource::new("healthy").lists(&["LUNA/KRW"]),
    ]);
    let filter = SourceFilter::new(Arc::new(registry), "LUNA");

    let outcome = filter
        .filter(
            &strings(&["empty", "scalar", "strings", "nosymbol", "healthy"]),
            &strings(&["KRW"]),
        )
        .await;

    assert_eq!(outcome.capabilities.source_ids("LUNA/KRW"), vec!["healthy".to_string()]);

    let kinds: Vec<(String, ListingFaultKind)> = outcome.listing_faults
        .iter()
        .map(|f| (f.source_id.clone(), f.kind.clone()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("empty".to_string(), ListingFaultKind::Empty),
            ("scalar".to_string(), ListingFaultKind::NotAList),
            ("strings".to_string(), ListingFaultKind::NotARecord),
            ("nosymbol".to_string(), ListingFaultKind::MissingSymbol { index: 1 }),
        ]
    );
}

#[tokio::test]
async fn test_unreachable_sources_are_silently_excluded() {
    let mut registry = registry(vec![
        ScriptedSource::new("down").listing(Listing::Fail),
        ScriptedSource::new("stuck").listing(Listing::Hang),
        ScriptedSource::new("healthy").lists(&["LUNA/KRW"]),
    ]);
    registry
        .register("keyless", || Err(Error::Authentication("missing api key".to_string())))
        .unwrap();

    let filter = SourceFilter::new(Arc::new(registry), "LUNA")
        .with_listing_timeout(Duration::from_millis(50));
    let outcome = filter
        .filter(
            &strings(&["down", "stuck", "keyless", "ghost", "healthy"]),
            &strings(&["KRW"]),
        )
        .await;

    assert_eq!(outcome.capabilities.source_ids("LUNA/KRW"), vec!["healthy".to_string()]);
    assert!(outcome.listing_faults.is_empty());
    assert_eq!(outcome.unavailable, strings(&["down", "stuck", "keyless", "ghost"]));
}

#[tokio::test]
async fn test_source_order_follows_candidates() {
    let registry = registry(vec![
        ScriptedSource::new("slow").listing(Listing::Delayed(
            Duration::from_millis(100),
            json!([{ "symbol": "LUNA/KRW" }]),
        )),
        ScriptedSource::new("fast").lists(&["LUNA/KRW"]),
        ScriptedSource::new("medium").listing(Listing::Delayed(
            Duration::from_millis(30),
            json!([{ "symbol": "LUNA/KRW" }]),
        )),
    ]);
    let filter = SourceFilter::new(Arc::new(registry), "LUNA").with_max_concurrency(3);

    let outcome = filter.filter(&strings(&["slow", "fast", "medium"]), &strings(&["KRW"])).await;

    assert_eq!(
        outcome.capabilities.source_ids("LUNA/KRW"),
        strings(&["slow", "fast", "medium"])
    );
}

#[tokio::test]
async fn test_keyed_listing_and_duplicate_symbols() {
    let registry = registry(vec![
        ScriptedSource::new("keyed").listing(Listing::Markets(json!({
            "LUNA-KRW": { "symbol": "LUNA/KRW" },
            "LUNA-USD": { "symbol": "LUNA/USD" },
        }))),
        ScriptedSource::new("dupes").lists(&["LUNA/KRW", "LUNA/KRW"]),
    ]);
    let filter = SourceFilter::new(Arc::new(registry), "LUNA");

    let outcome = filter.filter(&strings(&["keyed", "dupes"]), &strings(&["KRW", "USD"])).await;

    assert_eq!(outcome.capabilities.source_ids("LUNA/KRW"), strings(&["keyed", "dupes"]));
    assert_eq!(outcome.capabilities.source_ids("LUNA/USD"), strings(&["keyed"]));
}

#[tokio::test]
async fn test_source_without_last_price_is_excluded() {
    let registry = registry(vec![
        ScriptedSource::new("catalog_only").lists(&["LUNA/KRW"]).without_last_price(),
        ScriptedSource::new("upbit").lists(&["LUNA/KRW"]),
    ]);
    let filter = SourceFilter::new(Arc::new(registry), "LUNA");

    let outcome = filter.filter(&strings(&["catalog_only", "upbit"]), &strings(&["KRW"])).await;

    assert_eq!(outcome.capabilities.source_ids("LUNA/KRW"), strings(&["upbit"]));
}

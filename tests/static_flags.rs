use feature_flag_client::{
    ClientError, ClientOptions, FlagEvaluationClient, RecordingSink, StaticEvaluator,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_static_flags_through_client() {
    let evaluator = StaticEvaluator::new()
        .with_flag("featureNewUIComponents", true)
        .with_flag("legacyCheckout", false);
    let sink = Arc::new(RecordingSink::new());
    let client = FlagEvaluationClient::with_sink(
        evaluator,
        ClientOptions::default().with_cache_ttl(Duration::from_secs(60)),
        sink.clone(),
    );

    assert_eq!(client.evaluate("featureNewUIComponents").await, Ok(true));
    assert_eq!(client.evaluate("legacyCheckout").await, Ok(false));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_unknown_flag_falls_back_and_is_reported() {
    let sink = Arc::new(RecordingSink::new());
    let client =
        FlagEvaluationClient::with_sink(StaticEvaluator::new(), ClientOptions::default(), sink.clone());

    assert_eq!(client.evaluate("typoFlag").await, Ok(false));

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].flag.as_str(), "typoFlag");
    assert_eq!(records[0].cause.cause(), "flag_not_found");

    // Nothing is cached from a failure
    assert!(client.cached("typoFlag").is_none());
}

#[tokio::test]
async fn test_empty_name_is_rejected() {
    let client = FlagEvaluationClient::new(StaticEvaluator::new(), ClientOptions::default());
    assert!(matches!(
        client.evaluate("").await,
        Err(ClientError::InvalidArgument(_))
    ));
    assert_eq!(client.in_flight_len(), 0);
}

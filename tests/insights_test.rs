//! Integration tests for discussion insights
//!
//! Drives the analysis fetcher against a mock backend and checks the derived
//! bias ranking and perspective map.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use collective_intelligence_client::analysis::{
    AnalysisFetcher, AnalysisState, BiasTally, CoordinatePolicy, DiscussionInsights, FetchOutcome,
};
use collective_intelligence_client::api::ApiClient;
use collective_intelligence_client::config::{ApiConfig, RequestConfig};
use collective_intelligence_client::render;
use collective_intelligence_client::session::Session;
use collective_intelligence_client::AppError;

fn create_test_client(base_url: &str) -> ApiClient {
    let config = ApiConfig {
        base_url: format!("{}/api", base_url),
    };
    ApiClient::new(&config, RequestConfig { timeout_ms: 5000 }, Session::in_memory())
        .expect("Failed to create client")
}

fn record(id: &str, message_id: &str, values: &[f64], sentiment: f64, biases: &[(&str, f64)]) -> serde_json::Value {
    json!({
        "id": id,
        "message_id": message_id,
        "sentiment_score": sentiment,
        "perspective_vector": { "dimensions": [], "values": values },
        "detected_biases": {
            "biases": biases
                .iter()
                .map(|(name, confidence)| json!({ "name": name, "confidence": confidence, "evidence": "" }))
                .collect::<Vec<_>>()
        },
        "analyzed_at": "2024-03-01T12:00:00Z"
    })
}

fn applied(outcome: FetchOutcome) -> AnalysisState {
    match outcome {
        FetchOutcome::Applied(state) => state,
        FetchOutcome::Superseded { generation } => {
            panic!("Unexpectedly superseded at generation {}", generation)
        }
    }
}

#[tokio::test]
async fn test_404_resolves_to_empty_views() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/discussions/d1/analysis"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = AnalysisFetcher::new(create_test_client(&mock_server.uri()));
    let state = applied(fetcher.refresh("d1").await.unwrap());

    assert!(matches!(state, AnalysisState::Loaded { .. }));
    assert!(state.records().is_empty());
    assert!(state.error().is_none());

    let insights = DiscussionInsights::from_state(&state);
    assert!(render::bias_panel(&insights.biases()).contains(render::NO_BIASES));
    assert!(render::perspective_panel(insights.perspective_map(CoordinatePolicy::PassThrough).as_ref())
        .contains(render::NO_PERSPECTIVE_DATA));
}

#[tokio::test]
async fn test_404_with_offline_fixtures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/discussions/d1/analysis"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher =
        AnalysisFetcher::new(create_test_client(&mock_server.uri())).with_offline_fixtures(true);
    let state = applied(fetcher.refresh("d1").await.unwrap());
    let insights = DiscussionInsights::from_state(&state);

    assert_eq!(insights.records().len(), 1);
    assert_eq!(
        insights.biases(),
        vec![
            BiasTally {
                name: "Confirmation Bias".to_string(),
                count: 1
            },
            BiasTally {
                name: "Anchoring Bias".to_string(),
                count: 1
            },
        ]
    );
    // Fixture has no perspective coordinates
    assert!(insights.perspective_map(CoordinatePolicy::PassThrough).is_none());
}

#[tokio::test]
async fn test_failure_is_held_in_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/discussions/d1/analysis"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "You are not a member of this workspace"
        })))
        .mount(&mock_server)
        .await;

    let fetcher = AnalysisFetcher::new(create_test_client(&mock_server.uri()));
    let state = applied(fetcher.refresh("d1").await.unwrap());

    assert_eq!(state.error(), Some("You are not a member of this workspace"));
    assert!(state.records().is_empty());
    assert_eq!(fetcher.state().error(), state.error());
}

#[tokio::test]
async fn test_blank_discussion_id_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let fetcher = AnalysisFetcher::new(create_test_client(&mock_server.uri()));
    let result = fetcher.refresh("   ").await;

    assert!(matches!(result, Err(AppError::Validation { .. })));
    assert_eq!(fetcher.current_generation(), 0);
    assert!(matches!(fetcher.state(), AnalysisState::Idle));
}

#[tokio::test]
async fn test_every_refresh_refetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/discussions/d1/analysis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "analyses": [] })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = AnalysisFetcher::new(create_test_client(&mock_server.uri()));
    fetcher.refresh("d1").await.unwrap();
    fetcher.refresh("d1").await.unwrap();

    assert_eq!(fetcher.current_generation(), 2);
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/discussions/slow/analysis"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "analyses": [record("a1", "old-message", &[0.1, 0.1], 0.0, &[("Stale Bias", 0.9)])]
                }))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/discussions/fast/analysis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "analyses": [record("a2", "new-message", &[0.9, 0.9], 0.5, &[("Fresh Bias", 0.9)])]
        })))
        .mount(&mock_server)
        .await;

    let fetcher = AnalysisFetcher::new(create_test_client(&mock_server.uri()));

    let (slow, fast) = tokio::join!(fetcher.refresh("slow"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        fetcher.refresh("fast").await
    });

    assert!(matches!(slow.unwrap(), FetchOutcome::Superseded { generation: 1 }));
    assert!(matches!(fast.unwrap(), FetchOutcome::Applied(_)));

    match fetcher.state() {
        AnalysisState::Loaded {
            discussion_id,
            records,
        } => {
            assert_eq!(discussion_id, "fast");
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].message_id, "new-message");
        }
        other => panic!("Expected loaded state, got {:?}", other),
    }
}

#[tokio::test]
async fn test_one_fetch_feeds_both_views() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/discussions/d1/analysis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "analyses": [
                record("a1", "m-00000001", &[0.7, 0.3, 0.6, 0.2], 0.5, &[
                    ("Confirmation Bias", 0.7),
                    ("Confirmation Bias", 0.4),
                    ("Anchoring Bias", 0.2),
                ]),
                record("a2", "m-00000002", &[0.4], -0.2, &[]),
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = AnalysisFetcher::new(create_test_client(&mock_server.uri()));
    let state = applied(fetcher.refresh("d1").await.unwrap());
    let insights = DiscussionInsights::from_state(&state);

    assert_eq!(
        insights.biases(),
        vec![BiasTally {
            name: "Confirmation Bias".to_string(),
            count: 2
        }]
    );

    let map = insights
        .perspective_map(CoordinatePolicy::PassThrough)
        .expect("one plottable record");
    assert_eq!(map.points.len(), 1);
    assert!((map.points[0].cx - 147.0).abs() < 1e-9);
    assert!((map.points[0].cy - 112.0).abs() < 1e-9);

    let svg = render::perspective_svg(&map);
    assert!(svg.contains("<title>Message m-000000...\nSentiment: 0.50</title>"));
}

#[tokio::test]
async fn test_clamp_policy_keeps_points_in_frame() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/discussions/d1/analysis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "analyses": [record("a1", "m1", &[1.5, -0.5], 0.0, &[])]
        })))
        .mount(&mock_server)
        .await;

    let fetcher = AnalysisFetcher::new(create_test_client(&mock_server.uri()));
    let state = applied(fetcher.refresh("d1").await.unwrap());
    let insights = DiscussionInsights::from_state(&state);

    let passed = insights
        .perspective_map(CoordinatePolicy::PassThrough)
        .unwrap();
    assert!((passed.points[0].cx - 315.0).abs() < 1e-9);
    assert!((passed.points[0].cy - 240.0).abs() < 1e-9);

    let clamped = insights.perspective_map(CoordinatePolicy::Clamp).unwrap();
    assert!((clamped.points[0].cx - 210.0).abs() < 1e-9);
    assert!((clamped.points[0].cy - 160.0).abs() < 1e-9);
}

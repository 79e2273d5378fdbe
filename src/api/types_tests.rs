//! Unit tests for backend wire types.
//!
//! Tests decoding of the shapes the backend actually emits (naive
//! timestamps, nullable analysis columns, wrapped bias lists) and the
//! request bodies the client sends.

use super::types::*;
use chrono::{Datelike, Timelike};
use serde_json::json;

// AnalysisRecord tests
#[test]
fn test_analysis_record_backend_shape() {
    let record: AnalysisRecord = serde_json::from_value(json!({
        "id": "a-1",
        "message_id": "m-1",
        "sentiment_score": 0.5,
        "perspective_vector": {
            "dimensions": ["factual", "emotional", "logical", "intuitive"],
            "values": [0.7, 0.3, 0.6, 0.2]
        },
        "detected_biases": {
            "biases": [
                {"name": "Confirmation Bias", "confidence": 0.7, "evidence": "Sample evidence"}
            ]
        },
        "analyzed_at": "2024-03-01T10:15:30.123456"
    }))
    .unwrap();

    assert_eq!(record.message_id, "m-1");
    assert_eq!(record.perspective_vector.values.len(), 4);
    assert_eq!(record.detected_biases.biases[0].name, "Confirmation Bias");
    assert_eq!(record.analyzed_at.year(), 2024);
    assert_eq!(record.analyzed_at.hour(), 10);
}

#[test]
fn test_analysis_record_null_columns_default() {
    let record: AnalysisRecord = serde_json::from_value(json!({
        "id": "a-2",
        "message_id": "m-2",
        "sentiment_score": null,
        "perspective_vector": null,
        "detected_biases": null,
        "analyzed_at": "2024-03-01T10:15:30+00:00"
    }))
    .unwrap();

    assert_eq!(record.sentiment_score, 0.0);
    assert!(record.perspective_vector.values.is_empty());
    assert!(record.detected_biases.biases.is_empty());
}

#[test]
fn test_analysis_record_missing_columns_default() {
    let record: AnalysisRecord = serde_json::from_value(json!({
        "id": "a-3",
        "message_id": "m-3",
        "analyzed_at": "2024-03-01T10:15:30Z"
    }))
    .unwrap();

    assert!(record.detected_biases.biases.is_empty());
}

#[test]
fn test_analysis_record_rejects_bad_timestamp() {
    let result: Result<AnalysisRecord, _> = serde_json::from_value(json!({
        "id": "a-4",
        "message_id": "m-4",
        "analyzed_at": "yesterday"
    }));
    assert!(result.is_err());
}

#[test]
fn test_detected_bias_evidence_optional() {
    let bias: DetectedBias =
        serde_json::from_value(json!({"name": "Anchoring Bias", "confidence": 0.2})).unwrap();
    assert_eq!(bias.evidence, "");
}

#[test]
fn test_discussion_analysis_response_missing_analyses() {
    let response: DiscussionAnalysisResponse =
        serde_json::from_value(json!({"discussion_id": "d-1"})).unwrap();
    assert!(response.analyses.is_empty());

    let response: DiscussionAnalysisResponse =
        serde_json::from_value(json!({"analyses": null})).unwrap();
    assert!(response.analyses.is_empty());
}

#[test]
fn test_analysis_record_builder() {
    let record = AnalysisRecord::new("a", "m")
        .with_sentiment(-0.4)
        .with_values(vec![0.1, 0.9])
        .with_bias(DetectedBias::new("Groupthink", 0.8).with_evidence("everyone agrees"));

    assert_eq!(record.sentiment_score, -0.4);
    assert_eq!(record.perspective_vector.dimensions, vec!["dim_0", "dim_1"]);
    assert_eq!(record.detected_biases.biases[0].evidence, "everyone agrees");
}

// BiasDefinition tests
#[test]
fn test_bias_definition_null_patterns() {
    let def: BiasDefinition = serde_json::from_value(json!({
        "id": "b-1",
        "name": "Sunk Cost Fallacy",
        "description": "Continuing because of prior investment",
        "detection_patterns": null,
        "mitigation_strategies": null
    }))
    .unwrap();
    assert!(def.detection_patterns.is_empty());
    assert!(def.mitigation_strategies.is_none());
}

// Stage / process status tests
#[test]
fn test_stage_status_serialization() {
    assert_eq!(
        serde_json::to_value(StageStatus::InProgress).unwrap(),
        json!("in_progress")
    );
    assert_eq!(
        serde_json::to_string(&UpdateStageRequest {
            status: StageStatus::Completed
        })
        .unwrap(),
        r#"{"status":"completed"}"#
    );
}

#[test]
fn test_stage_status_unknown_decodes_as_pending() {
    let status: StageStatus = serde_json::from_value(json!("blocked")).unwrap();
    assert_eq!(status, StageStatus::Pending);

    let status: StageStatus = serde_json::from_value(json!("pending")).unwrap();
    assert_eq!(status, StageStatus::Pending);
    assert_eq!(serde_json::to_value(StageStatus::Pending).unwrap(), json!("pending"));
}

#[test]
fn test_stage_with_unknown_status_decodes() {
    let stage: DecisionStage = serde_json::from_value(json!({
        "id": "s-1",
        "process_id": "p-1",
        "name": "Review",
        "order_index": 2,
        "status": "on_hold"
    }))
    .unwrap();
    assert_eq!(stage.status, StageStatus::Pending);
}

#[test]
fn test_stage_status_display_and_parse() {
    for status in [
        StageStatus::Pending,
        StageStatus::InProgress,
        StageStatus::Completed,
    ] {
        assert_eq!(status.to_string().parse::<StageStatus>().unwrap(), status);
    }
    assert!("done".parse::<StageStatus>().is_err());
    assert_eq!(StageStatus::InProgress.label(), "In Progress");
}

#[test]
fn test_process_status_label() {
    let status: ProcessStatus = serde_json::from_value(json!("in_progress")).unwrap();
    assert_eq!(status.label(), "In Progress");
    assert_eq!(ProcessStatus::Active.label(), "In Progress");
    assert_eq!(ProcessStatus::Completed.label(), "Completed");
}

#[test]
fn test_unknown_process_status_reads_in_progress() {
    let envelope: ProcessEnvelope = serde_json::from_value(json!({
        "process": {
            "id": "p-1",
            "discussion_id": "d-1",
            "title": "Pick a vendor",
            "status": "archived",
            "started_at": "2024-03-01T10:00:00Z"
        },
        "stages": []
    }))
    .unwrap();

    assert_eq!(envelope.process.status, ProcessStatus::Other);
    assert_eq!(envelope.process.status.label(), "In Progress");
}

#[test]
fn test_process_envelope_backend_shape() {
    let envelope: ProcessEnvelope = serde_json::from_value(json!({
        "process": {
            "id": "p-1",
            "discussion_id": "d-1",
            "title": "Pick a vendor",
            "status": "in_progress",
            "process_template": null,
            "started_at": "2024-03-01T10:00:00.000001",
            "completed_at": null
        },
        "stages": [{
            "id": "s-1",
            "process_id": "p-1",
            "name": "Problem Definition",
            "description": "Define the problem or decision to be made",
            "order_index": 0,
            "status": "pending",
            "started_at": null,
            "completed_at": null
        }]
    }))
    .unwrap();

    assert_eq!(envelope.process.title, "Pick a vendor");
    assert!(envelope.process.completed_at.is_none());
    assert_eq!(envelope.stages[0].status, StageStatus::Pending);
    assert_eq!(envelope.stages[0].order_index, 0);
}

// Request body tests
#[test]
fn test_optional_request_fields_skipped() {
    let body = serde_json::to_value(PostMessageRequest {
        content: "hello".to_string(),
        parent_id: None,
    })
    .unwrap();
    assert_eq!(body, json!({"content": "hello"}));

    let body = serde_json::to_value(CreateProcessRequest {
        title: "Decide".to_string(),
        template: None,
    })
    .unwrap();
    assert_eq!(body, json!({"title": "Decide"}));

    let body = serde_json::to_value(AddMemberRequest {
        username: "ada".to_string(),
        role: Some("admin".to_string()),
    })
    .unwrap();
    assert_eq!(body, json!({"username": "ada", "role": "admin"}));
}

#[test]
fn test_document_roundtrip_keeps_version() {
    let doc: DecisionDocument = serde_json::from_value(json!({
        "id": "doc-1",
        "process_id": "p-1",
        "title": "Outcome",
        "content": "We chose B.",
        "version": 2,
        "created_at": "2024-03-01T10:00:00",
        "updated_at": "2024-03-02T10:00:00"
    }))
    .unwrap();
    assert_eq!(doc.version, 2);
    assert!(doc.updated_at.unwrap() > doc.created_at.unwrap());
}

#[test]
fn test_timestamp_parse_variants() {
    assert!(timestamp::parse("2024-03-01T10:00:00").is_some());
    assert!(timestamp::parse("2024-03-01T10:00:00.5").is_some());
    assert!(timestamp::parse("2024-03-01T10:00:00+02:00").is_some());
    assert!(timestamp::parse("2024-03-01").is_none());
}

//! End-to-end checks of `ApiClient` + `SessionState` against an in-process
//! mock of the catalog/scan service.
//!
//! Run with: cargo test -p tfscan-proto --test service_roundtrip

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::Query,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tfscan_proto::client::ApiClient;
use tfscan_proto::config::ApiConfig;
use tfscan_proto::error::ApiError;
use tfscan_proto::protocol::ScorePoint;
use tfscan_proto::sequence::normalize;
use tfscan_proto::state::{Applied, OpKind, ResultsView, SessionState};
use tokio::sync::mpsc;

const CATALOG: &[(&str, &str, &str)] = &[
    ("MA0002.1", "RUNX1", "Runt-related factors"),
    ("MA0684.1", "RUNX2", "Runt-related factors"),
    ("MA0079.1", "SP1", "Three-zinc finger Kruppel-related factors"),
];

async fn search_tfs(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    let query = params.get("query").cloned().unwrap_or_default();
    match query.as_str() {
        "fail" => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "JASPAR search failed"})),
            )
        }
        "broken" => return (StatusCode::OK, Json(json!({"count": 1}))),
        "sparse" => {
            return (
                StatusCode::OK,
                Json(json!({"results": [
                    {"matrix_id": "MA0002.1", "name": "RUNX1", "family": null},
                    {"matrix_id": "MA9999.1", "name": null, "id": 9999},
                ]})),
            )
        }
        _ => {}
    }

    let needle = query.trim().to_uppercase();
    let results: Vec<Value> = CATALOG
        .iter()
        .filter(|(_, name, _)| name.starts_with(&needle))
        .map(|(id, name, family)| {
            json!({
                "matrix_id": id,
                "name": name,
                "family": family,
                "version": 1,
                "query_seen": query,
                "page_size_seen": params.get("page_size"),
            })
        })
        .collect();
    (
        StatusCode::OK,
        Json(json!({"count": results.len(), "next": null, "previous": null, "results": results})),
    )
}

async fn scan(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let obj = body.as_object().cloned().unwrap_or_default();
    let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    keys.sort_unstable();
    if keys != ["sequence", "tf_id"] {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "unexpected body shape"})),
        );
    }
    let sequence = obj["sequence"].as_str().unwrap_or_default().to_string();
    let tf_id = obj["tf_id"].as_str().unwrap_or_default().to_string();

    if sequence.is_empty() || tf_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing sequence or tf_id."})),
        );
    }
    if sequence.starts_with('>') {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "header leaked into residues"})),
        );
    }
    if sequence == "MALFORMED" {
        return (StatusCode::OK, Json(json!({"topHits": []})));
    }
    if let Some(rest) = sequence.strip_prefix("SLOW") {
        tokio::time::sleep(Duration::from_millis(300)).await;
        return (StatusCode::OK, Json(profile(rest, &tf_id)));
    }
    if sequence.starts_with("HANG") {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    if !sequence.chars().all(|c| "ACGT".contains(c)) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid sequence. Only ACGT allowed."})),
        );
    }
    (StatusCode::OK, Json(profile(&sequence, &tf_id)))
}

/// Deterministic fake profile: a 3-wide window, score = count of 'G' - 1.
fn profile(sequence: &str, tf_id: &str) -> Value {
    let bytes = sequence.as_bytes();
    let width = 3usize;
    let mut scores = Vec::new();
    let mut positions = Vec::new();
    let mut hits = Vec::new();
    for i in 0..(bytes.len() + 1).saturating_sub(width) {
        let window = &sequence[i..i + width];
        let score = window.matches('G').count() as f64 - 1.0;
        positions.push(100 + i as i64);
        scores.push(score);
        if score > 0.0 {
            hits.push(json!({"start": i, "end": i + width, "score": score, "sequence": window}));
        }
    }
    json!({
        "name": null,
        "sequence": sequence,
        "scores": scores,
        "positions": positions,
        "topHits": hits,
        "tf": tf_id,
    })
}

async fn spawn_service() -> String {
    let router = Router::new()
        .route("/api/search_tfs", get(search_tfs))
        .route("/api/scan", post(scan));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(base_url: &str) -> ApiClient {
    ApiClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        page_size: None,
        request_timeout_secs: None,
    })
    .unwrap()
}

#[tokio::test]
async fn search_replaces_candidates_and_forwards_raw_query() {
    let base = spawn_service().await;
    let client = client_for(&base);
    let mut session = SessionState::new();

    let ticket = session.begin_search();
    assert!(session.is_busy(OpKind::Search));
    let result = client.search("  runx ").await;
    assert_eq!(session.apply_search_result(ticket, result), Applied::Updated);
    assert!(!session.is_busy(OpKind::Search));

    let ids: Vec<&str> = session.candidates().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["MA0002.1", "MA0684.1"]);
    assert_eq!(
        session.candidates()[0].metadata_text("query_seen").as_deref(),
        Some("  runx ")
    );
    assert_eq!(session.candidates()[0].subtitle(), "MA0002.1 - Runt-related factors");
    assert_eq!(session.total_matches(), Some(2));

    let ticket = session.begin_search();
    let result = client.search("SP").await;
    session.apply_search_result(ticket, result);
    let ids: Vec<&str> = session.candidates().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["MA0079.1"]);
}

#[tokio::test]
async fn empty_query_is_forwarded() {
    let base = spawn_service().await;
    let client = client_for(&base);
    let response = client.search("").await.unwrap();
    assert_eq!(response.results.len(), CATALOG.len());
}

#[tokio::test]
async fn page_size_is_sent_when_configured() {
    let base = spawn_service().await;
    let client = ApiClient::new(&ApiConfig {
        base_url: base,
        page_size: Some(25),
        request_timeout_secs: None,
    })
    .unwrap();
    let response = client.search("SP1").await.unwrap();
    assert_eq!(
        response.results[0].metadata_text("page_size_seen").as_deref(),
        Some("25")
    );
}

#[tokio::test]
async fn failed_search_surfaces_service_message() {
    let base = spawn_service().await;
    let client = client_for(&base);
    let mut session = SessionState::new();

    let ticket = session.begin_search();
    let result = client.search("RUNX1").await;
    session.apply_search_result(ticket, result);
    session.select_candidate("MA0002.1");

    let ticket = session.begin_search();
    let result = client.search("fail").await;
    match session.apply_search_result(ticket, result) {
        Applied::Failed(failure) => {
            assert_eq!(failure.title(), "Error searching TFs");
            assert_eq!(failure.description, "JASPAR search failed");
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(session.candidates().len(), 1);
    assert_eq!(session.selected_candidate_id(), Some("MA0002.1"));
    assert!(!session.is_busy(OpKind::Search));
}

#[tokio::test]
async fn null_catalog_fields_do_not_fail_the_search() {
    let base = spawn_service().await;
    let client = client_for(&base);
    let mut session = SessionState::new();

    let ticket = session.begin_search();
    let result = client.search("sparse").await;
    assert!(matches!(
        session.apply_search_result(ticket, result),
        Applied::Updated
    ));
    let ids: Vec<&str> = session.candidates().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["MA0002.1", "MA9999.1"]);
    assert_eq!(session.candidates()[1].display_name, "");
    assert_eq!(session.candidates()[0].subtitle(), "MA0002.1");
}

#[tokio::test]
async fn search_without_results_field_is_a_failure() {
    let base = spawn_service().await;
    let client = client_for(&base);
    let err = client.search("broken").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn scan_builds_series_and_passes_hits_through() {
    let base = spawn_service().await;
    let client = client_for(&base);
    let mut session = SessionState::new();

    session.select_candidate("MA0002.1");
    session.set_sequence_text(">promoter\nAGGTC");
    assert!(session.can_scan());

    let (id, seq) = session.scan_input().unwrap();
    let ticket = session.begin_scan();
    let result = client.scan(&id, &seq).await;
    assert_eq!(session.apply_scan_result(ticket, result), Applied::Updated);

    assert_eq!(
        session.series(),
        &[
            ScorePoint { position: 100, score: 1.0 },
            ScorePoint { position: 101, score: 1.0 },
            ScorePoint { position: 102, score: 0.0 },
        ]
    );
    let hits = session.hits();
    assert_eq!(hits.len(), 2);
    assert_eq!((hits[0].start, hits[0].end), (0, 3));
    assert_eq!(hits[0].matched_residues, "AGG");
    let run = session.last_run().unwrap();
    assert_eq!(run.candidate_id, "MA0002.1");
    assert_eq!(run.sequence_name.as_deref(), Some("promoter"));
    assert!(matches!(session.results_view(), ResultsView::Hits { .. }));
}

#[tokio::test]
async fn scan_without_hits_reports_no_hits_state() {
    let base = spawn_service().await;
    let client = client_for(&base);
    let mut session = SessionState::new();
    session.select_candidate("MA0079.1");
    session.set_sequence_text("ATATAT");

    let (id, seq) = session.scan_input().unwrap();
    let ticket = session.begin_scan();
    let result = client.scan(&id, &seq).await;
    session.apply_scan_result(ticket, result);
    assert!(matches!(
        session.results_view(),
        ResultsView::NoHits { series } if series.len() == 4
    ));
}

#[tokio::test]
async fn rejected_scan_keeps_previous_results() {
    let base = spawn_service().await;
    let client = client_for(&base);
    let mut session = SessionState::new();
    session.select_candidate("MA0002.1");

    session.set_sequence_text("GGGA");
    let (id, seq) = session.scan_input().unwrap();
    let ticket = session.begin_scan();
    let result = client.scan(&id, &seq).await;
    session.apply_scan_result(ticket, result);
    let before = session.series().to_vec();
    assert_eq!(before.len(), 2);

    session.set_sequence_text("ACGU");
    let (id, seq) = session.scan_input().unwrap();
    let ticket = session.begin_scan();
    let result = client.scan(&id, &seq).await;
    match session.apply_scan_result(ticket, result) {
        Applied::Failed(failure) => {
            assert_eq!(failure.description, "Invalid sequence. Only ACGT allowed.")
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(session.series(), before.as_slice());
    assert!(!session.is_busy(OpKind::Scan));
}

#[tokio::test]
async fn scan_missing_arrays_is_a_decode_failure() {
    let base = spawn_service().await;
    let client = client_for(&base);
    let err = client
        .scan("MA0002.1", &normalize("MALFORMED"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));

    let mut session = SessionState::new();
    let ticket = session.begin_scan();
    match session.apply_scan_result(ticket, Err(err)) {
        Applied::Failed(failure) => assert_eq!(failure.description, "Failed to scan DNA sequence"),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn overlapping_scans_resolve_to_last_issued() {
    let base = spawn_service().await;
    let client = client_for(&base);
    let mut session = SessionState::new();
    let (tx, mut rx) = mpsc::channel(4);

    // Slow request issued first, fast request second.
    for text in ["SLOWGGGG", "AAAA"] {
        let ticket = session.begin_scan();
        let client = client.clone();
        let seq = normalize(text);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client.scan("MA0002.1", &seq).await;
            let _ = tx.send((ticket, result)).await;
        });
    }
    drop(tx);
    assert!(session.is_busy(OpKind::Scan));

    let mut arrivals = Vec::new();
    while let Some((ticket, result)) = rx.recv().await {
        arrivals.push(ticket.generation);
        session.apply_scan_result(ticket, result);
    }

    assert_eq!(arrivals, vec![2, 1], "fast scan should resolve first");
    assert!(!session.is_busy(OpKind::Scan));
    // "AAAA": two windows, no G, no hits.
    assert_eq!(session.series().len(), 2);
    assert!(session.hits().is_empty());
}

#[tokio::test]
async fn timeout_becomes_transport_failure() {
    let base = spawn_service().await;
    let client = ApiClient::new(&ApiConfig {
        base_url: base,
        page_size: None,
        request_timeout_secs: Some(1),
    })
    .unwrap();
    let err = client
        .scan("MA0002.1", &normalize("HANGACGT"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.service_message(), None);
}

#[tokio::test]
async fn unreachable_service_is_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}", addr));
    let err = client.search("RUNX").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

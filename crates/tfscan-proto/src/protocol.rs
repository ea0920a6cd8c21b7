use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Catalog lookup endpoint (GET, `query` parameter).
pub const SEARCH_PATH: &str = "/api/search_tfs";
/// Sequence scan endpoint (POST, JSON body).
pub const SCAN_PATH: &str = "/api/scan";

/// One binding-site model from the catalog.
///
/// `matrix_id` and `name` are lifted into typed fields; everything else the
/// catalog sends (version, collection, family, logo URL, ...) is kept as-is.
/// A missing or null `name` decodes as empty, and a bare `id` stands in for
/// `matrix_id` only when the latter is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCandidate")]
pub struct TfCandidate {
    #[serde(rename = "matrix_id")]
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Catalog record as sent; any typed field may be absent or null.
#[derive(Deserialize)]
struct RawCandidate {
    #[serde(default)]
    matrix_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(flatten)]
    metadata: BTreeMap<String, serde_json::Value>,
}

impl From<RawCandidate> for TfCandidate {
    fn from(raw: RawCandidate) -> Self {
        let mut metadata = raw.metadata;
        let id = match raw.matrix_id {
            Some(id) => id,
            None => match metadata.remove("id") {
                Some(serde_json::Value::String(id)) => id,
                Some(other) => {
                    metadata.insert("id".to_string(), other);
                    String::new()
                }
                None => String::new(),
            },
        };
        Self {
            id,
            display_name: raw.name.unwrap_or_default(),
            metadata,
        }
    }
}

impl TfCandidate {
    /// A metadata field as text.  Numbers are rendered, nulls are `None`.
    pub fn metadata_text(&self, key: &str) -> Option<String> {
        match self.metadata.get(key)? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Second list line: `MA0002.1 - Runt-related factors`.
    pub fn subtitle(&self) -> String {
        let detail = ["family", "collection", "tax_group"]
            .iter()
            .find_map(|key| self.metadata_text(key));
        match detail {
            Some(d) => format!("{} - {}", self.id, d),
            None => self.id.clone(),
        }
    }
}

/// `GET /api/search_tfs` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<TfCandidate>,
    /// Total matches on the catalog side (paging metadata).
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// `POST /api/scan` request body.  The FASTA header never goes on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub sequence: String,
    pub tf_id: String,
}

/// A service-reported binding site, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingHit {
    pub start: i64,
    pub end: i64,
    pub score: f64,
    #[serde(rename = "sequence", default)]
    pub matched_residues: String,
}

/// One point of the per-position score profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub position: i64,
    pub score: f64,
}

/// `POST /api/scan` response: two parallel arrays plus the ranked hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub scores: Vec<f64>,
    pub positions: Vec<i64>,
    #[serde(rename = "topHits", default)]
    pub top_hits: Vec<BindingHit>,
    /// Record name the service resolved from the submitted text, if any.
    #[serde(default)]
    pub name: Option<String>,
    /// Residues the service actually scanned.
    #[serde(default)]
    pub sequence: Option<String>,
}

/// Decoded, view-ready result of one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub candidate_id: String,
    pub sequence_name: Option<String>,
    pub series: Vec<ScorePoint>,
    pub hits: Vec<BindingHit>,
}

impl ScanResponse {
    /// Zip `positions` and `scores` index-by-index into a score series.
    ///
    /// Arrays of unequal length are not rejected; the series stops at the
    /// shorter one.
    pub fn into_outcome(
        self,
        candidate_id: impl Into<String>,
        fallback_name: Option<String>,
    ) -> ScanOutcome {
        if self.scores.len() != self.positions.len() {
            warn!(
                "scan response arrays differ in length: {} scores, {} positions",
                self.scores.len(),
                self.positions.len()
            );
        }
        let series = self
            .positions
            .iter()
            .zip(self.scores.iter())
            .map(|(&position, &score)| ScorePoint { position, score })
            .collect();

        ScanOutcome {
            candidate_id: candidate_id.into(),
            sequence_name: self.name.filter(|n| !n.is_empty()).or(fallback_name),
            series,
            hits: self.top_hits,
        }
    }
}

/// Error payload either endpoint may send with a non-success status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// First non-empty human-readable message in the payload.
    pub fn message(&self) -> Option<&str> {
        let detail = match &self.detail {
            Some(serde_json::Value::String(s)) => Some(s.as_str()),
            _ => None,
        };
        [self.error.as_deref(), self.message.as_deref(), detail]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_keeps_auxiliary_fields() {
        let json = r#"{
            "matrix_id": "MA0002.1",
            "name": "RUNX1",
            "version": 1,
            "collection": "CORE",
            "sequence_logo": null
        }"#;
        let tf: TfCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(tf.id, "MA0002.1");
        assert_eq!(tf.display_name, "RUNX1");
        assert_eq!(tf.metadata_text("collection").as_deref(), Some("CORE"));
        assert_eq!(tf.metadata_text("version").as_deref(), Some("1"));
        assert_eq!(tf.metadata_text("sequence_logo"), None);
        assert_eq!(tf.subtitle(), "MA0002.1 - CORE");
    }

    #[test]
    fn test_candidate_accepts_plain_id() {
        let tf: TfCandidate = serde_json::from_str(r#"{"id":"MA0079.1","name":"SP1"}"#).unwrap();
        assert_eq!(tf.id, "MA0079.1");
        assert!(tf.metadata.is_empty());
        assert_eq!(tf.subtitle(), "MA0079.1");
    }

    #[test]
    fn test_candidate_tolerates_null_name() {
        let resp: SearchResponse = serde_json::from_str(
            r#"{"results": [
                {"matrix_id": "MA0002.1", "name": "RUNX1"},
                {"matrix_id": "MA9999.1", "name": null}
            ]}"#,
        )
        .unwrap();
        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.results[1].id, "MA9999.1");
        assert_eq!(resp.results[1].display_name, "");

        let tf: TfCandidate = serde_json::from_str(r#"{"matrix_id": "MA0003.1"}"#).unwrap();
        assert_eq!(tf.display_name, "");
    }

    #[test]
    fn test_matrix_id_wins_over_plain_id() {
        let tf: TfCandidate =
            serde_json::from_str(r#"{"matrix_id": "MA0002.1", "id": 42, "name": "RUNX1"}"#)
                .unwrap();
        assert_eq!(tf.id, "MA0002.1");
        assert_eq!(tf.metadata_text("id").as_deref(), Some("42"));

        let tf: TfCandidate =
            serde_json::from_str(r#"{"matrix_id": "MA0002.1", "id": "MA0002.1"}"#).unwrap();
        assert_eq!(tf.id, "MA0002.1");
    }

    #[test]
    fn test_search_response_requires_results() {
        assert!(serde_json::from_str::<SearchResponse>(r#"{"count": 3}"#).is_err());
        let resp: SearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(resp.results.is_empty());
        assert_eq!(resp.count, None);
    }

    #[test]
    fn test_scan_request_wire_names() {
        let req = ScanRequest {
            sequence: "ACGT".into(),
            tf_id: "MA0002.1".into(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, serde_json::json!({"sequence": "ACGT", "tf_id": "MA0002.1"}));
    }

    #[test]
    fn test_series_pairs_positions_with_scores() {
        let resp: ScanResponse = serde_json::from_str(
            r#"{
                "scores": [-1.5, 2.25, 0.5],
                "positions": [10, 11, 14],
                "topHits": [{"start": 11, "end": 17, "score": 2.25, "sequence": "TGTGGT"}]
            }"#,
        )
        .unwrap();
        let outcome = resp.into_outcome("MA0002.1", None);
        assert_eq!(
            outcome.series,
            vec![
                ScorePoint { position: 10, score: -1.5 },
                ScorePoint { position: 11, score: 2.25 },
                ScorePoint { position: 14, score: 0.5 },
            ]
        );
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].matched_residues, "TGTGGT");
        assert_eq!(outcome.candidate_id, "MA0002.1");
    }

    #[test]
    fn test_hits_are_not_reordered() {
        let resp: ScanResponse = serde_json::from_str(
            r#"{
                "scores": [1.0, 3.0],
                "positions": [0, 1],
                "topHits": [
                    {"start": 0, "end": 4, "score": 1.0},
                    {"start": 1, "end": 5, "score": 3.0}
                ]
            }"#,
        )
        .unwrap();
        let outcome = resp.into_outcome("X", None);
        let starts: Vec<i64> = outcome.hits.iter().map(|h| h.start).collect();
        assert_eq!(starts, vec![0, 1]);
        assert_eq!(outcome.hits[0].matched_residues, "");
    }

    #[test]
    fn test_missing_arrays_fail_to_decode() {
        assert!(serde_json::from_str::<ScanResponse>(r#"{"positions": [0]}"#).is_err());
        assert!(serde_json::from_str::<ScanResponse>(r#"{"scores": [0.1]}"#).is_err());
        assert!(
            serde_json::from_str::<ScanResponse>(r#"{"scores": null, "positions": []}"#).is_err()
        );
    }

    #[test]
    fn test_length_mismatch_truncates() {
        let resp = ScanResponse {
            scores: vec![1.0, 2.0, 3.0],
            positions: vec![5, 6],
            top_hits: vec![],
            name: None,
            sequence: None,
        };
        let outcome = resp.into_outcome("X", None);
        assert_eq!(outcome.series.len(), 2);
        assert_eq!(outcome.series[1], ScorePoint { position: 6, score: 2.0 });
    }

    #[test]
    fn test_service_name_wins_over_local_header() {
        let resp = ScanResponse {
            scores: vec![],
            positions: vec![],
            top_hits: vec![],
            name: Some("chr1".into()),
            sequence: None,
        };
        let outcome = resp.into_outcome("X", Some("local".into()));
        assert_eq!(outcome.sequence_name.as_deref(), Some("chr1"));

        let resp = ScanResponse {
            scores: vec![],
            positions: vec![],
            top_hits: vec![],
            name: None,
            sequence: None,
        };
        let outcome = resp.into_outcome("X", Some("local".into()));
        assert_eq!(outcome.sequence_name.as_deref(), Some("local"));
    }

    #[test]
    fn test_error_body_message_precedence() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "Invalid sequence. Only ACGT allowed."}"#).unwrap();
        assert_eq!(body.message(), Some("Invalid sequence. Only ACGT allowed."));

        let body: ErrorBody = serde_json::from_str(r#"{"detail": "Not Found"}"#).unwrap();
        assert_eq!(body.message(), Some("Not Found"));

        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "  ", "detail": [{"loc": ["query"]}]}"#).unwrap();
        assert_eq!(body.message(), None);
    }
}

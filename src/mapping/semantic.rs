//! Strategy 4: semantic match (§4.9). Delegates to an external matcher,
//! treated as an opaque collaborator behind the [`SemanticMatcher`] trait so
//! the cascade can be unit-tested without a live HTTP endpoint.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Error;
use crate::models::matcher_invocation::NewMatcherInvocation;

use super::{CustomerNode, MappingOutcome, MasterCandidate};

const ACCEPT_THRESHOLD: f64 = 0.50;

/// Default cap on how many same-type master candidates are offered to the
/// matcher per call (§4.9: "up to K (default 20)").
pub const DEFAULT_CANDIDATE_LIMIT: usize = 20;

#[derive(Debug, Serialize)]
pub struct SemanticRequest {
    pub customer_value: String,
    pub customer_path: Vec<String>,
    pub candidates: Vec<SemanticCandidate>,
}

#[derive(Debug, Serialize)]
pub struct SemanticCandidate {
    pub master_node_id: Uuid,
    pub value: String,
    pub path: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SemanticResponse {
    pub master_node_id: Option<Uuid>,
    pub confidence: f64,
    pub reasoning: Option<String>,
}

/// The one external collaborator in the system (§1). Implementations must be
/// safe to call from multiple rayon worker threads.
pub trait SemanticMatcher: Sync {
    fn match_node(&self, request: &SemanticRequest) -> Result<SemanticResponse, Error>;
}

fn build_request(customer: &CustomerNode, candidates: &[MasterCandidate]) -> SemanticRequest {
    let path = |segments: &[super::PathSegment]| -> Vec<String> {
        segments.iter().map(|s| if s.is_na { "<N/A>".to_string() } else { s.value.clone() }).collect()
    };

    SemanticRequest {
        customer_value: customer.value.clone(),
        customer_path: path(&customer.ancestor_path),
        candidates: candidates
            .iter()
            .take(DEFAULT_CANDIDATE_LIMIT)
            .map(|c| SemanticCandidate { master_node_id: c.id, value: c.value.clone(), path: path(&c.ancestor_path) })
            .collect(),
    }
}

pub fn run(customer: &CustomerNode, candidates: &[MasterCandidate], matcher: &dyn SemanticMatcher) -> Result<Option<MappingOutcome>, Error> {
    let request = build_request(customer, candidates);
    let response = matcher.match_node(&request)?;

    Ok(match response.master_node_id {
        Some(master_node_id) if response.confidence >= ACCEPT_THRESHOLD => {
            Some(MappingOutcome { master_node_id, confidence: response.confidence, strategy: "semantic" })
        }
        _ => None,
    })
}

/// Builds the [`MatcherInvocation`](crate::models::matcher_invocation::MatcherInvocation)
/// audit row for one call, win or lose, so operators have a debugging trail
/// independent of the vendor's own logs (§3.1).
pub fn invocation_record(
    child_node_id: Uuid,
    request_hash: String,
    response: Option<&SemanticResponse>,
    error: Option<&str>,
    elapsed: Duration,
) -> NewMatcherInvocation {
    NewMatcherInvocation {
        id: Uuid::new_v4(),
        child_node_id,
        request_hash,
        confidence: response.map(|r| (r.confidence.clamp(0.0, 1.0) * 100.0).round() as i32),
        accepted: response.map(|r| r.master_node_id.is_some() && r.confidence >= ACCEPT_THRESHOLD).unwrap_or(false),
        reasoning: response.and_then(|r| r.reasoning.clone()),
        error: error.map(|e| e.to_string()),
        latency_ms: elapsed.as_millis() as i32,
        created_at: chrono::Utc::now(),
    }
}

/// Calls the matcher and times it, for building an invocation record
/// regardless of success or failure.
pub fn call_and_time(matcher: &dyn SemanticMatcher, request: &SemanticRequest) -> (Result<SemanticResponse, Error>, Duration) {
    let start = Instant::now();
    let result = matcher.match_node(request);
    (result, start.elapsed())
}

/// HTTP-backed matcher using the same lightweight client (`ureq`) the rest
/// of this codebase's lineage uses for outbound calls, bounded by
/// `SEMANTIC_MATCHER_TIMEOUT_MS`.
pub struct HttpSemanticMatcher {
    pub url: String,
    pub timeout: Duration,
}

impl HttpSemanticMatcher {
    pub fn from_env() -> HttpSemanticMatcher {
        let url = std::env::var("SEMANTIC_MATCHER_URL").expect("SEMANTIC_MATCHER_URL must be set");
        let timeout_ms: u64 = std::env::var("SEMANTIC_MATCHER_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5_000);
        HttpSemanticMatcher { url, timeout: Duration::from_millis(timeout_ms) }
    }
}

impl SemanticMatcher for HttpSemanticMatcher {
    fn match_node(&self, request: &SemanticRequest) -> Result<SemanticResponse, Error> {
        let response = ureq::post(&self.url)
            .config()
            .timeout_global(Some(self.timeout))
            .build()
            .send_json(request)?;

        let body: SemanticResponse = response.into_body().read_json()?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeMatcher {
        response: SemanticResponse,
    }

    impl SemanticMatcher for FakeMatcher {
        fn match_node(&self, _request: &SemanticRequest) -> Result<SemanticResponse, Error> {
            Ok(SemanticResponse {
                master_node_id: self.response.master_node_id,
                confidence: self.response.confidence,
                reasoning: self.response.reasoning.clone(),
            })
        }
    }

    fn customer() -> CustomerNode {
        CustomerNode { id: Uuid::new_v4(), node_type_id: 1, value: "Advanced Practice Psychiatric Nurses".to_string(), profession: None, ancestor_path: vec![] }
    }

    #[test]
    fn accepts_response_at_or_above_threshold() {
        let target = Uuid::new_v4();
        let matcher = FakeMatcher { response: SemanticResponse { master_node_id: Some(target), confidence: 0.72, reasoning: Some("close match".to_string()) } };
        let outcome = run(&customer(), &[], &matcher).unwrap().unwrap();
        assert_eq!(outcome.master_node_id, target);
        assert_eq!(outcome.confidence, 0.72);
    }

    #[test]
    fn rejects_response_below_threshold() {
        let matcher = FakeMatcher { response: SemanticResponse { master_node_id: Some(Uuid::new_v4()), confidence: 0.2, reasoning: None } };
        assert!(run(&customer(), &[], &matcher).unwrap().is_none());
    }

    #[test]
    fn rejects_null_master_node_regardless_of_confidence() {
        let matcher = FakeMatcher { response: SemanticResponse { master_node_id: None, confidence: 0.95, reasoning: None } };
        assert!(run(&customer(), &[], &matcher).unwrap().is_none());
    }
}

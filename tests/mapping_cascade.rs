//! Black-box coverage of the full four-stage cascade (run_cascade), driven
//! entirely through in-memory fakes — no database, no live matcher. Each
//! customer node below is built to fall through to a different stage, the
//! way a real taxonomy would mix exact duplicates, abbreviations, near
//! misses, and genuinely novel titles in one load.

use taxomap::errors::Error;
use taxomap::mapping::semantic::{SemanticMatcher, SemanticRequest, SemanticResponse};
use taxomap::mapping::vocabulary::Vocabulary;
use taxomap::mapping::{run_cascade, CustomerNode, MasterCandidate};
use uuid::Uuid;

struct FakeMatcher {
    accept: Uuid,
    confidence: f64,
}

impl SemanticMatcher for FakeMatcher {
    fn match_node(&self, request: &SemanticRequest) -> Result<SemanticResponse, Error> {
        if request.customer_value == "Advanced Practice Psychiatric Nurses" {
            Ok(SemanticResponse { master_node_id: Some(self.accept), confidence: self.confidence, reasoning: Some("closest available title".to_string()) })
        }
        else {
            Ok(SemanticResponse { master_node_id: None, confidence: 0.0, reasoning: None })
        }
    }
}

fn customer(value: &str) -> CustomerNode {
    CustomerNode { id: Uuid::new_v4(), node_type_id: 1, value: value.to_string(), profession: None, ancestor_path: vec![] }
}

fn candidate(value: &str) -> MasterCandidate {
    MasterCandidate { id: Uuid::new_v4(), value: value.to_string(), profession: None, ancestor_path: vec![] }
}

#[test]
fn qualified_pattern_beats_a_later_stage_before_it_ever_runs() {
    let registered_nurse = candidate("Registered Nurse");
    let mut vocabulary = Vocabulary::new();
    vocabulary.add_qualified_pattern("Registered Nurse", "ICU", registered_nurse.id);

    let matcher = FakeMatcher { accept: Uuid::new_v4(), confidence: 1.0 };
    let outcome = run_cascade(&customer("ICU Registered Nurse"), &[registered_nurse.clone()], &[], &vocabulary, &matcher).unwrap().unwrap();

    assert_eq!(outcome.master_node_id, registered_nurse.id);
    assert_eq!(outcome.strategy, "nlp_qualified_suffix");
    assert!((outcome.confidence - 0.90).abs() < 1e-9);
}

#[test]
fn fuzzy_wins_when_exact_and_nlp_both_fail() {
    let critical_care = candidate("Critical Care Nurse Practitioner");
    let vocabulary = Vocabulary::new();
    let matcher = FakeMatcher { accept: Uuid::new_v4(), confidence: 1.0 };

    let outcome = run_cascade(&customer("ICU Nurse Practitioner"), &[critical_care.clone()], &[], &vocabulary, &matcher).unwrap().unwrap();

    assert_eq!(outcome.master_node_id, critical_care.id);
    assert_eq!(outcome.strategy, "fuzzy_value");
}

#[test]
fn semantic_only_runs_when_an_enabled_rule_flags_ai_matching() {
    let psychiatric_np = candidate("Psychiatric Mental Health Nurse Practitioner");
    let vocabulary = Vocabulary::new();
    let matcher = FakeMatcher { accept: psychiatric_np.id, confidence: 0.72 };
    let customer_node = customer("Advanced Practice Psychiatric Nurses");

    // No enabled AI-flagged rule: exact/nlp/fuzzy all fail and the cascade
    // stops short of semantic, leaving the node unmapped.
    let without_rule = run_cascade(&customer_node, &[psychiatric_np.clone()], &[], &vocabulary, &matcher).unwrap();
    assert!(without_rule.is_none());

    let ai_rule = taxomap::models::mapping_rule::MappingRule {
        id: Uuid::new_v4(),
        name: "semantic fallback".to_string(),
        command: "AI".to_string(),
        pattern: None,
        attribute_filters: serde_json::json!([]),
        flags: serde_json::json!({}),
        ai_flag: true,
        human_flag: false,
        enabled: true,
    };

    let outcome = run_cascade(&customer_node, &[psychiatric_np.clone()], &[ai_rule], &vocabulary, &matcher).unwrap().unwrap();
    assert_eq!(outcome.master_node_id, psychiatric_np.id);
    assert_eq!(outcome.strategy, "semantic");
    assert!((outcome.confidence - 0.72).abs() < 1e-9);
}

#[test]
fn nothing_close_is_recorded_unmapped() {
    let registered_nurse = candidate("Registered Nurse");
    let vocabulary = Vocabulary::new();
    let matcher = FakeMatcher { accept: Uuid::new_v4(), confidence: 1.0 };

    let outcome = run_cascade(&customer("Xyzzy Practitioner"), &[registered_nurse], &[], &vocabulary, &matcher).unwrap();
    assert!(outcome.is_none());
}

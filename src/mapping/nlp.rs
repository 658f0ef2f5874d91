//! Strategy 2: NLP-qualifier (§4.9). Tokenizes the folded customer value and
//! checks it against the master taxonomy's pre-extracted vocabulary of
//! strong heads and qualified head/qualifier patterns.

use crate::normalize::fold;

use super::vocabulary::Vocabulary;
use super::{CustomerNode, MappingOutcome};

const STRONG_HEAD_CONFIDENCE: f64 = 0.95;
const QUALIFIED_CONFIDENCE: f64 = 0.90;

pub fn run(customer: &CustomerNode, vocabulary: &Vocabulary) -> Option<MappingOutcome> {
    let tokens: Vec<String> = fold(&customer.value).split_whitespace().map(|t| t.to_string()).collect();

    if let Some(master_node_id) = vocabulary.find_strong_head(&tokens) {
        return Some(MappingOutcome { master_node_id, confidence: STRONG_HEAD_CONFIDENCE, strategy: "nlp_strong_head" });
    }

    if let Some(master_node_id) = vocabulary.find_qualified_suffix(&tokens) {
        return Some(MappingOutcome { master_node_id, confidence: QUALIFIED_CONFIDENCE, strategy: "nlp_qualified_suffix" });
    }

    if let Some(master_node_id) = vocabulary.find_qualified_prefix(&tokens) {
        return Some(MappingOutcome { master_node_id, confidence: QUALIFIED_CONFIDENCE, strategy: "nlp_qualified_prefix" });
    }

    None
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn customer(value: &str) -> CustomerNode {
        CustomerNode { id: Uuid::new_v4(), node_type_id: 1, value: value.to_string(), profession: None, ancestor_path: vec![] }
    }

    #[test]
    fn strong_head_beats_qualified_patterns() {
        let mut vocab = Vocabulary::new();
        let strong_id = Uuid::new_v4();
        vocab.add_strong_head("Registered Nurse", strong_id);
        vocab.add_qualified_pattern("Registered Nurse", "ICU", Uuid::new_v4());

        let outcome = run(&customer("Registered Nurse"), &vocab).unwrap();
        assert_eq!(outcome.master_node_id, strong_id);
        assert_eq!(outcome.confidence, STRONG_HEAD_CONFIDENCE);
    }

    #[test]
    fn qualified_suffix_pattern_matches() {
        let mut vocab = Vocabulary::new();
        let id = Uuid::new_v4();
        vocab.add_qualified_pattern("Registered Nurse", "ICU", id);

        let outcome = run(&customer("ICU Registered Nurse"), &vocab).unwrap();
        assert_eq!(outcome.master_node_id, id);
        assert_eq!(outcome.strategy, "nlp_qualified_suffix");
    }

    #[test]
    fn qualified_prefix_pattern_matches() {
        let mut vocab = Vocabulary::new();
        let id = Uuid::new_v4();
        vocab.add_qualified_pattern("Registered Nurse", "ICU", id);

        let outcome = run(&customer("Registered Nurse ICU"), &vocab).unwrap();
        assert_eq!(outcome.master_node_id, id);
        assert_eq!(outcome.strategy, "nlp_qualified_prefix");
    }

    #[test]
    fn no_vocabulary_match_returns_none() {
        let vocab = Vocabulary::new();
        assert!(run(&customer("Xyzzy Practitioner"), &vocab).is_none());
    }
}

//! Strategy 3: fuzzy match (§4.9). Bigram overlap plus edit distance on
//! `fold`ed values; a secondary pass on `profession` is scaled down.

use crate::normalize::fold;

use super::{CustomerNode, MasterCandidate, MappingOutcome};

const SIMILARITY_THRESHOLD: f64 = 0.70;
const MAX_EDIT_DISTANCE: usize = 3;
const PROFESSION_SCALE: f64 = 0.90;

/// Dice coefficient over character bigrams.
fn bigram_similarity(a: &str, b: &str) -> f64 {
    let bigrams = |s: &str| -> Vec<String> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() < 2 {
            return vec![s.to_string()];
        }
        chars.windows(2).map(|w| w.iter().collect()).collect()
    };
    let a_bigrams = bigrams(a);
    let b_bigrams = bigrams(b);
    if a_bigrams.is_empty() || b_bigrams.is_empty() {
        return 0.0;
    }

    let mut remaining = b_bigrams.clone();
    let mut shared = 0usize;
    for bg in &a_bigrams {
        if let Some(pos) = remaining.iter().position(|x| x == bg) {
            remaining.remove(pos);
            shared += 1;
        }
    }

    (2.0 * shared as f64) / (a_bigrams.len() + b_bigrams.len()) as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            }
            else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = tmp;
        }
    }

    row[b.len()]
}

fn accepts(a: &str, b: &str) -> Option<f64> {
    let similarity = bigram_similarity(a, b);
    if similarity >= SIMILARITY_THRESHOLD && levenshtein(a, b) <= MAX_EDIT_DISTANCE {
        Some(similarity)
    }
    else {
        None
    }
}

/// Highest-confidence candidate across the value pass, then the
/// profession pass (scaled by `PROFESSION_SCALE`), wins.
pub fn run(customer: &CustomerNode, candidates: &[MasterCandidate]) -> Option<MappingOutcome> {
    let folded_customer = fold(&customer.value);

    let best_value = candidates
        .iter()
        .filter_map(|c| accepts(&folded_customer, &fold(&c.value)).map(|score| (score, c.id)))
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    if let Some((score, id)) = best_value {
        return Some(MappingOutcome { master_node_id: id, confidence: score, strategy: "fuzzy_value" });
    }

    let Some(customer_profession) = &customer.profession
    else {
        return None;
    };
    let folded_profession = fold(customer_profession);

    let best_profession = candidates
        .iter()
        .filter_map(|c| {
            let candidate_profession = c.profession.as_deref()?;
            accepts(&folded_profession, &fold(candidate_profession)).map(|score| (score * PROFESSION_SCALE, c.id))
        })
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    best_profession.map(|(score, id)| MappingOutcome { master_node_id: id, confidence: score, strategy: "fuzzy_profession" })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn customer(value: &str, profession: Option<&str>) -> CustomerNode {
        CustomerNode { id: Uuid::new_v4(), node_type_id: 1, value: value.to_string(), profession: profession.map(|p| p.to_string()), ancestor_path: vec![] }
    }

    fn candidate(value: &str, profession: Option<&str>) -> MasterCandidate {
        MasterCandidate { id: Uuid::new_v4(), value: value.to_string(), profession: profession.map(|p| p.to_string()), ancestor_path: vec![] }
    }

    #[test]
    fn similar_strings_above_threshold_match() {
        let customer = customer("ICU Nurse Practitioner", None);
        let candidates = vec![candidate("Critical Care Nurse Practitioner", None)];
        let outcome = run(&customer, &candidates);
        assert!(outcome.is_some());
        assert_eq!(outcome.unwrap().strategy, "fuzzy_value");
    }

    #[test]
    fn dissimilar_strings_do_not_match() {
        let customer = customer("Xyzzy Practitioner", None);
        let candidates = vec![candidate("Registered Nurse", None)];
        assert!(run(&customer, &candidates).is_none());
    }

    #[test]
    fn profession_pass_is_scaled_down() {
        let customer = customer("Totally Different Value", Some("Registered Nurse"));
        let candidates = vec![candidate("Something Else Entirely", Some("Registered Nurs"))];
        if let Some(outcome) = run(&customer, &candidates) {
            assert_eq!(outcome.strategy, "fuzzy_profession");
            assert!(outcome.confidence < 1.0 * PROFESSION_SCALE + f64::EPSILON);
        }
    }

    #[test]
    fn identical_strings_score_close_to_one() {
        assert!((bigram_similarity("nurse", "nurse") - 1.0).abs() < 1e-9);
        assert_eq!(levenshtein("nurse", "nurse"), 0);
    }
}

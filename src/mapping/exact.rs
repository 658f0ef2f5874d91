//! Strategy 1: exact match (§4.9). `fold(value) == fold(value)` is the
//! primary key; `fold(profession)` is a secondary key at a lower confidence.
//! `contains`/`startswith`/`regex` rule commands extend this stage with an
//! additional literal predicate rather than opening a new cascade position
//! (§4.9, §9 decision).

use regex::Regex;

use crate::errors::Error;
use crate::models::enums::RuleCommand;
use crate::models::mapping_rule::MappingRule;
use crate::normalize::fold;

use super::{CustomerNode, MappingOutcome, MasterCandidate};

const PROFESSION_SECONDARY_CONFIDENCE: f64 = 0.95;

/// An additional literal predicate contributed by an enabled
/// `contains`/`startswith`/`regex` rule, evaluated in assignment-priority
/// order before the cascade falls through to NLP.
pub enum Predicate {
    Contains(String),
    StartsWith(String),
    Regex(Regex),
}

impl Predicate {
    fn matches(&self, folded_value: &str) -> bool {
        match self {
            Predicate::Contains(needle) => folded_value.contains(needle.as_str()),
            Predicate::StartsWith(prefix) => folded_value.starts_with(prefix.as_str()),
            Predicate::Regex(re) => re.is_match(folded_value),
        }
    }
}

/// Compiles the additional literal predicates carried by enabled rules,
/// preserving priority order as the caller already sorted `rules`.
pub fn compile_predicates(rules: &[MappingRule]) -> Result<Vec<Predicate>, Error> {
    let mut predicates = Vec::new();
    for rule in rules {
        if !rule.enabled {
            continue;
        }
        let Some(pattern) = &rule.pattern
        else {
            continue;
        };
        let command: RuleCommand = rule.command.parse()?;
        let predicate = match command {
            RuleCommand::Contains => Some(Predicate::Contains(fold(pattern))),
            RuleCommand::StartsWith => Some(Predicate::StartsWith(fold(pattern))),
            RuleCommand::Regex => Some(Predicate::Regex(Regex::new(pattern).map_err(|e| {
                crate::errors::LayoutError::Invalid(format!("invalid regex pattern '{pattern}': {e}"))
            })?)),
            _ => None,
        };
        if let Some(predicate) = predicate {
            predicates.push(predicate);
        }
    }
    Ok(predicates)
}

/// Exact-match candidates by folded value, falling back to folded profession,
/// then the additional literal predicates in order.
pub fn run(customer: &CustomerNode, candidates: &[MasterCandidate], predicates: &[Predicate]) -> Option<MappingOutcome> {
    let folded_customer = fold(&customer.value);

    let value_matches: Vec<&MasterCandidate> = candidates.iter().filter(|c| fold(&c.value) == folded_customer).collect();
    if let Some(outcome) = resolve(customer, &value_matches, 1.0) {
        return Some(outcome);
    }

    if let Some(customer_profession) = &customer.profession {
        let folded_profession = fold(customer_profession);
        let profession_matches: Vec<&MasterCandidate> = candidates
            .iter()
            .filter(|c| c.profession.as_deref().map(fold).as_deref() == Some(folded_profession.as_str()))
            .collect();
        if let Some(outcome) = resolve(customer, &profession_matches, PROFESSION_SECONDARY_CONFIDENCE) {
            return Some(outcome);
        }
    }

    for predicate in predicates {
        let matches: Vec<&MasterCandidate> = candidates.iter().filter(|c| predicate.matches(&fold(&c.value))).collect();
        if let Some(outcome) = resolve(customer, &matches, 1.0) {
            return Some(outcome);
        }
    }

    None
}

/// Single candidate wins outright; multiple disambiguate by closest ancestor
/// agreement, ties broken to the lexicographically smallest node id (§4.9).
fn resolve(customer: &CustomerNode, matches: &[&MasterCandidate], confidence: f64) -> Option<MappingOutcome> {
    match matches.len() {
        0 => None,
        1 => Some(MappingOutcome { master_node_id: matches[0].id, confidence, strategy: "exact" }),
        _ => {
            let best = matches
                .iter()
                .map(|c| (ancestor_agreement(customer, c), c.id))
                .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
                .map(|(_, id)| id)?;
            Some(MappingOutcome { master_node_id: best, confidence, strategy: "exact" })
        }
    }
}

fn ancestor_agreement(customer: &CustomerNode, candidate: &MasterCandidate) -> usize {
    customer
        .ancestor_path
        .iter()
        .zip(candidate.ancestor_path.iter())
        .filter(|(a, b)| !a.is_na && !b.is_na && fold(&a.value) == fold(&b.value))
        .count()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::mapping::PathSegment;

    fn customer(value: &str, profession: Option<&str>, path: Vec<&str>) -> CustomerNode {
        CustomerNode {
            id: Uuid::new_v4(),
            node_type_id: 1,
            value: value.to_string(),
            profession: profession.map(|p| p.to_string()),
            ancestor_path: path.into_iter().map(|v| PathSegment { value: v.to_string(), is_na: false }).collect(),
        }
    }

    fn candidate(value: &str, path: Vec<&str>) -> MasterCandidate {
        MasterCandidate {
            id: Uuid::new_v4(),
            value: value.to_string(),
            profession: None,
            ancestor_path: path.into_iter().map(|v| PathSegment { value: v.to_string(), is_na: false }).collect(),
        }
    }

    #[test]
    fn single_exact_match_wins_at_full_confidence() {
        let customer = customer("Registered Nurse", None, vec![]);
        let candidates = vec![candidate("Registered Nurse", vec![]), candidate("Licensed Practical Nurse", vec![])];
        let outcome = run(&customer, &candidates, &[]).unwrap();
        assert_eq!(outcome.master_node_id, candidates[0].id);
        assert_eq!(outcome.confidence, 1.0);
    }

    #[test]
    fn ambiguous_exact_matches_disambiguate_by_ancestor_agreement() {
        let customer = customer("Nurse Practitioner", None, vec!["Healthcare", "Nursing"]);
        let candidates = vec![
            candidate("Nurse Practitioner", vec!["Healthcare", "Allied Health"]),
            candidate("Nurse Practitioner", vec!["Healthcare", "Nursing"]),
        ];
        let outcome = run(&customer, &candidates, &[]).unwrap();
        assert_eq!(outcome.master_node_id, candidates[1].id);
    }

    #[test]
    fn profession_is_a_secondary_key_at_lower_confidence() {
        let mut customer = customer("RN II", Some("Registered Nurse"), vec![]);
        customer.value = "RN II".to_string();
        let mut master = candidate("Registered Nurse Level 2", vec![]);
        master.profession = Some("Registered Nurse".to_string());
        let outcome = run(&customer, &[master], &[]).unwrap();
        assert_eq!(outcome.confidence, PROFESSION_SECONDARY_CONFIDENCE);
    }

    #[test]
    fn no_match_returns_none() {
        let customer = customer("Xyzzy Practitioner", None, vec![]);
        let candidates = vec![candidate("Registered Nurse", vec![])];
        assert!(run(&customer, &candidates, &[]).is_none());
    }
}

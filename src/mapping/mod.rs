//! C9: the mapping engine — the matcher cascade (§4.9). The cascade order
//! (Exact -> NLP-qualifier -> Fuzzy -> Semantic) is fixed; rule configuration
//! only selects which strategies are enabled and how they're parameterized,
//! per the design note that each strategy is a pure function
//! `(customer_node, master_candidates) -> Optional<Mapping>`.

pub mod exact;
pub mod fuzzy;
pub mod nlp;
pub mod orchestrator;
pub mod semantic;
pub mod vocabulary;
pub mod writer;

use uuid::Uuid;

use crate::errors::Error;
use crate::models::mapping_rule::MappingRule;
use vocabulary::Vocabulary;

/// One segment of a node's ancestor path, including N/A skip tokens so the
/// semantic matcher sees the structural shape of gap-filled branches (§4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub value: String,
    pub is_na: bool,
}

#[derive(Debug, Clone)]
pub struct CustomerNode {
    pub id: Uuid,
    pub node_type_id: i32,
    pub value: String,
    pub profession: Option<String>,
    pub ancestor_path: Vec<PathSegment>,
}

#[derive(Debug, Clone)]
pub struct MasterCandidate {
    pub id: Uuid,
    pub value: String,
    pub profession: Option<String>,
    pub ancestor_path: Vec<PathSegment>,
}

/// The result of one successful strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutcome {
    pub master_node_id: Uuid,
    pub confidence: f64,
    pub strategy: &'static str,
}

/// Runs the fixed four-stage cascade for one customer node against its
/// same-type master candidates. `rules` are the enabled
/// `MappingRuleAssignment` rules for this `(T_master, T_c)` pair, in
/// priority order; they parameterize the Exact stage and gate Semantic, they
/// never reorder the cascade (§4.9, §9 decision).
pub fn run_cascade(
    customer: &CustomerNode,
    candidates: &[MasterCandidate],
    rules: &[MappingRule],
    vocabulary: &Vocabulary,
    matcher: &dyn semantic::SemanticMatcher,
) -> Result<Option<MappingOutcome>, Error> {
    let predicates = exact::compile_predicates(rules)?;
    if let Some(outcome) = exact::run(customer, candidates, &predicates) {
        return Ok(Some(outcome));
    }

    if let Some(outcome) = nlp::run(customer, vocabulary) {
        return Ok(Some(outcome));
    }

    if let Some(outcome) = fuzzy::run(customer, candidates) {
        return Ok(Some(outcome));
    }

    let ai_enabled = rules.iter().any(|r| r.enabled && r.ai_flag);
    if ai_enabled {
        if let Some(outcome) = semantic::run(customer, candidates, matcher)? {
            return Ok(Some(outcome));
        }
    }

    Ok(None)
}

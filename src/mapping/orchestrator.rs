//! Drives the cascade (C9) across every node in a customer taxonomy against
//! its paired master taxonomy, one node type at a time, and persists each
//! accepted outcome via [`writer::write_cascade_mapping`] (§4.9).

use std::collections::HashMap;

use diesel::prelude::*;
use uuid::Uuid;

use crate::errors::Error;
use crate::models::enums::Status;
use crate::models::mapping_rule::{MappingRule, MappingRuleAssignment};
use crate::models::node::Node;
use crate::models::node_attribute::NodeAttribute;
use crate::schema::{mapping_rule_assignments, mapping_rules, node_attributes, nodes};

use super::semantic::SemanticMatcher;
use super::vocabulary::{MasterVocabularyEntry, Vocabulary};
use super::{run_cascade, writer, CustomerNode, MasterCandidate, PathSegment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeCounts {
    pub mapped: usize,
    pub unmapped: usize,
}

fn ancestor_path(conn: &mut PgConnection, node: &Node) -> Result<Vec<PathSegment>, Error> {
    let mut path = Vec::new();
    let mut current_parent = node.parent_id;
    while let Some(parent_id) = current_parent {
        let parent: Node = nodes::table.find(parent_id).select(Node::as_select()).first(conn)?;
        path.push(PathSegment { value: parent.value.clone(), is_na: parent.is_na() });
        current_parent = parent.parent_id;
    }
    path.reverse();
    Ok(path)
}

/// Same-node-type dictionary entries pair a master and child type directly
/// (§4.9): a customer "Industry" level maps against the master "Industry"
/// level, so the rule-assignment lookup uses one node type for both sides.
fn rules_for_type(conn: &mut PgConnection, node_type_id: i32) -> Result<Vec<MappingRule>, Error> {
    let assignments: Vec<MappingRuleAssignment> = mapping_rule_assignments::table
        .filter(mapping_rule_assignments::master_node_type_id.eq(node_type_id))
        .filter(mapping_rule_assignments::child_node_type_id.eq(node_type_id))
        .order(mapping_rule_assignments::priority.asc())
        .select(MappingRuleAssignment::as_select())
        .load(conn)?;

    let mut rules = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let rule: MappingRule = mapping_rules::table.find(assignment.rule_id).select(MappingRule::as_select()).first(conn)?;
        if rule.enabled {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// Runs the cascade for every active, non-N/A node in `customer_taxonomy_id`
/// against same-type active nodes in `master_taxonomy_id`. Candidates, rules,
/// and the NLP vocabulary built from the master side's nodes/attributes are
/// all cached per node type for the run, since a taxonomy typically has far
/// fewer node types than nodes.
pub fn run_for_taxonomy(
    conn: &mut PgConnection,
    master_taxonomy_id: Uuid,
    customer_taxonomy_id: Uuid,
    matcher: &dyn SemanticMatcher,
) -> Result<CascadeCounts, Error> {
    let customer_nodes: Vec<Node> = nodes::table
        .filter(nodes::taxonomy_id.eq(customer_taxonomy_id))
        .filter(nodes::status.eq(Status::Active.as_str()))
        .select(Node::as_select())
        .load(conn)?;

    let mut candidates_by_type: HashMap<i32, Vec<(Node, Vec<PathSegment>)>> = HashMap::new();
    let mut rules_by_type: HashMap<i32, Vec<MappingRule>> = HashMap::new();
    let mut vocabulary_by_type: HashMap<i32, Vocabulary> = HashMap::new();
    let mut counts = CascadeCounts::default();

    for node in customer_nodes {
        if node.is_na() {
            continue;
        }

        if !candidates_by_type.contains_key(&node.node_type_id) {
            let master_nodes: Vec<Node> = nodes::table
                .filter(nodes::taxonomy_id.eq(master_taxonomy_id))
                .filter(nodes::node_type_id.eq(node.node_type_id))
                .filter(nodes::status.eq(Status::Active.as_str()))
                .select(Node::as_select())
                .load(conn)?;

            let master_ids: Vec<Uuid> = master_nodes.iter().map(|n| n.id).collect();
            let attributes: Vec<NodeAttribute> = node_attributes::table
                .filter(node_attributes::node_id.eq_any(&master_ids))
                .filter(node_attributes::status.eq(Status::Active.as_str()))
                .select(NodeAttribute::as_select())
                .load(conn)?;
            let mut attributes_by_node: HashMap<Uuid, Vec<String>> = HashMap::new();
            for attribute in attributes {
                attributes_by_node.entry(attribute.node_id).or_default().push(attribute.value);
            }

            let mut with_paths = Vec::with_capacity(master_nodes.len());
            let mut vocabulary_entries = Vec::with_capacity(master_nodes.len());
            for master_node in master_nodes {
                let path = ancestor_path(conn, &master_node)?;
                vocabulary_entries.push(MasterVocabularyEntry {
                    master_node_id: master_node.id,
                    value: master_node.value.clone(),
                    profession: master_node.profession.clone(),
                    attribute_values: attributes_by_node.remove(&master_node.id).unwrap_or_default(),
                });
                with_paths.push((master_node, path));
            }
            candidates_by_type.insert(node.node_type_id, with_paths);
            vocabulary_by_type.insert(node.node_type_id, Vocabulary::build(&vocabulary_entries));
        }
        let candidates = &candidates_by_type[&node.node_type_id];

        let master_candidates: Vec<MasterCandidate> = candidates
            .iter()
            .map(|(n, path)| MasterCandidate { id: n.id, value: n.value.clone(), profession: n.profession.clone(), ancestor_path: path.clone() })
            .collect();

        if !rules_by_type.contains_key(&node.node_type_id) {
            let rules = rules_for_type(conn, node.node_type_id)?;
            rules_by_type.insert(node.node_type_id, rules);
        }
        let rules = &rules_by_type[&node.node_type_id];

        let path = ancestor_path(conn, &node)?;
        let customer_node =
            CustomerNode { id: node.id, node_type_id: node.node_type_id, value: node.value.clone(), profession: node.profession.clone(), ancestor_path: path };

        let vocabulary = &vocabulary_by_type[&node.node_type_id];
        let outcome = run_cascade(&customer_node, &master_candidates, rules, vocabulary, matcher)?;

        match outcome {
            Some(outcome) => {
                let rule_id = rules.first().map(|r| r.id);
                writer::write_cascade_mapping(conn, rule_id, outcome.master_node_id, node.id, outcome.confidence)?;
                counts.mapped += 1;
            }
            None => counts.unmapped += 1,
        }
    }

    Ok(counts)
}

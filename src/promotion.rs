//! C10: the promotion projector (§4.10). Reconciles the read-optimized
//! production set to exactly the active, non-AI, approved mappings. Idempotent,
//! safe to re-run.

use std::collections::{HashMap, HashSet};

use diesel::prelude::*;
use uuid::Uuid;

use crate::audit;
use crate::errors::Error;
use crate::models::audit_log::AuditOperation;
use crate::models::enums::MappingStatus;
use crate::models::mapping::Mapping;
use crate::models::production_mapping::{NewProductionMapping, ProductionMapping};
use crate::schema::{mapping_rules, mappings, production_mappings};

const ACTOR: &str = "promotion:sync";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    pub inserted: usize,
    pub deleted: usize,
}

/// The production-projection predicate (§4.10, §8): `M.is_active AND
/// M.status == active AND !rule(M).ai_flag`.
pub fn is_eligible(status: &str, is_active: bool, rule_ai_flag: bool) -> bool {
    is_active && status == MappingStatus::Active.as_str() && !rule_ai_flag
}

/// Takes a snapshot of the eligible set and converges the production table:
/// inserts new members, deletes members no longer eligible.
pub fn sync(conn: &mut PgConnection) -> Result<SyncCounts, Error> {
    // `mappings.rule_id` is nullable: NLP/fuzzy cascade wins are written with
    // no rule at all, and a mapping with no rule is not AI-flagged. An inner
    // join would drop those rows before the `ai_flag` filter ever saw them.
    let eligible: Vec<Mapping> = mappings::table
        .left_join(mapping_rules::table)
        .filter(mappings::status.eq(MappingStatus::Active.as_str()))
        .filter(mappings::is_active.eq(true))
        .filter(mapping_rules::ai_flag.eq(false).or(mapping_rules::ai_flag.is_null()))
        .select(Mapping::as_select())
        .load(conn)?;

    let eligible_pairs: HashSet<(Uuid, Uuid)> = eligible.iter().map(|m| (m.master_node_id, m.child_node_id)).collect();

    let existing: Vec<ProductionMapping> = production_mappings::table.select(ProductionMapping::as_select()).load(conn)?;
    let existing_pairs: HashMap<(Uuid, Uuid), Uuid> = existing.iter().map(|p| ((p.master_node_id, p.child_node_id), p.id)).collect();

    let to_insert: Vec<&Mapping> = eligible.iter().filter(|m| !existing_pairs.contains_key(&(m.master_node_id, m.child_node_id))).collect();
    let to_delete: Vec<Uuid> = existing.iter().filter(|p| !eligible_pairs.contains(&(p.master_node_id, p.child_node_id))).map(|p| p.id).collect();

    for mapping in &to_insert {
        let new_row = NewProductionMapping::from_mapping(mapping);
        let inserted: ProductionMapping =
            diesel::insert_into(production_mappings::table).values(&new_row).returning(ProductionMapping::as_select()).get_result(conn)?;
        audit::record(conn, "production_mappings", inserted.id, AuditOperation::Insert, None::<&ProductionMapping>, Some(&inserted), ACTOR)?;
    }

    if !to_delete.is_empty() {
        let removed: Vec<ProductionMapping> =
            production_mappings::table.filter(production_mappings::id.eq_any(&to_delete)).select(ProductionMapping::as_select()).load(conn)?;
        diesel::delete(production_mappings::table.filter(production_mappings::id.eq_any(&to_delete))).execute(conn)?;
        for row in &removed {
            audit::record(conn, "production_mappings", row.id, AuditOperation::Delete, Some(row), None::<&ProductionMapping>, ACTOR)?;
        }
    }

    Ok(SyncCounts { inserted: to_insert.len(), deleted: to_delete.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligible_requires_active_status_and_flag_and_non_ai_rule() {
        assert!(is_eligible("active", true, false));
        assert!(!is_eligible("pending_review", true, false));
        assert!(!is_eligible("active", false, false));
        assert!(!is_eligible("active", true, true));
    }
}

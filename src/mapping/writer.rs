//! Persists a cascade outcome as a [`Mapping`](crate::models::mapping::Mapping),
//! handling the supersession chain (§4.9) and exposing the narrow
//! `record_human_mapping` entry point for manually-asserted mappings.

use diesel::prelude::*;
use uuid::Uuid;

use crate::audit;
use crate::errors::Error;
use crate::models::audit_log::AuditOperation;
use crate::models::mapping::{Mapping, NewMapping, SupersedeMapping};
use crate::models::mapping_version::NewMappingVersion;
use crate::schema::{mapping_versions, mappings};

/// Upserts `(master_node, child_node)` as the active mapping for `child_node`,
/// superseding any prior active mapping for the same child with a different
/// master (§4.9: at most one active mapping per child node). `actor` is the
/// audit attribution string for this write — the cascade label for automatic
/// matches, or the reviewer's identity for a human override.
fn write(
    conn: &mut PgConnection,
    rule_id: Option<Uuid>,
    master_node_id: Uuid,
    child_node_id: Uuid,
    confidence: f64,
    user_attribution: Option<String>,
    actor: &str,
) -> Result<Mapping, Error> {
    let prior: Option<Mapping> = mappings::table
        .filter(mappings::child_node_id.eq(child_node_id))
        .filter(mappings::is_active.eq(true))
        .select(Mapping::as_select())
        .first(conn)
        .optional()?;

    if let Some(prior) = &prior {
        if prior.master_node_id == master_node_id {
            // Same assignment already active; nothing to supersede or rewrite.
            return Ok(prior.clone());
        }
    }

    let (supersedes, mapping_version) = match &prior {
        Some(prior) => {
            diesel::update(mappings::table.find(prior.id)).set(SupersedeMapping { is_active: false }).execute(conn)?;

            let new_id = Uuid::new_v4();
            diesel::update(mapping_versions::table.filter(mapping_versions::mapping_id.eq(prior.id)).filter(mapping_versions::version_to_date.is_null()))
                .set(mapping_versions::superseded_by.eq(new_id))
                .execute(conn)?;

            let superseded: Mapping = mappings::table.find(prior.id).select(Mapping::as_select()).first(conn)?;
            audit::record(conn, "mappings", prior.id, AuditOperation::Update, Some(prior), Some(&superseded), actor)?;

            (Some(prior.id), prior.mapping_version + 1)
        }
        None => (None, 1),
    };

    let new_mapping = NewMapping::create(rule_id, master_node_id, child_node_id, confidence, user_attribution, supersedes, mapping_version);
    diesel::insert_into(mappings::table).values(&new_mapping).execute(conn)?;

    diesel::insert_into(mapping_versions::table)
        .values(NewMappingVersion::open(new_mapping.id, mapping_version))
        .execute(conn)?;

    let inserted: Mapping = mappings::table.find(new_mapping.id).select(Mapping::as_select()).first(conn)?;
    audit::record(conn, "mappings", inserted.id, AuditOperation::Insert, None::<&Mapping>, Some(&inserted), actor)?;
    Ok(inserted)
}

/// Writes the result of an automatic cascade match. `rule_id` is the
/// assignment that gated the match, when the winning strategy was rule-driven
/// (exact, or semantic gated by `ai_flag`); the qualifier and fuzzy strategies
/// run unconditionally and may win with no configured rule at all.
pub fn write_cascade_mapping(
    conn: &mut PgConnection,
    rule_id: Option<Uuid>,
    master_node_id: Uuid,
    child_node_id: Uuid,
    confidence: f64,
) -> Result<Mapping, Error> {
    write(conn, rule_id, master_node_id, child_node_id, confidence, None, "mapping:cascade")
}

/// A manually-asserted mapping from a reviewer, outside the automatic
/// cascade. Performs the same supersession bookkeeping so manual overrides
/// stay consistent with the versioning and promotion invariants, but never
/// invokes a matcher strategy (§4.9).
pub fn record_human_mapping(
    conn: &mut PgConnection,
    rule_id: Uuid,
    master_node_id: Uuid,
    child_node_id: Uuid,
    user_attribution: impl Into<String>,
) -> Result<Mapping, Error> {
    let user_attribution = user_attribution.into();
    let actor = format!("user:{user_attribution}");
    write(conn, Some(rule_id), master_node_id, child_node_id, 1.0, Some(user_attribution), &actor)
}

//! C8: the version engine (§4.8). Closes the previous open version and opens
//! a new one under a per-taxonomy advisory lock, preserving the invariant
//! that exactly one version row per taxonomy has a null `version_to_date`.

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::audit;
use crate::database::with_taxonomy_version_lock;
use crate::errors::{Error, VersioningError};
use crate::hierarchy::NodeChange;
use crate::models::audit_log::AuditOperation;
use crate::models::version::{AffectedNode, CloseVersion, NewTaxonomyVersion, TaxonomyVersion};
use crate::schema::taxonomy_versions;

const ACTOR: &str = "version:engine";

/// Opens the first version row for a brand-new taxonomy. Called once, when a
/// taxonomy is created by its first load.
pub fn open_first_version(conn: &mut PgConnection, taxonomy_id: Uuid) -> Result<TaxonomyVersion, Error> {
    let new_row = NewTaxonomyVersion::first(taxonomy_id);
    let inserted: TaxonomyVersion = diesel::insert_into(taxonomy_versions::table)
        .values(&new_row)
        .returning(TaxonomyVersion::as_select())
        .get_result(conn)?;
    audit::record(conn, "taxonomy_versions", inserted.id, AuditOperation::Insert, None::<&TaxonomyVersion>, Some(&inserted), ACTOR)?;
    Ok(inserted)
}

/// Closes the taxonomy's current open version and opens the next one,
/// carrying the structural delta from the load that triggered it (§4.8).
/// Triggered exactly once per successfully-closed load that changed structure.
pub fn record_version(
    conn: &mut PgConnection,
    taxonomy_id: Uuid,
    change_type: impl Into<String>,
    affected_nodes: Vec<AffectedNode>,
    remapping_flag: bool,
    remapping_reason: Option<String>,
) -> Result<TaxonomyVersion, Error> {
    let change_type = change_type.into();

    with_taxonomy_version_lock(conn, taxonomy_id, move |conn| {
        let open: Vec<TaxonomyVersion> = taxonomy_versions::table
            .filter(taxonomy_versions::taxonomy_id.eq(taxonomy_id))
            .filter(taxonomy_versions::version_to_date.is_null())
            .select(TaxonomyVersion::as_select())
            .load(conn)?;

        if open.len() > 1 {
            return Err(VersioningError::MultipleOpenVersions(taxonomy_id).into());
        }

        let next_number = match open.first() {
            Some(prev) => {
                let closed: TaxonomyVersion = diesel::update(taxonomy_versions::table.find(prev.id))
                    .set(CloseVersion { version_to_date: Some(Utc::now()) })
                    .returning(TaxonomyVersion::as_select())
                    .get_result(conn)?;
                audit::record(conn, "taxonomy_versions", prev.id, AuditOperation::Update, Some(prev), Some(&closed), ACTOR)?;
                prev.version_number + 1
            }
            None => 1,
        };

        let new_row = NewTaxonomyVersion {
            id: Uuid::new_v4(),
            taxonomy_id,
            version_number: next_number,
            change_type: change_type.clone(),
            affected_nodes: serde_json::to_value(&affected_nodes)?,
            affected_attributes: serde_json::json!([]),
            remapping_flag,
            remapping_reason: remapping_reason.clone(),
            remapping_processed: 0,
            remapping_changed: 0,
            remapping_unchanged: 0,
            remapping_failed: 0,
            remapping_new: 0,
            remapping_status: "none".to_string(),
            version_from_date: Utc::now(),
            version_to_date: None,
        };

        let inserted: TaxonomyVersion = diesel::insert_into(taxonomy_versions::table)
            .values(&new_row)
            .returning(TaxonomyVersion::as_select())
            .get_result(conn)?;
        audit::record(conn, "taxonomy_versions", inserted.id, AuditOperation::Insert, None::<&TaxonomyVersion>, Some(&inserted), ACTOR)?;

        Ok(inserted)
    })
}

/// Finds the single open version row for a taxonomy; fails if there isn't
/// exactly one, surfacing the integrity violation rather than silently
/// picking one (§8: exactly one open version per taxonomy).
pub fn current_version(conn: &mut PgConnection, taxonomy_id: Uuid) -> Result<TaxonomyVersion, Error> {
    let mut open: Vec<TaxonomyVersion> = taxonomy_versions::table
        .filter(taxonomy_versions::taxonomy_id.eq(taxonomy_id))
        .filter(taxonomy_versions::version_to_date.is_null())
        .select(TaxonomyVersion::as_select())
        .load(conn)?;

    match open.len() {
        0 => Err(VersioningError::NoOpenVersion(taxonomy_id).into()),
        1 => Ok(open.remove(0)),
        _ => Err(VersioningError::MultipleOpenVersions(taxonomy_id).into()),
    }
}

pub fn affected_node(node_id: Uuid, change: NodeChange) -> AffectedNode {
    AffectedNode { node_id, change: change.as_str().to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affected_node_uses_change_label() {
        let id = Uuid::new_v4();
        let node = affected_node(id, NodeChange::Deactivated);
        assert_eq!(node.node_id, id);
        assert_eq!(node.change, "deactivated");
    }
}

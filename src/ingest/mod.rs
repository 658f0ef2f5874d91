//! Ingest entry orchestration (§6): turns one load's rows into bronze rows,
//! then drives them through the silver pipeline (C1-C8) in row order.
//!
//! Two equivalent external shapes feed this module: a spreadsheet referenced
//! by a conventionally-named file (see [`filename`]) or a JSON payload naming
//! the layout and rows directly. Both converge on [`IngestRequest`] before
//! reaching [`run`].

pub mod filename;

use std::collections::HashMap;

use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::decoder::{self, RawRow};
use crate::errors::{Error, LayoutError};
use crate::hierarchy::{NodeChange, NodeSink, PgHierarchyStore};
use crate::layout::{HeaderTag, Layout};
use crate::load_state::{self, RowCounts};
use crate::models::attribute_type::NewAttributeType;
use crate::models::bronze_row::{BronzeRow, BronzeRowStatusUpdate, NewBronzeRow};
use crate::models::enums::{LoadKind, LoadStatus, RowStatus, TaxonomyKind};
use crate::models::load::{LoadDetails, NewLoad};
use crate::models::node_attribute::NodeAttributeUpsert;
use crate::models::node_type::NewNodeType;
use crate::models::taxonomy::{NewTaxonomy, Taxonomy, TouchTaxonomy, MASTER_OWNER_ID, MASTER_TAXONOMY_SENTINEL};
use crate::resolver::{ingest_decoded_row, RollingAncestorResolver, RowContext};
use crate::retry::{with_retries, RetryPolicy};
use crate::schema::{attribute_types, bronze_rows, loads, node_types, taxonomies};
use crate::versioning;

/// One row of the JSON ingest shape (§6): header-tagged cells exactly as the
/// layout declares them.
#[derive(Debug, Clone)]
pub struct IngestRow {
    pub cells: Vec<(String, String)>,
}

/// Everything needed to run one load, already resolved from either external
/// shape (filename-bearing spreadsheet or explicit JSON payload).
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub owner_id: String,
    pub taxonomy_kind: TaxonomyKind,
    /// `None` asks the engine to resolve or create the taxonomy by
    /// `(owner_id, taxonomy_kind)` alone — always `None` for master loads.
    pub taxonomy_id: Option<Uuid>,
    pub load_kind: LoadKind,
    pub layout_tags: Vec<HeaderTag>,
    pub rows: Vec<IngestRow>,
    pub details: LoadDetails,
}

#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    pub load_id: Uuid,
    pub taxonomy_id: Uuid,
    pub status: LoadStatus,
    pub counts: RowCounts,
}

/// The JSON layout object (§6): `{Nodes:[{Level,Name}…], Attributes:[…], ProfessionColumn?}`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonLayout {
    #[serde(rename = "Nodes", default)]
    pub nodes: Vec<JsonNodeLevel>,
    #[serde(rename = "Attributes", default)]
    pub attributes: Vec<String>,
    #[serde(rename = "ProfessionColumn")]
    pub profession_column: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonNodeLevel {
    #[serde(rename = "Level")]
    pub level: i32,
    #[serde(rename = "Name")]
    pub name: String,
}

impl JsonLayout {
    pub fn into_tags(self) -> Vec<HeaderTag> {
        let JsonLayout { nodes, attributes, profession_column } = self;
        let mut tags: Vec<HeaderTag> = nodes.into_iter().map(|n| HeaderTag::Node { level: n.level, name: n.name }).collect();

        for attr in attributes {
            let is_profession = profession_column.as_deref() == Some(attr.as_str());
            tags.push(HeaderTag::Attribute { name: attr.clone() });
            if is_profession {
                tags.push(HeaderTag::Profession { name: attr });
            }
        }
        tags
    }
}

/// The explicit JSON ingest shape (§6): `{taxonomy_type, customer_id,
/// taxonomy_id, request_id, layout, rows[], callback_url?}`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonIngestPayload {
    pub taxonomy_type: String,
    pub customer_id: String,
    pub taxonomy_id: String,
    pub request_id: Option<String>,
    pub layout: JsonLayout,
    pub rows: Vec<Vec<(String, String)>>,
    pub callback_url: Option<String>,
}

impl JsonIngestPayload {
    pub fn into_request(self, load_kind: LoadKind) -> Result<IngestRequest, Error> {
        let taxonomy_kind: TaxonomyKind = self.taxonomy_type.parse()?;

        let taxonomy_id = if self.taxonomy_id == MASTER_TAXONOMY_SENTINEL {
            None
        }
        else {
            Some(Uuid::parse_str(&self.taxonomy_id).map_err(|_| LayoutError::Invalid(format!("invalid taxonomy id '{}'", self.taxonomy_id)))?)
        };

        Ok(IngestRequest {
            owner_id: self.customer_id,
            taxonomy_kind,
            taxonomy_id,
            load_kind,
            layout_tags: self.layout.into_tags(),
            rows: self.rows.into_iter().map(|cells| IngestRow { cells }).collect(),
            details: LoadDetails {
                input_format: Some("json".to_string()),
                request_id: self.request_id,
                source_url: None,
                callback_url: self.callback_url,
            },
        })
    }
}

fn resolve_taxonomy(conn: &mut PgConnection, request: &IngestRequest) -> Result<Taxonomy, Error> {
    let is_master = matches!(request.taxonomy_kind, TaxonomyKind::Master);
    let owner_id = if is_master { MASTER_OWNER_ID.to_string() } else { request.owner_id.clone() };

    if let Some(id) = request.taxonomy_id {
        if let Some(existing) = taxonomies::table.find(id).select(Taxonomy::as_select()).first(conn).optional()? {
            return Ok(existing);
        }
    }

    let existing: Option<Taxonomy> = taxonomies::table
        .filter(taxonomies::owner_id.eq(&owner_id))
        .filter(taxonomies::kind.eq(request.taxonomy_kind.as_str()))
        .select(Taxonomy::as_select())
        .first(conn)
        .optional()?;
    if let Some(existing) = existing {
        return Ok(existing);
    }

    let new_taxonomy = NewTaxonomy::create(owner_id, request.taxonomy_kind);
    diesel::insert_into(taxonomies::table).values(&new_taxonomy).execute(conn)?;
    versioning::open_first_version(conn, new_taxonomy.id)?;

    let inserted: Taxonomy = taxonomies::table.find(new_taxonomy.id).select(Taxonomy::as_select()).first(conn)?;
    Ok(inserted)
}

/// Dictionary tables are append-only and shared; concurrent loads race to
/// create the same entry, so the insert is a no-op on conflict and the
/// winning row is re-read (§5).
fn resolve_node_type(conn: &mut PgConnection, name: &str) -> Result<i32, Error> {
    diesel::insert_into(node_types::table)
        .values(NewNodeType::create(name))
        .on_conflict(node_types::name)
        .do_nothing()
        .execute(conn)?;

    let node_type: crate::models::node_type::NodeType =
        node_types::table.filter(node_types::name.eq(name)).select(crate::models::node_type::NodeType::as_select()).first(conn)?;
    Ok(node_type.id)
}

fn resolve_attribute_type(conn: &mut PgConnection, name: &str) -> Result<i32, Error> {
    diesel::insert_into(attribute_types::table)
        .values(NewAttributeType::create(name))
        .on_conflict(attribute_types::name)
        .do_nothing()
        .execute(conn)?;

    let attribute_type: crate::models::attribute_type::AttributeType = attribute_types::table
        .filter(attribute_types::name.eq(name))
        .select(crate::models::attribute_type::AttributeType::as_select())
        .first(conn)?;
    Ok(attribute_type.id)
}

/// Decodes and silver-processes one bronze row. Single row of failure here is
/// row-local (§7): the caller marks the bronze row `failed` and continues.
#[allow(clippy::too_many_arguments)]
fn process_row(
    conn: &mut PgConnection,
    layout: &Layout,
    raw_row: &RawRow,
    ctx: &RowContext,
    resolver: &mut RollingAncestorResolver,
    node_type_ids: &mut HashMap<String, i32>,
    attribute_type_ids: &mut HashMap<String, i32>,
    touched: &mut Vec<Uuid>,
) -> Result<(), Error> {
    let decoded = decoder::decode_row(raw_row, layout)?;

    let type_name = layout
        .type_name_for_level(decoded.level)
        .expect("decode_row only reports levels declared in the layout")
        .to_string();

    if !node_type_ids.contains_key(&type_name) {
        let id = resolve_node_type(conn, &type_name)?;
        node_type_ids.insert(type_name.clone(), id);
    }
    let node_type_id = node_type_ids[&type_name];

    let mut attribute_type_id_list = Vec::with_capacity(decoded.attributes.len());
    for (attr_name, _) in &decoded.attributes {
        if !attribute_type_ids.contains_key(attr_name) {
            let id = resolve_attribute_type(conn, attr_name)?;
            attribute_type_ids.insert(attr_name.clone(), id);
        }
        attribute_type_id_list.push(attribute_type_ids[attr_name]);
    }

    let mut sink = PgHierarchyStore::new(&mut *conn);
    let sibling_ids = ingest_decoded_row(resolver, &decoded, ctx, node_type_id, &mut sink)?;
    touched.extend(&sibling_ids);

    // Attributes on a multi-valued cell attach to the first sibling, the one
    // that also becomes the `lastSeen` ancestor (§4.4 design note).
    if let Some(&primary_node_id) = sibling_ids.first() {
        for ((_, value), attribute_type_id) in decoded.attributes.iter().zip(attribute_type_id_list) {
            sink.upsert_attribute(NodeAttributeUpsert {
                node_id: primary_node_id,
                attribute_type_id,
                value: value.clone(),
                load_id: ctx.load_id,
                row_id: ctx.row_id,
            })?;
        }
    }

    Ok(())
}

/// Runs one load end to end: resolve/create the taxonomy, open the load,
/// insert bronze rows, then process them single-threaded in input order
/// (§5: the rolling-ancestor state is order-dependent and cannot be sharded).
pub fn run(conn: &mut PgConnection, request: IngestRequest) -> Result<IngestOutcome, Error> {
    let taxonomy = resolve_taxonomy(conn, &request)?;
    let is_master = matches!(request.taxonomy_kind, TaxonomyKind::Master);

    let new_load = NewLoad::open(request.owner_id.clone(), taxonomy.id, request.load_kind, request.taxonomy_kind, request.details.clone());
    let load_id = new_load.id;
    diesel::insert_into(loads::table).values(&new_load).execute(conn)?;

    // A layout error is terminal for this load (§7), but the load row must
    // already exist to record that outcome against (§3). Reported as a
    // recorded `Failed` outcome rather than a propagated `Err` so the caller's
    // close-load callback still fires (§6).
    let layout = match Layout::resolve(&request.layout_tags, is_master) {
        Ok(layout) => layout,
        Err(err) => {
            tracing::warn!(load_id = %load_id, error = %err, "load failed before any row was processed");
            let status = load_state::close_load(conn, load_id, &RowCounts::default())?;
            return Ok(IngestOutcome { load_id, taxonomy_id: taxonomy.id, status, counts: RowCounts::default() });
        }
    };

    let mut bronze_rows_inserted: Vec<BronzeRow> = Vec::with_capacity(request.rows.len());
    for (index, row) in request.rows.iter().enumerate() {
        let payload = serde_json::to_value(&row.cells)?;
        let new_row = NewBronzeRow::create(load_id, request.owner_id.clone(), taxonomy.id, index as i32, payload);
        diesel::insert_into(bronze_rows::table).values(&new_row).execute(conn)?;
        let inserted: BronzeRow = bronze_rows::table.find(new_row.id).select(BronzeRow::as_select()).first(conn)?;
        bronze_rows_inserted.push(inserted);
    }

    let progress = crate::utils::new_progress_bar(bronze_rows_inserted.len(), "Processing rows");
    let mut resolver = RollingAncestorResolver::new();
    let mut node_type_ids = HashMap::new();
    let mut attribute_type_ids = HashMap::new();
    let mut touched_nodes = Vec::new();
    let mut counts = RowCounts::default();

    for bronze_row in &bronze_rows_inserted {
        progress.inc(1);

        let cells: Vec<(String, String)> = serde_json::from_value(bronze_row.payload.clone())?;
        let raw_row = RawRow::new(cells);
        let ctx = RowContext { taxonomy_id: taxonomy.id, customer_id: request.owner_id.clone(), load_id, row_id: bronze_row.id };

        let result = with_retries(RetryPolicy::default(), |_| {
            process_row(conn, &layout, &raw_row, &ctx, &mut resolver, &mut node_type_ids, &mut attribute_type_ids, &mut touched_nodes)
        });

        let row_status = match &result {
            Ok(()) => {
                counts.record_completed();
                RowStatus::Completed
            }
            Err(err) => {
                tracing::warn!(row_id = %bronze_row.id, error = %err, "row failed");
                counts.record_failed();
                RowStatus::Failed
            }
        };

        diesel::update(bronze_rows::table.find(bronze_row.id))
            .set(BronzeRowStatusUpdate { status: row_status.as_str().to_string(), payload: bronze_row.payload.clone() })
            .execute(conn)?;
    }
    progress.finish();

    let status = load_state::close_load(conn, load_id, &counts)?;

    let mut affected: Vec<_> = touched_nodes.iter().map(|&id| versioning::affected_node(id, NodeChange::New)).collect();
    if matches!(request.load_kind, LoadKind::Update) {
        let mut store = PgHierarchyStore::new(&mut *conn);
        let deactivated = store.reconcile_untouched(taxonomy.id, &touched_nodes, load_id)?;
        affected.extend(deactivated.into_iter().map(|id| versioning::affected_node(id, NodeChange::Deactivated)));
    }

    if status != LoadStatus::Failed && !affected.is_empty() {
        let remapping_flag = is_master;
        let remapping_reason = is_master.then(|| "master taxonomy structural change".to_string());
        let version = versioning::record_version(conn, taxonomy.id, "load", affected, remapping_flag, remapping_reason)?;

        diesel::update(taxonomies::table.find(taxonomy.id))
            .set(TouchTaxonomy { current_version: version.version_number, last_load_id: Some(load_id), updated_at: chrono::Utc::now() })
            .execute(conn)?;
    }

    Ok(IngestOutcome { load_id, taxonomy_id: taxonomy.id, status, counts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_layout_marks_profession_column_as_both_attribute_and_profession() {
        let layout = JsonLayout {
            nodes: vec![JsonNodeLevel { level: 0, name: "Industry".to_string() }],
            attributes: vec!["Profession".to_string(), "State".to_string()],
            profession_column: Some("Profession".to_string()),
        };
        let tags = layout.into_tags();
        assert_eq!(tags.len(), 4);
        assert!(tags.contains(&HeaderTag::Profession { name: "Profession".to_string() }));
        assert!(tags.contains(&HeaderTag::Attribute { name: "State".to_string() }));
    }

    #[test]
    fn json_payload_resolves_master_sentinel_to_no_taxonomy_id() {
        let payload = JsonIngestPayload {
            taxonomy_type: "master".to_string(),
            customer_id: "-1".to_string(),
            taxonomy_id: "-1".to_string(),
            request_id: None,
            layout: JsonLayout { nodes: vec![], attributes: vec![], profession_column: None },
            rows: vec![],
            callback_url: None,
        };
        let request = payload.into_request(LoadKind::New).unwrap();
        assert_eq!(request.taxonomy_kind, TaxonomyKind::Master);
        assert_eq!(request.taxonomy_id, None);
    }

    #[test]
    fn json_payload_rejects_malformed_taxonomy_id() {
        let payload = JsonIngestPayload {
            taxonomy_type: "customer".to_string(),
            customer_id: "evercheck-719".to_string(),
            taxonomy_id: "not-a-uuid".to_string(),
            request_id: None,
            layout: JsonLayout { nodes: vec![], attributes: vec![], profession_column: None },
            rows: vec![],
            callback_url: None,
        };
        let err = payload.into_request(LoadKind::New).unwrap_err();
        assert!(matches!(err, Error::Layout(LayoutError::Invalid(_))));
    }
}

//! C6: persistence seam for nodes/attributes, keyed by natural key (§4.6).
//!
//! The rolling-ancestor resolver (C4) and gap filler (C5) only need to upsert
//! a node by natural key and get back its id; that surface is captured in
//! [`NodeSink`] so those two pure algorithms can run — and be unit-tested —
//! against an in-memory fake as well as the Postgres-backed [`PgHierarchyStore`],
//! mirroring the way the reference tool abstracts persistence behind
//! `OperationLoader`.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::audit;
use crate::errors::Error;
use crate::models::audit_log::AuditOperation;
use crate::models::enums::Status;
use crate::models::node::{Node, NodeKey, NodeUpsert};
use crate::models::node_attribute::{NodeAttribute, NodeAttributeUpsert};
use crate::schema::{node_attributes, nodes};

/// What C4/C5 need from storage: upsert-by-natural-key, returning the node id.
pub trait NodeSink {
    fn upsert_node(&mut self, upsert: NodeUpsert) -> Result<Uuid, Error>;
}

/// The change recorded for one node touched by a load, fed into the Version
/// Engine's `affected_nodes` list (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeChange {
    New,
    Modified,
    Deactivated,
}

impl NodeChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeChange::New => "new",
            NodeChange::Modified => "modified",
            NodeChange::Deactivated => "deactivated",
        }
    }
}

pub struct PgHierarchyStore<'a> {
    pub conn: &'a mut PgConnection,
}

impl<'a> PgHierarchyStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> PgHierarchyStore<'a> {
        PgHierarchyStore { conn }
    }

    /// Attributes are keyed by `(node, attribute_type, fold(value))` and
    /// upserted the same way nodes are (§4.6).
    pub fn upsert_attribute(&mut self, upsert: NodeAttributeUpsert) -> Result<Uuid, Error> {
        let key = upsert.key();
        let new_id = Uuid::new_v4();
        let new_row = upsert.into_new(new_id);

        let existing: Option<NodeAttribute> = node_attributes::table
            .filter(node_attributes::node_id.eq(key.node_id))
            .filter(node_attributes::attribute_type_id.eq(key.attribute_type_id))
            .select(NodeAttribute::as_select())
            .load::<NodeAttribute>(self.conn)?
            .into_iter()
            .find(|a| crate::normalize::fold(&a.value) == key.folded_value);

        let actor = format!("load:{}", new_row.load_id);

        if let Some(existing) = existing {
            diesel::update(node_attributes::table.find(existing.id))
                .set((
                    node_attributes::status.eq(Status::Active.as_str()),
                    node_attributes::load_id.eq(new_row.load_id),
                    node_attributes::row_id.eq(new_row.row_id),
                ))
                .execute(self.conn)?;

            let updated: NodeAttribute = node_attributes::table.find(existing.id).select(NodeAttribute::as_select()).first(self.conn)?;
            audit::record(self.conn, "node_attributes", existing.id, AuditOperation::Update, Some(&existing), Some(&updated), &actor)?;
            Ok(existing.id)
        }
        else {
            diesel::insert_into(node_attributes::table)
                .values(&new_row)
                .execute(self.conn)?;
            audit::record(self.conn, "node_attributes", new_id, AuditOperation::Insert, None::<&NodeAttribute>, Some(&new_row), &actor)?;
            Ok(new_id)
        }
    }

    /// The update-load reconciliation pass (§4.6): nodes active before this
    /// load but not touched by it are soft-deactivated. Returns their ids so
    /// the caller can fold them into the version engine's `affected_nodes`
    /// list as `Deactivated`.
    pub fn reconcile_untouched(&mut self, taxonomy_id: Uuid, touched: &[Uuid], load_id: Uuid) -> Result<Vec<Uuid>, Error> {
        let active_before: Vec<Node> = nodes::table
            .filter(nodes::taxonomy_id.eq(taxonomy_id))
            .filter(nodes::status.eq(Status::Active.as_str()))
            .select(Node::as_select())
            .load(self.conn)?;

        let touched_set: std::collections::HashSet<Uuid> = touched.iter().copied().collect();
        let stale: Vec<Node> = active_before.into_iter().filter(|n| !touched_set.contains(&n.id)).collect();
        let stale_ids: Vec<Uuid> = stale.iter().map(|n| n.id).collect();

        if !stale_ids.is_empty() {
            diesel::update(nodes::table.filter(nodes::id.eq_any(&stale_ids)))
                .set(nodes::status.eq(Status::Inactive.as_str()))
                .execute(self.conn)?;

            let actor = format!("load:{load_id}");
            for node in &stale {
                let deactivated: Node = nodes::table.find(node.id).select(Node::as_select()).first(self.conn)?;
                audit::record(self.conn, "nodes", node.id, AuditOperation::Update, Some(node), Some(&deactivated), &actor)?;
            }
        }

        Ok(stale_ids)
    }
}

impl<'a> NodeSink for PgHierarchyStore<'a> {
    /// Upsert semantics on the natural key (§3, §4.6): on conflict, reactivate
    /// if inactive and refresh lineage to the latest touching load; every
    /// other field is left alone.
    fn upsert_node(&mut self, upsert: NodeUpsert) -> Result<Uuid, Error> {
        let key = upsert.key();
        let existing: Option<Node> = nodes::table
            .filter(nodes::taxonomy_id.eq(key.taxonomy_id))
            .filter(nodes::node_type_id.eq(key.node_type_id))
            .filter(nodes::customer_id.eq(&key.customer_id))
            .filter(nodes::parent_id.eq(key.parent_id))
            .filter(nodes::folded_value.eq(&key.folded_value))
            .select(Node::as_select())
            .first(self.conn)
            .optional()?;

        let id = Uuid::new_v4();
        let new_row = upsert.into_new_node(id);
        let actor = format!("load:{}", new_row.load_id);

        let inserted: Node = diesel::insert_into(nodes::table)
            .values(&new_row)
            .on_conflict((nodes::taxonomy_id, nodes::node_type_id, nodes::customer_id, nodes::parent_id, nodes::folded_value))
            .do_update()
            .set((
                nodes::status.eq(Status::Active.as_str()),
                nodes::load_id.eq(excluded(nodes::load_id)),
                nodes::row_id.eq(excluded(nodes::row_id)),
                nodes::updated_at.eq(excluded(nodes::updated_at)),
            ))
            .returning(Node::as_select())
            .get_result(self.conn)?;

        match &existing {
            Some(existing) => audit::record(self.conn, "nodes", inserted.id, AuditOperation::Update, Some(existing), Some(&inserted), &actor)?,
            None => audit::record(self.conn, "nodes", inserted.id, AuditOperation::Insert, None::<&Node>, Some(&inserted), &actor)?,
        }

        Ok(inserted.id)
    }
}

/// In-memory fake implementing [`NodeSink`], used to unit-test the rolling-
/// ancestor resolver (C4) and gap filler (C5) without a live database.
#[derive(Debug, Default)]
pub struct InMemorySink {
    pub nodes: HashMap<NodeKey, Uuid>,
    pub by_id: HashMap<Uuid, NodeUpsert>,
}

impl InMemorySink {
    pub fn new() -> InMemorySink {
        InMemorySink::default()
    }

    pub fn get(&self, id: Uuid) -> Option<&NodeUpsert> {
        self.by_id.get(&id)
    }
}

impl NodeSink for InMemorySink {
    fn upsert_node(&mut self, upsert: NodeUpsert) -> Result<Uuid, Error> {
        let key = upsert.key();
        if let Some(id) = self.nodes.get(&key) {
            return Ok(*id);
        }
        let id = Uuid::new_v4();
        self.nodes.insert(key, id);
        self.by_id.insert(id, upsert);
        Ok(id)
    }
}

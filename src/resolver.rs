//! C4: the rolling-ancestor resolver — the one genuinely central algorithm
//! (§4.4). Reconstructs parent links from a per-row "new node at explicit
//! level L" stream with arbitrary gaps.

use std::collections::HashMap;

use uuid::Uuid;

use crate::decoder::DecodedRow;
use crate::errors::{Error, ValidationError};
use crate::gapfill;
use crate::hierarchy::NodeSink;
use crate::models::node::NodeUpsert;

/// Per-load, per-taxonomy identity the resolver needs to build a `NodeUpsert`;
/// threaded through unchanged for every row of one load.
#[derive(Debug, Clone)]
pub struct RowContext {
    pub taxonomy_id: Uuid,
    pub customer_id: String,
    pub load_id: Uuid,
    pub row_id: Uuid,
}

/// `lastSeen`: the most recently written node id at each level, scoped to one
/// load. Parent resolution is a pure function of insertion order within that
/// scope (§4.4 design note: a map with truncation, not a stack).
#[derive(Debug, Default)]
pub struct RollingAncestorResolver {
    last_seen: HashMap<i32, Uuid>,
}

impl RollingAncestorResolver {
    pub fn new() -> RollingAncestorResolver {
        RollingAncestorResolver::default()
    }

    /// Step 1–2: the largest `k < level` with a realized node, or root if
    /// `level == 0` and no such `k` exists. Fails with `RootLevelMismatch`
    /// for a non-root row with no realized ancestor.
    fn resolve_parent(&self, level: i32) -> Result<Option<(i32, Uuid)>, Error> {
        let parent_level = self.last_seen.keys().filter(|&&k| k < level).max().copied();
        match parent_level {
            Some(k) => Ok(Some((k, self.last_seen[&k]))),
            None if level == 0 => Ok(None),
            None => Err(ValidationError::RootLevelMismatch { level }.into()),
        }
    }

    /// Step 4: record the first sibling at `level` and erase every entry for
    /// a deeper level — a prior branch's descendants cannot ancestor whatever
    /// row follows.
    fn record(&mut self, level: i32, node_id: Uuid) {
        self.last_seen.retain(|&k, _| k <= level);
        self.last_seen.insert(level, node_id);
    }
}

/// Resolves the parent for `decoded`, fills any gap (C5), and upserts every
/// sibling value (C6) via `sink`. Returns the id of each sibling node in
/// order — the first is the one recorded into `lastSeen`.
pub fn ingest_decoded_row(
    resolver: &mut RollingAncestorResolver,
    decoded: &DecodedRow,
    ctx: &RowContext,
    node_type_id: i32,
    sink: &mut impl NodeSink,
) -> Result<Vec<Uuid>, Error> {
    let (parent_level, parent_id) = match resolver.resolve_parent(decoded.level)? {
        Some((level, id)) => (Some(level), Some(id)),
        None => (None, None),
    };

    let immediate_parent = gapfill::fill_gaps(ctx, parent_level, parent_id, decoded.level, sink)?;

    let mut sibling_ids = Vec::with_capacity(decoded.values.len());
    for (index, value) in decoded.values.iter().enumerate() {
        let upsert = NodeUpsert {
            taxonomy_id: ctx.taxonomy_id,
            node_type_id,
            customer_id: ctx.customer_id.clone(),
            parent_id: immediate_parent,
            value: value.clone(),
            profession: decoded.profession.clone(),
            level: decoded.level,
            load_id: ctx.load_id,
            row_id: ctx.row_id,
        };
        let id = sink.upsert_node(upsert)?;
        if index == 0 {
            resolver.record(decoded.level, id);
        }
        sibling_ids.push(id);
    }

    Ok(sibling_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::InMemorySink;

    fn ctx() -> RowContext {
        RowContext {
            taxonomy_id: Uuid::new_v4(),
            customer_id: "-1".to_string(),
            load_id: Uuid::new_v4(),
            row_id: Uuid::new_v4(),
        }
    }

    fn row(level: i32, values: &[&str]) -> DecodedRow {
        DecodedRow {
            level,
            values: values.iter().map(|v| v.to_string()).collect(),
            attributes: vec![],
            profession: None,
        }
    }

    /// S1: Healthcare(0) -> Nursing(1) -> Registered Nurse(2), no gaps.
    #[test]
    fn simple_chain_builds_linear_parentage() {
        let ctx = ctx();
        let mut sink = InMemorySink::new();
        let mut resolver = RollingAncestorResolver::new();

        let healthcare = ingest_decoded_row(&mut resolver, &row(0, &["Healthcare"]), &ctx, 1, &mut sink).unwrap()[0];
        let nursing = ingest_decoded_row(&mut resolver, &row(1, &["Nursing"]), &ctx, 1, &mut sink).unwrap()[0];
        let rn = ingest_decoded_row(&mut resolver, &row(2, &["Registered Nurse"]), &ctx, 1, &mut sink).unwrap()[0];

        assert_eq!(sink.get(healthcare).unwrap().parent_id, None);
        assert_eq!(sink.get(nursing).unwrap().parent_id, Some(healthcare));
        assert_eq!(sink.get(rn).unwrap().parent_id, Some(nursing));
        assert_eq!(sink.nodes.len(), 3);
    }

    /// S2: level 2 is skipped; the resolver fills exactly one N/A node.
    #[test]
    fn gap_at_ingest_inserts_na_placeholder() {
        let ctx = ctx();
        let mut sink = InMemorySink::new();
        let mut resolver = RollingAncestorResolver::new();

        ingest_decoded_row(&mut resolver, &row(0, &["Healthcare"]), &ctx, 1, &mut sink).unwrap();
        let nursing = ingest_decoded_row(&mut resolver, &row(1, &["Nursing"]), &ctx, 1, &mut sink).unwrap()[0];
        let cns = ingest_decoded_row(&mut resolver, &row(3, &["Advanced CNS"]), &ctx, 1, &mut sink).unwrap()[0];

        assert_eq!(sink.nodes.len(), 4);
        let cns_row = sink.get(cns).unwrap();
        let na = sink.get(cns_row.parent_id.unwrap()).unwrap();
        assert_eq!(na.value, "N/A");
        assert_eq!(na.level, 2);
        assert_eq!(na.parent_id, Some(nursing));
    }

    /// S3: a semicolon cell creates siblings; only the first becomes `lastSeen`.
    #[test]
    fn sibling_cell_only_first_value_becomes_ancestor() {
        let ctx = ctx();
        let mut sink = InMemorySink::new();
        let mut resolver = RollingAncestorResolver::new();

        let healthcare = ingest_decoded_row(&mut resolver, &row(0, &["Healthcare"]), &ctx, 1, &mut sink).unwrap()[0];
        let siblings = ingest_decoded_row(&mut resolver, &row(1, &["Acute", "Critical"]), &ctx, 1, &mut sink).unwrap();
        assert_eq!(siblings.len(), 2);
        assert_eq!(sink.get(siblings[0]).unwrap().parent_id, Some(healthcare));
        assert_eq!(sink.get(siblings[1]).unwrap().parent_id, Some(healthcare));

        let cardiology = ingest_decoded_row(&mut resolver, &row(2, &["Cardiology"]), &ctx, 1, &mut sink).unwrap()[0];
        assert_eq!(sink.get(cardiology).unwrap().parent_id, Some(siblings[0]));
    }

    /// S4: a new row at a shallower level clears deeper `lastSeen` entries.
    #[test]
    fn branch_switch_clears_deeper_last_seen() {
        let ctx = ctx();
        let mut sink = InMemorySink::new();
        let mut resolver = RollingAncestorResolver::new();

        ingest_decoded_row(&mut resolver, &row(0, &["Healthcare"]), &ctx, 1, &mut sink).unwrap();
        let acute = ingest_decoded_row(&mut resolver, &row(1, &["Acute"]), &ctx, 1, &mut sink).unwrap()[0];
        ingest_decoded_row(&mut resolver, &row(2, &["Cardiology"]), &ctx, 1, &mut sink).unwrap();

        let allied = ingest_decoded_row(&mut resolver, &row(1, &["Allied Health"]), &ctx, 1, &mut sink).unwrap()[0];
        assert_ne!(allied, acute);

        let next = ingest_decoded_row(&mut resolver, &row(2, &["Radiology"]), &ctx, 1, &mut sink).unwrap()[0];
        assert_eq!(sink.get(next).unwrap().parent_id, Some(allied));
    }

    #[test]
    fn non_root_row_with_no_ancestor_fails() {
        let ctx = ctx();
        let mut sink = InMemorySink::new();
        let mut resolver = RollingAncestorResolver::new();

        let err = ingest_decoded_row(&mut resolver, &row(2, &["Orphan"]), &ctx, 1, &mut sink).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::RootLevelMismatch { level: 2 })));
    }
}

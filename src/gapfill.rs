//! C5: insert N/A placeholder nodes for skipped levels (§4.5).

use uuid::Uuid;

use crate::errors::Error;
use crate::hierarchy::NodeSink;
use crate::models::node::NodeUpsert;
use crate::resolver::RowContext;

/// Fills the chain `parent_level+1 .. target_level-1` with idempotent N/A
/// nodes and returns the id to use as the immediate parent of a node at
/// `target_level`. `parent_level = None` means the new node is a root; no gap
/// is possible in that case and `parent_id` (always `None` too) passes through.
pub fn fill_gaps(
    ctx: &RowContext,
    parent_level: Option<i32>,
    parent_id: Option<Uuid>,
    target_level: i32,
    sink: &mut impl NodeSink,
) -> Result<Option<Uuid>, Error> {
    let Some(p) = parent_level
    else {
        return Ok(parent_id);
    };

    let mut current_parent = parent_id;
    for level in (p + 1)..target_level {
        let na = NodeUpsert::na(ctx.taxonomy_id, ctx.customer_id.clone(), current_parent, level, ctx.load_id, ctx.row_id);
        let id = sink.upsert_node(na)?;
        current_parent = Some(id);
    }
    Ok(current_parent)
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

    #[test]
    fn no_gap_when_levels_are_adjacent() {
        let ctx = ctx();
        let mut sink = InMemorySink::new();
        let parent = Uuid::new_v4();
        let result = fill_gaps(&ctx, Some(0), Some(parent), 1, &mut sink).unwrap();
        assert_eq!(result, Some(parent));
        assert!(sink.nodes.is_empty());
    }

    #[test]
    fn fills_a_single_skipped_level() {
        let ctx = ctx();
        let mut sink = InMemorySink::new();
        let parent = Uuid::new_v4();
        let result = fill_gaps(&ctx, Some(0), Some(parent), 2, &mut sink).unwrap();
        assert!(result.is_some());
        assert_ne!(result, Some(parent));
        assert_eq!(sink.nodes.len(), 1);
        let na = sink.get(result.unwrap()).unwrap();
        assert_eq!(na.value, "N/A");
        assert_eq!(na.level, 1);
        assert_eq!(na.parent_id, Some(parent));
    }

    #[test]
    fn fills_two_skipped_levels_in_order() {
        let ctx = ctx();
        let mut sink = InMemorySink::new();
        let parent = Uuid::new_v4();
        let result = fill_gaps(&ctx, Some(0), Some(parent), 3, &mut sink).unwrap();
        assert_eq!(sink.nodes.len(), 2);
        let deepest = sink.get(result.unwrap()).unwrap();
        assert_eq!(deepest.level, 2);
        let middle = sink.get(deepest.parent_id.unwrap()).unwrap();
        assert_eq!(middle.level, 1);
        assert_eq!(middle.parent_id, Some(parent));
    }

    #[test]
    fn root_row_passes_through_without_filling() {
        let ctx = ctx();
        let mut sink = InMemorySink::new();
        let result = fill_gaps(&ctx, None, None, 0, &mut sink).unwrap();
        assert_eq!(result, None);
        assert!(sink.nodes.is_empty());
    }

    #[test]
    fn repeated_gap_at_same_key_is_idempotent() {
        let ctx = ctx();
        let mut sink = InMemorySink::new();
        let parent = Uuid::new_v4();
        let first = fill_gaps(&ctx, Some(0), Some(parent), 2, &mut sink).unwrap();
        let second = fill_gaps(&ctx, Some(0), Some(parent), 2, &mut sink).unwrap();
        assert_eq!(first, second);
        assert_eq!(sink.nodes.len(), 1);
    }
}

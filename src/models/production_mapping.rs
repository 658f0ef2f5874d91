use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::production_mappings;

/// The read-optimized production mirror (C10): active, non-AI, approved
/// mappings only. Reconciled, never hand-edited.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = production_mappings)]
pub struct ProductionMapping {
    pub id: Uuid,
    pub master_node_id: Uuid,
    pub child_node_id: Uuid,
    pub confidence: i32,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = production_mappings)]
pub struct NewProductionMapping {
    pub id: Uuid,
    pub master_node_id: Uuid,
    pub child_node_id: Uuid,
    pub confidence: i32,
    pub synced_at: DateTime<Utc>,
}

impl NewProductionMapping {
    pub fn from_mapping(mapping: &crate::models::mapping::Mapping) -> NewProductionMapping {
        NewProductionMapping {
            id: Uuid::new_v4(),
            master_node_id: mapping.master_node_id,
            child_node_id: mapping.child_node_id,
            confidence: mapping.confidence,
            synced_at: Utc::now(),
        }
    }
}

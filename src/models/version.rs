use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::taxonomy_versions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedNode {
    pub node_id: Uuid,
    pub change: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = taxonomy_versions)]
pub struct TaxonomyVersion {
    pub id: Uuid,
    pub taxonomy_id: Uuid,
    pub version_number: i32,
    pub change_type: String,
    pub affected_nodes: serde_json::Value,
    pub affected_attributes: serde_json::Value,
    pub remapping_flag: bool,
    pub remapping_reason: Option<String>,
    pub remapping_processed: i32,
    pub remapping_changed: i32,
    pub remapping_unchanged: i32,
    pub remapping_failed: i32,
    pub remapping_new: i32,
    pub remapping_status: String,
    pub version_from_date: DateTime<Utc>,
    pub version_to_date: Option<DateTime<Utc>>,
}

impl TaxonomyVersion {
    pub fn is_open(&self) -> bool {
        self.version_to_date.is_none()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = taxonomy_versions)]
pub struct NewTaxonomyVersion {
    pub id: Uuid,
    pub taxonomy_id: Uuid,
    pub version_number: i32,
    pub change_type: String,
    pub affected_nodes: serde_json::Value,
    pub affected_attributes: serde_json::Value,
    pub remapping_flag: bool,
    pub remapping_reason: Option<String>,
    pub remapping_processed: i32,
    pub remapping_changed: i32,
    pub remapping_unchanged: i32,
    pub remapping_failed: i32,
    pub remapping_new: i32,
    pub remapping_status: String,
    pub version_from_date: DateTime<Utc>,
    pub version_to_date: Option<DateTime<Utc>>,
}

impl NewTaxonomyVersion {
    pub fn first(taxonomy_id: Uuid) -> NewTaxonomyVersion {
        NewTaxonomyVersion {
            id: Uuid::new_v4(),
            taxonomy_id,
            version_number: 1,
            change_type: "initial".to_string(),
            affected_nodes: serde_json::json!([]),
            affected_attributes: serde_json::json!([]),
            remapping_flag: false,
            remapping_reason: None,
            remapping_processed: 0,
            remapping_changed: 0,
            remapping_unchanged: 0,
            remapping_failed: 0,
            remapping_new: 0,
            remapping_status: "none".to_string(),
            version_from_date: Utc::now(),
            version_to_date: None,
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = taxonomy_versions)]
pub struct CloseVersion {
    pub version_to_date: Option<DateTime<Utc>>,
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::mappings;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = mappings)]
pub struct Mapping {
    pub id: Uuid,
    pub rule_id: Option<Uuid>,
    pub master_node_id: Uuid,
    pub child_node_id: Uuid,
    pub confidence: i32,
    pub status: String,
    pub user_attribution: Option<String>,
    pub mapping_version: i32,
    pub supersedes: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Mapping {
    /// Confidence is persisted as an integer 0-100 (§3); this is the 0.0-1.0 view.
    pub fn confidence_fraction(&self) -> f64 {
        self.confidence as f64 / 100.0
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mappings)]
pub struct NewMapping {
    pub id: Uuid,
    pub rule_id: Option<Uuid>,
    pub master_node_id: Uuid,
    pub child_node_id: Uuid,
    pub confidence: i32,
    pub status: String,
    pub user_attribution: Option<String>,
    pub mapping_version: i32,
    pub supersedes: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl NewMapping {
    /// Confidence threshold (§4.9): `active` at >= 0.70, otherwise `pending_review`.
    pub const ACTIVE_THRESHOLD: f64 = 0.70;

    pub fn status_for_confidence(confidence: f64) -> crate::models::enums::MappingStatus {
        if confidence >= Self::ACTIVE_THRESHOLD {
            crate::models::enums::MappingStatus::Active
        }
        else {
            crate::models::enums::MappingStatus::PendingReview
        }
    }

    pub fn create(
        rule_id: Option<Uuid>,
        master_node_id: Uuid,
        child_node_id: Uuid,
        confidence: f64,
        user_attribution: Option<String>,
        supersedes: Option<Uuid>,
        mapping_version: i32,
    ) -> NewMapping {
        NewMapping {
            id: Uuid::new_v4(),
            rule_id,
            master_node_id,
            child_node_id,
            confidence: (confidence.clamp(0.0, 1.0) * 100.0).round() as i32,
            status: Self::status_for_confidence(confidence).as_str().to_string(),
            user_attribution,
            mapping_version,
            supersedes,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = mappings)]
pub struct SupersedeMapping {
    pub is_active: bool,
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::loads;

/// Free-form load metadata (§3 Load.details): input format, request id,
/// source URL, and an optional callback to notify on close.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadDetails {
    pub input_format: Option<String>,
    pub request_id: Option<String>,
    pub source_url: Option<String>,
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = loads)]
pub struct Load {
    pub id: Uuid,
    pub owner_id: String,
    pub taxonomy_id: Uuid,
    pub kind: String,
    pub taxonomy_kind: String,
    pub status: String,
    pub active: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub details: serde_json::Value,
}

impl Load {
    pub fn details(&self) -> LoadDetails {
        serde_json::from_value(self.details.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = loads)]
pub struct NewLoad {
    pub id: Uuid,
    pub owner_id: String,
    pub taxonomy_id: Uuid,
    pub kind: String,
    pub taxonomy_kind: String,
    pub status: String,
    pub active: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub details: serde_json::Value,
}

#[derive(AsChangeset)]
#[diesel(table_name = loads)]
pub struct CloseLoad {
    pub status: String,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(AsChangeset)]
#[diesel(table_name = loads)]
pub struct WithdrawLoad {
    pub active: bool,
}

impl NewLoad {
    pub fn open(
        owner_id: impl Into<String>,
        taxonomy_id: Uuid,
        kind: crate::models::enums::LoadKind,
        taxonomy_kind: crate::models::enums::TaxonomyKind,
        details: LoadDetails,
    ) -> NewLoad {
        NewLoad {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            taxonomy_id,
            kind: kind.as_str().to_string(),
            taxonomy_kind: taxonomy_kind.as_str().to_string(),
            status: crate::models::enums::LoadStatus::InProgress.as_str().to_string(),
            active: true,
            started_at: Utc::now(),
            ended_at: None,
            details: serde_json::to_value(&details).unwrap_or(serde_json::json!({})),
        }
    }
}

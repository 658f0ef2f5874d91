use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::taxonomies;

/// Sentinel owner id / taxonomy id that together identify the one master taxonomy.
pub const MASTER_OWNER_ID: &str = "-1";
pub const MASTER_TAXONOMY_SENTINEL: &str = "-1";

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = taxonomies)]
pub struct Taxonomy {
    pub id: Uuid,
    pub owner_id: String,
    pub kind: String,
    pub status: String,
    pub current_version: i32,
    pub last_load_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = taxonomies)]
pub struct NewTaxonomy {
    pub id: Uuid,
    pub owner_id: String,
    pub kind: String,
    pub status: String,
    pub current_version: i32,
    pub last_load_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewTaxonomy {
    pub fn create(owner_id: impl Into<String>, kind: crate::models::enums::TaxonomyKind) -> NewTaxonomy {
        let now = Utc::now();
        NewTaxonomy {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            kind: kind.as_str().to_string(),
            status: crate::models::enums::Status::Active.as_str().to_string(),
            current_version: 0,
            last_load_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Bumps `current_version`/`last_load_id` after a load closes (§3: Taxonomy
/// lifecycle is "mutated by subsequent loads").
#[derive(AsChangeset)]
#[diesel(table_name = taxonomies)]
pub struct TouchTaxonomy {
    pub current_version: i32,
    pub last_load_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

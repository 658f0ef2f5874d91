use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::mapping_versions;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = mapping_versions)]
pub struct MappingVersion {
    pub id: Uuid,
    pub mapping_id: Uuid,
    pub version_number: i32,
    pub superseded_by: Option<Uuid>,
    pub version_from_date: DateTime<Utc>,
    pub version_to_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mapping_versions)]
pub struct NewMappingVersion {
    pub id: Uuid,
    pub mapping_id: Uuid,
    pub version_number: i32,
    pub superseded_by: Option<Uuid>,
    pub version_from_date: DateTime<Utc>,
    pub version_to_date: Option<DateTime<Utc>>,
}

impl NewMappingVersion {
    pub fn open(mapping_id: Uuid, version_number: i32) -> NewMappingVersion {
        NewMappingVersion {
            id: Uuid::new_v4(),
            mapping_id,
            version_number,
            superseded_by: None,
            version_from_date: Utc::now(),
            version_to_date: None,
        }
    }
}

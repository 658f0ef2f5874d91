use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::bronze_rows;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = bronze_rows)]
pub struct BronzeRow {
    pub id: Uuid,
    pub load_id: Uuid,
    pub owner_id: String,
    pub taxonomy_id: Uuid,
    pub row_index: i32,
    pub payload: serde_json::Value,
    pub status: String,
    pub active: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bronze_rows)]
pub struct NewBronzeRow {
    pub id: Uuid,
    pub load_id: Uuid,
    pub owner_id: String,
    pub taxonomy_id: Uuid,
    pub row_index: i32,
    pub payload: serde_json::Value,
    pub status: String,
    pub active: bool,
}

impl NewBronzeRow {
    pub fn create(load_id: Uuid, owner_id: impl Into<String>, taxonomy_id: Uuid, row_index: i32, payload: serde_json::Value) -> NewBronzeRow {
        NewBronzeRow {
            id: Uuid::new_v4(),
            load_id,
            owner_id: owner_id.into(),
            taxonomy_id,
            row_index,
            payload,
            status: crate::models::enums::RowStatus::InProgress.as_str().to_string(),
            active: true,
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = bronze_rows)]
pub struct BronzeRowStatusUpdate {
    pub status: String,
    pub payload: serde_json::Value,
}

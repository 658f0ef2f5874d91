use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::normalize::fold;
use crate::schema::node_attributes;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeAttributeKey {
    pub node_id: Uuid,
    pub attribute_type_id: i32,
    pub folded_value: String,
}

impl NodeAttributeKey {
    pub fn new(node_id: Uuid, attribute_type_id: i32, value: &str) -> NodeAttributeKey {
        NodeAttributeKey { node_id, attribute_type_id, folded_value: fold(value) }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = node_attributes)]
pub struct NodeAttribute {
    pub id: Uuid,
    pub node_id: Uuid,
    pub attribute_type_id: i32,
    pub value: String,
    pub status: String,
    pub load_id: Uuid,
    pub row_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize)]
#[diesel(table_name = node_attributes)]
pub struct NewNodeAttribute {
    pub id: Uuid,
    pub node_id: Uuid,
    pub attribute_type_id: i32,
    pub value: String,
    pub status: String,
    pub load_id: Uuid,
    pub row_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NodeAttributeUpsert {
    pub node_id: Uuid,
    pub attribute_type_id: i32,
    pub value: String,
    pub load_id: Uuid,
    pub row_id: Uuid,
}

impl NodeAttributeUpsert {
    pub fn key(&self) -> NodeAttributeKey {
        NodeAttributeKey::new(self.node_id, self.attribute_type_id, &self.value)
    }

    pub fn into_new(self, id: Uuid) -> NewNodeAttribute {
        NewNodeAttribute {
            id,
            node_id: self.node_id,
            attribute_type_id: self.attribute_type_id,
            value: self.value,
            status: crate::models::enums::Status::Active.as_str().to_string(),
            load_id: self.load_id,
            row_id: self.row_id,
            created_at: Utc::now(),
        }
    }
}

use diesel::prelude::*;

use crate::schema::node_types;

/// Reserved id for the N/A placeholder node type (§3, §4.5).
pub const NA_NODE_TYPE_ID: i32 = -1;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = node_types)]
pub struct NodeType {
    pub id: i32,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = node_types)]
pub struct NewNodeType {
    pub name: String,
    pub status: String,
}

impl NewNodeType {
    pub fn create(name: impl Into<String>) -> NewNodeType {
        NewNodeType {
            name: name.into(),
            status: crate::models::enums::Status::Active.as_str().to_string(),
        }
    }
}

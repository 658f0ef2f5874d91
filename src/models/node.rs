use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::normalize::fold;
use crate::schema::nodes;

/// The value used for every N/A placeholder node (§4.5).
pub const NA_VALUE: &str = "N/A";

/// Natural key (§3): `(taxonomy_id, node_type_id, customer_id, parent_node_id, lower(value))`.
/// Two rows with the same key are the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub taxonomy_id: Uuid,
    pub node_type_id: i32,
    pub customer_id: String,
    pub parent_id: Option<Uuid>,
    pub folded_value: String,
}

impl NodeKey {
    pub fn new(
        taxonomy_id: Uuid,
        node_type_id: i32,
        customer_id: impl Into<String>,
        parent_id: Option<Uuid>,
        value: &str,
    ) -> NodeKey {
        NodeKey {
            taxonomy_id,
            node_type_id,
            customer_id: customer_id.into(),
            parent_id,
            folded_value: fold(value),
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = nodes)]
pub struct Node {
    pub id: Uuid,
    pub taxonomy_id: Uuid,
    pub node_type_id: i32,
    pub customer_id: String,
    pub parent_id: Option<Uuid>,
    pub value: String,
    pub folded_value: String,
    pub profession: Option<String>,
    pub level: i32,
    pub status: String,
    pub load_id: Uuid,
    pub row_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    pub fn is_na(&self) -> bool {
        self.node_type_id == crate::models::node_type::NA_NODE_TYPE_ID
    }

    pub fn natural_key(&self) -> NodeKey {
        NodeKey::new(self.taxonomy_id, self.node_type_id, self.customer_id.clone(), self.parent_id, &self.value)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = nodes)]
pub struct NewNode {
    pub id: Uuid,
    pub taxonomy_id: Uuid,
    pub node_type_id: i32,
    pub customer_id: String,
    pub parent_id: Option<Uuid>,
    pub value: String,
    pub folded_value: String,
    pub profession: Option<String>,
    pub level: i32,
    pub status: String,
    pub load_id: Uuid,
    pub row_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the hierarchy store (C6) needs to upsert one node by natural key.
#[derive(Debug, Clone)]
pub struct NodeUpsert {
    pub taxonomy_id: Uuid,
    pub node_type_id: i32,
    pub customer_id: String,
    pub parent_id: Option<Uuid>,
    pub value: String,
    pub profession: Option<String>,
    pub level: i32,
    pub load_id: Uuid,
    pub row_id: Uuid,
}

impl NodeUpsert {
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.taxonomy_id, self.node_type_id, self.customer_id.clone(), self.parent_id, &self.value)
    }

    pub fn na(taxonomy_id: Uuid, customer_id: impl Into<String>, parent_id: Option<Uuid>, level: i32, load_id: Uuid, row_id: Uuid) -> NodeUpsert {
        NodeUpsert {
            taxonomy_id,
            node_type_id: crate::models::node_type::NA_NODE_TYPE_ID,
            customer_id: customer_id.into(),
            parent_id,
            value: NA_VALUE.to_string(),
            profession: None,
            level,
            load_id,
            row_id,
        }
    }

    pub fn into_new_node(self, id: Uuid) -> NewNode {
        let now = Utc::now();
        let folded_value = fold(&self.value);
        NewNode {
            id,
            taxonomy_id: self.taxonomy_id,
            node_type_id: self.node_type_id,
            customer_id: self.customer_id,
            parent_id: self.parent_id,
            value: self.value,
            folded_value,
            profession: self.profession,
            level: self.level,
            status: crate::models::enums::Status::Active.as_str().to_string(),
            load_id: self.load_id,
            row_id: self.row_id,
            created_at: now,
            updated_at: now,
        }
    }
}

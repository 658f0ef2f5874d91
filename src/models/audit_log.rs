use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::audit_logs;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = audit_logs)]
pub struct AuditLog {
    pub id: Uuid,
    pub entity_table: String,
    pub entity_id: Uuid,
    pub operation: String,
    pub old_row: Option<serde_json::Value>,
    pub new_row: Option<serde_json::Value>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOperation {
    Insert,
    Update,
    Delete,
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::Insert => "insert",
            AuditOperation::Update => "update",
            AuditOperation::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_logs)]
pub struct NewAuditLog {
    pub id: Uuid,
    pub entity_table: String,
    pub entity_id: Uuid,
    pub operation: String,
    pub old_row: Option<serde_json::Value>,
    pub new_row: Option<serde_json::Value>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl NewAuditLog {
    pub fn new(
        entity_table: impl Into<String>,
        entity_id: Uuid,
        operation: AuditOperation,
        old_row: Option<serde_json::Value>,
        new_row: Option<serde_json::Value>,
        actor: impl Into<String>,
    ) -> NewAuditLog {
        NewAuditLog {
            id: Uuid::new_v4(),
            entity_table: entity_table.into(),
            entity_id,
            operation: operation.as_str().to_string(),
            old_row,
            new_row,
            actor: actor.into(),
            created_at: Utc::now(),
        }
    }
}

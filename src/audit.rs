//! C11: the audit log writer (§4.11). Every mutating operation on a
//! silver/gold entity writes a before/after JSON snapshot in the same
//! transaction as the mutation.

use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::Error;
use crate::models::audit_log::{AuditOperation, NewAuditLog};
use crate::schema::audit_logs;

/// Writes one audit row. Callers are responsible for running this inside the
/// same transaction as the mutation it documents.
pub fn record(
    conn: &mut PgConnection,
    entity_table: &str,
    entity_id: Uuid,
    operation: AuditOperation,
    old_row: Option<&impl Serialize>,
    new_row: Option<&impl Serialize>,
    actor: &str,
) -> Result<(), Error> {
    let old_row = old_row.map(serde_json::to_value).transpose()?;
    let new_row = new_row.map(serde_json::to_value).transpose()?;

    let entry = NewAuditLog::new(entity_table, entity_id, operation, old_row, new_row, actor);
    diesel::insert_into(audit_logs::table).values(&entry).execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_has_no_old_row() {
        let entry = NewAuditLog::new("nodes", Uuid::new_v4(), AuditOperation::Insert, None, Some(serde_json::json!({"value": "Nursing"})), "load:ingest");
        assert!(entry.old_row.is_none());
        assert!(entry.new_row.is_some());
        assert_eq!(entry.operation, "insert");
    }

    #[test]
    fn delete_has_no_new_row() {
        let entry = NewAuditLog::new("nodes", Uuid::new_v4(), AuditOperation::Delete, Some(serde_json::json!({"value": "Nursing"})), None, "load:ingest");
        assert!(entry.new_row.is_none());
        assert_eq!(entry.operation, "delete");
    }
}

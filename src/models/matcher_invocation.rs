use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::matcher_invocations;

/// One record per semantic-matcher call (§3.1, this expansion's supplement).
/// Not a mutation of a silver/gold entity, so it lives alongside the audit log
/// rather than inside it, but serves the same "what actually happened" role
/// for the one external collaborator in the system.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = matcher_invocations)]
pub struct MatcherInvocation {
    pub id: Uuid,
    pub child_node_id: Uuid,
    pub request_hash: String,
    pub confidence: Option<i32>,
    pub accepted: bool,
    pub reasoning: Option<String>,
    pub error: Option<String>,
    pub latency_ms: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = matcher_invocations)]
pub struct NewMatcherInvocation {
    pub id: Uuid,
    pub child_node_id: Uuid,
    pub request_hash: String,
    pub confidence: Option<i32>,
    pub accepted: bool,
    pub reasoning: Option<String>,
    pub error: Option<String>,
    pub latency_ms: i32,
    pub created_at: DateTime<Utc>,
}

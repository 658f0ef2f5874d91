//! C6/§6 companion: the load-close callback. Fire-and-forget POST to the
//! load's `callback_url`, if it has one — a failed delivery is logged, never
//! escalated to the load's own status (§6, §7).

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::load_state::RowCounts;
use crate::models::enums::LoadStatus;
use crate::retry::{with_retries, RetryPolicy};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize)]
pub struct CallbackCounts {
    pub completed: i32,
    pub failed: i32,
    pub skipped: i32,
}

impl From<RowCounts> for CallbackCounts {
    fn from(counts: RowCounts) -> CallbackCounts {
        CallbackCounts { completed: counts.completed, failed: counts.failed, skipped: counts.skipped }
    }
}

/// The callback body (§6): `{request_id, load_id, status, counts, taxonomy_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackPayload {
    pub request_id: Option<String>,
    pub load_id: Uuid,
    pub status: String,
    pub counts: CallbackCounts,
    pub taxonomy_id: Uuid,
}

impl CallbackPayload {
    pub fn new(request_id: Option<String>, load_id: Uuid, status: LoadStatus, counts: CallbackCounts, taxonomy_id: Uuid) -> CallbackPayload {
        CallbackPayload { request_id, load_id, status: status.as_str().to_string(), counts, taxonomy_id }
    }
}

/// Posts `payload` to `callback_url`, retrying a bounded number of times on
/// transient network failure. Never returns an error to a caller that
/// doesn't want one; callers that need to know about delivery failure should
/// inspect the `tracing::warn!` this emits, not propagate a `Result`.
pub fn deliver(callback_url: &str, payload: &CallbackPayload) {
    let result = with_retries(RetryPolicy { max_attempts: 3 }, |_| {
        ureq::post(callback_url).config().timeout_global(Some(DEFAULT_TIMEOUT)).build().send_json(payload).map(|_| ()).map_err(Into::into)
    });

    if let Err(err) = result {
        tracing::warn!(callback_url, load_id = %payload.load_id, error = %err, "callback delivery failed, giving up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_the_status_label() {
        let payload = CallbackPayload::new(
            Some("req-1".to_string()),
            Uuid::new_v4(),
            LoadStatus::PartiallyCompleted,
            CallbackCounts { completed: 4, failed: 1, skipped: 0 },
            Uuid::new_v4(),
        );
        assert_eq!(payload.status, "partially_completed");
    }
}

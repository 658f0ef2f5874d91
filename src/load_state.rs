//! C7: the load state machine (§4.7). Transitions fire only at load close;
//! row-level sub-states live on `BronzeRow`.

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::errors::Error;
use crate::models::enums::LoadStatus;
use crate::models::load::{CloseLoad, WithdrawLoad};
use crate::schema::loads;

/// Row outcome tally for one load, used to decide the terminal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub completed: i32,
    pub failed: i32,
    pub skipped: i32,
}

impl RowCounts {
    pub fn record_completed(&mut self) {
        self.completed += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }
}

/// `completed` when every non-skipped row completed; `partially_completed`
/// when at least one completed and at least one failed; `failed` when none
/// completed (§4.7).
pub fn terminal_status(counts: &RowCounts) -> LoadStatus {
    if counts.completed == 0 {
        LoadStatus::Failed
    }
    else if counts.failed > 0 {
        LoadStatus::PartiallyCompleted
    }
    else {
        LoadStatus::Completed
    }
}

/// Applies the terminal transition to the load row and returns the status
/// that was set.
pub fn close_load(conn: &mut PgConnection, load_id: Uuid, counts: &RowCounts) -> Result<LoadStatus, Error> {
    let status = terminal_status(counts);

    diesel::update(loads::table.find(load_id))
        .set(CloseLoad { status: status.as_str().to_string(), ended_at: Some(Utc::now()) })
        .execute(conn)?;

    Ok(status)
}

/// Soft-withdraw: `load_active=false` cascades to bronze rows and silver
/// nodes/attributes tagged with this load via read-time filtering, without
/// deleting anything (§4.7).
pub fn withdraw_load(conn: &mut PgConnection, load_id: Uuid) -> Result<(), Error> {
    diesel::update(loads::table.find(load_id)).set(WithdrawLoad { active: false }).execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_when_every_row_completed() {
        let counts = RowCounts { completed: 5, failed: 0, skipped: 1 };
        assert_eq!(terminal_status(&counts), LoadStatus::Completed);
    }

    #[test]
    fn partially_completed_when_mixed() {
        let counts = RowCounts { completed: 3, failed: 2, skipped: 0 };
        assert_eq!(terminal_status(&counts), LoadStatus::PartiallyCompleted);
    }

    #[test]
    fn failed_when_nothing_completed() {
        let counts = RowCounts { completed: 0, failed: 4, skipped: 0 };
        assert_eq!(terminal_status(&counts), LoadStatus::Failed);
    }

    #[test]
    fn failed_when_load_is_entirely_skipped() {
        let counts = RowCounts { completed: 0, failed: 0, skipped: 3 };
        assert_eq!(terminal_status(&counts), LoadStatus::Failed);
    }
}

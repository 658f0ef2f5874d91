//! C12: failure & retry coordinator (§4.12). Bounded immediate retries for a
//! transient error on the current row/operation; deterministic errors (bad
//! natural key, validation failures) bubble straight through — retrying them
//! would never succeed.

use crate::errors::Error;

/// Bookkeeping kept in memory per bronze row while retrying; discarded once
/// the row reaches a terminal status (§3.1 supplemental entity).
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryAttempt {
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    /// §4.12: "a bounded number of immediate retries (configurable, default 3)".
    fn default() -> RetryPolicy {
        RetryPolicy { max_attempts: 3 }
    }
}

/// Transient infrastructure errors (connection loss, pool exhaustion, network
/// failure) are retryable; everything else is deterministic for this row and
/// retrying would reproduce the same failure (§4.12, §7).
pub fn is_transient(err: &Error) -> bool {
    matches!(err, Error::Database(_) | Error::Pool(_) | Error::Io(_) | Error::Http(_))
}

/// Runs `operation`, retrying up to `policy.max_attempts` total attempts when
/// it fails with a transient error. Returns the first success, or the last
/// error once attempts are exhausted or the error is non-transient.
pub fn with_retries<T>(policy: RetryPolicy, mut operation: impl FnMut(&mut RetryAttempt) -> Result<T, Error>) -> Result<T, Error> {
    let mut attempt = RetryAttempt::default();

    loop {
        attempt.attempts += 1;
        match operation(&mut attempt) {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) && attempt.attempts < policy.max_attempts => {
                tracing::warn!(attempt = attempt.attempts, error = %err, "retrying after transient error");
                continue;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::errors::ValidationError;

    #[test]
    fn succeeds_without_retry_when_operation_succeeds_first_try() {
        let calls = Cell::new(0);
        let result = with_retries(RetryPolicy::default(), |_| {
            calls.set(calls.get() + 1);
            Ok::<_, Error>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retries_transient_errors_up_to_max_attempts() {
        let calls = Cell::new(0);
        let result = with_retries(RetryPolicy { max_attempts: 3 }, |_| {
            calls.set(calls.get() + 1);
            Err::<(), Error>(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom")))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn does_not_retry_deterministic_errors() {
        let calls = Cell::new(0);
        let result = with_retries(RetryPolicy::default(), |_| {
            calls.set(calls.get() + 1);
            Err::<(), Error>(ValidationError::EmptyValue.into())
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn recovers_after_a_transient_failure() {
        let calls = Cell::new(0);
        let result = with_retries(RetryPolicy::default(), |_| {
            calls.set(calls.get() + 1);
            if calls.get() < 2 {
                Err(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom")))
            }
            else {
                Ok(())
            }
        });
        assert!(result.is_ok());
        assert_eq!(calls.get(), 2);
    }
}

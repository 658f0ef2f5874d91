//! Small string-backed enums shared by the model layer.
//!
//! Columns that hold one of these are plain `Text` in `schema.rs` (no native
//! Postgres enum type, to keep the dependency surface the same as the rest of
//! this codebase's stack); the `Display`/`FromStr` pair at each boundary is
//! what keeps the database value and the typed value in lock-step.

use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, ValidationError};

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ValidationError::UnknownColumn(other.to_string()).into()),
                }
            }
        }
    };
}

text_enum!(TaxonomyKind {
    Master => "master",
    Customer => "customer",
});

text_enum!(Status {
    Active => "active",
    Inactive => "inactive",
});

text_enum!(LoadKind {
    New => "new",
    Update => "update",
});

text_enum!(LoadStatus {
    InProgress => "in_progress",
    Completed => "completed",
    PartiallyCompleted => "partially_completed",
    Failed => "failed",
});

text_enum!(RowStatus {
    InProgress => "in_progress",
    Completed => "completed",
    Failed => "failed",
});

text_enum!(VersionChangeKind {
    New => "new",
    Modified => "modified",
    Deactivated => "deactivated",
});

text_enum!(MappingStatus {
    Active => "active",
    PendingReview => "pending_review",
    Inactive => "inactive",
});

text_enum!(RuleCommand {
    Equals => "equals",
    Contains => "contains",
    StartsWith => "startswith",
    Regex => "regex",
    Ai => "AI",
    Human => "Human",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        assert_eq!(LoadStatus::from_str("partially_completed").unwrap(), LoadStatus::PartiallyCompleted);
        assert_eq!(LoadStatus::PartiallyCompleted.as_str(), "partially_completed");
    }

    #[test]
    fn unknown_value_is_an_error() {
        assert!(Status::from_str("disabled").is_err());
    }
}

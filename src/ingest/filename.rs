//! Parses the file-by-reference ingest shape's filename convention (§6):
//! `(Master|Customer) <owner_id> <taxonomy_id> [free text].<ext>`.
//!
//! Owner `-1` and taxonomy-id `-1` together identify the master taxonomy
//! (§6 Reserved sentinels); every other combination names a customer
//! taxonomy by its actual owner id and target uuid.

use uuid::Uuid;

use crate::errors::{Error, LayoutError};
use crate::models::enums::TaxonomyKind;
use crate::models::taxonomy::{MASTER_OWNER_ID, MASTER_TAXONOMY_SENTINEL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub taxonomy_kind: TaxonomyKind,
    pub owner_id: String,
    /// `None` only for the master sentinel; every customer load names its
    /// target taxonomy explicitly.
    pub taxonomy_id: Option<Uuid>,
}

fn invalid(filename: &str, reason: impl std::fmt::Display) -> Error {
    LayoutError::Invalid(format!("filename '{filename}': {reason}")).into()
}

pub fn parse(filename: &str) -> Result<ParsedFilename, Error> {
    let stem = filename.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(filename);
    let mut parts = stem.splitn(3, ' ');

    let kind_token = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| invalid(filename, "missing taxonomy-kind token"))?;
    let taxonomy_kind = match kind_token {
        "Master" => TaxonomyKind::Master,
        "Customer" => TaxonomyKind::Customer,
        other => return Err(invalid(filename, format!("unknown taxonomy-kind '{other}'"))),
    };

    let owner_id = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| invalid(filename, "missing owner id"))?.to_string();

    let taxonomy_token = parts
        .next()
        .map(|rest| rest.split_whitespace().next().unwrap_or(rest))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid(filename, "missing taxonomy id"))?;

    let taxonomy_id = if taxonomy_token == MASTER_TAXONOMY_SENTINEL {
        None
    }
    else {
        Some(Uuid::parse_str(taxonomy_token).map_err(|_| invalid(filename, format!("invalid taxonomy id '{taxonomy_token}'")))?)
    };

    match taxonomy_kind {
        TaxonomyKind::Master if owner_id != MASTER_OWNER_ID || taxonomy_id.is_some() => {
            Err(invalid(filename, "a master load must use owner '-1' and taxonomy id '-1'"))
        }
        TaxonomyKind::Customer if taxonomy_id.is_none() => Err(invalid(filename, "a customer load must name a real taxonomy id")),
        _ => Ok(ParsedFilename { taxonomy_kind, owner_id, taxonomy_id }),
    }
}

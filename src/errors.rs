#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("an error occurred with the database connection")]
    Database(#[from] diesel::result::Error),

    #[error("an error occurred getting a database connection")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("an error occurred parsing the csv file")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] Box<ureq::Error>),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Versioning(#[from] VersioningError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Error::Http(Box::new(err))
    }
}

/// Row-local errors. These never abort a load; the bronze row is marked
/// `failed` and processing continues with the next row.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("value is empty after normalization")]
    EmptyValue,

    #[error("row has no populated node column")]
    EmptyNodeRow,

    #[error("row at level {level} has no realized ancestor in lastSeen and is not a root")]
    RootLevelMismatch { level: i32 },

    #[error("row has more than one populated node column")]
    MultiNodeRow,

    #[error("column '{0}' is not declared in the layout")]
    UnknownColumn(String),
}

/// Load-level errors. Terminal: the load is marked `failed` with no rows processed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("layout is invalid: {0}")]
    Invalid(String),

    #[error("master layout requires a profession column")]
    ProfessionColumnMissing,

    #[error("profession column '{0}' must also be declared as an attribute for a master layout")]
    ProfessionColumnNotAttribute(String),

    #[error("level {0} is declared by more than one header")]
    DuplicateLevel(i32),
}

/// Natural-key conflicts with an inconsistent payload (e.g. same key, different parent).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("natural key conflict: existing node {existing} has a different parent than the incoming row")]
    ConflictingParent { existing: uuid::Uuid },

    #[error("node {0} has a non-null parent but is declared at level 0")]
    RootWithParent(uuid::Uuid),

    #[error("parent {parent} is not in the same taxonomy as child {child}")]
    CrossTaxonomyParent { parent: uuid::Uuid, child: uuid::Uuid },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum VersioningError {
    #[error("could not acquire the version lock for taxonomy {0} within the deadline")]
    LockTimeout(uuid::Uuid),

    #[error("taxonomy {0} has no open version row")]
    NoOpenVersion(uuid::Uuid),

    #[error("taxonomy {0} has more than one open version row")]
    MultipleOpenVersions(uuid::Uuid),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("cannot find taxonomy in database: {0}")]
    Taxonomy(String),

    #[error("cannot find node type in database: {0}")]
    NodeType(String),

    #[error("cannot find attribute type in database: {0}")]
    AttributeType(String),
}

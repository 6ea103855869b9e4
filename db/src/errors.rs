use thiserror::Error;
use uuid::Uuid;

/// The error taxonomy shared by every repository operation so the API
/// layer can map a single type to HTTP status without re-deriving it per
/// endpoint.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database operation failed: {0}")]
    Fatal(#[from] sea_orm::DbErr),
}

#[derive(Error, Debug)]
pub enum CreateSeasonError {
    #[error(transparent)]
    Validation(#[from] SeasonNameValidationError),
    #[error("database operation failed: `{0}`")]
    DatabaseError(String),
}

#[derive(Debug, Error)]
pub enum SeasonNameValidationError {
    #[error("season name cannot be empty")]
    EmptyName,
    #[error("season name is {len} characters which is larger than the max, 120")]
    NameTooLong { len: usize },
    #[error("start_date ({start}) is after end_date ({end})")]
    InvertedRange { start: String, end: String },
}

#[derive(Error, Debug)]
pub enum CreateVenueError {
    #[error("database was not initialized")]
    NoDatabase,
    #[error("venue name cannot be empty")]
    EmptyName,
    #[error("database operation failed: `{0}`")]
    DatabaseError(String),
}

#[derive(Error, Debug)]
pub enum DeleteVenueError {
    #[error("venue {0} not found")]
    NotFound(Uuid),
    #[error("venue {0} is still referenced by non-cancelled games")]
    StillReferenced(Uuid),
    #[error("database operation failed: `{0}`")]
    DatabaseError(String),
}

#[derive(Error, Debug)]
pub enum BulkInsertGamesError {
    #[error("season {0} not found")]
    SeasonNotFound(Uuid),
    #[error("no row id in the lookup for domain id {0}")]
    UnknownForeignKey(Uuid),
    #[error("the transaction to insert {count} games failed: {source}")]
    TransactionFailed { count: usize, source: String },
}

#[derive(Error, Debug)]
pub enum PublishScheduleError {
    #[error("no cached plan for season {0}; generate before publishing")]
    CacheEmpty(Uuid),
    #[error("season {0} not found")]
    SeasonNotFound(Uuid),
    #[error(transparent)]
    Insert(#[from] BulkInsertGamesError),
}

#[derive(Error, Debug)]
pub enum RescheduleGameError {
    #[error("game {0} not found")]
    NotFound(Uuid),
    #[error("the move was rejected by {count} conflicts")]
    WouldConflict { count: usize },
    #[error("database operation failed: `{0}`")]
    DatabaseError(String),
}

#[derive(Error, Debug)]
pub enum FindConflictsAtError {
    #[error("venue {0} not found")]
    VenueNotFound(Uuid),
    #[error("database operation failed: `{0}`")]
    DatabaseError(String),
}

#[derive(Error, Debug)]
pub enum LoadOfficialsError {
    #[error("database operation failed: `{0}`")]
    DatabaseError(String),
}

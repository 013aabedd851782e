use thiserror::Error;

/// Failures raised by the ORM itself, as opposed to driver or database errors.
///
/// They travel inside [`crate::Error`] so callers can recover the kind with
/// `error.downcast_ref::<OrmError>()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrmError {
    #[error("Entity `{entity}` is already registered")]
    DuplicateRegistration { entity: String },
    #[error("Entity `{entity}` is not registered")]
    UnknownEntity { entity: String },
    #[error("Required data source `{name}` is not present in the pool")]
    RequiredDataSource { name: String },
    #[error("A master data source is required, push one named `master` or `_`")]
    NoMasterDataSource,
    #[error("A transaction is already bound to this handle")]
    AlreadyBoundTx,
    #[error("The transaction is not open")]
    TxNotOpen,
    #[error("Expected at most one row but the query returned {count}")]
    TooManyResults { count: usize },
    #[error("Field `{field}` of `{entity}` joins on `{column}`, which is not one of its columns")]
    UnknownJoinColumn {
        entity: String,
        field: String,
        column: String,
    },
    #[error("Nothing to update for `{entity}`, every column is ignored")]
    NothingToUpdate { entity: String },
}

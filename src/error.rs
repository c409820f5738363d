//! Error types for the corpus store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field was missing or empty, or the request names a
    /// chapter/class pair that does not exist.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A statement inside a multi-statement operation failed. Nothing the
    /// operation did is visible afterwards.
    #[error("{operation} failed and was rolled back: {source}")]
    Transaction {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The database connection is gone.
    #[error("database connection lost: {0}")]
    Connectivity(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Storage(#[source] sqlx::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

impl StoreError {
    /// Wrap an error raised inside the transaction of `operation`.
    pub(crate) fn in_transaction(operation: &'static str, err: sqlx::Error) -> Self {
        if is_connectivity(&err) {
            StoreError::Connectivity(err)
        } else {
            StoreError::Transaction {
                operation,
                source: err,
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_connectivity(&err) {
            StoreError::Connectivity(err)
        } else {
            StoreError::Storage(err)
        }
    }
}

fn is_connectivity(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::WorkerCrashed
    )
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_closed_is_connectivity() {
        let err: StoreError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, StoreError::Connectivity(_)));
    }

    #[test]
    fn transaction_error_names_the_operation() {
        let err = StoreError::in_transaction("delete_file", sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("delete_file failed and was rolled back"));
    }
}

//! Shared Diesel error mapping for the repository adapters.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
pub(crate) fn map_diesel_error<E, Q, C>(
    error: diesel::result::Error,
    query: Q,
    connection: C,
) -> E
where
    Q: Fn(String) -> E,
    C: Fn(String) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            connection(format!("database connection error: {}", info.message()))
        }
        DieselError::DatabaseError(_, info) => {
            query(format!("database error: {}", info.message()))
        }
        other => query(format!("database error: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::SessionRepositoryError;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_map_to_connection_variant() {
        let error = map_pool_error(
            PoolError::checkout("connection refused"),
            SessionRepositoryError::connection,
        );
        assert!(matches!(
            error,
            SessionRepositoryError::Connection { .. }
        ));
        assert!(error.to_string().contains("connection refused"));
    }

    #[rstest]
    fn not_found_maps_to_query_variant() {
        let error = map_diesel_error(
            diesel::result::Error::NotFound,
            SessionRepositoryError::query,
            SessionRepositoryError::connection,
        );
        assert!(matches!(error, SessionRepositoryError::Query { .. }));
        assert!(error.to_string().contains("record not found"));
    }
}

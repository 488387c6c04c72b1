use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to {action} in collection `{collection}`")]
    Query {
        action: &'static str,
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("transaction `{operation}` failed")]
    Transaction {
        operation: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("document `{id}` in collection `{collection}` is malformed: {reason}")]
    MalformedDocument {
        collection: &'static str,
        id: String,
        reason: String,
    },
}

impl MongoDaoError {
    pub(super) fn query(
        action: &'static str,
        collection: &'static str,
    ) -> impl FnOnce(MongoError) -> Self {
        move |source| MongoDaoError::Query {
            action,
            collection,
            source,
        }
    }

    pub(super) fn transaction(operation: &'static str) -> impl FnOnce(MongoError) -> Self {
        move |source| MongoDaoError::Transaction { operation, source }
    }

    /// Underlying driver error, when there is one.
    pub(super) fn driver_error(&self) -> Option<&MongoError> {
        match self {
            MongoDaoError::InvalidUri { source, .. }
            | MongoDaoError::ClientConstruction { source }
            | MongoDaoError::InitialPing { source, .. }
            | MongoDaoError::HealthPing { source }
            | MongoDaoError::EnsureIndex { source, .. }
            | MongoDaoError::Query { source, .. }
            | MongoDaoError::Transaction { source, .. } => Some(source),
            MongoDaoError::MalformedDocument { .. } => None,
        }
    }

    /// Whether the driver flagged the failure as a transient transaction error.
    pub(super) fn is_transient_transaction_error(&self) -> bool {
        self.driver_error().is_some_and(|err| {
            err.contains_label(mongodb::error::TRANSIENT_TRANSACTION_ERROR)
        })
    }
}

/// Duplicate key violations of a unique index.
pub(super) fn is_duplicate_key(err: &MongoError) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    const DUPLICATE_KEY: i32 = 11000;
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY,
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY,
        _ => false,
    }
}

use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures raised by the MongoDB backend, tagged with the failing operation.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI")]
    InvalidUri {
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
    #[error(transparent)]
    Corrupt(#[from] CorruptDocument),
    #[error("failed to {action} in collection `{collection}`")]
    Query {
        collection: &'static str,
        action: &'static str,
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    pub(super) fn query(
        collection: &'static str,
        action: &'static str,
    ) -> impl FnOnce(MongoError) -> Self {
        move |source| MongoDaoError::Query {
            collection,
            action,
            source,
        }
    }
}

/// A stored document could not be mapped back to an entity.
#[derive(Debug, Error)]
#[error("document `{id}` in collection `{collection}` holds an invalid identifier")]
pub struct CorruptDocument {
    pub collection: &'static str,
    pub id: String,
}

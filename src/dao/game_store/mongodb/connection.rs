use std::{env, time::Duration};

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DATABASE: &str = "trivia_night";
const MAX_PING_ATTEMPTS: u32 = 5;
const FIRST_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(4);

/// Where to find the MongoDB deployment.
#[derive(Clone)]
pub struct MongoConfig {
    uri: String,
    database_name: String,
}

impl MongoConfig {
    /// Target `uri`, using `db_name` or the default database.
    pub fn new(uri: impl Into<String>, db_name: Option<&str>) -> Self {
        Self {
            uri: uri.into(),
            database_name: db_name.unwrap_or(DEFAULT_DATABASE).to_owned(),
        }
    }

    /// Read `MONGO_URI` (required) and `MONGO_DB` (optional).
    pub fn from_env() -> MongoResult<Self> {
        let uri = env::var("MONGO_URI")
            .map_err(|_| MongoDaoError::MissingEnvVar { var: "MONGO_URI" })?;
        let db = env::var("MONGO_DB").ok().filter(|db| !db.is_empty());
        Ok(Self::new(uri, db.as_deref()))
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }
}

/// Build a client and wait until the database answers a ping.
pub async fn establish_connection(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let options = ClientOptions::parse(&config.uri)
        .await
        .map_err(|source| MongoDaoError::InvalidUri { source })?;
    let client = Client::with_options(options)
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut attempts = 0;
    let mut delay = FIRST_PING_DELAY;

    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok((client, database)),
            Err(source) => {
                attempts += 1;
                if attempts >= MAX_PING_ATTEMPTS {
                    return Err(MongoDaoError::InitialPing { attempts, source });
                }
                debug!(attempts, database = %config.database_name, "MongoDB ping failed; retrying");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_PING_DELAY);
            }
        }
    }
}

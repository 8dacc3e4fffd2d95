use std::time::{Duration, Instant};

use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{config::Config, errors::AppResult, models::domain::Game};

const APP_NAME: &str = "quizcraft-server";

/// Handle to the quiz database. Games live in a single collection with their
/// questions embedded, so that is the only collection handed out.
#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
    games_collection: String,
}

/// Driver settings for the game store: a small pool and short timeouts so a
/// missing server fails startup and readiness quickly.
pub async fn client_options(config: &Config) -> AppResult<ClientOptions> {
    let mut options = ClientOptions::parse(&config.mongo_conn_string).await?;

    options.app_name = Some(APP_NAME.to_string());
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.max_pool_size = Some(10);
    options.min_pool_size = Some(2);
    options.connect_timeout = Some(Duration::from_secs(5));
    options.server_selection_timeout = Some(Duration::from_secs(5));

    Ok(options)
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let client = Client::with_options(client_options(config).await?)?;
        let database = Self {
            client,
            db_name: config.mongo_db_name.clone(),
            games_collection: config.games_collection.clone(),
        };

        let latency = database.ping().await?;
        log::info!(
            "Connected to MongoDB database {} (games in '{}', ping {}ms)",
            database.db_name,
            database.games_collection,
            latency.as_millis()
        );

        Ok(database)
    }

    pub fn games(&self) -> Collection<Game> {
        self.client
            .database(&self.db_name)
            .collection(&self.games_collection)
    }

    /// Round-trip time of a `ping` against the quiz database.
    pub async fn ping(&self) -> AppResult<Duration> {
        let started = Instant::now();
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(started.elapsed())
    }
}

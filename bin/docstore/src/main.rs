use clap::Parser;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::signal;

use config::{Config, ConfigError};
use storage::{
    doc, to_document, Bson, CancellationToken, ConnectionOptions, DBError, Document,
    DocumentStore, MongoDBClient, ObjectId, OpContext,
};

const COLLECTION: &str = "cars";

#[derive(Parser, Debug)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Overrides infra.mongo_url from the config file
    #[arg(long, env = "MONGO_URL")]
    mongo_url: Option<String>,

    /// Keep the walkthrough's records instead of deleting them at the end
    #[arg(long)]
    keep: bool,
}

#[derive(Serialize, Deserialize, Debug)]
struct Car {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
}

#[derive(Serialize)]
struct ByName<'a> {
    name: &'a str,
}

#[derive(Error, Debug)]
enum WalkthroughError {
    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] DBError),
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    simple_logger::SimpleLogger::new().env().init().unwrap();

    let args = Args::parse();
    debug!("Args: {:?}", args);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    if let Err(e) = run(args, cancel).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args, cancel: CancellationToken) -> Result<(), WalkthroughError> {
    let mut config = Config::from_file(&args.config)?;
    if let Some(mongo_url) = args.mongo_url {
        config = config.with_mongo_url(mongo_url);
    }

    let ctx = OpContext::with_timeout(config.operation.timeout()).cancellation(cancel);
    let client = MongoDBClient::connect(&ctx, ConnectionOptions::from(&config)).await?;
    info!("Using {}", client);

    // Save
    let ack = client.save(&ctx, COLLECTION, &Car { id: None, name: "Porsche".to_string() }).await?;
    info!("Saved car with id {}", ack.inserted_id);

    // Find one
    let filter = to_document(&ByName { name: "Volkswagen" })?;
    match client.find_one_as::<Car>(&ctx, COLLECTION, filter).await? {
        Some(car) => info!("Found {:?}", car),
        None => info!("No Volkswagen in {}", COLLECTION),
    }

    // Find many
    let cars: Vec<Car> = client.find_as(&ctx, COLLECTION, doc! {}).await?;
    for car in &cars {
        info!("Listed {:?}", car);
    }

    // Find one and update, then read the record back by id
    let update = to_document(&ByName { name: "Toyota" })?;
    let filter = to_document(&ByName { name: "Porsche" })?;
    let before = client.find_one_and_update(&ctx, COLLECTION, filter, update).await?;
    info!("Before update: {}", render(&before));

    let id = before.get("_id").cloned().unwrap_or(Bson::Null);
    match client.find_one(&ctx, COLLECTION, doc! { "_id": id }).await? {
        Some(after) => info!("After update: {}", render(&after)),
        None => warn!("Updated car vanished before it could be re-read"),
    }

    // Delete many
    if !args.keep {
        let filter = to_document(&ByName { name: "Toyota" })?;
        let deleted = client.delete_many(&ctx, COLLECTION, filter).await?;
        info!("Deleted {} car(s)", deleted);
    }

    Ok(())
}

fn render(doc: &Document) -> String {
    Bson::Document(doc.clone()).into_relaxed_extjson().to_string()
}

async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Unable to handle ctrl+c");
    };
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, cancelling in-flight operations");
    cancel.cancel();
}

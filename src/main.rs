use clap::Parser;
use docvec::cli::commands::{Cli, Commands};
use docvec::domain::entities::document::Document;
use docvec::domain::values::document_field::DocumentField;
use docvec::domain::values::document_id::DocumentId;
use docvec::DocVec;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docvec=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = std::env::var("DOCVEC_DB").unwrap_or_else(|_| "./docvec.db".into());

    let db = match DocVec::new(&db_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("failed to open {db_path}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(db, cli.command).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run_command(db: DocVec, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Create { name, overwrite } => {
            let collection = db.create_collection(&name, overwrite).await?;
            println!("{}", serde_json::to_string_pretty(&collection)?);
        }
        Commands::Collections => {
            for name in db.list_collections()? {
                println!("{name}");
            }
        }
        Commands::Drop { name } => {
            db.delete_collection(&name).await?;
            println!("Dropped {name}");
        }
        Commands::Insert { collection, json, upsert } => {
            let docs: Vec<Document> = serde_json::from_str(&json)?;
            db.insert_docs(&docs, Some(collection.as_str()), upsert).await?;
            println!("Inserted {} documents into {collection}", docs.len());
        }
        Commands::Update { collection, json, upsert } => {
            let docs: Vec<Document> = serde_json::from_str(&json)?;
            let summary = db.update_docs(&docs, Some(collection.as_str()), upsert).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Get { collection, ids, include } => {
            let ids: Vec<DocumentId> = serde_json::from_str(&ids)?;
            let include = include
                .map(|fields| fields.iter().map(|f| f.parse()).collect::<Result<Vec<DocumentField>, _>>())
                .transpose()?;
            let docs = db.get_docs_by_ids(Some(ids.as_slice()), include.as_deref(), Some(collection.as_str()))?;
            println!("{}", serde_json::to_string_pretty(&docs)?);
        }
        Commands::Delete { collection, ids } => {
            let ids: Vec<DocumentId> = serde_json::from_str(&ids)?;
            let deleted = db.delete_docs(&ids, Some(collection.as_str()))?;
            println!("Deleted {deleted} documents from {collection}");
        }
        Commands::Query {
            collection,
            queries,
            n_results,
            distance_threshold,
        } => {
            let results = db
                .retrieve_docs(&queries, Some(collection.as_str()), n_results, distance_threshold)
                .await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }
    Ok(())
}

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "docvec", about = "Embedding-backed document collections with similarity search")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a collection and its search index
    Create {
        name: String,
        /// Drop and recreate the collection if it exists
        #[arg(long)]
        overwrite: bool,
    },
    /// List collections
    Collections,
    /// Drop a collection and its search indexes
    Drop { name: String },
    /// Insert documents
    Insert {
        collection: String,
        /// JSON array of {"id", "content", "metadata"} objects
        json: String,
        /// Replace documents whose id is already stored
        #[arg(long)]
        upsert: bool,
    },
    /// Replace stored documents by id
    Update {
        collection: String,
        /// JSON array of {"id", "content", "metadata"} objects
        json: String,
        /// Insert documents whose id is not stored
        #[arg(long)]
        upsert: bool,
    },
    /// Fetch documents by id
    Get {
        collection: String,
        /// JSON array of ids, e.g. [1, "1"]
        ids: String,
        /// Fields to return besides the id (content, metadata)
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },
    /// Delete documents by id
    Delete {
        collection: String,
        /// JSON array of ids, e.g. [1, "1"]
        ids: String,
    },
    /// Similarity search, one result list per query
    Query {
        collection: String,
        #[arg(required = true)]
        queries: Vec<String>,
        #[arg(long, default_value = "10")]
        n_results: usize,
        /// Drop hits further than this distance (0.0 - 1.0)
        #[arg(long)]
        distance_threshold: Option<f64>,
    },
}

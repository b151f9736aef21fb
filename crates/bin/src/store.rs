//! Opening the application database.

use std::path::PathBuf;

use intentions::store::Store;

use crate::cli::ServeArgs;

/// File name of the SQLite database inside the data directory.
pub const DB_FILE: &str = "intentions.db";

/// Open (creating if needed) the database in the configured data directory.
pub async fn open_store(args: &ServeArgs) -> Result<Store, Box<dyn std::error::Error>> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    let db_path = data_dir.join(DB_FILE);
    tracing::info!("Using SQLite database at {}", db_path.display());
    Ok(Store::open(&db_path).await?)
}

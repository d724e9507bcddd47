use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

/// Open (or create) the catalog file at `path`, creating its parent directory
/// on the way, and make sure the schema exists.
pub fn open_catalog(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    ensure_schema(&conn)?;
    info!(path = %path.display(), "catalog opened");
    Ok(conn)
}

/// Private in-memory catalog. Nothing survives the connection, which makes it
/// the natural fixture for tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the `Buku` table if it is missing. Safe to call on every start.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS Buku (
            ID INTEGER PRIMARY KEY AUTOINCREMENT,
            Judul TEXT NOT NULL,
            Pengarang TEXT NOT NULL,
            Tahun INTEGER NOT NULL
        )",
        [],
    )
    .context("failed to create Buku table")?;

    Ok(())
}

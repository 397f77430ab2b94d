// ============================================================================
// TutorDb — Embedded Database (redb)
// ============================================================================
// Durable local storage for the profile and per-subject transcripts.
// Default path: ~/.alamo/tutor.redb (override via ALAMO_DB_PATH env var)
// ============================================================================

use anyhow::{anyhow, Result};
use redb::{Database, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::KvStore;

// Single string table; the key layout in store::* namespaces the entries
const STORE: TableDefinition<&str, &str> = TableDefinition::new("store");

/// Embedded database for the Alámò tutor
pub struct TutorDb {
    db: Database,
    path: PathBuf,
}

impl TutorDb {
    /// Open (or create) the database at the given path.
    /// If `path` is None, uses ALAMO_DB_PATH env var or ~/.alamo/tutor.redb
    pub fn open(path: Option<&str>) -> Result<Self> {
        let db_path = if let Some(p) = path {
            PathBuf::from(p)
        } else if let Ok(env_path) = std::env::var("ALAMO_DB_PATH") {
            PathBuf::from(env_path)
        } else {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
            let alamo_dir = home.join(".alamo");
            std::fs::create_dir_all(&alamo_dir)
                .map_err(|e| anyhow!("Failed to create .alamo directory: {}", e))?;
            alamo_dir.join("tutor.redb")
        };

        info!("Opening database at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| anyhow!("Failed to open database: {}", e))?;

        // Ensure the table exists by doing a write transaction
        let write_txn = db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let _ = write_txn
                .open_table(STORE)
                .map_err(|e| anyhow!("Failed to create store table: {}", e))?;
        }
        write_txn
            .commit()
            .map_err(|e| anyhow!("Failed to commit init: {}", e))?;

        info!("Database ready");

        Ok(Self { db, path: db_path })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvStore for TutorDb {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn
            .open_table(STORE)
            .map_err(|e| anyhow!("Failed to open store table: {}", e))?;

        match table
            .get(key)
            .map_err(|e| anyhow!("Failed to get {}: {}", key, e))?
        {
            Some(value) => Ok(Some(value.value().to_string())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn
                .open_table(STORE)
                .map_err(|e| anyhow!("Failed to open store table: {}", e))?;
            table
                .insert(key, value)
                .map_err(|e| anyhow!("Failed to insert {}: {}", key, e))?;
        }
        write_txn
            .commit()
            .map_err(|e| anyhow!("Failed to commit: {}", e))?;

        debug!("Stored {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn
                .open_table(STORE)
                .map_err(|e| anyhow!("Failed to open store table: {}", e))?;
            table
                .remove(key)
                .map_err(|e| anyhow!("Failed to remove {}: {}", key, e))?;
        }
        write_txn
            .commit()
            .map_err(|e| anyhow!("Failed to commit delete: {}", e))?;

        debug!("Removed {}", key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        write_txn
            .delete_table(STORE)
            .map_err(|e| anyhow!("Failed to drop store table: {}", e))?;
        {
            let _ = write_txn
                .open_table(STORE)
                .map_err(|e| anyhow!("Failed to recreate store table: {}", e))?;
        }
        write_txn
            .commit()
            .map_err(|e| anyhow!("Failed to commit wipe: {}", e))?;

        info!("Database wiped");
        Ok(())
    }
}

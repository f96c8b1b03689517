use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

/// On-disk cache of search-query → DOI outcomes, so re-running over the
/// same corpus doesn't re-hit the search service. Negative results are
/// cached too (a query known to have no candidates).
pub struct LookupCache {
    conn: Connection,
}

impl LookupCache {
    pub fn open() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .context("Could not determine cache directory")?
            .join("bbl2bib");
        std::fs::create_dir_all(&cache_dir)?;
        let db_path = cache_dir.join("doi_cache.db");
        let conn = Connection::open(&db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS query_cache (
                key TEXT PRIMARY KEY,
                doi TEXT,
                created_at INTEGER NOT NULL
            )",
        )?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS query_cache (
                key TEXT PRIMARY KEY,
                doi TEXT,
                created_at INTEGER NOT NULL
            )",
        )?;
        Ok(Self { conn })
    }

    /// None = not cached, Some(None) = negative hit, Some(Some(doi)) = cached DOI.
    pub fn get(&self, key: &str) -> Result<Option<Option<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT doi FROM query_cache WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn put(&self, key: &str, doi: Option<&str>) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0) as i64;
        self.conn.execute(
            "INSERT OR REPLACE INTO query_cache (key, doi, created_at) VALUES (?1, ?2, ?3)",
            params![key, doi, now],
        )?;
        Ok(())
    }
}

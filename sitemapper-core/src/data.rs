use crate::error::{CoreError, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use sitemapper_scanner::{CrawlResult, normalize_url};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Number of crawl results kept before the least recently used are evicted
pub const DEFAULT_RESULT_CAPACITY: usize = 32;

pub struct Database {
    conn: Connection,
    result_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapSource {
    pub id: String,
    pub url: String,
    pub label: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub token: String,
    pub urls: Vec<String>,
    pub errors: Vec<String>,
    pub sources: usize,
    pub elapsed_ms: u64,
    pub created_at: i64,
    pub last_accessed: i64,
}

/// One entry of a hand-edited or older `sitemaps.json` list. Field names
/// vary between versions, so everything is optional here.
#[derive(Debug, Deserialize)]
struct LegacySourceEntry {
    id: Option<String>,
    url: Option<String>,
    sitemap: Option<String>,
    label: Option<String>,
    name: Option<String>,
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Database {
    /// Remove a database file along with its WAL side files
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)?;
        for suffix in ["-wal", "-shm"] {
            let mut side = path.as_os_str().to_owned();
            side.push(suffix);
            let side = Path::new(&side);
            if side.exists() {
                fs::remove_file(side)?;
            }
        }
        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Database {
            conn,
            result_capacity: DEFAULT_RESULT_CAPACITY,
        };
        db.init_schema()?;
        Ok(db)
    }

    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity.max(1);
        self
    }

    pub fn result_capacity(&self) -> usize {
        self.result_capacity
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- Configured sitemap sources
            CREATE TABLE IF NOT EXISTS sitemap_sources (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                url TEXT UNIQUE NOT NULL,
                label TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Recent crawl results, retrievable by token
            CREATE TABLE IF NOT EXISTS crawl_results (
                token TEXT PRIMARY KEY,
                urls TEXT NOT NULL,       -- JSON array
                errors TEXT NOT NULL,     -- JSON array
                sources INTEGER NOT NULL,
                elapsed_ms INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                last_accessed INTEGER NOT NULL,
                access_seq INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_crawl_results_access ON crawl_results(access_seq);
            ",
        )?;
        Ok(())
    }

    // Source management
    pub fn add_source(&self, url: &str, label: &str) -> Result<SitemapSource> {
        let id = uuid::Uuid::new_v4().to_string();
        self.insert_source(id, url, label)
    }

    fn insert_source(&self, id: String, url: &str, label: &str) -> Result<SitemapSource> {
        let url = normalize_url(url);
        if url.is_empty() {
            return Err(CoreError::InvalidSource("URL is required".to_string()));
        }
        if self.get_source_by_url(&url)?.is_some() {
            return Err(CoreError::DuplicateSource(url));
        }

        let label = match label.trim() {
            "" => url.clone(),
            label => label.to_string(),
        };
        let source = SitemapSource {
            id,
            url,
            label,
            created_at: current_timestamp(),
        };

        self.conn.execute(
            "INSERT INTO sitemap_sources (id, url, label, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![&source.id, &source.url, &source.label, source.created_at],
        )?;
        info!("Added sitemap source {} ({})", source.url, source.id);

        Ok(source)
    }

    /// Returns false when no source has this id
    pub fn remove_source(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM sitemap_sources WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    pub fn list_sources(&self) -> Result<Vec<SitemapSource>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, url, label, created_at FROM sitemap_sources ORDER BY seq")?;

        let sources = stmt
            .query_map([], |row| {
                Ok(SitemapSource {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    label: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sources)
    }

    pub fn get_source(&self, id: &str) -> Result<Option<SitemapSource>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, url, label, created_at FROM sitemap_sources WHERE id = ?1")?;

        let source = stmt
            .query_row(params![id], |row| {
                Ok(SitemapSource {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    label: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })
            .optional()?;
        Ok(source)
    }

    fn get_source_by_url(&self, url: &str) -> Result<Option<String>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM sitemap_sources WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Look up several sources, keeping the order of `ids`. Unknown ids are
    /// skipped.
    pub fn get_sources(&self, ids: &[String]) -> Result<Vec<SitemapSource>> {
        let mut sources = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(source) = self.get_source(id)? {
                sources.push(source);
            }
        }
        Ok(sources)
    }

    /// Import a JSON list of sources, tolerating the older `sitemap`/`name`
    /// field names. Entries without a URL and URLs already present are
    /// skipped. Returns how many were added.
    pub fn import_sources_json(&self, json: &str) -> Result<usize> {
        let entries: Vec<LegacySourceEntry> = serde_json::from_str(json)?;
        let mut imported = 0;

        for entry in entries {
            let Some(url) = non_blank(entry.url).or(non_blank(entry.sitemap)) else {
                debug!("Skipping source entry without a URL");
                continue;
            };
            let label = non_blank(entry.label)
                .or(non_blank(entry.name))
                .unwrap_or_default();
            let id = match non_blank(entry.id) {
                Some(id) if self.get_source(&id)?.is_none() => id,
                _ => uuid::Uuid::new_v4().to_string(),
            };

            match self.insert_source(id, &url, &label) {
                Ok(_) => imported += 1,
                Err(CoreError::DuplicateSource(url)) => {
                    debug!("Skipping duplicate source {}", url);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(imported)
    }

    // Result storage
    pub fn put_result(&self, result: &CrawlResult, sources: usize, elapsed_ms: u64) -> Result<String> {
        let token = uuid::Uuid::new_v4().to_string();
        let timestamp = current_timestamp();

        self.conn.execute(
            "INSERT INTO crawl_results (
                token, urls, errors, sources, elapsed_ms, created_at, last_accessed, access_seq
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7,
                (SELECT COALESCE(MAX(access_seq), 0) + 1 FROM crawl_results))",
            params![
                &token,
                serde_json::to_string(&result.urls)?,
                serde_json::to_string(&result.errors)?,
                sources as i64,
                elapsed_ms as i64,
                timestamp,
                timestamp,
            ],
        )?;

        let evicted = self.evict_results()?;
        if evicted > 0 {
            debug!("Evicted {} least recently used crawl result(s)", evicted);
        }

        Ok(token)
    }

    /// Fetch a stored result and mark it as most recently used
    pub fn get_result(&self, token: &str) -> Result<Option<StoredResult>> {
        let timestamp = current_timestamp();
        let touched = self.conn.execute(
            "UPDATE crawl_results
             SET last_accessed = ?1,
                 access_seq = (SELECT COALESCE(MAX(access_seq), 0) + 1 FROM crawl_results)
             WHERE token = ?2",
            params![timestamp, token],
        )?;
        if touched == 0 {
            return Ok(None);
        }

        let row = self.conn.query_row(
            "SELECT token, urls, errors, sources, elapsed_ms, created_at, last_accessed
             FROM crawl_results WHERE token = ?1",
            params![token],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            },
        )?;

        let (token, urls, errors, sources, elapsed_ms, created_at, last_accessed) = row;
        Ok(Some(StoredResult {
            token,
            urls: serde_json::from_str(&urls)?,
            errors: serde_json::from_str(&errors)?,
            sources: sources as usize,
            elapsed_ms: elapsed_ms as u64,
            created_at,
            last_accessed,
        }))
    }

    /// Tokens of stored results, most recently used first
    pub fn list_result_tokens(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT token FROM crawl_results ORDER BY access_seq DESC")?;
        let tokens = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(tokens)
    }

    fn evict_results(&self) -> Result<usize> {
        let evicted = self.conn.execute(
            "DELETE FROM crawl_results WHERE token NOT IN (
                SELECT token FROM crawl_results ORDER BY access_seq DESC LIMIT ?1
            )",
            params![self.result_capacity as i64],
        )?;
        Ok(evicted)
    }
}

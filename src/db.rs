use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::record::{LabeledRecord, Record, RunMetadata};

/// Collection holding one document per labeled record
pub const RESULTS_COLLECTION: &str = "cluster_results";

/// Collection holding the single run metadata document
pub const METADATA_COLLECTION: &str = "cluster_metadata";

/// Atomic replacement of the stored result set
pub trait PersistenceGateway {
    /// Replace both result collections with the output of one run
    ///
    /// Either both collections hold the new content afterwards, or an error
    /// is returned and neither was changed.
    fn commit(
        &mut self,
        records: &[LabeledRecord],
        metadata: &RunMetadata,
        fingerprint: &str,
    ) -> Result<()>;
}

/// Leads shown per page when listing
pub const LEADS_PER_PAGE: usize = 10;

/// A document as stored, with its store-assigned id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument<T> {
    pub id: String,
    pub body: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub fingerprint: String,
    pub committed_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreStats {
    pub lead_count: u32,
    pub result_count: u32,
    pub metadata_count: u32,
}

/// One page of stored leads, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadPage {
    pub leads: Vec<StoredDocument<Record>>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// Store for leads and the clustering results derived from them, backed by SQLite
///
/// Any change to the leads drops the stored results, since they no longer
/// describe the current lead set.
pub struct ResultStore {
    conn: Connection,
}

impl ResultStore {
    /// Create a new in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open (or create) a store file
    pub fn open(path: &str) -> Result<Self> {
        let conn =
            Connection::open(path).context(format!("Failed to open database at {}", path))?;
        let store = Self { conn };
        store.init_schema()?;
        debug!(path, "opened result store");
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                position INTEGER NOT NULL,
                body TEXT NOT NULL,
                inserted_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS run_info (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                fingerprint TEXT NOT NULL,
                committed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS leads (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, position);
            "#,
            )
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// All stored labeled records, in insertion order
    pub fn load_results(&self) -> Result<Vec<StoredDocument<LabeledRecord>>> {
        self.load_collection(RESULTS_COLLECTION)
    }

    /// Stored labeled records assigned to `cluster`
    pub fn results_in_cluster(&self, cluster: usize) -> Result<Vec<StoredDocument<LabeledRecord>>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, body FROM documents
                 WHERE collection = ?1 AND json_extract(body, '$.cluster') = ?2
                 ORDER BY position",
            )
            .context("Failed to prepare statement")?;

        let rows = stmt
            .query_map(params![RESULTS_COLLECTION, cluster as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .context("Failed to query cluster results")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect cluster results")?;

        decode_rows(rows)
    }

    /// The stored run metadata, if any run has been committed
    pub fn load_metadata(&self) -> Result<Option<RunMetadata>> {
        let docs: Vec<StoredDocument<RunMetadata>> = self.load_collection(METADATA_COLLECTION)?;
        Ok(docs.into_iter().next().map(|doc| doc.body))
    }

    pub fn run_info(&self) -> Result<Option<RunInfo>> {
        self.conn
            .query_row(
                "SELECT fingerprint, committed_at FROM run_info WHERE id = 1",
                [],
                |row| {
                    Ok(RunInfo {
                        fingerprint: row.get(0)?,
                        committed_at: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("Failed to query run info")
    }

    pub fn get_stats(&self) -> Result<StoreStats> {
        let lead_count = self
            .conn
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))
            .context("Failed to count leads")?;

        Ok(StoreStats {
            lead_count,
            result_count: self.count(RESULTS_COLLECTION)?,
            metadata_count: self.count(METADATA_COLLECTION)?,
        })
    }

    /// Drop every stored result, e.g. after the underlying leads changed
    pub fn clear(&mut self) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin transaction")?;
        invalidate_results(&tx)?;
        tx.commit().context("Failed to commit clear")?;

        info!("cleared stored cluster results");
        Ok(())
    }

    /// Validate and store new leads, in order. Nothing is stored if any lead
    /// is rejected.
    pub fn add_leads(&mut self, leads: &[Record]) -> Result<Vec<String>> {
        for (i, lead) in leads.iter().enumerate() {
            lead.check_lead()
                .context(format!("Lead {} ({}) rejected", i, lead.customer))?;
        }

        let tx = self
            .conn
            .transaction()
            .context("Failed to begin transaction")?;

        let now = Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(leads.len());
        {
            let mut stmt = tx
                .prepare("INSERT INTO leads (id, body, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)")
                .context("Failed to prepare lead insert")?;
            for lead in leads {
                let id = Uuid::new_v4().to_string();
                let body = serde_json::to_string(lead).context("Failed to serialize lead")?;
                stmt.execute(params![id, body, now])
                    .context("Failed to insert lead")?;
                ids.push(id);
            }
        }

        invalidate_results(&tx)?;
        tx.commit().context("Failed to commit leads")?;

        info!(added = ids.len(), "stored leads");
        Ok(ids)
    }

    pub fn add_lead(&mut self, lead: &Record) -> Result<String> {
        let mut ids = self.add_leads(std::slice::from_ref(lead))?;
        ids.pop().context("Lead insert returned no id")
    }

    /// Every stored lead in insertion order
    pub fn list_leads(&self) -> Result<Vec<StoredDocument<Record>>> {
        self.query_leads("SELECT id, body FROM leads ORDER BY seq", params![])
    }

    /// Page `page` (1-based; 0 is treated as 1) of the stored leads
    pub fn lead_page(&self, page: usize, per_page: usize) -> Result<LeadPage> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get::<_, i64>(0))
            .context("Failed to count leads")? as usize;

        let leads = self.query_leads(
            "SELECT id, body FROM leads ORDER BY seq LIMIT ?1 OFFSET ?2",
            params![per_page as i64, ((page - 1) * per_page) as i64],
        )?;

        Ok(LeadPage {
            leads,
            page,
            total_pages: total.div_ceil(per_page),
            total,
        })
    }

    pub fn get_lead(&self, id: &str) -> Result<Option<StoredDocument<Record>>> {
        let mut leads = self.query_leads("SELECT id, body FROM leads WHERE id = ?1", params![id])?;
        Ok(leads.pop())
    }

    /// Replace the body of a stored lead. Returns false if `id` is unknown.
    pub fn update_lead(&mut self, id: &str, lead: &Record) -> Result<bool> {
        lead.check_lead().context("Lead rejected")?;
        let body = serde_json::to_string(lead).context("Failed to serialize lead")?;

        let tx = self
            .conn
            .transaction()
            .context("Failed to begin transaction")?;
        let changed = tx
            .execute(
                "UPDATE leads SET body = ?1, updated_at = ?2 WHERE id = ?3",
                params![body, Utc::now().to_rfc3339(), id],
            )
            .context(format!("Failed to update lead {}", id))?;
        if changed == 0 {
            return Ok(false);
        }

        invalidate_results(&tx)?;
        tx.commit().context("Failed to commit lead update")?;

        info!(id, "updated lead");
        Ok(true)
    }

    /// Remove a stored lead. Returns false if `id` is unknown.
    pub fn delete_lead(&mut self, id: &str) -> Result<bool> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin transaction")?;
        let removed = tx
            .execute("DELETE FROM leads WHERE id = ?1", params![id])
            .context(format!("Failed to delete lead {}", id))?;
        if removed == 0 {
            return Ok(false);
        }

        invalidate_results(&tx)?;
        tx.commit().context("Failed to commit lead delete")?;

        info!(id, "deleted lead");
        Ok(true)
    }

    fn query_leads<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<StoredDocument<Record>>> {
        let mut stmt = self.conn.prepare(sql).context("Failed to prepare statement")?;

        let rows = stmt
            .query_map(params, |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .context("Failed to query leads")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect leads")?;

        decode_rows(rows)
    }

    fn count(&self, collection: &str) -> Result<u32> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )
            .context(format!("Failed to count {}", collection))
    }

    fn load_collection<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<StoredDocument<T>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY position")
            .context("Failed to prepare statement")?;

        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .context(format!("Failed to query {}", collection))?
            .collect::<Result<Vec<_>, _>>()
            .context(format!("Failed to collect {}", collection))?;

        decode_rows(rows)
    }
}

impl PersistenceGateway for ResultStore {
    fn commit(
        &mut self,
        records: &[LabeledRecord],
        metadata: &RunMetadata,
        fingerprint: &str,
    ) -> Result<()> {
        // rolled back on drop unless committed
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin transaction")?;

        let written = replace_collection(&tx, RESULTS_COLLECTION, records)?;
        replace_collection(&tx, METADATA_COLLECTION, std::slice::from_ref(metadata))?;

        let committed_at = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT OR REPLACE INTO run_info (id, fingerprint, committed_at) VALUES (1, ?1, ?2)",
            params![fingerprint, committed_at],
        )
        .context("Failed to record run info")?;

        tx.commit().context("Failed to commit result transaction")?;

        info!(records = written, k = metadata.k, score = metadata.score, "stored cluster results");
        Ok(())
    }
}

/// Drop both result collections and the run info
fn invalidate_results(conn: &Connection) -> Result<usize> {
    let removed = conn
        .execute(
            "DELETE FROM documents WHERE collection IN (?1, ?2)",
            params![RESULTS_COLLECTION, METADATA_COLLECTION],
        )
        .context("Failed to delete stored results")?;
    conn.execute("DELETE FROM run_info", [])
        .context("Failed to delete run info")?;
    if removed > 0 {
        debug!(removed, "dropped stored cluster results");
    }
    Ok(removed)
}

/// Delete every document in `collection`, then insert `docs` in order
fn replace_collection<T: Serialize>(conn: &Connection, collection: &str, docs: &[T]) -> Result<usize> {
    conn.execute(
        "DELETE FROM documents WHERE collection = ?1",
        params![collection],
    )
    .context(format!("Failed to clear collection {}", collection))?;

    let inserted_at = Utc::now().to_rfc3339();
    let mut stmt = conn
        .prepare(
            "INSERT INTO documents (id, collection, position, body, inserted_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .context("Failed to prepare insert")?;

    for (position, doc) in docs.iter().enumerate() {
        let body = serde_json::to_string(doc)
            .context(format!("Failed to serialize document for {}", collection))?;
        stmt.execute(params![
            Uuid::new_v4().to_string(),
            collection,
            position as i64,
            body,
            inserted_at
        ])
        .context(format!("Failed to insert into {}", collection))?;
    }

    Ok(docs.len())
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<(String, String)>) -> Result<Vec<StoredDocument<T>>> {
    rows.into_iter()
        .map(|(id, body)| {
            let body = serde_json::from_str(&body)
                .context(format!("Failed to parse stored document {}", id))?;
            Ok(StoredDocument { id, body })
        })
        .collect()
}

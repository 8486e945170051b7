// src/store/sqlite.rs

//! SQLite backed record store.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::errors::{QahubError, Result};
use crate::store::model::{
    ApiEndpoint, ApiRun, NewCheck, NewEndpoint, PresetDraft, ProbeOutcome, RunPreset, RunRecord,
    WebsiteCheck, WebsiteRun,
};
use crate::store::{PresetStore, ProbeStore, RunStore};
use crate::types::{HttpMethod, RunId};

/// How long a statement waits for another process holding the write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    suite_path TEXT NOT NULL,
    output_dir TEXT NOT NULL DEFAULT '',
    return_code INTEGER,
    ok INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS presets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    suite_path TEXT NOT NULL,
    variables_json TEXT,
    extra_args_json TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS api_endpoints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    headers_json TEXT,
    body_json TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS api_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    endpoint_id INTEGER NOT NULL,
    status_code INTEGER,
    ok INTEGER NOT NULL,
    latency_ms REAL NOT NULL,
    error TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_api_runs_endpoint ON api_runs(endpoint_id, id DESC);
CREATE TABLE IF NOT EXISTS website_checks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    label TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS website_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    website_id INTEGER NOT NULL,
    status_code INTEGER,
    ok INTEGER NOT NULL,
    latency_ms REAL NOT NULL,
    error TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_website_runs_check ON website_runs(website_id, id DESC);
"#;

const RUN_COLUMNS: &str = "id, suite_path, output_dir, return_code, ok, created_at";
const PRESET_COLUMNS: &str =
    "id, name, suite_path, variables_json, extra_args_json, created_at";
const ENDPOINT_COLUMNS: &str = "id, name, method, url, headers_json, body_json, created_at";
const CHECK_COLUMNS: &str = "id, url, label, created_at";

/// Record store on a single SQLite database.
///
/// Every operation is one autocommit statement, so several processes can
/// share the same file: identities come from `AUTOINCREMENT` and are never
/// handed out twice, and completing a run touches only that run's row.
#[derive(Debug)]
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)
            .map_err(|e| QahubError::Store(format!("opening {}: {e}", path.display())))?;
        let store = Self::bootstrap(conn, Some(path))?;
        info!(path = ?store.path, "opened record store");
        Ok(store)
    }

    /// Private database that disappears on drop.
    pub fn in_memory() -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?, None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn bootstrap(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        if path.is_some() {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            debug!(journal_mode = %mode, "journal mode set");
        }
        conn.execute_batch(SCHEMA).map_err(|e| {
            let shown = path
                .as_deref()
                .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string());
            QahubError::Store(format!("initialising schema in {shown}: {e}"))
        })?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    fn delete_row(&self, table: &str, id: u64) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
        debug!(table, id, changed, "delete");
        Ok(changed > 0)
    }
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let Some(text) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| conversion_error(idx, e))
}

fn to_json<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    Ok(value.map(serde_json::to_string).transpose()?)
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: RunId::new(row.get(0)?),
        suite_path: row.get(1)?,
        output_dir: row.get(2)?,
        return_code: row.get(3)?,
        ok: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn preset_from_row(row: &Row<'_>) -> rusqlite::Result<RunPreset> {
    Ok(RunPreset {
        id: row.get(0)?,
        name: row.get(1)?,
        suite_path: row.get(2)?,
        variables: json_column(row, 3)?,
        extra_args: json_column(row, 4)?,
        created_at: row.get(5)?,
    })
}

fn endpoint_from_row(row: &Row<'_>) -> rusqlite::Result<ApiEndpoint> {
    let method: String = row.get(2)?;
    Ok(ApiEndpoint {
        id: row.get(0)?,
        name: row.get(1)?,
        method: method.parse::<HttpMethod>().map_err(|e| conversion_error(2, e))?,
        url: row.get(3)?,
        headers: json_column(row, 4)?,
        body: json_column(row, 5)?,
        created_at: row.get(6)?,
    })
}

fn check_from_row(row: &Row<'_>) -> rusqlite::Result<WebsiteCheck> {
    Ok(WebsiteCheck {
        id: row.get(0)?,
        url: row.get(1)?,
        label: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn outcome_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<ProbeOutcome> {
    Ok(ProbeOutcome {
        status_code: row.get(first)?,
        ok: row.get(first + 1)?,
        latency_ms: row.get(first + 2)?,
        error: row.get(first + 3)?,
    })
}

impl RunStore for SqliteStore {
    fn insert_placeholder(&self, suite_path: &str) -> Result<RunRecord> {
        let created_at = Utc::now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO runs (suite_path, created_at) VALUES (?1, ?2)",
            params![suite_path, created_at],
        )?;
        let id = RunId::new(conn.last_insert_rowid() as u64);
        debug!(run_id = %id, suite_path, "run placeholder inserted");

        let mut record = RunRecord::placeholder(id, suite_path);
        record.created_at = created_at;
        Ok(record)
    }

    fn complete_run(&self, id: RunId, output_dir: &str, return_code: i32) -> Result<RunRecord> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE runs SET output_dir = ?1, return_code = ?2, ok = ?3 WHERE id = ?4",
            params![output_dir, return_code, return_code == 0, id.get()],
        )?;
        if changed == 0 {
            return Err(QahubError::not_found("run", id));
        }

        conn.query_row(
            &format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"),
            params![id.get()],
            run_from_row,
        )
        .map_err(Into::into)
    }

    fn get_run(&self, id: RunId) -> Result<Option<RunRecord>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"),
                params![id.get()],
                run_from_row,
            )
            .optional()?)
    }

    fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM runs ORDER BY id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], run_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl PresetStore for SqliteStore {
    fn insert_preset(&self, draft: PresetDraft) -> Result<RunPreset> {
        let created_at = Utc::now();
        let variables = to_json(draft.variables.as_ref())?;
        let extra_args = to_json(draft.extra_args.as_ref())?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO presets (name, suite_path, variables_json, extra_args_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![draft.name, draft.suite_path, variables, extra_args, created_at],
        )?;

        Ok(RunPreset {
            id: conn.last_insert_rowid() as u64,
            name: draft.name,
            suite_path: draft.suite_path,
            variables: draft.variables,
            extra_args: draft.extra_args,
            created_at,
        })
    }

    fn list_presets(&self) -> Result<Vec<RunPreset>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PRESET_COLUMNS} FROM presets ORDER BY id DESC"
        ))?;
        let rows = stmt.query_map([], preset_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_preset(&self, id: u64) -> Result<Option<RunPreset>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                &format!("SELECT {PRESET_COLUMNS} FROM presets WHERE id = ?1"),
                params![id],
                preset_from_row,
            )
            .optional()?)
    }

    fn delete_preset(&self, id: u64) -> Result<bool> {
        self.delete_row("presets", id)
    }
}

impl ProbeStore for SqliteStore {
    fn insert_endpoint(&self, endpoint: NewEndpoint) -> Result<ApiEndpoint> {
        let created_at = Utc::now();
        let headers = to_json(endpoint.headers.as_ref())?;
        let body = to_json(endpoint.body.as_ref())?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO api_endpoints (name, method, url, headers_json, body_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                endpoint.name,
                endpoint.method.as_str(),
                endpoint.url,
                headers,
                body,
                created_at
            ],
        )?;

        Ok(ApiEndpoint {
            id: conn.last_insert_rowid() as u64,
            name: endpoint.name,
            method: endpoint.method,
            url: endpoint.url,
            headers: endpoint.headers,
            body: endpoint.body,
            created_at,
        })
    }

    fn list_endpoints(&self) -> Result<Vec<ApiEndpoint>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENDPOINT_COLUMNS} FROM api_endpoints ORDER BY id DESC"
        ))?;
        let rows = stmt.query_map([], endpoint_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_endpoint(&self, id: u64) -> Result<Option<ApiEndpoint>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                &format!("SELECT {ENDPOINT_COLUMNS} FROM api_endpoints WHERE id = ?1"),
                params![id],
                endpoint_from_row,
            )
            .optional()?)
    }

    fn delete_endpoint(&self, id: u64) -> Result<bool> {
        self.delete_row("api_endpoints", id)
    }

    fn record_api_run(&self, endpoint_id: u64, outcome: ProbeOutcome) -> Result<ApiRun> {
        let created_at = Utc::now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO api_runs (endpoint_id, status_code, ok, latency_ms, error, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                endpoint_id,
                outcome.status_code,
                outcome.ok,
                outcome.latency_ms,
                outcome.error,
                created_at
            ],
        )?;

        Ok(ApiRun {
            id: conn.last_insert_rowid() as u64,
            endpoint_id,
            outcome,
            created_at,
        })
    }

    fn insert_check(&self, check: NewCheck) -> Result<WebsiteCheck> {
        let created_at = Utc::now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO website_checks (url, label, created_at) VALUES (?1, ?2, ?3)",
            params![check.url, check.label, created_at],
        )?;

        Ok(WebsiteCheck {
            id: conn.last_insert_rowid() as u64,
            url: check.url,
            label: check.label,
            created_at,
        })
    }

    fn list_checks(&self) -> Result<Vec<WebsiteCheck>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHECK_COLUMNS} FROM website_checks ORDER BY id DESC"
        ))?;
        let rows = stmt.query_map([], check_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_check(&self, id: u64) -> Result<Option<WebsiteCheck>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                &format!("SELECT {CHECK_COLUMNS} FROM website_checks WHERE id = ?1"),
                params![id],
                check_from_row,
            )
            .optional()?)
    }

    fn delete_check(&self, id: u64) -> Result<bool> {
        self.delete_row("website_checks", id)
    }

    fn record_website_run(&self, website_id: u64, outcome: ProbeOutcome) -> Result<WebsiteRun> {
        let created_at = Utc::now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO website_runs (website_id, status_code, ok, latency_ms, error, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                website_id,
                outcome.status_code,
                outcome.ok,
                outcome.latency_ms,
                outcome.error,
                created_at
            ],
        )?;

        Ok(WebsiteRun {
            id: conn.last_insert_rowid() as u64,
            website_id,
            outcome,
            created_at,
        })
    }

    fn latest_website_run(&self, website_id: u64) -> Result<Option<WebsiteRun>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT id, website_id, status_code, ok, latency_ms, error, created_at
                 FROM website_runs WHERE website_id = ?1 ORDER BY id DESC LIMIT 1",
                params![website_id],
                |row| {
                    Ok(WebsiteRun {
                        id: row.get(0)?,
                        website_id: row.get(1)?,
                        outcome: outcome_from_row(row, 2)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::in_memory().unwrap()
    }

    #[test]
    fn run_ids_are_monotonic_and_listing_is_newest_first() {
        let store = store();
        let a = store.insert_placeholder("/s/a.robot").unwrap();
        let b = store.insert_placeholder("/s/b.robot").unwrap();
        let c = store.insert_placeholder("/s/c.robot").unwrap();
        assert!(a.id < b.id && b.id < c.id);

        let recent = store.recent_runs(2).unwrap();
        let ids: Vec<_> = recent.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c.id, b.id]);
    }

    #[test]
    fn completing_an_unknown_run_is_not_found() {
        let store = store();
        match store.complete_run(RunId::new(9), "/runs/9", 0) {
            Err(QahubError::NotFound { kind, id }) => {
                assert_eq!(kind, "run");
                assert_eq!(id, 9);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn completion_only_touches_its_own_row() {
        let store = store();
        let a = store.insert_placeholder("/s/a.robot").unwrap();
        let b = store.insert_placeholder("/s/b.robot").unwrap();

        let done = store.complete_run(a.id, "/runs/1", 4).unwrap();
        assert_eq!(done.return_code, Some(4));
        assert!(!done.ok);
        assert_eq!(done.created_at, a.created_at);

        assert!(store.get_run(b.id).unwrap().unwrap().is_placeholder());
    }

    #[test]
    fn deleted_preset_ids_are_not_reused() {
        let store = store();
        let draft = PresetDraft {
            name: "smoke".into(),
            suite_path: "/s/smoke.robot".into(),
            variables: None,
            extra_args: None,
        };
        let first = store.insert_preset(draft.clone()).unwrap();
        assert!(store.delete_preset(first.id).unwrap());
        assert!(!store.delete_preset(first.id).unwrap());

        let second = store.insert_preset(draft).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn endpoint_columns_read_back_intact() {
        let store = store();
        let created = store
            .insert_endpoint(NewEndpoint {
                name: "create".into(),
                method: HttpMethod::Post,
                url: "http://localhost/items".into(),
                headers: Some([("X-Token".to_string(), "t".to_string())].into()),
                body: Some(serde_json::json!({ "n": 1 })),
            })
            .unwrap();

        let read = store.get_endpoint(created.id).unwrap().unwrap();
        assert_eq!(read, created);
    }

    #[test]
    fn latest_website_run_picks_most_recent_for_that_check() {
        let store = store();
        let outcome = |code| ProbeOutcome {
            status_code: Some(code),
            ok: code < 500,
            latency_ms: 1.0,
            error: None,
        };
        store.record_website_run(1, outcome(200)).unwrap();
        store.record_website_run(2, outcome(503)).unwrap();
        store.record_website_run(1, outcome(404)).unwrap();

        let latest = store.latest_website_run(1).unwrap().unwrap();
        assert_eq!(latest.outcome.status_code, Some(404));
        assert!(store.latest_website_run(3).unwrap().is_none());
    }
}

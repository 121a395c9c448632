//! Store and entry operations.
//!
//! Implements [`CacheStorage`] for [`CacheDb`]. Entry order is the
//! autoincrement `entries.id`, so re-putting a key moves it to the back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use super::CacheStorage;
use crate::Error;
use crate::net::{Request, RequestMode, Response};

/// Per-store overview used by the inspection tools.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
    pub created_at: String,
}

/// Flattened entry ready to cross into the database thread.
struct EntryRow {
    key_hash: String,
    url: String,
    method: String,
    mode: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("failed to encode headers: {e}")))?;
        Ok(Self {
            key_hash: compute_cache_key(request.cache_key()),
            url: request.cache_key().to_string(),
            method: request.method().to_string(),
            mode: request.mode().as_str().to_string(),
            status: i64::from(response.status),
            headers_json,
            body: response.body.to_vec(),
        })
    }
}

/// Return the id of `name`, creating the store if needed.
fn ensure_store(conn: &rusqlite::Connection, name: &str) -> Result<i64, Error> {
    conn.execute(
        "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    let id = conn.query_row("SELECT id FROM stores WHERE name = ?1", params![name], |row| row.get(0))?;
    Ok(id)
}

fn insert_entry(conn: &rusqlite::Connection, store_id: i64, row: &EntryRow) -> Result<(), Error> {
    conn.execute(
        "DELETE FROM entries WHERE store_id = ?1 AND key_hash = ?2",
        params![store_id, row.key_hash],
    )?;
    conn.execute(
        "INSERT INTO entries (store_id, key_hash, url, method, mode, status, headers_json, body, stored_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            store_id,
            row.key_hash,
            row.url,
            row.method,
            row.mode,
            row.status,
            row.headers_json,
            row.body,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn decode_request(url: &str, method: String, mode: &str) -> Result<Request, Error> {
    let mode: RequestMode = mode
        .parse()
        .map_err(|_| Error::CorruptEntry(format!("bad mode {mode} for {url}")))?;
    let request = Request::parse(url, mode).map_err(|e| Error::CorruptEntry(e.to_string()))?;
    Ok(request.with_method(method))
}

fn decode_response(status: i64, headers_json: &str, body: Vec<u8>) -> Result<Response, Error> {
    let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("bad status {status}")))?;
    let headers: Vec<(String, String)> =
        serde_json::from_str(headers_json).map_err(|e| Error::CorruptEntry(format!("bad headers: {e}")))?;
    Ok(Response::new(status, headers, body))
}

impl CacheDb {
    /// Entry counts for every store, in creation order.
    pub async fn store_summaries(&self) -> Result<Vec<StoreSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, COUNT(e.id), s.created_at
                    FROM stores s LEFT JOIN entries e ON e.store_id = s.id
                    GROUP BY s.id ORDER BY s.id ASC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(StoreSummary { name: row.get(0)?, entries: row.get::<_, i64>(1)? as u64, created_at: row.get(2)? })
                })?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, store: &str) -> Result<(), Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_store(conn, &store)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, store: &str, entries: Vec<(Request, Response)>) -> Result<(), Error> {
        let store = store.to_string();
        let rows = entries
            .iter()
            .map(|(req, resp)| EntryRow::new(req, resp))
            .collect::<Result<Vec<_>, _>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let store_id = ensure_store(&tx, &store)?;
                for row in &rows {
                    insert_entry(&tx, store_id, row)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let store = store.to_string();
        let row = EntryRow::new(request, response)?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let store_id = ensure_store(&tx, &store)?;
                insert_entry(&tx, store_id, &row)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, store: &str, request: &Request) -> Result<Option<Response>, Error> {
        let store = store.to_string();
        let key_hash = compute_cache_key(request.cache_key());

        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let result = conn.query_row(
                    "SELECT e.status, e.headers_json, e.body
                    FROM entries e JOIN stores s ON s.id = e.store_id
                    WHERE s.name = ?1 AND e.key_hash = ?2",
                    params![store, key_hash],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                );

                match result {
                    Ok((status, headers, body)) => Ok(Some(decode_response(status, &headers, body)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key_hash = compute_cache_key(request.cache_key());

        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let result = conn.query_row(
                    "SELECT e.status, e.headers_json, e.body
                    FROM entries e JOIN stores s ON s.id = e.store_id
                    WHERE e.key_hash = ?1
                    ORDER BY s.id ASC LIMIT 1",
                    params![key_hash],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                );

                match result {
                    Ok((status, headers, body)) => Ok(Some(decode_response(status, &headers, body)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, store: &str) -> Result<Vec<Request>, Error> {
        let store = store.to_string();

        self.conn
            .call(move |conn| -> Result<Vec<Request>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.url, e.method, e.mode
                    FROM entries e JOIN stores s ON s.id = e.store_id
                    WHERE s.name = ?1 ORDER BY e.id ASC",
                )?;
                let rows = stmt.query_map(params![store], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
                })?;

                let mut keys = Vec::new();
                for row in rows {
                    let (url, method, mode) = row?;
                    keys.push(decode_request(&url, method, &mode)?);
                }
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, store: &str, request: &Request) -> Result<bool, Error> {
        let store = store.to_string();
        let key_hash = compute_cache_key(request.cache_key());

        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM entries
                    WHERE key_hash = ?2 AND store_id = (SELECT id FROM stores WHERE name = ?1)",
                    params![store, key_hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_store(&self, store: &str) -> Result<bool, Error> {
        let store = store.to_string();

        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM stores WHERE name = ?1", params![store])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY id ASC")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(url: &str) -> Request {
        Request::parse(url, RequestMode::NoCors).unwrap()
    }

    fn resp(body: &str) -> Response {
        Response::new(200, vec![("content-type".into(), "text/plain".into())], body.to_string())
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = req("https://example.com/app.js");

        db.put("static-v1", &request, &resp("console.log(1)")).await.unwrap();

        let found = db.match_in("static-v1", &request).await.unwrap().unwrap();
        assert_eq!(found.body.as_ref(), b"console.log(1)");
        assert_eq!(found.header("content-type"), Some("text/plain"));
        assert!(db.match_in("dynamic-v1", &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_any_spans_stores() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("dynamic-v1", &req("https://example.com/api/data"), &resp("[]"))
            .await
            .unwrap();

        let found = db.match_any(&req("https://example.com/api/data")).await.unwrap();
        assert!(found.is_some());
        assert!(db.match_any(&req("https://example.com/api/other")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_ignores_mode() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://example.com/";
        db.put("dynamic-v1", &Request::parse(url, RequestMode::Navigate).unwrap(), &resp("home"))
            .await
            .unwrap();

        assert!(db.match_any(&req(url)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_keys_insertion_order_and_replace() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for path in ["a", "b", "c"] {
            db.put("dynamic-v1", &req(&format!("https://example.com/{path}")), &resp(path))
                .await
                .unwrap();
        }
        db.put("dynamic-v1", &req("https://example.com/a"), &resp("a2")).await.unwrap();

        let keys: Vec<String> = db
            .keys("dynamic-v1")
            .await
            .unwrap()
            .iter()
            .map(|r| r.url().path().to_string())
            .collect();
        assert_eq!(keys, vec!["/b", "/c", "/a"]);

        let replaced = db.match_in("dynamic-v1", &req("https://example.com/a")).await.unwrap().unwrap();
        assert_eq!(replaced.body.as_ref(), b"a2");
    }

    #[tokio::test]
    async fn test_keys_missing_store_is_empty() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.keys("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = req("https://example.com/x");
        db.put("dynamic-v1", &request, &resp("x")).await.unwrap();

        assert!(db.delete("dynamic-v1", &request).await.unwrap());
        assert!(!db.delete("dynamic-v1", &request).await.unwrap());
        assert!(db.keys("dynamic-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = req("https://example.com/x");
        db.put("static-v1", &request, &resp("x")).await.unwrap();
        db.open("dynamic-v1").await.unwrap();

        assert!(db.delete_store("static-v1").await.unwrap());
        assert!(!db.delete_store("static-v1").await.unwrap());
        assert_eq!(db.store_names().await.unwrap(), vec!["dynamic-v1".to_string()]);
        assert!(db.match_any(&request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_all_and_summaries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![
            (req("https://example.com/"), resp("home")),
            (req("https://example.com/style.css"), resp("body{}")),
        ];
        db.put_all("static-v1", entries).await.unwrap();
        db.open("dynamic-v1").await.unwrap();

        let summaries = db.store_summaries().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "static-v1");
        assert_eq!(summaries[0].entries, 2);
        assert_eq!(summaries[1].entries, 0);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("static-v1").await.unwrap();
        db.open("static-v1").await.unwrap();
        assert_eq!(db.store_names().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_keys_keep_method_and_mode() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = Request::parse("https://example.com/page", RequestMode::Navigate).unwrap();
        db.put("dynamic-v1", &request, &resp("page")).await.unwrap();

        let keys = db.keys("dynamic-v1").await.unwrap();
        assert_eq!(keys, vec![request]);
    }
}

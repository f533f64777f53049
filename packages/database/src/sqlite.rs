//! `SQLite`-backed [`DocumentStore`].
//!
//! All collections share one table:
//!
//! ```sql
//! documents (collection TEXT, id TEXT, body TEXT, created_at TEXT)
//! ```
//!
//! `body` holds the JSON document. Filters and sorts are evaluated with
//! `json_extract`, and every value (including JSON paths) is bound as a
//! parameter.

use std::path::Path;

use async_trait::async_trait;
use moosicbox_json_utils::database::ToValue as _;
use serde_json::Value;
use switchy_database::{Database, DatabaseValue};
use switchy_database_connection::init_sqlite_rusqlite;

use crate::{
    Collection, Document, DocumentStore, Filter, Sort, SortOrder, StoreError, document_id,
    validate_field,
};

/// Default location of the document database.
pub const DEFAULT_DB_PATH: &str = "data/varun.db";

/// Document store on a `SQLite` file.
pub struct SqliteDocumentStore {
    db: Box<dyn Database>,
}

impl std::fmt::Debug for SqliteDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDocumentStore").finish_non_exhaustive()
    }
}

fn db_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database(e.to_string())
}

impl SqliteDocumentStore {
    /// Opens (or creates) the database at `path` and ensures the schema
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the parent directory cannot be created,
    /// the database cannot be opened, or schema creation fails.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = init_sqlite_rusqlite(Some(path)).map_err(db_err)?;
        ensure_schema(db.as_ref()).await?;

        log::debug!("Opened document store at {}", path.display());
        Ok(Self { db })
    }
}

/// Creates the documents table if it doesn't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), StoreError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS documents (
            collection  TEXT NOT NULL,
            id          TEXT NOT NULL,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        )",
    )
    .await
    .map_err(db_err)?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_documents_collection
         ON documents (collection, created_at)",
    )
    .await
    .map_err(db_err)?;

    Ok(())
}

/// Incrementally builds a parameterized `WHERE` clause.
struct Query {
    sql: String,
    params: Vec<DatabaseValue>,
}

impl Query {
    fn new(select: &str, collection: Collection) -> Self {
        Self {
            sql: format!("{select} FROM documents WHERE collection = $1"),
            params: vec![DatabaseValue::String(collection.to_string())],
        }
    }

    /// Binds `value` and returns its placeholder.
    fn bind(&mut self, value: DatabaseValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn filter(mut self, filter: &Filter) -> Result<Self, StoreError> {
        for (field, value) in filter.conditions() {
            validate_field(field)?;
            let path = self.bind(DatabaseValue::String(format!("$.{field}")));
            let json = self.bind(DatabaseValue::String(value.to_string()));
            self.sql
                .push_str(&format!(" AND json_extract(body, {path}) = json_extract({json}, '$')"));
            // json_extract maps booleans to 0/1; keep them apart from numbers.
            if let Some(types) = json_types(value) {
                let path = self.bind(DatabaseValue::String(format!("$.{field}")));
                self.sql
                    .push_str(&format!(" AND json_type(body, {path}) IN ({types})"));
            }
        }
        Ok(self)
    }

    fn sort(mut self, sort: Option<&Sort>) -> Result<Self, StoreError> {
        if let Some(sort) = sort {
            validate_field(&sort.field)?;
            let path = self.bind(DatabaseValue::String(format!("$.{}", sort.field)));
            let direction = match sort.order {
                SortOrder::Ascending => "ASC",
                SortOrder::Descending => "DESC",
            };
            self.sql
                .push_str(&format!(" ORDER BY json_extract(body, {path}) {direction}, rowid ASC"));
        } else {
            self.sql.push_str(" ORDER BY rowid ASC");
        }
        Ok(self)
    }

    fn limit(mut self, limit: u32) -> Self {
        let placeholder = self.bind(DatabaseValue::Int32(i32::try_from(limit).unwrap_or(i32::MAX)));
        self.sql.push_str(&format!(" LIMIT {placeholder}"));
        self
    }
}

/// `json_type` names a stored value must have to equal `value`.
const fn json_types(value: &Value) -> Option<&'static str> {
    match value {
        Value::Bool(_) => Some("'true', 'false'"),
        Value::Number(_) => Some("'integer', 'real'"),
        _ => None,
    }
}

fn parse_body(body: &str) -> Result<Document, StoreError> {
    match serde_json::from_str(body)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::InvalidDocument(format!(
            "stored body is not an object: {other}"
        ))),
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(&self, collection: Collection, doc: Document) -> Result<(), StoreError> {
        let id = document_id(&doc)?;
        let body = serde_json::to_string(&doc)?;
        let now = chrono::Utc::now().to_rfc3339();

        let inserted = self
            .db
            .exec_raw_params(
                "INSERT INTO documents (collection, id, body, created_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (collection, id) DO NOTHING",
                &[
                    DatabaseValue::String(collection.to_string()),
                    DatabaseValue::String(id.clone()),
                    DatabaseValue::String(body),
                    DatabaseValue::String(now),
                ],
            )
            .await
            .map_err(db_err)?;

        if inserted == 0 {
            return Err(StoreError::Duplicate { collection, id });
        }
        Ok(())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .find(collection, filter, None, 1)
            .await?
            .into_iter()
            .next())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError> {
        let query = Query::new("SELECT body", collection)
            .filter(filter)?
            .sort(sort)?
            .limit(limit);

        let rows = self
            .db
            .query_raw_params(&query.sql, &query.params)
            .await
            .map_err(db_err)?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in &rows {
            let body: String = row.to_value("body").unwrap_or_default();
            docs.push(parse_body(&body)?);
        }
        Ok(docs)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
    ) -> Result<bool, StoreError> {
        let query = Query::new("SELECT id, body", collection)
            .filter(filter)?
            .sort(None)?
            .limit(1);

        let rows = self
            .db
            .query_raw_params(&query.sql, &query.params)
            .await
            .map_err(db_err)?;

        let Some(row) = rows.first() else {
            return Ok(false);
        };

        let id: String = row.to_value("id").unwrap_or_default();
        let body: String = row.to_value("body").unwrap_or_default();
        let mut doc = parse_body(&body)?;
        for (key, value) in set {
            if key != "id" {
                doc.insert(key, value);
            }
        }

        self.db
            .exec_raw_params(
                "UPDATE documents SET body = $1 WHERE collection = $2 AND id = $3",
                &[
                    DatabaseValue::String(serde_json::to_string(&doc)?),
                    DatabaseValue::String(collection.to_string()),
                    DatabaseValue::String(id),
                ],
            )
            .await
            .map_err(db_err)?;

        Ok(true)
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let query = Query::new("SELECT COUNT(*) as cnt", collection).filter(filter)?;

        let rows = self
            .db
            .query_raw_params(&query.sql, &query.params)
            .await
            .map_err(db_err)?;

        let count: i64 = rows.first().map_or(0, |r| r.to_value("cnt").unwrap_or(0));

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

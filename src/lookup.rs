use camino::Utf8Path;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, params_from_iter};
use tracing::debug;

use crate::error::AnnotateError;

/// An equality-filtered select against one table of a store.
#[derive(Debug, Clone, Copy)]
pub struct LookupQuery<'a> {
    pub table: &'a str,
    pub fields: &'a [&'a str],
    pub filter: &'a [(&'a str, &'a str)],
}

impl LookupQuery<'_> {
    pub fn to_sql(&self) -> String {
        let columns = self
            .fields
            .iter()
            .map(|field| quote_ident(field))
            .collect::<Vec<_>>()
            .join(",");
        let conditions = self
            .filter
            .iter()
            .enumerate()
            .map(|(idx, (key, _))| format!("{} = ?{}", quote_ident(key), idx + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(
            "SELECT {columns} FROM {} WHERE {conditions};",
            quote_ident(self.table)
        )
    }
}

pub trait LookupService {
    /// Returns the requested fields of the single row matching the filter.
    /// Zero rows and several rows are both `None`.
    fn query_unique(
        &self,
        store: &Utf8Path,
        query: &LookupQuery<'_>,
    ) -> Result<Option<Vec<String>>, AnnotateError>;
}

/// Opens a fresh read-only connection per query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteLookup;

impl SqliteLookup {
    pub fn new() -> Self {
        Self
    }
}

impl LookupService for SqliteLookup {
    fn query_unique(
        &self,
        store: &Utf8Path,
        query: &LookupQuery<'_>,
    ) -> Result<Option<Vec<String>>, AnnotateError> {
        let conn = Connection::open_with_flags(
            store.as_std_path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| AnnotateError::StoreOpen {
            path: store.to_string(),
            message: err.to_string(),
        })?;
        let query_err = |err: rusqlite::Error| AnnotateError::StoreQuery {
            path: store.to_string(),
            message: err.to_string(),
        };

        let sql = query.to_sql();
        debug!(store = %store, sql = %sql, "lookup");
        let mut stmt = conn.prepare(&sql).map_err(query_err)?;
        let values = query.filter.iter().map(|(_, value)| *value);
        let width = query.fields.len();
        let mut rows = stmt
            .query_map(params_from_iter(values), |row| {
                (0..width)
                    .map(|idx| row.get::<_, Value>(idx).map(value_to_string))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(query_err)?;

        let first = match rows.next() {
            Some(row) => row.map_err(query_err)?,
            None => return Ok(None),
        };
        if rows.next().is_some() {
            return Ok(None);
        }
        Ok(Some(first))
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(number) => number.to_string(),
        Value::Real(number) => number.to_string(),
        Value::Text(text) => text,
        Value::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

//! Generic table surface of the relational backend.
//!
//! Rows travel as JSON objects so one store implementation serves every
//! content kind. Each kind describes its table once through [`Record`].

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::identifier::Identifier;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend answered and refused the statement.
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("connection failed: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Static description of one backend table.
#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    /// Writable columns, `id` first. Anything else in a row is dropped before writing.
    pub columns: &'static [&'static str],
    pub order: Option<(&'static str, Direction)>,
}

impl Table {
    pub fn is_column(&self, name: &str) -> bool {
        self.columns.contains(&name)
    }
}

/// A read against one table.
#[derive(Debug, Clone, Copy)]
pub struct Select<'a> {
    pub table: &'a Table,
    pub filter: Option<(&'a str, &'a str)>,
    pub limit: Option<u32>,
}

impl<'a> Select<'a> {
    pub fn all(table: &'a Table) -> Self {
        Select {
            table,
            filter: None,
            limit: None,
        }
    }

    pub fn filter(mut self, column: &'a str, value: &'a str) -> Self {
        self.filter = Some((column, value));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A content kind stored in its own table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: Table;

    fn id(&self) -> &Identifier;
}

/// Query/upsert/delete surface keyed by record id.
///
/// Carried by the repository as `Arc<dyn ContentStore>`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn select(&self, query: Select<'_>) -> Result<Vec<Value>, StoreError>;

    /// Inserts the row, or updates the row with the same `id` when the row carries one.
    async fn upsert(&self, table: &Table, row: Map<String, Value>) -> Result<(), StoreError>;

    /// Plain insert; the backend fills `id` and `created_at`.
    async fn insert(&self, table: &Table, row: Map<String, Value>) -> Result<(), StoreError>;

    /// Deleting an id that does not exist succeeds.
    async fn delete(&self, table: &Table, id: &str) -> Result<(), StoreError>;
}

/// Serializes a record into the row sent to the backend.
///
/// Unknown keys are dropped and a `New` id is removed entirely, so the backend
/// assigns one.
pub fn to_row<R: Record>(record: &R) -> Result<Map<String, Value>, StoreError> {
    let value = serde_json::to_value(record)
        .map_err(|e| StoreError::Rejected(format!("unserializable record: {e}")))?;
    let Value::Object(mut row) = value else {
        return Err(StoreError::Rejected(format!(
            "{} record is not an object",
            R::TABLE.name
        )));
    };
    row.retain(|key, _| R::TABLE.is_column(key));
    if record.id().is_new() {
        row.remove("id");
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::Skill;

    #[test]
    fn test_to_row_strips_new_identifier() {
        let skill = Skill {
            id: Identifier::New,
            name: "Copywriting".into(),
            category: "Marketing".into(),
            level: 90,
        };
        let row = to_row(&skill).unwrap();
        assert!(!row.contains_key("id"));
        assert_eq!(row["name"], "Copywriting");
    }

    #[test]
    fn test_to_row_keeps_existing_identifier() {
        let skill = Skill {
            id: Identifier::existing("8d1e6a8c-0000-4000-8000-000000000001"),
            name: "SEO".into(),
            category: "Marketing".into(),
            level: 80,
        };
        let row = to_row(&skill).unwrap();
        assert_eq!(row["id"], "8d1e6a8c-0000-4000-8000-000000000001");
    }
}

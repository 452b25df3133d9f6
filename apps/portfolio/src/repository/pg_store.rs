use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::repository::store::{ContentStore, Direction, Select, StoreError, Table};

/// [`ContentStore`] over PostgreSQL tables.
///
/// Rows are read with `to_jsonb` and written through `jsonb_populate_record`,
/// so column types (uuid, text[], timestamptz) are resolved by the database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            return StoreError::Rejected(db.message().to_string());
        }
        let unreachable = matches!(
            e,
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
        );
        if unreachable {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Rejected(e.to_string())
        }
    }
}

fn checked_column<'a>(table: &Table, column: &'a str) -> Result<&'a str, StoreError> {
    if table.is_column(column) {
        Ok(column)
    } else {
        Err(StoreError::Rejected(format!(
            "unknown column '{column}' on table '{}'",
            table.name
        )))
    }
}

fn select_sql(query: &Select<'_>) -> Result<String, StoreError> {
    let table = query.table;
    let mut sql = format!("SELECT to_jsonb(t) FROM {} t", table.name);
    if let Some((column, _)) = query.filter {
        let column = checked_column(table, column)?;
        sql.push_str(&format!(" WHERE t.\"{column}\"::text = $1"));
    }
    if let Some((column, direction)) = table.order {
        let direction = match direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        sql.push_str(&format!(" ORDER BY t.\"{column}\" {direction}"));
    }
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    Ok(sql)
}

fn write_sql(table: &Table, row: &Map<String, Value>, upsert: bool) -> Result<String, StoreError> {
    let columns: Vec<&str> = table
        .columns
        .iter()
        .copied()
        .filter(|c| row.contains_key(*c))
        .collect();
    if columns.is_empty() {
        return Err(StoreError::Rejected(format!(
            "nothing to write to '{}'",
            table.name
        )));
    }

    let list = columns
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "INSERT INTO {name} ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{name}, $1)",
        name = table.name
    );

    if upsert && row.contains_key("id") {
        let updates = columns
            .iter()
            .filter(|c| **c != "id")
            .map(|c| format!("\"{c}\" = EXCLUDED.\"{c}\""))
            .collect::<Vec<_>>();
        if updates.is_empty() {
            sql.push_str(" ON CONFLICT (id) DO NOTHING");
        } else {
            sql.push_str(&format!(" ON CONFLICT (id) DO UPDATE SET {}", updates.join(", ")));
        }
    }
    Ok(sql)
}

#[async_trait]
impl ContentStore for PgStore {
    async fn select(&self, query: Select<'_>) -> Result<Vec<Value>, StoreError> {
        let sql = select_sql(&query)?;
        let mut statement = sqlx::query_scalar::<_, Value>(&sql);
        if let Some((_, value)) = query.filter {
            statement = statement.bind(value);
        }
        Ok(statement.fetch_all(&self.pool).await?)
    }

    async fn upsert(&self, table: &Table, row: Map<String, Value>) -> Result<(), StoreError> {
        let sql = write_sql(table, &row, true)?;
        sqlx::query(&sql)
            .bind(Json(Value::Object(row)))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert(&self, table: &Table, row: Map<String, Value>) -> Result<(), StoreError> {
        let sql = write_sql(table, &row, false)?;
        sqlx::query(&sql)
            .bind(Json(Value::Object(row)))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, table: &Table, id: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id::text = $1", table.name);
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }
}

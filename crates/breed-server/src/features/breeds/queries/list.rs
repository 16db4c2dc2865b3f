//! List breeds matching a filter
//!
//! Runs one parameterized `SELECT` against the `breed` table and streams the
//! rows into [`Breed`] records. No ordering is requested; rows come back in
//! whatever order PostgreSQL produces them.

use breed_common::{Breed, BreedQuery};
use futures::TryStreamExt;
use sqlx::{FromRow, PgPool};
use thiserror::Error;

use crate::db::{CancelOnDrop, QueryTag};
use crate::features::breeds::predicate::{BuildError, Column, Predicate, SqlFragment};

pub const BREED_TABLE: &str = "breed";

/// Label carried in the leading comment of every breed `SELECT`
pub const QUERY_LABEL: &str = "breed-inquiry";

#[derive(Debug, Error)]
pub enum ListBreedsError {
    #[error("Failed to build breed query: {0}")]
    Build(#[from] BuildError),

    #[error("Failed to execute breed query: {0}")]
    Execution(#[source] sqlx::Error),

    #[error("Failed to decode breed row: {0}")]
    Decode(#[source] sqlx::Error),
}

/// Build the full `SELECT` for a query without running it
pub fn select_statement(query: &BreedQuery) -> Result<SqlFragment, BuildError> {
    let predicate = Predicate::from_query(query).render(1)?;

    let projection = Column::PROJECTION
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Ok(SqlFragment {
        sql: format!("SELECT {} FROM {} WHERE {}", projection, BREED_TABLE, predicate.sql),
        params: predicate.params,
    })
}

/// Fetch every breed matching `query`
///
/// Issues exactly one query. Returns an empty vector when nothing matches. A
/// single row that fails to decode fails the whole call.
///
/// Dropping the returned future before it resolves cancels the statement on
/// the server as well: the `SELECT` is tagged with a unique comment and a
/// [`CancelOnDrop`] guard signals that backend through `pg_cancel_backend`.
#[tracing::instrument(
    skip(pool, query),
    fields(
        ids = query.ids.len(),
        short_names = query.short_names.len(),
        has_keyword = !query.keyword.is_empty()
    )
)]
pub async fn handle(pool: &PgPool, query: &BreedQuery) -> Result<Vec<Breed>, ListBreedsError> {
    let statement = select_statement(query)?;

    let tag = QueryTag::new(QUERY_LABEL);
    let sql = tag.annotate(&statement.sql);
    let guard = CancelOnDrop::new(pool.clone(), tag);

    let result = fetch_all(pool, &sql, &statement.params).await;
    guard.disarm();

    let breeds = result?;
    tracing::debug!(count = breeds.len(), "Breeds fetched");

    Ok(breeds)
}

async fn fetch_all(pool: &PgPool, sql: &str, params: &[String]) -> Result<Vec<Breed>, ListBreedsError> {
    // Every tagged statement is unique, so never cache it as prepared.
    let mut sql_query = sqlx::query(sql).persistent(false);
    for param in params {
        sql_query = sql_query.bind(param.as_str());
    }

    let mut rows = sql_query.fetch(pool);
    let mut breeds = Vec::new();

    while let Some(row) = rows.try_next().await.map_err(ListBreedsError::Execution)? {
        let record = BreedRecord::from_row(&row).map_err(ListBreedsError::Decode)?;
        breeds.push(Breed::from(record));
    }

    Ok(breeds)
}

#[derive(Debug, FromRow)]
struct BreedRecord {
    id: String,
    name_th: String,
    name_en: String,
    short_name: String,
    remark: Option<String>,
}

impl From<BreedRecord> for Breed {
    fn from(r: BreedRecord) -> Self {
        Breed {
            id: r.id,
            name_th: r.name_th,
            name_en: r.name_en,
            short_name: r.short_name,
            remark: r.remark,
        }
    }
}

//! Server-side cancellation of abandoned queries
//!
//! Dropping a sqlx future stops reading results but leaves the statement
//! running in PostgreSQL until it completes. Callers that need the backend to
//! stop prefix their statement with a [`QueryTag`] and hold a
//! [`CancelOnDrop`] guard while it runs. If the guard is dropped while still
//! armed, a background task finds the tagged statement in
//! `pg_stat_activity` and calls `pg_cancel_backend` on it.

use sqlx::PgPool;
use uuid::Uuid;

use super::DbResult;

/// Unique comment placed at the very start of one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTag(String);

impl QueryTag {
    pub fn new(label: &str) -> Self {
        Self(format!("/* {}:{} */", label, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `sql` with this tag prepended
    pub fn annotate(&self, sql: &str) -> String {
        format!("{} {}", self.0, sql)
    }
}

/// Cancel every active backend whose current statement starts with `tag`
///
/// Returns how many backends accepted the cancel signal. The session running
/// this lookup is never a candidate.
pub async fn cancel_tagged(pool: &PgPool, tag: &QueryTag) -> DbResult<usize> {
    let signalled: Vec<bool> = sqlx::query_scalar(
        "SELECT pg_cancel_backend(pid) FROM pg_stat_activity \
         WHERE pid <> pg_backend_pid() \
           AND state = 'active' \
           AND left(query, length($1::text)) = $1::text",
    )
    .bind(tag.as_str())
    .fetch_all(pool)
    .await?;

    Ok(signalled.into_iter().filter(|ok| *ok).count())
}

/// Cancels a tagged statement unless disarmed first
#[must_use = "dropping the guard immediately cancels the query"]
pub struct CancelOnDrop {
    pool: PgPool,
    tag: Option<QueryTag>,
}

impl CancelOnDrop {
    pub fn new(pool: PgPool, tag: QueryTag) -> Self {
        Self {
            pool,
            tag: Some(tag),
        }
    }

    /// The statement finished on its own; nothing to cancel
    pub fn disarm(mut self) {
        self.tag = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        let Some(tag) = self.tag.take() else {
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(tag = tag.as_str(), "No runtime to cancel abandoned query");
            return;
        };

        let pool = self.pool.clone();
        runtime.spawn(async move {
            match cancel_tagged(&pool, &tag).await {
                Ok(count) => tracing::debug!(tag = tag.as_str(), count, "Abandoned query cancelled"),
                Err(e) => tracing::warn!(tag = tag.as_str(), error = %e, "Failed to cancel abandoned query"),
            }
        });
    }
}

//! Breed storage backends
//!
//! Handlers only see [`BreedStore`]. Production wires in [`PgBreedStore`] over
//! the shared connection pool; tests and local tooling can use
//! [`MemoryBreedStore`], which evaluates the same [`Predicate`] in memory.

use async_trait::async_trait;
use breed_common::{Breed, BreedQuery};
use sqlx::PgPool;
use std::sync::Arc;

use super::predicate::Predicate;
use super::queries::{list, ListBreedsError};
use crate::db::{self, DbResult};

/// Read access to the breed catalog
#[async_trait]
pub trait BreedStore: Send + Sync {
    /// Every breed matching `query`; empty when nothing matches
    async fn list_breeds(&self, query: &BreedQuery) -> Result<Vec<Breed>, ListBreedsError>;

    /// Check that the backend is reachable
    async fn ping(&self) -> DbResult<()>;
}

/// Store handle shared across request handlers
pub type SharedBreedStore = Arc<dyn BreedStore>;

/// [`BreedStore`] backed by the PostgreSQL `breed` table
#[derive(Debug, Clone)]
pub struct PgBreedStore {
    pool: PgPool,
}

impl PgBreedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BreedStore for PgBreedStore {
    async fn list_breeds(&self, query: &BreedQuery) -> Result<Vec<Breed>, ListBreedsError> {
        list::handle(&self.pool, query).await
    }

    async fn ping(&self) -> DbResult<()> {
        db::health_check(&self.pool).await
    }
}

/// In-memory [`BreedStore`]
///
/// Holds a fixed set of breeds and filters them with [`Predicate::matches`].
/// The predicate is still rendered first so build failures surface exactly
/// as they do against PostgreSQL.
///
/// # Example
///
/// ```rust
/// use breed_common::{Breed, BreedQuery};
/// use breed_server::features::breeds::{BreedStore, MemoryBreedStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryBreedStore::new(vec![Breed {
///     id: "2".into(),
///     name_th: "พุดเดิ้ล".into(),
///     name_en: "Poodle".into(),
///     short_name: "PDL".into(),
///     remark: None,
/// }]);
///
/// let query = BreedQuery { keyword: "Poo".into(), ..Default::default() };
/// assert_eq!(store.list_breeds(&query).await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBreedStore {
    breeds: Arc<Vec<Breed>>,
}

impl MemoryBreedStore {
    pub fn new(breeds: Vec<Breed>) -> Self {
        Self {
            breeds: Arc::new(breeds),
        }
    }

    pub fn len(&self) -> usize {
        self.breeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breeds.is_empty()
    }
}

impl FromIterator<Breed> for MemoryBreedStore {
    fn from_iter<I: IntoIterator<Item = Breed>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl BreedStore for MemoryBreedStore {
    async fn list_breeds(&self, query: &BreedQuery) -> Result<Vec<Breed>, ListBreedsError> {
        let predicate = Predicate::from_query(query);
        predicate.render(1)?;

        Ok(self
            .breeds
            .iter()
            .filter(|breed| predicate.matches(breed))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

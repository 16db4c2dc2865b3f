//! Breed catalog inquiry
//!
//! - `predicate`: filter to parameterized `WHERE` clause
//! - `queries::list`: runs the clause against PostgreSQL
//! - `store`: the [`BreedStore`] seam with PostgreSQL and in-memory backends
//! - `routes`: `POST /v1/breed-inquiry`

pub mod predicate;
pub mod queries;
pub mod routes;
pub mod store;

pub use breed_common::{Breed, BreedQuery};
pub use predicate::{BuildError, Predicate, SqlFragment};
pub use queries::ListBreedsError;
pub use routes::breeds_routes;
pub use store::{BreedStore, MemoryBreedStore, PgBreedStore, SharedBreedStore};

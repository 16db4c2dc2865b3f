pub mod list;

pub use list::ListBreedsError;

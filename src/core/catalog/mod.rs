pub mod model;

pub use model::{Catalog, CatalogEntry, MOD_LOADER_ID};

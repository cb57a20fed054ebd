pub mod catalog;

pub use catalog::{
    load_catalog, ArrangementParams, Catalog, CatalogError, ModelBounds, ModelRecord,
    SceneCatalog, ShelfSpec, Vec3,
};

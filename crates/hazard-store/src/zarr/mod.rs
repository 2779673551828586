//! Zarr-backed grid store.

mod staging;
mod store;

pub use staging::STAGING_DIR;
pub use store::ZarrGridStore;

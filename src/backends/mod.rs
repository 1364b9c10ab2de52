//! Backend adapters.
//!
//! Each adapter wraps one external collaborator behind a trait and translates
//! its native failures into [`BackendError`].

pub mod catalog;
mod error;
pub mod store;

pub use catalog::{DownloadStore, MusicBrainzCatalog, MusicCatalog};
pub use error::{BackendError, BackendResult};
pub use store::{PostgresStore, RelationalStore};

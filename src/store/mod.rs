//! Disk persistence: template documents, the shared analytics ledger, and
//! the optional version archive.

use std::fs;
use std::path::Path;

use crate::MaquetteError;

pub mod analytics;
pub mod history;
pub mod templates;

pub use analytics::AnalyticsLedger;
pub use history::{Snapshot, VersionArchive};
pub use templates::TemplateStore;

/// Write a file via a temporary sibling plus rename, so readers never
/// observe a half-written document.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MaquetteError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

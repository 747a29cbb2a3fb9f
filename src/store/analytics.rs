//! Usage analytics ledger shared by every template in a store.
//!
//! One `analytics.json` file maps template names to counters. Updates are
//! read-modify-write cycles under a mutex with an atomic replace at the
//! end, so concurrent executions in one process serialize cleanly and
//! readers never observe a torn file.
//!
//! Analytics are derived data: a corrupt ledger is logged and treated as
//! empty instead of failing the caller.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::warn;

use crate::models::AnalyticsRecord;
use crate::store::write_atomic;
use crate::MaquetteError;

/// File-backed map of template name to usage counters.
pub struct AnalyticsLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AnalyticsLedger {
    /// Ledger at `path`. The file appears lazily on the first recorded
    /// execution.
    pub fn open(path: &Path) -> Self {
        AnalyticsLedger {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Fold one finished execution into the counters for `name`, creating
    /// the entry on first use.
    pub async fn record(
        &self,
        name: &str,
        elapsed_secs: f64,
        success: bool,
    ) -> Result<(), MaquetteError> {
        let _guard = self.write_lock.lock().await;
        let mut ledger = self.read_all();
        ledger.entry(name.to_string()).or_default().record(elapsed_secs, success);
        self.write_all(&ledger)
    }

    /// Counters for one template, `None` before its first execution.
    pub fn get(&self, name: &str) -> Option<AnalyticsRecord> {
        self.read_all().remove(name)
    }

    /// The whole ledger, sorted by template name.
    pub fn all(&self) -> BTreeMap<String, AnalyticsRecord> {
        self.read_all()
    }

    /// Drop the entry for `name`. Returns whether one existed.
    pub async fn remove(&self, name: &str) -> Result<bool, MaquetteError> {
        let _guard = self.write_lock.lock().await;
        let mut ledger = self.read_all();
        let existed = ledger.remove(name).is_some();
        if existed {
            self.write_all(&ledger)?;
        }
        Ok(existed)
    }

    fn read_all(&self) -> BTreeMap<String, AnalyticsRecord> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return BTreeMap::new(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read analytics ledger");
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&json) {
            Ok(ledger) => ledger,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "corrupt analytics ledger, starting empty");
                BTreeMap::new()
            }
        }
    }

    fn write_all(&self, ledger: &BTreeMap<String, AnalyticsRecord>) -> Result<(), MaquetteError> {
        let json = serde_json::to_string_pretty(ledger)?;
        write_atomic(&self.path, json.as_bytes())
    }
}

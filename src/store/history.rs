//! Version archive: snapshots of every persisted template mutation.
//!
//! Each snapshot lands under `history/<name>/<revision>.json` with a
//! monotonically increasing per-name revision number. The archive is
//! advisory: callers log a snapshot failure and carry on, the primary
//! operation never fails because archiving did.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{RevisionInfo, Template};
use crate::MaquetteError;

/// Most revisions a listing returns, newest first.
const REVISION_LIST_CAP: usize = 10;

/// One archived snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub revision: u32,
    pub saved_at: DateTime<Utc>,
    /// What triggered the snapshot: `update`, `modify` or `delete`.
    pub reason: String,
    /// Full template document as it was at snapshot time.
    pub template: Template,
}

/// Plain-file snapshot archive rooted at `history/` inside the store.
pub struct VersionArchive {
    root: PathBuf,
}

impl VersionArchive {
    /// Open the archive, creating its root directory if needed.
    pub fn open(root: &Path) -> Result<Self, MaquetteError> {
        fs::create_dir_all(root)?;
        Ok(VersionArchive {
            root: root.to_path_buf(),
        })
    }

    fn template_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Write one snapshot and return its revision number.
    pub fn snapshot(&self, template: &Template, reason: &str) -> Result<u32, MaquetteError> {
        let dir = self.template_dir(&template.name);
        fs::create_dir_all(&dir)?;

        let revision = self.latest_revision(&template.name)? + 1;
        let snapshot = Snapshot {
            revision,
            saved_at: Utc::now(),
            reason: reason.to_string(),
            template: template.clone(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(dir.join(format!("{revision:06}.json")), json)?;
        debug!(template = %template.name, revision, reason, "archived snapshot");
        Ok(revision)
    }

    /// Newest-first revision listing, capped at [`REVISION_LIST_CAP`].
    pub fn revisions(&self, name: &str) -> Result<Vec<RevisionInfo>, MaquetteError> {
        let dir = self.template_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut revisions = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let json = fs::read_to_string(&path)?;
            let snapshot: Snapshot = serde_json::from_str(&json)?;
            revisions.push(RevisionInfo {
                revision: snapshot.revision,
                saved_at: snapshot.saved_at,
                reason: snapshot.reason,
            });
        }

        revisions.sort_by(|a, b| b.revision.cmp(&a.revision));
        revisions.truncate(REVISION_LIST_CAP);
        Ok(revisions)
    }

    /// Load one archived snapshot in full.
    pub fn load(&self, name: &str, revision: u32) -> Result<Snapshot, MaquetteError> {
        let path = self.template_dir(name).join(format!("{revision:06}.json"));
        if !path.exists() {
            return Err(MaquetteError::not_found(format!("{name}@{revision}")));
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Highest revision number present for `name`, 0 when none exist.
    fn latest_revision(&self, name: &str) -> Result<u32, MaquetteError> {
        let dir = self.template_dir(name);
        if !dir.exists() {
            return Ok(0);
        }

        let mut latest = 0;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(revision) = stem.parse::<u32>() {
                    latest = latest.max(revision);
                }
            }
        }
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TemplateKind;
    use tempfile::TempDir;

    fn sample(name: &str, version: u32) -> Template {
        let now = Utc::now();
        Template {
            name: name.to_string(),
            kind: TemplateKind::Lighting,
            tags: vec![],
            description: String::new(),
            actions: vec![],
            version,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_revisions_are_monotone_per_name() {
        let dir = TempDir::new().unwrap();
        let archive = VersionArchive::open(dir.path()).unwrap();

        assert_eq!(archive.snapshot(&sample("rig", 1), "update").unwrap(), 1);
        assert_eq!(archive.snapshot(&sample("rig", 2), "modify").unwrap(), 2);
        assert_eq!(archive.snapshot(&sample("other", 1), "update").unwrap(), 1);
    }

    #[test]
    fn test_listing_is_newest_first_and_capped() {
        let dir = TempDir::new().unwrap();
        let archive = VersionArchive::open(dir.path()).unwrap();
        for version in 1..=12 {
            archive.snapshot(&sample("rig", version), "update").unwrap();
        }

        let revisions = archive.revisions("rig").unwrap();
        assert_eq!(revisions.len(), 10);
        assert_eq!(revisions[0].revision, 12);
        assert_eq!(revisions[9].revision, 3);
    }

    #[test]
    fn test_load_round_trips_document() {
        let dir = TempDir::new().unwrap();
        let archive = VersionArchive::open(dir.path()).unwrap();
        let template = sample("rig", 3);
        let revision = archive.snapshot(&template, "delete").unwrap();

        let snapshot = archive.load("rig", revision).unwrap();
        assert_eq!(snapshot.reason, "delete");
        assert_eq!(snapshot.template, template);
    }

    #[test]
    fn test_unknown_name_lists_empty() {
        let dir = TempDir::new().unwrap();
        let archive = VersionArchive::open(dir.path()).unwrap();
        assert!(archive.revisions("ghost").unwrap().is_empty());
        assert!(archive.load("ghost", 1).is_err());
    }
}

//! Template store: one JSON document per template under a root directory.
//!
//! Writes go through a temporary sibling plus rename, so a crashed or
//! interrupted save never leaves a half-written document behind. A single
//! async mutex serializes writers within the process; reads go through a
//! small in-memory cache that every write keeps coherent.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::merge::merge_template;
use crate::models::{Action, OverrideDocument, Template, TemplateDraft, TemplateSummary};
use crate::store::analytics::AnalyticsLedger;
use crate::store::history::VersionArchive;
use crate::store::write_atomic;
use crate::utils::names::validate_template_name;
use crate::MaquetteError;

/// File name of the shared usage ledger inside the store root.
const ANALYTICS_FILE: &str = "analytics.json";
/// Directory name of the version archive inside the store root.
const HISTORY_DIR: &str = "history";

/// Names that would collide with the store's own files.
const RESERVED_NAMES: &[&str] = &["analytics", "history"];

/// File-backed template storage with usage analytics and an optional
/// version archive.
pub struct TemplateStore {
    root: PathBuf,
    cache: RwLock<HashMap<String, Template>>,
    write_lock: Mutex<()>,
    analytics: AnalyticsLedger,
    archive: Option<VersionArchive>,
}

impl TemplateStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// `versioning` controls whether persisted mutations leave snapshots
    /// in the version archive.
    pub fn open(root: &Path, versioning: bool) -> Result<Self, MaquetteError> {
        fs::create_dir_all(root)?;

        let analytics = AnalyticsLedger::open(&root.join(ANALYTICS_FILE));
        let archive = if versioning {
            Some(VersionArchive::open(&root.join(HISTORY_DIR))?)
        } else {
            None
        };

        debug!(root = %root.display(), versioning, "template store opened");
        Ok(TemplateStore {
            root: root.to_path_buf(),
            cache: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
            analytics,
            archive,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn analytics(&self) -> &AnalyticsLedger {
        &self.analytics
    }

    pub fn archive(&self) -> Option<&VersionArchive> {
        self.archive.as_ref()
    }

    /// Create or replace the template named `name` from caller content.
    ///
    /// The store derives what the caller may not set: `version` (previous
    /// plus one, or 1), `created_at` (preserved across updates) and
    /// `updated_at`.
    pub async fn create_or_update(
        &self,
        name: &str,
        draft: TemplateDraft,
    ) -> Result<Template, MaquetteError> {
        self.validate_name(name)?;
        validate_actions(&draft.actions)?;

        let _guard = self.write_lock.lock().await;
        let existing = self.read_document_opt(name)?;

        let now = Utc::now();
        let template = Template {
            name: name.to_string(),
            kind: draft.kind,
            tags: draft.tags,
            description: draft.description,
            actions: draft.actions,
            version: existing.as_ref().map_or(1, |prev| prev.version + 1),
            created_at: existing.as_ref().map_or(now, |prev| prev.created_at),
            updated_at: now,
        };

        self.write_document(&template)?;
        self.cache
            .write()
            .await
            .insert(name.to_string(), template.clone());
        self.archive_snapshot(&template, "update");

        debug!(template = %name, version = template.version, "template saved");
        Ok(template)
    }

    /// Load one template by name.
    pub async fn get(&self, name: &str) -> Result<Template, MaquetteError> {
        self.validate_name(name)?;

        if let Some(template) = self.cache.read().await.get(name) {
            return Ok(template.clone());
        }

        let template = self.read_document(name)?;
        self.cache
            .write()
            .await
            .insert(name.to_string(), template.clone());
        Ok(template)
    }

    /// Summaries of every stored template, sorted by name.
    ///
    /// Files that fail to read or parse are logged and skipped rather
    /// than failing the whole listing. `include_versions` attaches the
    /// archive's revision list when the archive is enabled.
    pub async fn list(&self, include_versions: bool) -> Result<Vec<TemplateSummary>, MaquetteError> {
        let mut summaries = Vec::new();

        for name in self.stored_names()? {
            let template = match self.get(&name).await {
                Ok(template) => template,
                Err(err) => {
                    warn!(template = %name, error = %err, "skipping unreadable template");
                    continue;
                }
            };

            let mut summary = TemplateSummary::from(&template);
            if include_versions {
                if let Some(archive) = &self.archive {
                    match archive.revisions(&name) {
                        Ok(revisions) => summary.revisions = Some(revisions),
                        Err(err) => {
                            warn!(template = %name, error = %err, "failed to list revisions")
                        }
                    }
                }
            }
            summaries.push(summary);
        }

        Ok(summaries)
    }

    /// Full templates sharing at least one tag with the query set.
    ///
    /// An empty query matches nothing. Results are sorted by name.
    pub async fn search(&self, tags: &[String]) -> Result<Vec<Template>, MaquetteError> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for name in self.stored_names()? {
            let template = match self.get(&name).await {
                Ok(template) => template,
                Err(err) => {
                    warn!(template = %name, error = %err, "skipping unreadable template");
                    continue;
                }
            };
            if template.tags.iter().any(|tag| tags.contains(tag)) {
                matches.push(template);
            }
        }

        Ok(matches)
    }

    /// Delete one template, its analytics entry, and nothing else.
    ///
    /// Returns whether a document existed. Deleting a missing name is a
    /// successful no-op, so the operation is idempotent. The archived
    /// revision history survives the delete.
    pub async fn delete(&self, name: &str) -> Result<bool, MaquetteError> {
        self.validate_name(name)?;

        let _guard = self.write_lock.lock().await;
        let Some(existing) = self.read_document_opt(name)? else {
            return Ok(false);
        };

        self.archive_snapshot(&existing, "delete");
        fs::remove_file(self.template_path(name))?;
        self.cache.write().await.remove(name);
        self.analytics.remove(name).await?;

        debug!(template = %name, "template deleted");
        Ok(true)
    }

    /// Merge `changes` over the stored template.
    ///
    /// With `save` unset this is a preview: the resolved document is
    /// returned and disk stays untouched. With `save` set the result is
    /// persisted through the same path as [`Self::create_or_update`],
    /// version bump included.
    pub async fn modify(
        &self,
        name: &str,
        changes: &OverrideDocument,
        save: bool,
    ) -> Result<Template, MaquetteError> {
        self.validate_name(name)?;

        if !save {
            let base = self.get(name).await?;
            let resolved = merge_template(&base, changes)?;
            validate_actions(&resolved.actions)?;
            return Ok(resolved);
        }

        let _guard = self.write_lock.lock().await;
        let base = self.read_document(name)?;
        let merged = merge_template(&base, changes)?;
        validate_actions(&merged.actions)?;

        let template = Template {
            version: base.version + 1,
            updated_at: Utc::now(),
            ..merged
        };

        self.write_document(&template)?;
        self.cache
            .write()
            .await
            .insert(name.to_string(), template.clone());
        self.archive_snapshot(&template, "modify");

        debug!(template = %name, version = template.version, "template modified");
        Ok(template)
    }

    fn validate_name(&self, name: &str) -> Result<(), MaquetteError> {
        validate_template_name(name)?;
        if RESERVED_NAMES.contains(&name) {
            return Err(MaquetteError::validation(
                "name",
                format!("'{name}' is reserved for the store's own files"),
            ));
        }
        Ok(())
    }

    fn template_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Sorted stems of every template document in the root directory.
    fn stored_names(&self) -> Result<Vec<String>, MaquetteError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem == "analytics" {
                continue;
            }
            names.push(stem.to_string());
        }
        names.sort();
        Ok(names)
    }

    fn read_document(&self, name: &str) -> Result<Template, MaquetteError> {
        self.read_document_opt(name)?
            .ok_or_else(|| MaquetteError::not_found(name))
    }

    fn read_document_opt(&self, name: &str) -> Result<Option<Template>, MaquetteError> {
        let json = match fs::read_to_string(self.template_path(name)) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn write_document(&self, template: &Template) -> Result<(), MaquetteError> {
        let json = serde_json::to_string_pretty(template)?;
        write_atomic(&self.template_path(&template.name), json.as_bytes())
    }

    /// Best-effort archive write; failures are logged, never propagated.
    fn archive_snapshot(&self, template: &Template, reason: &str) {
        if let Some(archive) = &self.archive {
            if let Err(err) = archive.snapshot(template, reason) {
                warn!(template = %template.name, reason, error = %err, "version snapshot failed");
            }
        }
    }
}

fn validate_actions(actions: &[Action]) -> Result<(), MaquetteError> {
    for (i, action) in actions.iter().enumerate() {
        if action.tool.is_empty() {
            return Err(MaquetteError::validation(
                format!("actions[{i}].tool"),
                "tool cannot be empty",
            ));
        }
    }
    Ok(())
}

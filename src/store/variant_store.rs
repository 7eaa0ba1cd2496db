//! # VariantStore
//!
//! Durable append-only storage of document variants on the local filesystem.
//!
//! - Base documents are read-only: `<base_dir>/<name>.<ext>`
//! - Variants are immutable: `<variant_dir>/<name>_<YYYYMMDD_HHMMSS>[_<seq>].<ext>`
//! - Appends for one document are serialized by a per-document lock
//! - An append writes a hidden temp file, fsyncs it, then hard-links it to
//!   its identifier. The link never replaces an existing file, so a
//!   same-second collision moves on to the next sequence instead of
//!   overwriting.

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{Local, NaiveDateTime};
use uuid::Uuid;

use super::errors::{DocumentError, DocumentResult};
use super::index::VariantIndex;
use super::variant::{
    classify_entry, truncate_to_second, validate_document_name, Variant, VariantEntry, VariantId,
};
use crate::observability::{log_event_with_fields, Event};

/// Upper bound on same-second sequence attempts for one append
const MAX_SEQUENCE_ATTEMPTS: u32 = 10_000;

/// Filesystem-backed variant store
#[derive(Debug)]
pub struct VariantStore {
    base_dir: PathBuf,
    variant_dir: PathBuf,
    extension: String,
    index: RwLock<VariantIndex>,
    document_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl VariantStore {
    /// Open the store, creating both roots if absent and indexing existing variants
    pub fn open(
        base_dir: impl Into<PathBuf>,
        variant_dir: impl Into<PathBuf>,
        extension: &str,
    ) -> DocumentResult<Self> {
        let store = Self {
            base_dir: base_dir.into(),
            variant_dir: variant_dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
            index: RwLock::new(VariantIndex::new()),
            document_locks: Mutex::new(HashMap::new()),
        };

        ensure_dir(&store.base_dir)?;
        let indexed = store.refresh()?;

        let indexed = indexed.to_string();
        log_event_with_fields(
            Event::StoreOpened,
            &[
                ("base_dir", &store.base_dir.display().to_string()),
                ("variant_dir", &store.variant_dir.display().to_string()),
                ("variants", &indexed),
            ],
        );

        Ok(store)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn variant_dir(&self) -> &Path {
        &self.variant_dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Names of all base documents, sorted, without duplicates
    pub fn list_documents(&self) -> DocumentResult<Vec<String>> {
        let entries = fs::read_dir(&self.base_dir)
            .map_err(|e| DocumentError::storage_at("cannot read base root", &self.base_dir, e))?;

        let suffix = format!(".{}", self.extension);
        let mut names = BTreeSet::new();

        for entry in entries {
            let entry = entry
                .map_err(|e| DocumentError::storage_at("cannot read base root", &self.base_dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(file_name) = entry.file_name().to_str() {
                if let Some(name) = file_name.strip_suffix(&suffix) {
                    if validate_document_name(name).is_ok() {
                        names.insert(name.to_string());
                    }
                }
            }
        }

        Ok(names.into_iter().collect())
    }

    /// Variants of `name`, oldest first
    pub fn list_variants(&self, name: &str) -> DocumentResult<Vec<Variant>> {
        validate_document_name(name)?;
        ensure_dir(&self.variant_dir)?;

        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Ok(index.variants(name).to_vec())
    }

    /// Newest variant of `name`, if any
    pub fn latest_variant(&self, name: &str) -> DocumentResult<Option<Variant>> {
        validate_document_name(name)?;
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Ok(index.latest(name).cloned())
    }

    /// Append `content` as a new variant stamped with the current local time.
    ///
    /// The stamp never goes behind the document's newest variant, so a local
    /// clock that steps back (DST end, NTP correction) still yields a variant
    /// that sorts last.
    pub fn append_variant(&self, name: &str, content: &[u8]) -> DocumentResult<VariantId> {
        validate_document_name(name)?;
        let lock = self.document_lock(name);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let created_at = self.monotonic_stamp(name, Local::now().naive_local());
        self.append_locked(name, content, created_at)
    }

    /// Append `content` as a new variant stamped with `created_at`
    pub fn append_variant_at(
        &self,
        name: &str,
        content: &[u8],
        created_at: NaiveDateTime,
    ) -> DocumentResult<VariantId> {
        validate_document_name(name)?;
        let lock = self.document_lock(name);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.append_locked(name, content, truncate_to_second(created_at))
    }

    /// Caller holds the document lock
    fn append_locked(
        &self,
        name: &str,
        content: &[u8],
        created_at: NaiveDateTime,
    ) -> DocumentResult<VariantId> {
        ensure_dir(&self.variant_dir)?;

        let temp_path = self.variant_dir.join(format!(".{}.tmp", Uuid::new_v4()));
        if let Err(e) = write_synced(&temp_path, content) {
            remove_staged(&temp_path);
            return Err(e);
        }

        let linked = self.link_next_free(name, created_at, &temp_path);
        // The temp name is only a staging handle; the variant lives on under its link
        remove_staged(&temp_path);
        let variant = linked?;

        fsync_dir(&self.variant_dir)?;

        let id = variant.id().clone();
        let size = content.len().to_string();
        self.index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(variant);

        log_event_with_fields(
            Event::VariantAppended,
            &[("document", name), ("variant", id.as_str()), ("bytes", &size)],
        );

        Ok(id)
    }

    /// Read the immutable base document
    pub fn read_base(&self, name: &str) -> DocumentResult<Vec<u8>> {
        validate_document_name(name)?;
        let path = self.base_dir.join(format!("{}.{}", name, self.extension));

        fs::read(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                DocumentError::NotFound(name.to_string())
            } else {
                DocumentError::storage_at("cannot read base document", &path, e)
            }
        })
    }

    /// Read the content of one variant
    pub fn read_variant(&self, variant: &Variant) -> DocumentResult<Vec<u8>> {
        let path = self.variant_dir.join(variant.file_name());
        fs::read(&path).map_err(|e| DocumentError::storage_at("cannot read variant", &path, e))
    }

    /// Rebuild the index from the variant root. Returns the number of variants indexed.
    ///
    /// Entries that look like variants but cannot be parsed are skipped and logged.
    pub fn refresh(&self) -> DocumentResult<usize> {
        ensure_dir(&self.variant_dir)?;

        // Hold the write lock across the scan so no append lands in a stale index
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);

        let entries = fs::read_dir(&self.variant_dir).map_err(|e| {
            DocumentError::storage_at("cannot enumerate variant root", &self.variant_dir, e)
        })?;

        let mut fresh = VariantIndex::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                DocumentError::storage_at("cannot enumerate variant root", &self.variant_dir, e)
            })?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let os_name = entry.file_name();
            let file_name = match os_name.to_str() {
                Some(n) => n,
                None => continue,
            };

            match classify_entry(file_name, &self.extension) {
                VariantEntry::Valid(variant) => fresh.insert(variant),
                VariantEntry::Malformed { document, reason } => {
                    let document = document.unwrap_or_default();
                    log_event_with_fields(
                        Event::VariantSkipped,
                        &[("file", file_name), ("document", &document), ("reason", &reason)],
                    );
                }
                VariantEntry::Foreign => {}
            }
        }

        let count = fresh.len();
        *index = fresh;
        Ok(count)
    }

    /// `now` truncated to the second, clamped to the newest indexed stamp of `name`
    fn monotonic_stamp(&self, name: &str, now: NaiveDateTime) -> NaiveDateTime {
        let now = truncate_to_second(now);
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        match index.latest(name) {
            Some(latest) if latest.created_at() > now => latest.created_at(),
            _ => now,
        }
    }

    fn document_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .document_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Link the staged file under the first free identifier at `created_at`.
    /// Caller holds the document lock.
    fn link_next_free(
        &self,
        name: &str,
        created_at: NaiveDateTime,
        staged: &Path,
    ) -> DocumentResult<Variant> {
        let first = self
            .index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .next_sequence(name, created_at);

        for sequence in first..first.saturating_add(MAX_SEQUENCE_ATTEMPTS) {
            let variant = Variant::new(name, created_at, sequence, &self.extension);
            let target = self.variant_dir.join(variant.file_name());

            match fs::hard_link(staged, &target) {
                Ok(()) => return Ok(variant),
                // Present on disk but not indexed (written by another process)
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(DocumentError::storage_at("cannot link variant", &target, e)),
            }
        }

        Err(DocumentError::storage_no_source(format!(
            "no free variant identifier for '{}' at {}",
            name, created_at
        )))
    }
}

/// Remove a staging file. A failure is logged at WARN and never fails the
/// append; returns false when the file could not be removed.
fn remove_staged(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            log_event_with_fields(
                Event::TempCleanupFailed,
                &[("file", &path.display().to_string()), ("error", &e.to_string())],
            );
            false
        }
    }
}

fn ensure_dir(path: &Path) -> DocumentResult<()> {
    fs::create_dir_all(path).map_err(|e| DocumentError::storage_at("cannot create root", path, e))
}

fn write_synced(path: &Path, content: &[u8]) -> DocumentResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| DocumentError::storage_at("cannot stage variant", path, e))?;

    file.write_all(content)
        .and_then(|_| file.sync_all())
        .map_err(|e| DocumentError::storage_at("cannot write variant", path, e))
}

/// fsync a directory so a new link survives a crash
#[cfg(unix)]
fn fsync_dir(path: &Path) -> DocumentResult<()> {
    File::open(path)
        .and_then(|dir| dir.sync_all())
        .map_err(|e| DocumentError::storage_at("fsync directory failed", path, e))
}

#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> DocumentResult<()> {
    Ok(())
}

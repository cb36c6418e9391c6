//! File-backed registry store.
//!
//! Layout under the configured root:
//!
//! ```text
//! <root>/<environment>/contract-addresses.json          unsharded
//! <root>/<environment>/contract-addresses-<SHARD>.json  per shard
//! <root>/<environment>/.rigger.lock                     run lock
//! ```
//!
//! Documents are replaced whole through a temp file and a rename, so a
//! reader sees either the old or the new document, never a torn one. The
//! revision of a document is the SHA-256 of its bytes.
//!
//! The revision check and the rename are two separate filesystem steps.
//! Compare-and-swap only holds between processes that hold the
//! environment's run lock; two writers without it can still interleave
//! between check and rename.

use super::{
    RegistryError,
    store::{Document, Partition, RegistryStore, Revision, Snapshot},
};
use crate::{ids::EnvironmentName, log::Topic};
use sha2::{Digest, Sha256};
use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write as _},
    path::{Path, PathBuf},
};

pub const DOCUMENT_PREFIX: &str = "contract-addresses";
pub const LOCK_FILE: &str = ".rigger.lock";

///
/// FileStore
///

#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn environment_dir(&self, environment: &EnvironmentName) -> PathBuf {
        self.root.join(environment.as_str())
    }

    #[must_use]
    pub fn document_path(&self, partition: &Partition) -> PathBuf {
        let file = match &partition.shard {
            Some(shard) => format!("{DOCUMENT_PREFIX}-{shard}.json"),
            None => format!("{DOCUMENT_PREFIX}.json"),
        };

        self.environment_dir(&partition.environment).join(file)
    }

    fn read_bytes(path: &Path, partition: &Partition) -> Result<Option<Vec<u8>>, RegistryError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_failure(partition, &e)),
        }
    }
}

impl RegistryStore for FileStore {
    fn load(&self, partition: &Partition) -> Result<Snapshot, RegistryError> {
        let path = self.document_path(partition);
        let Some(bytes) = Self::read_bytes(&path, partition)? else {
            return Ok(Snapshot::default());
        };

        let document: Document =
            serde_json::from_slice(&bytes).map_err(|e| RegistryError::Corrupt {
                partition: partition.to_string(),
                reason: format!("{}: {e}", path.display()),
            })?;

        Ok(Snapshot {
            document,
            revision: Some(revision_of(&bytes)),
        })
    }

    fn store(
        &self,
        partition: &Partition,
        document: &Document,
        expected: Option<&Revision>,
    ) -> Result<Revision, RegistryError> {
        let path = self.document_path(partition);

        let current = Self::read_bytes(&path, partition)?.map(|bytes| revision_of(&bytes));
        if current.as_ref() != expected {
            return Err(RegistryError::Conflict {
                partition: partition.to_string(),
            });
        }

        let dir = self.environment_dir(&partition.environment);
        fs::create_dir_all(&dir).map_err(|e| io_failure(partition, &e))?;

        let bytes = serde_json::to_vec_pretty(document).map_err(|e| RegistryError::IoFailure {
            partition: partition.to_string(),
            reason: e.to_string(),
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).map_err(|e| io_failure(partition, &e))?;
        fs::rename(&tmp, &path).map_err(|e| io_failure(partition, &e))?;

        Ok(revision_of(&bytes))
    }

    fn clear(&self, environment: &EnvironmentName) -> Result<usize, RegistryError> {
        let dir = self.environment_dir(environment);
        let failure = |e: &std::io::Error| RegistryError::IoFailure {
            partition: environment.to_string(),
            reason: format!("{}: {e}", dir.display()),
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(failure(&e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| failure(&e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if name.starts_with(DOCUMENT_PREFIX) && name.ends_with(".json") {
                fs::remove_file(entry.path()).map_err(|e| failure(&e))?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn lock(&self, environment: &EnvironmentName) -> Result<Option<RunLock>, RegistryError> {
        RunLock::acquire(&self.environment_dir(environment), environment).map(Some)
    }
}

///
/// RunLock
///
/// Exclusive marker file for one environment; released on drop. Guards
/// against two orchestrator runs on one host racing the same documents.
/// A lock left behind by a crashed run must be removed by hand.
///

#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(dir: &Path, environment: &EnvironmentName) -> Result<Self, RegistryError> {
        let failure = |e: &std::io::Error| RegistryError::IoFailure {
            partition: environment.to_string(),
            reason: format!("{}: {e}", dir.display()),
        };

        fs::create_dir_all(dir).map_err(|e| failure(&e))?;

        let path = dir.join(LOCK_FILE);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(RegistryError::Locked {
                    environment: environment.to_string(),
                    path: path.display().to_string(),
                });
            }
            Err(e) => return Err(failure(&e)),
        };

        // best effort; the file's existence is the lock
        let _ = writeln!(file, "{}", std::process::id());

        log!(Topic::Registry, Debug, "🔒 locked {}", path.display());

        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log!(
                Topic::Registry,
                Warn,
                "⚠️ could not release {}: {e}",
                self.path.display()
            );
        }
    }
}

// -------------------------------------------------------------------------
// Helpers
// -------------------------------------------------------------------------

fn revision_of(bytes: &[u8]) -> Revision {
    Revision(hex::encode(Sha256::digest(bytes)))
}

fn io_failure(partition: &Partition, e: &std::io::Error) -> RegistryError {
    RegistryError::IoFailure {
        partition: partition.to_string(),
        reason: e.to_string(),
    }
}

///
/// TESTS
///

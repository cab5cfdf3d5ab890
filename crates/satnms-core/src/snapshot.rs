// ── Configuration snapshots ──
//
// Whole-configuration capture and restore, the isolation mechanism between
// test scenarios. Two stores:
//
// - shared: named configurations kept by the NMS itself
// - local: `<name>.cfg` files in a directory owned by the harness, holding
//   the exported artifact byte for byte
//
// Applying a snapshot that doesn't exist is always an error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use satnms_api::NmsClient;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CoreError, Operation};

const EXTENSION: &str = "cfg";

/// A local snapshot file.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Capture and restore of the full NMS configuration.
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    local_dir: PathBuf,
}

impl SnapshotManager {
    pub fn new(local_dir: impl Into<PathBuf>) -> Self {
        Self {
            local_dir: local_dir.into(),
        }
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Path of a local snapshot. Names must be plain file stems.
    pub fn local_path(&self, name: &str) -> Result<PathBuf, CoreError> {
        validate_name(name)?;
        Ok(self.local_dir.join(format!("{name}.{EXTENSION}")))
    }

    /// Capture the running configuration under `name`.
    pub async fn create_backup(
        &self,
        client: &NmsClient,
        name: &str,
        local: bool,
    ) -> Result<(), CoreError> {
        validate_name(name)?;
        if local {
            let path = self.local_path(name)?;
            let artifact = client
                .export_config()
                .await
                .map_err(|e| CoreError::from_api(e, Operation::Snapshot { name }))?;
            write_atomic(&path, &artifact).await?;
            info!(name, path = %path.display(), bytes = artifact.len(), "local snapshot created");
        } else {
            client
                .save_config(name)
                .await
                .map_err(|e| CoreError::from_api(e, Operation::Snapshot { name }))?;
            info!(name, "shared snapshot created");
        }
        Ok(())
    }

    /// Replace the running configuration with snapshot `name`.
    pub async fn apply_backup(
        &self,
        client: &NmsClient,
        name: &str,
        local: bool,
    ) -> Result<(), CoreError> {
        validate_name(name)?;
        if local {
            let path = self.local_path(name)?;
            let artifact = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(CoreError::SnapshotNotFound {
                        name: name.to_owned(),
                    });
                }
                Err(e) => return Err(CoreError::io(&path, e)),
            };
            debug!(name, bytes = artifact.len(), "uploading local snapshot");
            client
                .import_config(artifact)
                .await
                .map_err(|e| CoreError::from_api(e, Operation::Snapshot { name }))?;
        } else {
            client
                .load_config(name)
                .await
                .map_err(|e| CoreError::from_api(e, Operation::Snapshot { name }))?;
        }
        info!(name, local, "snapshot applied");
        Ok(())
    }

    /// Local snapshots, sorted by name. A missing directory is an empty store.
    pub fn list_local(&self) -> Result<Vec<SnapshotInfo>, CoreError> {
        let entries = match std::fs::read_dir(&self.local_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::io(&self.local_dir, e)),
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::io(&self.local_dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
                continue;
            };
            let meta = entry.metadata().map_err(|e| CoreError::io(&path, e))?;
            if !meta.is_file() {
                continue;
            }
            out.push(SnapshotInfo {
                name,
                size: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
                path,
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name != name.trim();
    if bad {
        return Err(CoreError::invalid_usage(format!(
            "invalid snapshot name {name:?}"
        )));
    }
    Ok(())
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| CoreError::io(dir, e))?;
    }
    let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| CoreError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| CoreError::io(path, e))
}

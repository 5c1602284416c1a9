//! Durable record of a failed run, sufficient to replay it offline.
//!
//! Layout of a snapshot directory:
//!
//! - `payload.json` - the raw event
//! - `pr_db.json` - the mapping as it was before planning
//! - `exception` - the error and its causes
//! - `pr.diff` - the full diff of the triggering pull request

use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use sync_core::PrMapping;
use tokio::fs;
use tracing::info;

use crate::error::Result;

const PAYLOAD_FILE: &str = "payload.json";
const MAPPING_FILE: &str = "pr_db.json";
const EXCEPTION_FILE: &str = "exception";
const DIFF_FILE: &str = "pr.diff";

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub payload: Value,
    pub mapping: PrMapping,
    pub exception: String,
    pub diff: String,
}

impl Snapshot {
    pub async fn load(dir: &Path) -> Result<Self> {
        let payload = serde_json::from_str(&fs::read_to_string(dir.join(PAYLOAD_FILE)).await?)?;
        let mapping = serde_json::from_str(&fs::read_to_string(dir.join(MAPPING_FILE)).await?)?;
        let exception = fs::read_to_string(dir.join(EXCEPTION_FILE)).await?;
        let diff = fs::read_to_string(dir.join(DIFF_FILE)).await?;

        Ok(Self {
            payload,
            mapping,
            exception,
            diff,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotRecorder {
    root: PathBuf,
}

impl SnapshotRecorder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write a new `error-snapshot-<millis>` directory and return its path.
    ///
    /// Existing snapshots are never overwritten.
    pub async fn record(
        &self,
        payload: &Value,
        mapping: &PrMapping,
        exception: &str,
        diff: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.root).await?;
        let dir = self.create_unique_dir().await?;

        fs::write(dir.join(PAYLOAD_FILE), serde_json::to_string_pretty(payload)?).await?;
        fs::write(dir.join(MAPPING_FILE), serde_json::to_string_pretty(mapping)?).await?;
        fs::write(dir.join(EXCEPTION_FILE), exception).await?;
        fs::write(dir.join(DIFF_FILE), diff).await?;

        info!(path = %dir.display(), "Error snapshot saved");
        Ok(dir)
    }

    async fn create_unique_dir(&self) -> Result<PathBuf> {
        let base = format!("error-snapshot-{}", Utc::now().timestamp_millis());
        let mut candidate = self.root.join(&base);
        let mut attempt = 1;

        loop {
            match fs::create_dir(&candidate).await {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    candidate = self.root.join(format!("{}-{}", base, attempt));
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_record_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = SnapshotRecorder::new(temp_dir.path().join("snapshots"));

        let mut mapping = PrMapping::new();
        mapping.insert("42", 7);
        let payload = json!({ "action": "closed", "pull_request": { "number": 42 } });

        let dir = recorder
            .record(&payload, &mapping, "Step MergeUpstreamStep failed\n", "diff --git a/x b/x\n")
            .await
            .unwrap();

        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("error-snapshot-"));

        let snapshot = Snapshot::load(&dir).await.unwrap();
        assert_eq!(snapshot.payload, payload);
        assert_eq!(snapshot.mapping, mapping);
        assert_eq!(snapshot.exception, "Step MergeUpstreamStep failed\n");
        assert_eq!(snapshot.diff, "diff --git a/x b/x\n");
    }

    #[tokio::test]
    async fn test_snapshots_never_collide() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = SnapshotRecorder::new(temp_dir.path());
        let payload = json!({});

        let first = recorder
            .record(&payload, &PrMapping::new(), "a", "")
            .await
            .unwrap();
        let second = recorder
            .record(&payload, &PrMapping::new(), "b", "")
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(Snapshot::load(&first).await.unwrap().exception, "a");
        assert_eq!(Snapshot::load(&second).await.unwrap().exception, "b");
    }

    #[tokio::test]
    async fn test_mapping_file_is_plain_json_object() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = SnapshotRecorder::new(temp_dir.path());
        let mut mapping = PrMapping::new();
        mapping.insert("1", 2);

        let dir = recorder.record(&json!({}), &mapping, "", "").await.unwrap();
        let raw = std::fs::read_to_string(dir.join("pr_db.json")).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(parsed, json!({ "1": 2 }));
    }
}

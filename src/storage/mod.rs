use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};

use crate::domain::MessageData;

/// JSON file sink for normalized records. One file per batch, named
/// `{prefix}_{timestamp}.json` with the colons of the ISO timestamp
/// replaced so the name is filesystem-safe everywhere.
pub struct FileStorage {
    base: PathBuf,
}

impl FileStorage {
    pub fn new(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        fs::create_dir_all(&base)
            .with_context(|| format!("failed to create storage directory {}", base.display()))?;
        Ok(Self { base })
    }

    pub fn save(&self, records: &[MessageData], prefix: &str) -> Result<PathBuf> {
        let timestamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace(':', "-");
        let path = self.base.join(format!("{prefix}_{timestamp}.json"));

        let body = serde_json::to_vec_pretty(records).context("failed to serialize messages")?;
        fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;

        tracing::info!(
            target: "storage",
            count = records.len(),
            path = %path.display(),
            "messages saved"
        );
        Ok(path)
    }

    /// Load a message file by absolute path or path relative to the base.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<MessageData>> {
        let path = path.as_ref();
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        };
        let body =
            fs::read(&full).with_context(|| format!("failed to read {}", full.display()))?;
        serde_json::from_slice(&body)
            .with_context(|| format!("invalid message file {}", full.display()))
    }

    /// All `.json` files under the base, sorted by name.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let entries = fs::read_dir(&self.base)
            .with_context(|| format!("failed to list {}", self.base.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: i64, text: &str) -> MessageData {
        MessageData {
            data_post: format!("foo/{id}"),
            user_url: "https://t.me/foo".into(),
            user_name: "Foo Channel".into(),
            user_photo: Some("https://t.me/foo/profile-photo".into()),
            message_url: format!("https://t.me/foo/{id}"),
            message_text: text.to_string(),
            message_photo: vec![format!("https://t.me/foo/{id}?single&photo=x")],
            message_video: Vec::new(),
            views: Some("12".into()),
            datetime: "2023-11-14T22:13:20.000Z".into(),
            id: Some(id),
        }
    }

    #[test]
    fn save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        let records = vec![record(1, "first"), record(2, ""), record(3, "третий")];
        let path = storage.save(&records, "foo_direct").unwrap();
        assert_eq!(storage.load(&path).unwrap(), records);
    }

    #[test]
    fn filenames_carry_prefix_and_no_colons() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        let path = storage.save(&[record(1, "x")], "foo_live").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("foo_live_"));
        assert!(name.ends_with(".json"));
        assert!(!name.contains(':'));
    }

    #[test]
    fn load_accepts_base_relative_paths() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        let path = storage.save(&[record(5, "rel")], "foo_direct").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        let loaded = storage.load(name).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, Some(5));
    }

    #[test]
    fn list_returns_only_json_files() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.save(&[record(1, "a")], "one").unwrap();
        storage.save(&[record(2, "b")], "two").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();

        let files = storage.list().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().unwrap() == "json"));
    }

    #[test]
    fn load_of_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert!(storage.load("absent.json").is_err());
    }
}

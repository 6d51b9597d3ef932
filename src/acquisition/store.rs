//! Durable audio storage keyed by generated file names.
//! Writes land in a private temp directory first and are renamed into place.

use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const PARTIAL_DIR: &str = ".partial";

#[derive(Debug, Clone)]
pub struct AudioStore {
    root: PathBuf,
}

impl AudioStore {
    /// Open (and create) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(PARTIAL_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn generate_name(extension: &str) -> String {
        format!("{}.{}", Uuid::new_v4(), extension)
    }

    /// Fresh temp path on the same filesystem as the store.
    pub fn temp_path(&self) -> PathBuf {
        self.root
            .join(PARTIAL_DIR)
            .join(format!("{}.part", Uuid::new_v4()))
    }

    /// Atomically move a finished temp file into the store.
    pub async fn commit(&self, temp: &Path, file_name: &str) -> io::Result<PathBuf> {
        let dest = self.path_for(file_name);
        if let Err(e) = tokio::fs::rename(temp, &dest).await {
            let _ = tokio::fs::remove_file(temp).await;
            return Err(e);
        }
        Ok(dest)
    }

    /// Copy `source` into the store under `file_name`.
    pub async fn import_copy(&self, source: &Path, file_name: &str) -> io::Result<PathBuf> {
        let temp = self.temp_path();
        if let Err(e) = tokio::fs::copy(source, &temp).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        self.commit(&temp, file_name).await
    }

    pub async fn remove(&self, file_name: &str) -> io::Result<()> {
        tokio::fs::remove_file(self.path_for(file_name)).await
    }

    /// Committed file names, sorted. Temp files are not listed.
    pub fn list(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)?.flatten() {
            if entry.file_type().map_or(false, |t| t.is_file()) {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

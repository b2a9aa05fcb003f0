use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// 本地持久化：每个命名空间对应数据目录下的一个 JSON 文件
#[derive(Debug, Clone)]
pub struct BlobStorage {
    dir: PathBuf,
}

impl BlobStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", namespace))
    }

    /// 读取命名空间；文件不存在时返回 `None`，内容损坏时返回错误
    pub fn load<T: DeserializeOwned>(&self, namespace: &str) -> Result<Option<T>> {
        let path = self.path_for(namespace);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", path)),
        };

        let value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(Some(value))
    }

    /// 先写临时文件再原子替换，避免中途崩溃留下半个文件
    pub fn save<T: Serialize>(&self, namespace: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data directory {:?}", self.dir))?;

        let json = serde_json::to_string_pretty(value)
            .context("Failed to serialize persisted state")?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .context("Failed to create temp file")?;
        tmp.write_all(json.as_bytes())
            .context("Failed to write temp file")?;
        tmp.flush().context("Failed to flush temp file")?;

        let path = self.path_for(namespace);
        tmp.persist(&path)
            .with_context(|| format!("Failed to persist {:?}", path))?;
        Ok(())
    }

    pub fn remove(&self, namespace: &str) -> Result<()> {
        let path = self.path_for(namespace);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", path)),
        }
    }
}
